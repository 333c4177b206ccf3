//! Request-scoped enrichment: decide, look up, rewrite.

use tracing::{debug, instrument};

use crate::config::{EnrichConfig, RegistryConfig};
use crate::enrich::enrich_in_place;
use crate::error::EnrichError;
use crate::fields::lookup_names;
use crate::model::QueryRangeParams;
use crate::registry::AttributeRegistry;
use crate::required::{enrichment_required, references_body_fields};
use crate::schema::SchemaMap;

/// Enriches query requests using descriptors from a registry.
///
/// The registry is consulted at most once per request, and only when some
/// reference is missing its type metadata or a logs filter names a `body.`
/// path. Body paths land on a promoted field when one is found for the path
/// or one of its prefixes, and are typed from their literal otherwise.
#[derive(Debug, Clone)]
pub struct Enricher<R> {
    registry: R,
    config: RegistryConfig,
}

impl<R: AttributeRegistry> Enricher<R> {
    pub fn new(registry: R, config: &EnrichConfig) -> Self {
        Self {
            registry,
            config: config.registry.clone(),
        }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    #[instrument(skip_all)]
    pub async fn enrich(
        &self,
        mut params: QueryRangeParams,
    ) -> Result<QueryRangeParams, EnrichError> {
        let fields = self.lookup(&params).await?;
        enrich_in_place(&mut params, &fields);
        Ok(params)
    }

    /// Decode a JSON request, enrich it and encode the result.
    pub async fn enrich_json(&self, request: &str) -> Result<String, EnrichError> {
        let params: QueryRangeParams = serde_json::from_str(request)?;
        let enriched = self.enrich(params).await?;
        Ok(serde_json::to_string_pretty(&enriched)?)
    }

    async fn lookup(&self, params: &QueryRangeParams) -> Result<SchemaMap, EnrichError> {
        if !enrichment_required(params) && !references_body_fields(params) {
            debug!("all references resolved, skipping registry");
            return Ok(SchemaMap::new());
        }

        let names = lookup_names(params.composite_query.as_ref());
        if names.is_empty() {
            debug!("no attribute names referenced, skipping registry");
            return Ok(SchemaMap::new());
        }

        let limit = self.config.max_field_names;
        if names.len() > limit {
            return Err(EnrichError::TooManyFields {
                count: names.len(),
                limit,
            });
        }

        let duration = self.config.timeout();
        let fields = tokio::time::timeout(duration, self.registry.fetch(&names))
            .await
            .map_err(|_| EnrichError::RegistryTimeout { duration })??;

        debug!(
            requested = names.len(),
            found = fields.len(),
            "fetched attribute descriptors"
        );
        Ok(fields)
    }
}
