//! Schema registry boundary.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::trace;

use crate::model::AttributeKey;
use crate::schema::SchemaMap;

/// Failure reported by a registry backend.
///
/// Lookup deadlines are enforced by [`crate::Enricher`].
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Connection error: {0}")]
    Connection(String),
}

/// Source of attribute descriptors.
#[async_trait]
pub trait AttributeRegistry: Send + Sync {
    /// Every known variant of each of `names`. Unknown names are absent
    /// from the result rather than an error.
    async fn fetch(&self, names: &[String]) -> Result<SchemaMap, RegistryError>;
}

#[async_trait]
impl<R: AttributeRegistry + ?Sized> AttributeRegistry for Arc<R> {
    async fn fetch(&self, names: &[String]) -> Result<SchemaMap, RegistryError> {
        (**self).fetch(names).await
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryRegistry {
    fields: Arc<RwLock<SchemaMap>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields(fields: impl IntoIterator<Item = AttributeKey>) -> Self {
        Self {
            fields: Arc::new(RwLock::new(fields.into_iter().collect())),
        }
    }

    /// Add or replace the variant identified by the descriptor's metadata.
    pub async fn register(&self, descriptor: AttributeKey) {
        self.fields.write().await.insert(descriptor);
    }
}

#[async_trait]
impl AttributeRegistry for MemoryRegistry {
    async fn fetch(&self, names: &[String]) -> Result<SchemaMap, RegistryError> {
        let guard = self.fields.read().await;
        let fields: &SchemaMap = &guard;
        let found: SchemaMap = names
            .iter()
            .flat_map(|name| fields.variants(name).cloned())
            .collect();

        trace!(requested = names.len(), found = found.len(), "memory registry lookup");
        Ok(found)
    }
}
