//! Rewrites attribute references with registry metadata.
//!
//! Every reference is matched by name against the [`SchemaMap`], narrowed by
//! whatever category or data type the reference already carries. Exactly
//! one surviving candidate is adopted; anything else leaves the reference
//! untouched for the query builder to reject.

use std::collections::HashMap;

use tracing::debug;

use crate::json::{json_filter_enrich, json_replace_field};
use crate::model::{AttributeKey, BuilderQuery, QueryRangeParams};
use crate::schema::{agrees_with, static_log_field, SchemaMap};

/// Outcome of matching one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A single descriptor agrees with the reference.
    Matched(AttributeKey),
    /// Several descriptors agree; the reference gives no way to choose.
    Ambiguous(usize),
    Missing,
}

/// Match `reference` against `fields`.
///
/// When the registry has no agreeing variant, static log columns such as
/// `trace_id` are used if they agree with the reference.
pub fn resolve(reference: &AttributeKey, fields: &SchemaMap) -> Resolution {
    match fields.candidates(reference).as_slice() {
        [only] => Resolution::Matched((*only).clone()),
        [] => static_log_field(&reference.name)
            .filter(|field| agrees_with(reference, field))
            .map_or(Resolution::Missing, Resolution::Matched),
        many => Resolution::Ambiguous(many.len()),
    }
}

/// Enrich every logs sub-query of `params` and hand the request back.
pub fn enrich(mut params: QueryRangeParams, fields: &SchemaMap) -> QueryRangeParams {
    enrich_in_place(&mut params, fields);
    params
}

/// In-place form of [`enrich`].
pub fn enrich_in_place(params: &mut QueryRangeParams, fields: &SchemaMap) {
    let Some(composite_query) = params.composite_query.as_mut() else {
        return;
    };

    let known = fields.by_name();
    for query in composite_query
        .builder_queries
        .values_mut()
        .filter(|query| query.data_source.is_logs())
    {
        enrich_query(query, fields, &known);
    }
}

fn enrich_query(
    query: &mut BuilderQuery,
    fields: &SchemaMap,
    known: &HashMap<String, AttributeKey>,
) {
    if !query.aggregate_attribute.name.is_empty() {
        resolve_key(&mut query.aggregate_attribute, fields);
    }

    if let Some(filters) = query.filters.as_mut() {
        for item in filters
            .items
            .iter_mut()
            .filter(|item| !item.key.name.is_empty())
        {
            if item.key.is_body_field() {
                if !json_replace_field(item, known) {
                    json_filter_enrich(item);
                }
            } else {
                resolve_key(&mut item.key, fields);
            }
        }
    }

    for key in query.group_by.iter_mut().filter(|key| !key.is_column) {
        resolve_key(key, fields);
    }

    for order in query
        .order_by
        .iter_mut()
        .filter(|order| !order.is_aggregate_value())
    {
        order.key.clone_from(&order.column_name);
        let mut key = AttributeKey::new(order.column_name.as_str());
        resolve_key(&mut key, fields);
        order.category = key.category;
        order.data_type = key.data_type;
        order.is_column = key.is_column;
    }
}

fn resolve_key(key: &mut AttributeKey, fields: &SchemaMap) {
    match resolve(key, fields) {
        Resolution::Matched(descriptor) => key.adopt(&descriptor),
        Resolution::Ambiguous(candidates) => {
            debug!(name = %key.name, candidates, "ambiguous attribute reference left unresolved");
        }
        Resolution::Missing => {
            debug!(name = %key.name, "no descriptor for attribute reference");
        }
    }
}
