//! Decides whether a registry lookup is worth performing for a request.

use crate::model::{AttributeKey, BuilderQuery, QueryRangeParams};

/// Whether any attribute reference in a logs sub-query lacks type metadata.
///
/// A missing composite query reports `true` so callers attempt enrichment
/// rather than silently skipping it.
pub fn enrichment_required(params: &QueryRangeParams) -> bool {
    let Some(composite_query) = &params.composite_query else {
        return true;
    };

    composite_query
        .builder_queries
        .values()
        .filter(|query| query.data_source.is_logs())
        .any(query_requires_enrichment)
}

/// Whether any logs sub-query filters on a `body.` path.
///
/// Such paths are never unresolved in the sense of [`enrichment_required`],
/// but they can only land on promoted fields when those are looked up.
pub fn references_body_fields(params: &QueryRangeParams) -> bool {
    params.composite_query.as_ref().is_some_and(|composite_query| {
        composite_query
            .builder_queries
            .values()
            .filter(|query| query.data_source.is_logs())
            .flat_map(BuilderQuery::filter_items)
            .any(|item| item.key.is_body_field())
    })
}

fn query_requires_enrichment(query: &BuilderQuery) -> bool {
    if is_unresolved(&query.aggregate_attribute) {
        return true;
    }

    // body paths are typed from their literal, never from the registry
    if query
        .filter_items()
        .iter()
        .filter(|item| !item.key.is_body_field())
        .any(|item| is_unresolved(&item.key))
    {
        return true;
    }

    if query.group_by.iter().any(group_key_unresolved) {
        return true;
    }

    query.order_by.iter().any(|order| {
        if order.is_aggregate_value() {
            // the aggregate shadows the group keys; any of them not backed
            // by a column still needs a lookup pass
            query.group_by.iter().any(|key| !key.is_column)
        } else {
            group_key_unresolved(&order.as_attribute_key())
        }
    })
}

fn is_unresolved(key: &AttributeKey) -> bool {
    !key.name.is_empty() && !key.is_resolved()
}

fn group_key_unresolved(key: &AttributeKey) -> bool {
    !key.is_column && is_unresolved(key)
}
