//! Collects the attribute names a composite query needs looked up.

use std::collections::HashSet;

use crate::json::is_well_formed;
use crate::model::{BuilderQuery, CompositeQuery, BODY_PREFIX};

/// Distinct attribute names referenced by `composite_query`.
///
/// Only sub-queries whose expression is their own name are visited; formula
/// sub-queries reference other sub-queries rather than attributes. Body
/// paths are returned without the `body.` prefix since the registry is
/// keyed by the path inside the body. Order follows first appearance.
pub fn field_names(composite_query: Option<&CompositeQuery>) -> Vec<String> {
    let mut names = NameSet::default();
    if let Some(composite_query) = composite_query {
        collect_field_names(composite_query, &mut names);
    }
    names.into_vec()
}

/// Names to request from the registry.
///
/// [`field_names`] followed by every dotted prefix of the logs body filter
/// paths, longest first, so a path below a promoted field can still land on
/// it (`body.data.error.code` also asks for `data.error` and `data`).
pub fn lookup_names(composite_query: Option<&CompositeQuery>) -> Vec<String> {
    let Some(composite_query) = composite_query else {
        return Vec::new();
    };

    let mut names = NameSet::default();
    collect_field_names(composite_query, &mut names);

    for query in composite_query
        .builder_queries
        .values()
        .filter(|query| query.data_source.is_logs())
    {
        for item in query.filter_items() {
            if let Some(path) = item.key.name.strip_prefix(BODY_PREFIX) {
                for prefix in path_prefixes(path) {
                    names.push(prefix);
                }
            }
        }
    }

    names.into_vec()
}

fn collect_field_names(composite_query: &CompositeQuery, names: &mut NameSet) {
    let mut expressions = HashSet::new();

    for query in composite_query
        .builder_queries
        .values()
        .filter(|query| !is_formula(query))
    {
        if !expressions.insert(query.expression.as_str()) {
            continue;
        }

        if !query.aggregate_attribute.name.is_empty() {
            names.push(&query.aggregate_attribute.name);
        }
        for item in query.filter_items() {
            names.push(&item.key.name);
        }
        for key in &query.group_by {
            names.push(&key.name);
        }
        for order in &query.order_by {
            names.push(&order.column_name);
        }
    }
}

fn is_formula(query: &BuilderQuery) -> bool {
    query.expression != query.query_name
}

/// Proper dotted prefixes of `path`, longest first. Malformed paths have none.
fn path_prefixes(path: &str) -> impl Iterator<Item = &str> {
    let path = if is_well_formed(path) { path } else { "" };
    path.rmatch_indices('.').map(move |(idx, _)| &path[..idx])
}

#[derive(Default)]
struct NameSet {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl NameSet {
    fn push(&mut self, name: &str) {
        let name = name.strip_prefix(BODY_PREFIX).unwrap_or(name);
        if name.is_empty() {
            return;
        }
        if self.seen.insert(name.to_owned()) {
            self.ordered.push(name.to_owned());
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AttributeKey, DataSource, FilterItem, FilterSet, OrderBy};
    use serde_json::json;

    fn filters(items: Vec<FilterItem>) -> Option<FilterSet> {
        Some(FilterSet {
            operator: "AND".to_string(),
            items,
        })
    }

    fn filter(name: &str) -> FilterItem {
        FilterItem::new(AttributeKey::new(name), "=", json!("value"))
    }

    fn sorted(mut names: Vec<String>) -> Vec<String> {
        names.sort();
        names
    }

    fn single(query: BuilderQuery) -> CompositeQuery {
        CompositeQuery::default().with_query(query)
    }

    #[test]
    fn nil_composite_query() {
        assert!(field_names(None).is_empty());
    }

    #[test]
    fn empty_builder_queries() {
        assert!(field_names(Some(&CompositeQuery::default())).is_empty());
    }

    #[test]
    fn aggregate_attribute_only() {
        let query = BuilderQuery {
            aggregate_attribute: AttributeKey::new("response_time"),
            ..BuilderQuery::logs("test")
        };
        assert_eq!(field_names(Some(&single(query))), vec!["response_time"]);
    }

    #[test]
    fn filters_only() {
        let query = BuilderQuery {
            filters: filters(vec![filter("user_name"), filter("status")]),
            ..BuilderQuery::logs("test")
        };
        assert_eq!(field_names(Some(&single(query))), vec!["user_name", "status"]);
    }

    #[test]
    fn body_filters_are_stripped() {
        let query = BuilderQuery {
            filters: filters(vec![
                filter("body.user_name"),
                filter("body.status.code"),
                filter("body.requestor_list[*]"),
            ]),
            ..BuilderQuery::logs("test")
        };
        assert_eq!(
            field_names(Some(&single(query))),
            vec!["user_name", "status.code", "requestor_list[*]"]
        );
    }

    #[test]
    fn single_array_body_filter() {
        let query = BuilderQuery {
            filters: filters(vec![FilterItem::new(
                AttributeKey::new("body.requestor_list[*]"),
                "has",
                json!("index_service"),
            )]),
            ..BuilderQuery::logs("test")
        };
        assert_eq!(field_names(Some(&single(query))), vec!["requestor_list[*]"]);
    }

    #[test]
    fn group_by_and_order_by() {
        let query = BuilderQuery {
            group_by: vec![AttributeKey::new("service_name"), AttributeKey::new("host_name")],
            order_by: vec![
                OrderBy::new("timestamp", "DESC"),
                OrderBy::new("response_time", "ASC"),
            ],
            ..BuilderQuery::logs("test")
        };
        assert_eq!(
            field_names(Some(&single(query))),
            vec!["service_name", "host_name", "timestamp", "response_time"]
        );
    }

    #[test]
    fn all_sites_combined_collapse_repeats() {
        let query = BuilderQuery {
            aggregate_attribute: AttributeKey::new("response_time"),
            filters: filters(vec![filter("user_name"), filter("body.status")]),
            group_by: vec![AttributeKey::new("service_name"), AttributeKey::new("user_name")],
            order_by: vec![OrderBy::new("timestamp", "DESC")],
            ..BuilderQuery::logs("test")
        };
        assert_eq!(
            field_names(Some(&single(query))),
            vec!["response_time", "user_name", "status", "service_name", "timestamp"]
        );
    }

    #[test]
    fn empty_aggregate_attribute_is_skipped() {
        let query = BuilderQuery {
            filters: filters(vec![filter("user_name")]),
            group_by: vec![AttributeKey::new("service_name")],
            ..BuilderQuery::logs("test")
        };
        assert_eq!(
            field_names(Some(&single(query))),
            vec!["user_name", "service_name"]
        );
    }

    #[test]
    fn multiple_builder_queries() {
        let composite = CompositeQuery::default()
            .with_query(BuilderQuery {
                aggregate_attribute: AttributeKey::new("field1"),
                ..BuilderQuery::logs("query1")
            })
            .with_query(BuilderQuery {
                filters: filters(vec![filter("field2")]),
                ..BuilderQuery::logs("query2")
            })
            .with_query(BuilderQuery {
                expression: "different_expression".to_string(),
                aggregate_attribute: AttributeKey::new("field3"),
                ..BuilderQuery::logs("query3")
            });

        assert_eq!(
            sorted(field_names(Some(&composite))),
            vec!["field1", "field2"]
        );
    }

    #[test]
    fn shared_expression_is_visited_once() {
        let composite = CompositeQuery::default()
            .with_query(BuilderQuery {
                aggregate_attribute: AttributeKey::new("field1"),
                ..BuilderQuery::logs("A")
            })
            .with_query(BuilderQuery {
                query_name: "B".to_string(),
                expression: "A".to_string(),
                aggregate_attribute: AttributeKey::new("field3"),
                ..BuilderQuery::default()
            });

        assert_eq!(field_names(Some(&composite)), vec!["field1"]);
    }

    #[test]
    fn mixed_body_and_regular_filters() {
        let query = BuilderQuery {
            filters: filters(vec![
                filter("user_name"),
                filter("body.status.abc"),
                filter("service_name"),
            ]),
            ..BuilderQuery::logs("test")
        };
        assert_eq!(
            field_names(Some(&single(query))),
            vec!["user_name", "status.abc", "service_name"]
        );
    }

    #[test]
    fn formula_sub_queries_are_skipped() {
        let composite = CompositeQuery::default()
            .with_query(BuilderQuery {
                aggregate_attribute: AttributeKey::new("field1"),
                ..BuilderQuery::logs("A")
            })
            .with_query(BuilderQuery {
                expression: "A * 2".to_string(),
                group_by: vec![AttributeKey::new("field2")],
                ..BuilderQuery::logs("F1")
            });

        assert_eq!(field_names(Some(&composite)), vec!["field1"]);
    }

    #[test]
    fn lookup_names_add_body_path_prefixes() {
        let query = BuilderQuery {
            filters: filters(vec![
                filter("user_name"),
                filter("body.data.error.code"),
                filter("body.data.status"),
            ]),
            ..BuilderQuery::logs("test")
        };
        let composite = single(query);

        assert_eq!(
            lookup_names(Some(&composite)),
            vec![
                "user_name",
                "data.error.code",
                "data.status",
                "data.error",
                "data"
            ]
        );
        assert_eq!(
            field_names(Some(&composite)),
            vec!["user_name", "data.error.code", "data.status"]
        );
    }

    #[test]
    fn lookup_names_skip_malformed_and_non_log_paths() {
        let composite = CompositeQuery::default()
            .with_query(BuilderQuery {
                filters: filters(vec![filter("body.a..b"), filter("body.flat")]),
                ..BuilderQuery::logs("A")
            })
            .with_query(BuilderQuery {
                data_source: DataSource::Traces,
                filters: filters(vec![filter("body.x.y")]),
                ..BuilderQuery::logs("B")
            });

        assert_eq!(
            lookup_names(Some(&composite)),
            vec!["a..b", "flat", "x.y"]
        );
        assert!(lookup_names(None).is_empty());
    }
}
