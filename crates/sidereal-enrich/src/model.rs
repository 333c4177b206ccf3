//! Builder query model consumed by the enrichment passes.
//!
//! These types mirror the JSON shape accepted by the query API. Attribute
//! references arrive name-only and are filled in place by [`crate::enrich`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Prefix marking a path into the semi-structured log body.
pub const BODY_PREFIX: &str = "body.";

/// Order-by column that refers to the computed aggregate value.
pub const ORDER_BY_VALUE: &str = "#SIGNOZ_VALUE";

/// Suffix marking a JSON path segment that addresses every array element.
pub const ARRAY_SUFFIX: &str = "[*]";

/// Set-membership operators. Compared case-insensitively.
const MEMBERSHIP_OPERATORS: &[&str] = &["in", "nin", "not_in"];

/// Returns true for `IN` / `NOT_IN` style operators whose value is a list.
pub fn is_membership_operator(op: &str) -> bool {
    MEMBERSHIP_OPERATORS
        .iter()
        .any(|candidate| op.eq_ignore_ascii_case(candidate))
}

/// Attribute category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttributeKeyType {
    #[default]
    #[serde(rename = "")]
    Unspecified,
    /// Dynamic per-record attribute.
    #[serde(rename = "tag")]
    Tag,
    /// Attribute of the emitting resource.
    #[serde(rename = "resource")]
    Resource,
}

impl AttributeKeyType {
    /// Canonical lowercase form used in registry keys.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "",
            Self::Tag => "tag",
            Self::Resource => "resource",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "" => Some(Self::Unspecified),
            "tag" => Some(Self::Tag),
            "resource" => Some(Self::Resource),
            _ => None,
        }
    }

    pub const fn is_specified(&self) -> bool {
        !matches!(self, Self::Unspecified)
    }
}

impl fmt::Display for AttributeKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute value type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttributeKeyDataType {
    #[default]
    #[serde(rename = "")]
    Unspecified,
    #[serde(rename = "string")]
    String,
    #[serde(rename = "int64")]
    Int64,
    #[serde(rename = "float64")]
    Float64,
    #[serde(rename = "bool")]
    Bool,
    #[serde(rename = "array(string)")]
    ArrayString,
    #[serde(rename = "array(int64)")]
    ArrayInt64,
    #[serde(rename = "array(float64)")]
    ArrayFloat64,
    #[serde(rename = "array(bool)")]
    ArrayBool,
}

impl AttributeKeyDataType {
    /// Canonical lowercase form used in registry keys.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unspecified => "",
            Self::String => "string",
            Self::Int64 => "int64",
            Self::Float64 => "float64",
            Self::Bool => "bool",
            Self::ArrayString => "array(string)",
            Self::ArrayInt64 => "array(int64)",
            Self::ArrayFloat64 => "array(float64)",
            Self::ArrayBool => "array(bool)",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "" => Some(Self::Unspecified),
            "string" => Some(Self::String),
            "int64" => Some(Self::Int64),
            "float64" => Some(Self::Float64),
            "bool" => Some(Self::Bool),
            "array(string)" => Some(Self::ArrayString),
            "array(int64)" => Some(Self::ArrayInt64),
            "array(float64)" => Some(Self::ArrayFloat64),
            "array(bool)" => Some(Self::ArrayBool),
            _ => None,
        }
    }

    pub const fn is_specified(&self) -> bool {
        !matches!(self, Self::Unspecified)
    }

    pub const fn is_array(&self) -> bool {
        matches!(
            self,
            Self::ArrayString | Self::ArrayInt64 | Self::ArrayFloat64 | Self::ArrayBool
        )
    }

    /// The array variant holding elements of this type.
    ///
    /// Array types map to themselves; `Unspecified` maps to `ArrayString`.
    pub const fn array_of(self) -> Self {
        match self {
            Self::Int64 | Self::ArrayInt64 => Self::ArrayInt64,
            Self::Float64 | Self::ArrayFloat64 => Self::ArrayFloat64,
            Self::Bool | Self::ArrayBool => Self::ArrayBool,
            Self::Unspecified | Self::String | Self::ArrayString => Self::ArrayString,
        }
    }
}

impl fmt::Display for AttributeKeyDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single attribute reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeKey {
    /// Attribute name, or a `body.`-prefixed path into the log body.
    #[serde(rename = "key")]
    pub name: String,
    #[serde(rename = "type")]
    pub category: AttributeKeyType,
    #[serde(rename = "dataType")]
    pub data_type: AttributeKeyDataType,
    /// Materialized as its own storage column.
    #[serde(rename = "isColumn")]
    pub is_column: bool,
    /// `name` is a path evaluated inside the log body.
    #[serde(rename = "isJSON")]
    pub is_json: bool,
}

impl AttributeKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, category: AttributeKeyType) -> Self {
        self.category = category;
        self
    }

    pub fn with_data_type(mut self, data_type: AttributeKeyDataType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn column(mut self) -> Self {
        self.is_column = true;
        self
    }

    /// Both category and data type are known.
    pub const fn is_resolved(&self) -> bool {
        self.category.is_specified() && self.data_type.is_specified()
    }

    pub fn is_body_field(&self) -> bool {
        self.name.starts_with(BODY_PREFIX)
    }

    /// Copy the resolved metadata of `descriptor`, keeping this key's name.
    pub(crate) fn adopt(&mut self, descriptor: &Self) {
        self.category = descriptor.category;
        self.data_type = descriptor.data_type;
        self.is_column = descriptor.is_column;
    }
}

/// A single comparison in a filter set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterItem {
    pub key: AttributeKey,
    pub op: String,
    pub value: serde_json::Value,
}

impl FilterItem {
    pub fn new(key: AttributeKey, op: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            key,
            op: op.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSet {
    /// Boolean combinator (`AND`, `OR`).
    #[serde(rename = "op")]
    pub operator: String,
    pub items: Vec<FilterItem>,
}

/// Order-by entry.
///
/// `column_name` is the reference as authored. The remaining fields are
/// populated by enrichment and flattened rather than nested in an
/// [`AttributeKey`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OrderBy {
    pub column_name: String,
    pub order: String,
    pub key: String,
    #[serde(rename = "type")]
    pub category: AttributeKeyType,
    pub data_type: AttributeKeyDataType,
    pub is_column: bool,
}

impl OrderBy {
    pub fn new(column_name: impl Into<String>, order: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            order: order.into(),
            ..Self::default()
        }
    }

    /// Orders by the computed aggregate rather than a stored attribute.
    pub fn is_aggregate_value(&self) -> bool {
        self.column_name == ORDER_BY_VALUE
    }

    /// The reference this entry names, seen as a group-by style key.
    pub(crate) fn as_attribute_key(&self) -> AttributeKey {
        AttributeKey {
            name: self.column_name.clone(),
            category: self.category,
            data_type: self.data_type,
            is_column: self.is_column,
            is_json: false,
        }
    }
}

/// Telemetry signal a sub-query reads from.
///
/// A sub-query that omits its data source is `Unspecified` and is never
/// treated as a logs query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    #[default]
    #[serde(rename = "")]
    Unspecified,
    Logs,
    Metrics,
    Traces,
}

impl DataSource {
    pub const fn is_logs(&self) -> bool {
        matches!(self, Self::Logs)
    }
}

/// One named sub-query of a composite query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuilderQuery {
    pub query_name: String,
    /// Formula identifying this sub-query.
    pub expression: String,
    pub data_source: DataSource,
    pub aggregate_attribute: AttributeKey,
    pub filters: Option<FilterSet>,
    pub group_by: Vec<AttributeKey>,
    pub order_by: Vec<OrderBy>,
}

impl BuilderQuery {
    /// A logs sub-query whose expression is its own name.
    pub fn logs(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            expression: name.clone(),
            query_name: name,
            data_source: DataSource::Logs,
            ..Self::default()
        }
    }

    pub fn filter_items(&self) -> &[FilterItem] {
        self.filters.as_ref().map_or(&[], |f| f.items.as_slice())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompositeQuery {
    /// Sub-queries keyed by query name.
    pub builder_queries: BTreeMap<String, BuilderQuery>,
}

impl CompositeQuery {
    pub fn with_query(mut self, query: BuilderQuery) -> Self {
        self.builder_queries.insert(query.query_name.clone(), query);
        self
    }
}

/// Request envelope handed over by the API layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryRangeParams {
    pub composite_query: Option<CompositeQuery>,
}

impl From<CompositeQuery> for QueryRangeParams {
    fn from(composite_query: CompositeQuery) -> Self {
        Self {
            composite_query: Some(composite_query),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn attribute_key_deserializes_from_api_shape() {
        let key: AttributeKey = serde_json::from_value(json!({
            "key": "service.name",
            "type": "resource",
            "dataType": "string",
            "isColumn": true
        }))
        .unwrap();

        assert_eq!(key.name, "service.name");
        assert_eq!(key.category, AttributeKeyType::Resource);
        assert_eq!(key.data_type, AttributeKeyDataType::String);
        assert!(key.is_column);
        assert!(!key.is_json);
    }

    #[test]
    fn name_only_key_is_unresolved() {
        let key: AttributeKey = serde_json::from_value(json!({ "key": "user_name" })).unwrap();
        assert!(!key.is_resolved());

        let key = key.with_type(AttributeKeyType::Tag);
        assert!(!key.is_resolved());

        let key = key.with_data_type(AttributeKeyDataType::Int64);
        assert!(key.is_resolved());
    }

    #[test]
    fn array_data_types_round_trip_canonical_names() {
        for dt in [
            AttributeKeyDataType::ArrayString,
            AttributeKeyDataType::ArrayInt64,
            AttributeKeyDataType::ArrayFloat64,
            AttributeKeyDataType::ArrayBool,
        ] {
            assert!(dt.is_array());
            assert_eq!(AttributeKeyDataType::parse(dt.as_str()), Some(dt));
        }
        assert_eq!(
            serde_json::to_value(AttributeKeyDataType::ArrayInt64).unwrap(),
            json!("array(int64)")
        );
    }

    #[test]
    fn array_of_maps_scalars_to_arrays() {
        assert_eq!(
            AttributeKeyDataType::Int64.array_of(),
            AttributeKeyDataType::ArrayInt64
        );
        assert_eq!(
            AttributeKeyDataType::Unspecified.array_of(),
            AttributeKeyDataType::ArrayString
        );
        assert_eq!(
            AttributeKeyDataType::ArrayBool.array_of(),
            AttributeKeyDataType::ArrayBool
        );
    }

    #[test]
    fn membership_operators_ignore_case() {
        assert!(is_membership_operator("IN"));
        assert!(is_membership_operator("NOT_IN"));
        assert!(is_membership_operator("nin"));
        assert!(!is_membership_operator("="));
        assert!(!is_membership_operator("has"));
    }

    #[test]
    fn builder_query_deserializes_with_missing_sections() {
        let params: QueryRangeParams = serde_json::from_value(json!({
            "compositeQuery": {
                "builderQueries": {
                    "A": {
                        "queryName": "A",
                        "expression": "A",
                        "dataSource": "logs",
                        "orderBy": [{ "columnName": "#SIGNOZ_VALUE", "order": "desc" }]
                    }
                }
            }
        }))
        .unwrap();

        let query = &params.composite_query.unwrap().builder_queries["A"];
        assert!(query.filters.is_none());
        assert!(query.filter_items().is_empty());
        assert!(query.order_by[0].is_aggregate_value());
        assert_eq!(query.data_source, DataSource::Logs);
    }

    #[test]
    fn missing_data_source_is_not_logs() {
        let query: BuilderQuery = serde_json::from_value(json!({
            "queryName": "A",
            "expression": "A",
            "aggregateAttribute": { "key": "user_name" }
        }))
        .unwrap();

        assert_eq!(query.data_source, DataSource::Unspecified);
        assert!(!query.data_source.is_logs());
        assert!(BuilderQuery::logs("A").data_source.is_logs());
    }
}
