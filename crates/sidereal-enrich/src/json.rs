//! Resolution of `body.`-prefixed filter keys.
//!
//! A body path either lands on a field that has been promoted out of the
//! body (a materialized column or a plain attribute), or stays a dynamic
//! JSON path whose type is inferred from the comparison literal.

use std::collections::HashMap;

use serde_json::Value;
use tracing::trace;

use crate::model::{
    is_membership_operator, AttributeKey, AttributeKeyDataType, FilterItem, ARRAY_SUFFIX,
    BODY_PREFIX,
};
use crate::value::{parse_str_value, ScalarValue, ValueKind};

/// Resolve a body path against fields already known outside the body.
///
/// The full path is tried first, then successively shorter prefixes. The
/// first hit replaces the key with the known field (`is_json = false`).
/// Without a hit the name is kept and only `is_json` is cleared.
///
/// Returns whether a known field matched.
pub fn json_replace_field(item: &mut FilterItem, known: &HashMap<String, AttributeKey>) -> bool {
    let Some(path) = item.key.name.strip_prefix(BODY_PREFIX) else {
        return false;
    };

    if is_well_formed(path) {
        let mut prefix = path;
        loop {
            if let Some(field) = known.get(prefix) {
                trace!(path = %path, field = %field.name, "body path resolved to known field");
                item.key = AttributeKey {
                    is_json: false,
                    ..field.clone()
                };
                return true;
            }
            match prefix.rfind('.') {
                Some(idx) => prefix = &prefix[..idx],
                None => break,
            }
        }
    }

    item.key.is_json = false;
    false
}

/// Infer the storage type of a dynamic body path from its filter value.
///
/// Sets `data_type` and `is_json`; the category stays unspecified. A string
/// literal that parses as an integer is replaced by the integer.
pub fn json_filter_enrich(item: &mut FilterItem) {
    let (kind, replacement) = match &item.value {
        // membership operators carry the set as a list; its elements type the field
        Value::Array(values) => (
            values
                .first()
                .map_or(ValueKind::String, |first| infer_literal(first, &item.op).0),
            None,
        ),
        other => infer_literal(other, &item.op),
    };

    if let Some(value) = replacement {
        item.value = value;
    }

    let mut data_type = kind.data_type();
    if item.key.name.ends_with(ARRAY_SUFFIX) {
        data_type = data_type.array_of();
    }
    if item.key.data_type == AttributeKeyDataType::ArrayFloat64 && kind.is_numeric() {
        data_type = AttributeKeyDataType::ArrayFloat64;
    }

    trace!(
        key = %item.key.name,
        data_type = %data_type,
        membership = is_membership_operator(&item.op),
        "inferred body field type"
    );
    item.key.data_type = data_type;
    item.key.is_json = true;
}

fn infer_literal(value: &Value, operator: &str) -> (ValueKind, Option<Value>) {
    match value {
        Value::Bool(_) => (ValueKind::Bool, None),
        Value::Number(n) if n.is_i64() || n.is_u64() => (ValueKind::Int64, None),
        Value::Number(_) => (ValueKind::Float64, None),
        Value::String(s) => match parse_str_value(s, operator) {
            ScalarValue::Int64(i) => (ValueKind::Int64, Some(Value::from(i))),
            parsed => (parsed.kind(), None),
        },
        Value::Null | Value::Array(_) | Value::Object(_) => (ValueKind::String, None),
    }
}

pub(crate) fn is_well_formed(path: &str) -> bool {
    !path.is_empty() && path.split('.').all(|segment| !segment.is_empty())
}
