//! Attribute descriptors supplied by the schema registry.
//!
//! A name may exist under several (category, data type) variants at once,
//! e.g. `status` as a string tag and as an int64 resource attribute. The
//! [`SchemaMap`] keeps every variant and answers the narrowing questions the
//! enrichment engine asks.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::model::{AttributeKey, AttributeKeyDataType, AttributeKeyType};

/// Separator used by the string rendering of a [`FieldKey`].
pub const FIELD_KEY_SEPARATOR: &str = "##";

/// Log columns that exist on every log record regardless of the registry.
const STATIC_LOG_FIELDS: &[(&str, AttributeKeyDataType)] = &[
    ("trace_id", AttributeKeyDataType::String),
    ("span_id", AttributeKeyDataType::String),
    ("trace_flags", AttributeKeyDataType::Int64),
    ("severity_text", AttributeKeyDataType::String),
    ("severity_number", AttributeKeyDataType::Int64),
    ("body", AttributeKeyDataType::String),
];

/// Descriptor for a static log column, if `name` is one.
pub fn static_log_field(name: &str) -> Option<AttributeKey> {
    STATIC_LOG_FIELDS
        .iter()
        .find(|(field, _)| *field == name)
        .map(|(field, data_type)| AttributeKey::new(*field).with_data_type(*data_type).column())
}

/// Identity of one descriptor variant.
///
/// Ordered by name first, so all variants of a name are contiguous in a
/// [`SchemaMap`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldKey {
    pub name: String,
    pub category: AttributeKeyType,
    pub data_type: AttributeKeyDataType,
}

impl FieldKey {
    pub fn new(
        name: impl Into<String>,
        category: AttributeKeyType,
        data_type: AttributeKeyDataType,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            data_type,
        }
    }

    /// Smallest key with the given name.
    fn lower_bound(name: &str) -> Self {
        Self::new(
            name,
            AttributeKeyType::Unspecified,
            AttributeKeyDataType::Unspecified,
        )
    }
}

impl From<&AttributeKey> for FieldKey {
    fn from(key: &AttributeKey) -> Self {
        Self::new(key.name.clone(), key.category, key.data_type)
    }
}

/// Renders `name##category##datatype`.
impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{FIELD_KEY_SEPARATOR}{}{FIELD_KEY_SEPARATOR}{}",
            self.name, self.category, self.data_type
        )
    }
}

impl FromStr for FieldKey {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.rsplitn(3, FIELD_KEY_SEPARATOR);
        let (Some(data_type), Some(category), Some(name)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(SchemaError::MalformedKey(s.to_owned()));
        };

        let category = AttributeKeyType::parse(category).ok_or_else(|| SchemaError::UnknownCategory {
            key: s.to_owned(),
            value: category.to_owned(),
        })?;
        let data_type =
            AttributeKeyDataType::parse(data_type).ok_or_else(|| SchemaError::UnknownDataType {
                key: s.to_owned(),
                value: data_type.to_owned(),
            })?;

        Ok(Self::new(name, category, data_type))
    }
}

/// Error converting registry output into a [`SchemaMap`].
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("malformed field key: {0}")]
    MalformedKey(String),

    #[error("unknown attribute type {value:?} in field key {key}")]
    UnknownCategory { key: String, value: String },

    #[error("unknown data type {value:?} in field key {key}")]
    UnknownDataType { key: String, value: String },
}

/// Every known variant of the looked-up attribute names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaMap {
    fields: BTreeMap<FieldKey, AttributeKey>,
}

impl SchemaMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a descriptor under the key derived from its own metadata.
    pub fn insert(&mut self, descriptor: AttributeKey) -> Option<AttributeKey> {
        self.fields.insert(FieldKey::from(&descriptor), descriptor)
    }

    pub fn get(&self, key: &FieldKey) -> Option<&AttributeKey> {
        self.fields.get(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &AttributeKey)> {
        self.fields.iter()
    }

    /// All descriptors registered under `name`.
    pub fn variants<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a AttributeKey> + 'a {
        self.fields
            .range(FieldKey::lower_bound(name)..)
            .take_while(move |(key, _)| key.name == name)
            .map(|(_, descriptor)| descriptor)
    }

    /// Variants of `reference.name` agreeing with every field the reference
    /// already specifies. Unspecified fields act as wildcards.
    pub fn candidates<'a>(&'a self, reference: &'a AttributeKey) -> Vec<&'a AttributeKey> {
        self.variants(&reference.name)
            .filter(|descriptor| agrees_with(reference, descriptor))
            .collect()
    }

    /// Names that have exactly one variant, mapped to that variant.
    ///
    /// Used as the set of known fields when resolving body paths, where the
    /// reference carries no category to disambiguate with.
    pub fn by_name(&self) -> HashMap<String, AttributeKey> {
        let mut seen: HashMap<&str, Option<&AttributeKey>> = HashMap::new();
        for (key, descriptor) in &self.fields {
            seen.entry(key.name.as_str())
                .and_modify(|slot| *slot = None)
                .or_insert(Some(descriptor));
        }
        seen.into_iter()
            .filter_map(|(name, slot)| slot.map(|descriptor| (name.to_owned(), descriptor.clone())))
            .collect()
    }
}

/// Whether `descriptor` is compatible with what `reference` already states.
pub(crate) fn agrees_with(reference: &AttributeKey, descriptor: &AttributeKey) -> bool {
    (!reference.category.is_specified() || reference.category == descriptor.category)
        && (!reference.data_type.is_specified() || reference.data_type == descriptor.data_type)
}

impl FromIterator<AttributeKey> for SchemaMap {
    fn from_iter<I: IntoIterator<Item = AttributeKey>>(iter: I) -> Self {
        let mut map = Self::new();
        for descriptor in iter {
            map.insert(descriptor);
        }
        map
    }
}

impl Extend<AttributeKey> for SchemaMap {
    fn extend<I: IntoIterator<Item = AttributeKey>>(&mut self, iter: I) {
        for descriptor in iter {
            self.insert(descriptor);
        }
    }
}

/// Accepts the `name##category##datatype` keyed maps some registries return.
impl TryFrom<HashMap<String, AttributeKey>> for SchemaMap {
    type Error = SchemaError;

    fn try_from(raw: HashMap<String, AttributeKey>) -> Result<Self, Self::Error> {
        let fields = raw
            .into_iter()
            .map(|(key, descriptor)| key.parse::<FieldKey>().map(|key| (key, descriptor)))
            .collect::<Result<BTreeMap<_, _>, _>>()?;
        Ok(Self { fields })
    }
}
