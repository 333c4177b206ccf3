//! Sidereal Enrich - attribute type enrichment for log queries.
//!
//! Log queries reference attributes by name only. Before a query can be
//! compiled, each reference needs its category (tag or resource), data type
//! and storage layout. This crate fills those in:
//! - Decides whether a request needs a registry lookup at all
//! - Collects the attribute names to look up
//! - Rewrites references with the matching descriptors
//! - Types `body.` paths from known fields or from their comparison literal
//!
//! ## Flow
//!
//! ```text
//! QueryRangeParams → enrichment_required? → field_names → AttributeRegistry
//!                                                               ↓
//!                                         enrich ← SchemaMap ←──┘
//! ```

pub mod config;
pub mod enrich;
pub mod error;
pub mod fields;
pub mod json;
pub mod model;
pub mod registry;
pub mod required;
pub mod schema;
pub mod service;
pub mod value;

pub use config::EnrichConfig;
pub use enrich::{enrich, enrich_in_place, Resolution};
pub use error::EnrichError;
pub use fields::{field_names, lookup_names};
pub use model::{
    AttributeKey, AttributeKeyDataType, AttributeKeyType, BuilderQuery, CompositeQuery,
    DataSource, FilterItem, FilterSet, OrderBy, QueryRangeParams,
};
pub use registry::{AttributeRegistry, MemoryRegistry, RegistryError};
pub use required::{enrichment_required, references_body_fields};
pub use schema::{FieldKey, SchemaMap};
pub use service::Enricher;
