//! ormgen Core - Catalog introspection, type mapping and migration ordering.
//!
//! This crate reads a relational catalog through a [`CatalogSource`] and
//! produces an intermediate [`SchemaModel`]: mapped column types, resolved
//! user-defined types, classified relationships and a dependency-ordered
//! [`EmissionPlan`] of timestamped migration units.

pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;
pub mod introspect;
pub mod migration;
pub mod model;
pub mod naming;
pub mod relationship;
pub mod render;
pub mod types;

pub use catalog::{CatalogSnapshot, CatalogSource, ColumnRow, SnapshotCatalog, TableRow};
pub use config::GeneratorConfig;
pub use error::{CatalogError, CatalogResult, Error};
pub use fetch::{FetchedCatalog, SchemaFetchCoordinator};
pub use introspect::Introspector;
pub use migration::{
    EmissionPlan, EmissionUnit, MigrationCategory, MigrationOrderingEngine, TimestampAllocator,
    UnitPayload,
};
pub use model::{
    ColumnDescriptor, ForeignKeyDescriptor, IndexDescriptor, RelationshipDescriptor,
    RelationshipKind, SchemaModel, TableDescriptor, TableRef, UserDefinedType,
};
pub use relationship::{JunctionDetector, RelationshipClassifier, RelationshipSet};
pub use render::unit_context;
pub use types::{MappedType, TypeMapper, TypeVocabulary, UserDefinedTypeResolver};

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
