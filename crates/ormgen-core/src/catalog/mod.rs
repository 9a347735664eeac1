//! Catalog access: raw rows, the [`CatalogSource`] seam and a snapshot-backed
//! implementation.

pub mod rows;
pub mod snapshot;
pub mod source;

pub use rows::{
    ColumnRow, CompositeRow, DomainConstraintRow, DomainRow, EnumRow, RoutineRow, SampleRow,
    SchemaRow, TableRow, TriggerRow, ViewRow,
};
pub use snapshot::{CatalogSnapshot, SnapshotCatalog};
pub use source::CatalogSource;
