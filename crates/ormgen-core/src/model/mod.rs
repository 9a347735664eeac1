//! Intermediate model: descriptors produced by introspection.

pub mod column;
pub mod constraint;
pub mod relationship;
pub mod schema;
pub mod user_type;

pub use column::{ColumnDescriptor, ColumnFlags, DefaultValue};
pub use constraint::{ForeignKeyDescriptor, IndexConstraint, IndexDescriptor, ReferentialAction};
pub use relationship::{
    ColumnRef, DeclaredRelationship, JunctionRef, RelationshipDescriptor, RelationshipKind,
    TableRef,
};
pub use schema::{Diagnostics, SchemaModel, TableDescriptor};
pub use user_type::{
    CompositeTypeDescriptor, DomainConstraint, DomainTypeDescriptor, EnumDescriptor,
    UserDefinedType,
};
