//! Tables and the complete intermediate model.

use crate::catalog::rows::{RoutineRow, TriggerRow, ViewRow};
use crate::model::column::ColumnDescriptor;
use crate::model::constraint::{ForeignKeyDescriptor, IndexDescriptor};
use crate::model::relationship::{RelationshipDescriptor, TableRef};
use crate::model::user_type::{CompositeTypeDescriptor, DomainTypeDescriptor, EnumDescriptor};
use crate::relationship::RelationshipSet;
use serde::Serialize;

/// A table with its mapped columns and indexes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDescriptor {
    pub schema: String,
    pub name: String,
    /// Singular UpperCamelCase model name.
    pub model_name: String,
    pub comment: Option<String>,
    /// Columns in ordinal order.
    pub columns: Vec<ColumnDescriptor>,
    pub indexes: Vec<IndexDescriptor>,
}

impl TableDescriptor {
    /// Reference to this table.
    pub fn table_ref(&self) -> TableRef {
        TableRef::new(self.schema.clone(), self.name.clone())
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Primary key columns.
    pub fn primary_key(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| c.flags.primary_key)
    }
}

/// Counters and lists for everything that degraded silently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    /// Columns whose type fell back to the generic mapping (`schema.table.column`).
    pub fallback_columns: Vec<String>,
    /// Relationships dropped because their alias was already taken.
    pub dropped_aliases: usize,
    /// Optional metadata lookups that failed and were contained.
    pub degraded_metadata: usize,
}

impl Diagnostics {
    /// Check if nothing degraded.
    pub fn is_clean(&self) -> bool {
        self.fallback_columns.is_empty() && self.dropped_aliases == 0 && self.degraded_metadata == 0
    }
}

/// The intermediate model handed to renderers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SchemaModel {
    pub tables: Vec<TableDescriptor>,
    pub enums: Vec<EnumDescriptor>,
    pub composites: Vec<CompositeTypeDescriptor>,
    pub domains: Vec<DomainTypeDescriptor>,
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
    pub routines: Vec<RoutineRow>,
    pub views: Vec<ViewRow>,
    pub triggers: Vec<TriggerRow>,
    pub relationships: RelationshipSet,
    pub diagnostics: Diagnostics,
}

impl SchemaModel {
    /// Get a table by schema and name.
    pub fn table(&self, schema: &str, name: &str) -> Option<&TableDescriptor> {
        self.tables
            .iter()
            .find(|t| t.schema == schema && t.name == name)
    }

    /// Relationships declared on a table's model.
    pub fn relationships_for(&self, table: &TableRef) -> &[RelationshipDescriptor] {
        self.relationships.for_table(table)
    }

    /// Distinct schemas that own at least one table, in table order.
    pub fn schemas(&self) -> Vec<&str> {
        let mut schemas: Vec<&str> = Vec::new();
        for table in &self.tables {
            if !schemas.contains(&table.schema.as_str()) {
                schemas.push(&table.schema);
            }
        }
        schemas
    }
}
