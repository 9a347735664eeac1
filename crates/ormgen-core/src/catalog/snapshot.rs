//! In-memory catalog loaded from a JSON snapshot.

use super::rows::{
    ColumnRow, CompositeRow, DomainRow, EnumRow, RoutineRow, SampleRow, SchemaRow, TableRow,
    TriggerRow, ViewRow,
};
use super::source::CatalogSource;
use crate::error::{CatalogError, CatalogResult, Error};
use crate::model::{DeclaredRelationship, ForeignKeyDescriptor, IndexDescriptor};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;

/// Every row a catalog can report, as plain data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSnapshot {
    /// Schemas; derived from `tables` when empty.
    pub schemas: Vec<SchemaRow>,
    pub tables: Vec<TableRow>,
    pub columns: Vec<ColumnRow>,
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
    pub indexes: Vec<IndexDescriptor>,
    pub relationships: Vec<DeclaredRelationship>,
    pub enums: Vec<EnumRow>,
    pub composites: Vec<CompositeRow>,
    pub domains: Vec<DomainRow>,
    pub samples: Vec<SampleRow>,
    pub routines: Vec<RoutineRow>,
    pub views: Vec<ViewRow>,
    pub triggers: Vec<TriggerRow>,
}

/// A [`CatalogSource`] answering from a [`CatalogSnapshot`].
///
/// Individual queries can be made to fail with [`fail_query`](Self::fail_query).
#[derive(Debug, Clone, Default)]
pub struct SnapshotCatalog {
    snapshot: CatalogSnapshot,
    failing: HashSet<String>,
}

impl SnapshotCatalog {
    /// Create a catalog over a snapshot.
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            snapshot,
            failing: HashSet::new(),
        }
    }

    /// Parse a snapshot from JSON text.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Load a snapshot file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Make the named query (`schemas`, `enum_values`, ...) fail.
    pub fn fail_query(mut self, query: impl Into<String>) -> Self {
        self.failing.insert(query.into());
        self
    }

    /// The underlying snapshot.
    pub fn snapshot(&self) -> &CatalogSnapshot {
        &self.snapshot
    }

    fn check(&self, query: &str) -> CatalogResult<()> {
        if self.failing.contains(query) {
            Err(CatalogError::query(query, "injected failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CatalogSource for SnapshotCatalog {
    async fn schemas(&self) -> CatalogResult<Vec<SchemaRow>> {
        self.check("schemas")?;
        if !self.snapshot.schemas.is_empty() {
            return Ok(self.snapshot.schemas.clone());
        }

        let mut schemas: Vec<SchemaRow> = Vec::new();
        for table in &self.snapshot.tables {
            if !schemas.iter().any(|s| s.name == table.schema) {
                schemas.push(SchemaRow::new(table.schema.clone()));
            }
        }
        Ok(schemas)
    }

    async fn tables(&self, schema: &str) -> CatalogResult<Vec<TableRow>> {
        self.check("tables")?;
        Ok(self
            .snapshot
            .tables
            .iter()
            .filter(|t| t.schema == schema)
            .cloned()
            .collect())
    }

    async fn columns(&self, schema: &str, table: &str) -> CatalogResult<Vec<ColumnRow>> {
        self.check("columns")?;
        Ok(self
            .snapshot
            .columns
            .iter()
            .filter(|c| c.schema == schema && c.table == table)
            .cloned()
            .collect())
    }

    async fn foreign_keys(&self) -> CatalogResult<Vec<ForeignKeyDescriptor>> {
        self.check("foreign_keys")?;
        Ok(self.snapshot.foreign_keys.clone())
    }

    async fn indexes(&self) -> CatalogResult<Vec<IndexDescriptor>> {
        self.check("indexes")?;
        Ok(self.snapshot.indexes.clone())
    }

    async fn relationships(&self) -> CatalogResult<Vec<DeclaredRelationship>> {
        self.check("relationships")?;
        Ok(self.snapshot.relationships.clone())
    }

    async fn enum_values(&self, schema: &str, type_name: &str) -> CatalogResult<Option<String>> {
        self.check("enum_values")?;
        Ok(self
            .snapshot
            .enums
            .iter()
            .find(|e| e.schema == schema && e.name == type_name)
            .map(|e| e.values.clone()))
    }

    async fn composite_type(
        &self,
        schema: &str,
        type_name: &str,
    ) -> CatalogResult<Option<CompositeRow>> {
        self.check("composite_type")?;
        Ok(self
            .snapshot
            .composites
            .iter()
            .find(|c| c.schema == schema && c.name == type_name)
            .cloned())
    }

    async fn domain_type(&self, schema: &str, name: &str) -> CatalogResult<Option<DomainRow>> {
        self.check("domain_type")?;
        Ok(self
            .snapshot
            .domains
            .iter()
            .find(|d| d.schema == schema && d.name == name)
            .cloned())
    }

    async fn longest_json_sample(
        &self,
        schema: &str,
        table: &str,
        column: &str,
    ) -> CatalogResult<Option<Value>> {
        self.check("longest_json_sample")?;
        Ok(self
            .snapshot
            .samples
            .iter()
            .find(|s| s.schema == schema && s.table == table && s.column == column)
            .map(|s| s.value.clone()))
    }

    async fn routines(&self) -> CatalogResult<Vec<RoutineRow>> {
        self.check("routines")?;
        Ok(self.snapshot.routines.clone())
    }

    async fn views(&self) -> CatalogResult<Vec<ViewRow>> {
        self.check("views")?;
        Ok(self.snapshot.views.clone())
    }

    async fn triggers(&self) -> CatalogResult<Vec<TriggerRow>> {
        self.check("triggers")?;
        Ok(self.snapshot.triggers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "tables": [
            {"schema": "public", "name": "users"},
            {"schema": "audit", "name": "events"}
        ],
        "columns": [
            {"schema": "public", "table": "users", "name": "id", "data_type": "integer", "is_primary_key": true}
        ],
        "enums": [{"schema": "public", "name": "mood", "values": "{sad,happy}"}]
    }"#;

    #[tokio::test]
    async fn test_schemas_derived_from_tables() {
        let catalog = SnapshotCatalog::from_json(SNAPSHOT).unwrap();
        let schemas = catalog.schemas().await.unwrap();
        let names: Vec<_> = schemas.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["public", "audit"]);
    }

    #[tokio::test]
    async fn test_filters_by_owner() {
        let catalog = SnapshotCatalog::from_json(SNAPSHOT).unwrap();
        assert_eq!(catalog.tables("public").await.unwrap().len(), 1);
        assert_eq!(catalog.columns("public", "users").await.unwrap().len(), 1);
        assert!(catalog.columns("audit", "events").await.unwrap().is_empty());
        assert_eq!(
            catalog.enum_values("public", "mood").await.unwrap().as_deref(),
            Some("{sad,happy}")
        );
        assert_eq!(catalog.enum_values("public", "other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let catalog = SnapshotCatalog::from_json(SNAPSHOT)
            .unwrap()
            .fail_query("indexes");
        let err = catalog.indexes().await.unwrap_err();
        assert_eq!(err, CatalogError::query("indexes", "injected failure"));
        assert!(catalog.foreign_keys().await.is_ok());
    }

    #[tokio::test]
    async fn test_default_queries_are_empty() {
        let catalog = SnapshotCatalog::default();
        assert!(catalog.routines().await.unwrap().is_empty());
        assert!(catalog.longest_json_sample("public", "users", "settings").await.unwrap().is_none());
    }

    #[test]
    fn test_invalid_json_is_snapshot_error() {
        let err = SnapshotCatalog::from_json("{not json").unwrap_err();
        assert!(matches!(err, Error::Snapshot(_)));
    }
}
