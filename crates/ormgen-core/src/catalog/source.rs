//! The catalog seam.

use super::rows::{
    ColumnRow, CompositeRow, DomainRow, RoutineRow, SchemaRow, TableRow, TriggerRow, ViewRow,
};
use crate::error::CatalogResult;
use crate::model::{DeclaredRelationship, ForeignKeyDescriptor, IndexDescriptor};
use async_trait::async_trait;
use serde_json::Value;

/// Source of catalog metadata.
///
/// Every method maps onto one metadata query. Implementations must be
/// shareable across the concurrent fetches issued by the coordinator.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// All schemas, including system schemas.
    async fn schemas(&self) -> CatalogResult<Vec<SchemaRow>>;

    /// Tables of one schema.
    async fn tables(&self, schema: &str) -> CatalogResult<Vec<TableRow>>;

    /// Columns of one table.
    async fn columns(&self, schema: &str, table: &str) -> CatalogResult<Vec<ColumnRow>>;

    /// All foreign keys.
    async fn foreign_keys(&self) -> CatalogResult<Vec<ForeignKeyDescriptor>>;

    /// All indexes.
    async fn indexes(&self) -> CatalogResult<Vec<IndexDescriptor>>;

    /// Pre-classified relationship rows. An empty list means the catalog
    /// does not classify relationships itself.
    async fn relationships(&self) -> CatalogResult<Vec<DeclaredRelationship>>;

    /// Raw delimited literal list of an enum type, or `None` if the type is
    /// not an enum.
    async fn enum_values(&self, schema: &str, type_name: &str) -> CatalogResult<Option<String>>;

    /// Attributes of a composite type, or `None` if the type is not composite.
    async fn composite_type(
        &self,
        schema: &str,
        type_name: &str,
    ) -> CatalogResult<Option<CompositeRow>>;

    /// Base type and constraints of a domain, or `None` if it is not a domain.
    async fn domain_type(&self, schema: &str, name: &str) -> CatalogResult<Option<DomainRow>>;

    /// Longest stored payload of a JSON column.
    async fn longest_json_sample(
        &self,
        _schema: &str,
        _table: &str,
        _column: &str,
    ) -> CatalogResult<Option<Value>> {
        Ok(None)
    }

    /// Functions and procedures.
    async fn routines(&self) -> CatalogResult<Vec<RoutineRow>> {
        Ok(Vec::new())
    }

    /// Views.
    async fn views(&self) -> CatalogResult<Vec<ViewRow>> {
        Ok(Vec::new())
    }

    /// Triggers.
    async fn triggers(&self) -> CatalogResult<Vec<TriggerRow>> {
        Ok(Vec::new())
    }
}
