//! Concurrent catalog fetching.
//!
//! Independent metadata queries are issued together and joined before any
//! mapping happens. A failure of any required query aborts the fetch; user
//! type and sample lookups are contained per column.

use crate::catalog::rows::{
    ColumnRow, RoutineRow, SchemaRow, TableRow, TriggerRow, ViewRow,
};
use crate::catalog::CatalogSource;
use crate::config::GeneratorConfig;
use crate::error::{CatalogError, Error};
use crate::model::{DeclaredRelationship, ForeignKeyDescriptor, IndexDescriptor, UserDefinedType};
use crate::types::resolver::UserDefinedTypeResolver;
use crate::types::vocabulary::{NativeType, TypeFamily, TypeVocabulary};
use futures::future::{join_all, try_join_all};
use serde_json::Value;
use tracing::{debug, info, warn};

/// A column with its resolved classification and sample.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedColumn {
    pub row: ColumnRow,
    pub user_type: UserDefinedType,
    /// Longest stored payload (JSON columns only).
    pub sample: Option<Value>,
}

/// A table with its columns in ordinal order.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedTable {
    pub row: TableRow,
    pub columns: Vec<FetchedColumn>,
}

/// Everything fetched for one run, already filtered.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchedCatalog {
    pub schemas: Vec<SchemaRow>,
    pub tables: Vec<FetchedTable>,
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
    pub indexes: Vec<IndexDescriptor>,
    pub relationships: Vec<DeclaredRelationship>,
    pub routines: Vec<RoutineRow>,
    pub views: Vec<ViewRow>,
    pub triggers: Vec<TriggerRow>,
    /// Optional lookups that failed and were contained.
    pub degraded_metadata: usize,
}

impl FetchedCatalog {
    fn has_table(&self, schema: &str, table: &str) -> bool {
        self.tables
            .iter()
            .any(|t| t.row.schema == schema && t.row.name == table)
    }
}

/// Fetches and filters catalog metadata.
pub struct SchemaFetchCoordinator<'a, C: CatalogSource + ?Sized> {
    catalog: &'a C,
    config: &'a GeneratorConfig,
    vocabulary: &'a TypeVocabulary,
}

impl<'a, C: CatalogSource + ?Sized> SchemaFetchCoordinator<'a, C> {
    /// Create a coordinator.
    pub fn new(catalog: &'a C, config: &'a GeneratorConfig, vocabulary: &'a TypeVocabulary) -> Self {
        Self {
            catalog,
            config,
            vocabulary,
        }
    }

    /// Fetch everything the run needs.
    pub async fn fetch(&self) -> Result<FetchedCatalog, Error> {
        let (schemas, indexes, relationships, foreign_keys, routines, views, triggers) = tokio::try_join!(
            self.catalog.schemas(),
            self.catalog.indexes(),
            self.catalog.relationships(),
            self.catalog.foreign_keys(),
            self.catalog.routines(),
            self.catalog.views(),
            self.catalog.triggers(),
        )?;

        let schemas: Vec<SchemaRow> = schemas
            .into_iter()
            .filter(|s| self.config.includes_schema(&s.name))
            .collect();
        debug!(count = schemas.len(), "schemas selected");

        let table_lists = try_join_all(schemas.iter().map(|s| self.catalog.tables(&s.name))).await?;
        let tables: Vec<TableRow> = table_lists
            .into_iter()
            .flatten()
            .filter(|t| self.config.includes_table(&t.schema, &t.name))
            .collect();

        let fetched = try_join_all(tables.into_iter().map(|t| self.fetch_table(t))).await?;
        let degraded_metadata = fetched.iter().map(|(_, degraded)| degraded).sum();

        let mut catalog = FetchedCatalog {
            tables: fetched.into_iter().map(|(table, _)| table).collect(),
            degraded_metadata,
            ..FetchedCatalog::default()
        };

        catalog.indexes = indexes
            .into_iter()
            .filter(|i| catalog.has_table(&i.schema, &i.table))
            .collect();
        // Links survive only when every table they touch is kept.
        catalog.foreign_keys = foreign_keys
            .into_iter()
            .filter(|fk| {
                catalog.has_table(&fk.schema, &fk.table)
                    && catalog.has_table(&fk.referenced_schema, &fk.referenced_table)
            })
            .collect();
        catalog.relationships = relationships
            .into_iter()
            .filter(|r| {
                catalog.has_table(&r.source.schema, &r.source.table)
                    && catalog.has_table(&r.target.schema, &r.target.table)
                    && r.junction
                        .as_ref()
                        .map_or(true, |j| catalog.has_table(&j.schema, &j.table))
            })
            .collect();
        catalog.triggers = triggers
            .into_iter()
            .filter(|t| catalog.has_table(&t.schema, &t.table))
            .collect();
        catalog.routines = routines
            .into_iter()
            .filter(|r| schemas.iter().any(|s| s.name == r.schema))
            .collect();
        catalog.views = views
            .into_iter()
            .filter(|v| schemas.iter().any(|s| s.name == v.schema))
            .collect();
        catalog.schemas = schemas;

        info!(
            schemas = catalog.schemas.len(),
            tables = catalog.tables.len(),
            foreign_keys = catalog.foreign_keys.len(),
            degraded = catalog.degraded_metadata,
            "catalog fetched"
        );
        Ok(catalog)
    }

    async fn fetch_table(&self, table: TableRow) -> Result<(FetchedTable, usize), CatalogError> {
        let mut rows = self.catalog.columns(&table.schema, &table.name).await?;
        rows.sort_by_key(|c| c.ordinal_position);

        let columns = join_all(rows.into_iter().map(|row| self.fetch_column(row))).await;
        let degraded = columns.iter().map(|(_, degraded)| degraded).sum();

        Ok((
            FetchedTable {
                row: table,
                columns: columns.into_iter().map(|(column, _)| column).collect(),
            },
            degraded,
        ))
    }

    async fn fetch_column(&self, row: ColumnRow) -> (FetchedColumn, usize) {
        let resolution = UserDefinedTypeResolver::new(self.catalog).resolve(&row).await;
        let mut degraded = resolution.degraded;

        let sample = if self.config.sample_json && self.is_json(&row) {
            match self
                .catalog
                .longest_json_sample(&row.schema, &row.table, &row.name)
                .await
            {
                Ok(sample) => sample,
                Err(e) => {
                    warn!(column = %row.full_name(), error = %e, "json sample unavailable");
                    degraded += 1;
                    None
                }
            }
        } else {
            None
        };

        (
            FetchedColumn {
                row,
                user_type: resolution.user_type,
                sample,
            },
            degraded,
        )
    }

    fn is_json(&self, row: &ColumnRow) -> bool {
        let native = NativeType::parse(&row.native_type());
        !native.is_array()
            && self
                .vocabulary
                .entry(&native.base)
                .is_some_and(|entry| entry.family == TypeFamily::Json)
    }
}
