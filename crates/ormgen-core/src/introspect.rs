//! The introspection pipeline: fetch, map, classify, sequence.

use crate::catalog::CatalogSource;
use crate::config::GeneratorConfig;
use crate::error::Error;
use crate::fetch::{FetchedCatalog, FetchedColumn, SchemaFetchCoordinator};
use crate::migration::{EmissionPlan, MigrationOrderingEngine};
use crate::model::column::is_sequence;
use crate::model::{
    ColumnDescriptor, ColumnFlags, CompositeTypeDescriptor, DefaultValue, Diagnostics,
    DomainTypeDescriptor, EnumDescriptor, SchemaModel, TableDescriptor, UserDefinedType,
};
use crate::naming;
use crate::relationship::RelationshipClassifier;
use crate::types::mapper::{ColumnInput, TypeMapper};
use crate::types::vocabulary::Confidence;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

/// Runs introspection against a catalog.
pub struct Introspector<C> {
    catalog: C,
    config: GeneratorConfig,
    mapper: TypeMapper,
}

impl<C: CatalogSource> Introspector<C> {
    /// Create an introspector; the configuration is validated here.
    pub fn new(catalog: C, config: GeneratorConfig) -> Result<Self, Error> {
        config.validate()?;
        let mapper = TypeMapper::new(Arc::new(config.vocabulary()))
            .with_max_depth(config.max_structure_depth);
        Ok(Self {
            catalog,
            config,
            mapper,
        })
    }

    /// The run configuration.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Fetch the catalog and build the intermediate model.
    pub async fn run(&self) -> Result<SchemaModel, Error> {
        let fetched =
            SchemaFetchCoordinator::new(&self.catalog, &self.config, self.mapper.vocabulary())
                .fetch()
                .await?;
        Ok(self.build_model(fetched))
    }

    /// Build the model and sequence it for emission.
    pub async fn plan(&self) -> Result<(SchemaModel, EmissionPlan), Error> {
        let model = self.run().await?;
        let mut engine = MigrationOrderingEngine::new(self.config.allocator()?)
            .with_disabled(self.config.disabled_categories.iter().copied())
            .with_table_allow_list(self.config.tables.clone());
        let plan = engine.sequence(&model);
        info!(units = plan.len(), "emission plan sequenced");
        Ok((model, plan))
    }

    /// Build the model from already fetched metadata. Pure.
    pub fn build_model(&self, fetched: FetchedCatalog) -> SchemaModel {
        let mut diagnostics = Diagnostics {
            degraded_metadata: fetched.degraded_metadata,
            ..Diagnostics::default()
        };
        let mut enums: Vec<EnumDescriptor> = Vec::new();
        let mut composites: Vec<CompositeTypeDescriptor> = Vec::new();
        let mut domains: Vec<DomainTypeDescriptor> = Vec::new();

        let mut tables = Vec::with_capacity(fetched.tables.len());
        for table in &fetched.tables {
            let mut reserved: BTreeSet<String> = table
                .columns
                .iter()
                .filter_map(|column| match &column.user_type {
                    UserDefinedType::Enum(e) => Some(naming::type_name(&e.name)),
                    UserDefinedType::Composite(c) => Some(naming::type_name(&c.name)),
                    _ => None,
                })
                .collect();
            let mut columns: Vec<ColumnDescriptor> = Vec::with_capacity(table.columns.len());
            for column in &table.columns {
                let descriptor = self.describe_column(column, &reserved);
                if let Some(structured) = &descriptor.mapping.structured_type {
                    reserved.extend(structured.definitions.iter().map(|d| d.name.clone()));
                }
                columns.push(descriptor);
            }

            for column in &columns {
                if column.mapping.confidence == Confidence::Fallback {
                    debug!(column = %column.full_name(), native = %column.native_type, "type mapped by fallback");
                    diagnostics.fallback_columns.push(column.full_name());
                }
                match &column.user_type {
                    UserDefinedType::Enum(e) if !enums.contains(e) => enums.push(e.clone()),
                    UserDefinedType::Composite(c) if !composites.contains(c) => {
                        composites.push(c.clone())
                    }
                    UserDefinedType::Domain(d) if !domains.contains(d) => domains.push(d.clone()),
                    _ => {}
                }
            }

            tables.push(TableDescriptor {
                schema: table.row.schema.clone(),
                name: table.row.name.clone(),
                model_name: naming::model_name(&table.row.name),
                comment: table.row.comment.clone(),
                columns,
                indexes: fetched
                    .indexes
                    .iter()
                    .filter(|i| i.schema == table.row.schema && i.table == table.row.name)
                    .cloned()
                    .collect(),
            });
        }

        let relationships = if fetched.relationships.is_empty() {
            let inferred = RelationshipClassifier::infer_declared(&tables, &fetched.foreign_keys);
            RelationshipClassifier::classify(&fetched.foreign_keys, &inferred)
        } else {
            RelationshipClassifier::classify(&fetched.foreign_keys, &fetched.relationships)
        };
        diagnostics.dropped_aliases = relationships.dropped_aliases();

        info!(
            tables = tables.len(),
            relationships = relationships.len(),
            fallback_columns = diagnostics.fallback_columns.len(),
            dropped_aliases = diagnostics.dropped_aliases,
            "schema model built"
        );

        SchemaModel {
            tables,
            enums,
            composites,
            domains,
            foreign_keys: fetched.foreign_keys,
            routines: fetched.routines,
            views: fetched.views,
            triggers: fetched.triggers,
            relationships,
            diagnostics,
        }
    }

    fn describe_column(
        &self,
        column: &FetchedColumn,
        reserved: &BTreeSet<String>,
    ) -> ColumnDescriptor {
        let row = &column.row;
        let default_value = row.column_default.as_deref().and_then(DefaultValue::parse);

        let (udt_name, type_reference) = match &column.user_type {
            UserDefinedType::Enum(e) => (Some(e.name.clone()), naming::type_name(&e.name)),
            UserDefinedType::Composite(c) => (Some(c.name.clone()), naming::type_name(&c.name)),
            UserDefinedType::Domain(d) => (
                Some(d.name.clone()),
                structure_name(&row.table, &row.name),
            ),
            UserDefinedType::Plain => (None, structure_name(&row.table, &row.name)),
        };

        let mapping = self.mapper.map(&ColumnInput {
            row,
            user_type: &column.user_type,
            type_reference: Some(&type_reference),
            sample: column.sample.as_ref(),
            default_value: default_value.as_ref(),
            reserved_names: Some(reserved),
        });

        let flags = ColumnFlags {
            nullable: row.is_nullable,
            primary_key: row.is_primary_key,
            auto_increment: row.is_identity
                || row.column_default.as_deref().is_some_and(is_sequence),
            default_now: default_value.as_ref().is_some_and(DefaultValue::is_now),
        };

        ColumnDescriptor {
            schema: row.schema.clone(),
            table: row.table.clone(),
            name: row.name.clone(),
            property_name: naming::property_name(&row.name),
            native_type: row.native_type(),
            udt_name: udt_name.map(|name| name.to_ascii_lowercase()),
            flags,
            raw_default: row.column_default.clone(),
            default_value,
            user_type: column.user_type.clone(),
            mapping,
            comment: row.comment.clone(),
            ordinal_position: row.ordinal_position,
        }
    }
}

/// Host type name of a JSON column's synthesized structure (`UserSettings`).
fn structure_name(table: &str, column: &str) -> String {
    naming::type_name(&format!("{}_{}", naming::singularize(table), column))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::rows::{ColumnRow, TableRow};
    use crate::catalog::snapshot::{CatalogSnapshot, SnapshotCatalog};
    use crate::model::RelationshipKind;

    fn catalog() -> SnapshotCatalog {
        SnapshotCatalog::new(CatalogSnapshot {
            tables: vec![TableRow::new("public", "users"), TableRow::new("public", "posts")],
            columns: vec![
                ColumnRow::new("public", "users", "id", "integer")
                    .primary_key()
                    .with_default("nextval('users_id_seq'::regclass)"),
                ColumnRow::new("public", "users", "path", "ltree").nullable(),
                ColumnRow::new("public", "posts", "id", "integer").primary_key().identity(),
                ColumnRow::new("public", "posts", "userId", "integer"),
                ColumnRow::new("public", "posts", "created_at", "timestamp without time zone")
                    .with_default("CURRENT_TIMESTAMP"),
            ],
            foreign_keys: vec![crate::model::ForeignKeyDescriptor::new(
                "posts_user_fkey",
                "public",
                "posts",
                "userId",
                "users",
                "id",
            )],
            ..CatalogSnapshot::default()
        })
    }

    #[tokio::test]
    async fn test_run_builds_model() {
        let introspector = Introspector::new(catalog(), GeneratorConfig::default()).unwrap();
        let model = introspector.run().await.unwrap();

        let users = model.table("public", "users").unwrap();
        assert_eq!(users.model_name, "User");
        let id = users.column("id").unwrap();
        assert!(id.flags.auto_increment);
        assert_eq!(id.default_value, None);

        let posts = model.table("public", "posts").unwrap();
        let created = posts.column("created_at").unwrap();
        assert!(created.flags.default_now);
        assert_eq!(created.property_name, "createdAt");
        assert_eq!(created.host_type(), "Date");

        assert_eq!(model.diagnostics.fallback_columns, vec!["public.users.path"]);
    }

    #[tokio::test]
    async fn test_relationships_inferred_without_declared_rows() {
        let introspector = Introspector::new(catalog(), GeneratorConfig::default()).unwrap();
        let model = introspector.run().await.unwrap();

        let posts = model.relationships_for(&crate::model::TableRef::new("public", "posts"));
        assert_eq!(posts[0].kind(), RelationshipKind::BelongsTo);
        assert_eq!(posts[0].alias(), "user");

        let users = model.relationships_for(&crate::model::TableRef::new("public", "users"));
        assert_eq!(users[0].kind(), RelationshipKind::HasMany);
        assert_eq!(users[0].alias(), "postUsers");
    }

    #[tokio::test]
    async fn test_table_allow_list_drops_links_to_excluded_tables() {
        let config = GeneratorConfig::default().with_tables(vec!["posts".into()]);
        let introspector = Introspector::new(catalog(), config).unwrap();
        let model = introspector.run().await.unwrap();

        assert!(model.table("public", "users").is_none());
        assert!(model.foreign_keys.is_empty());
        assert!(model.relationships.is_empty());
        assert!(model
            .relationships_for(&crate::model::TableRef::new("public", "posts"))
            .is_empty());
    }

    #[tokio::test]
    async fn test_plan_uses_configured_base() {
        let config = GeneratorConfig::default().with_base_timestamp("20240101000000");
        let introspector = Introspector::new(catalog(), config).unwrap();
        let (_, plan) = introspector.plan().await.unwrap();
        assert_eq!(plan.units[0].timestamp, "20240101000030");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GeneratorConfig::default().with_max_structure_depth(0);
        assert!(Introspector::new(catalog(), config).is_err());
    }

    #[test]
    fn test_structure_name() {
        assert_eq!(structure_name("users", "settings"), "UserSettings");
    }
}
