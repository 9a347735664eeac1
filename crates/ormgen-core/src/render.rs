//! Flat render contexts for emitted units.
//!
//! Each [`EmissionUnit`] becomes one `serde_json::Map` that a template can
//! consume without walking the model. Text fragments (relationship
//! declarations, type definitions) are pre-formatted here.

use crate::migration::{EmissionUnit, UnitPayload};
use crate::model::{ColumnDescriptor, IndexConstraint, SchemaModel, TableRef, UserDefinedType};
use crate::naming;
use serde_json::{json, Map, Value};

/// Render context of one unit.
pub fn unit_context(unit: &EmissionUnit, model: &SchemaModel) -> Map<String, Value> {
    let mut context = Map::new();
    context.insert("timestamp".into(), json!(unit.timestamp));
    context.insert("category".into(), json!(unit.category.as_str()));
    context.insert("name".into(), json!(unit.name));
    context.insert("file_name".into(), json!(unit.file_name()));

    match &unit.payload {
        UnitPayload::Function { routine } => {
            context.insert("schema".into(), json!(routine.schema));
            context.insert("function".into(), json!(routine.name));
            context.insert("kind".into(), json!(routine.kind));
            context.insert("arguments".into(), json!(routine.arguments));
            context.insert("return_type".into(), json!(routine.return_type));
            context.insert("language".into(), json!(routine.language));
            context.insert("definition".into(), json!(routine.definition));
        }
        UnitPayload::Composite { composite } => {
            context.insert("schema".into(), json!(composite.schema));
            context.insert("type_name".into(), json!(composite.name));
            let attributes: Vec<Value> = composite
                .attributes()
                .map(|(name, native)| json!({ "name": name, "native_type": native }))
                .collect();
            context.insert("attributes".into(), Value::Array(attributes));
        }
        UnitPayload::Domain { domain } => {
            context.insert("schema".into(), json!(domain.schema));
            context.insert("domain".into(), json!(domain.name));
            context.insert("base_type".into(), json!(domain.base_type));
            context.insert("not_null".into(), json!(domain.is_not_null()));
            context.insert("checks".into(), json!(domain.checks().collect::<Vec<_>>()));
        }
        UnitPayload::Table { table } => table_context(&mut context, table, model),
        UnitPayload::Indexes { table, indexes } => {
            context.insert("schema".into(), json!(table.schema));
            context.insert("table".into(), json!(table.table));
            let indexes: Vec<Value> = indexes
                .iter()
                .map(|index| {
                    json!({
                        "name": index.name,
                        "index_type": index.index_type,
                        "unique": index.constraint != IndexConstraint::None,
                        "columns": index.columns,
                    })
                })
                .collect();
            context.insert("indexes".into(), Value::Array(indexes));
        }
        UnitPayload::ForeignKeys { foreign_keys } => {
            let constraints: Vec<Value> = foreign_keys
                .iter()
                .map(|fk| {
                    json!({
                        "constraint_name": fk.constraint_name,
                        "schema": fk.schema,
                        "table": fk.table,
                        "column": fk.column,
                        "referenced_schema": fk.referenced_schema,
                        "referenced_table": fk.referenced_table,
                        "referenced_column": fk.referenced_column,
                        "on_update": fk.update_rule.to_string(),
                        "on_delete": fk.delete_rule.to_string(),
                        "deferrable": fk.deferrable,
                        "initially_deferred": fk.initially_deferred,
                    })
                })
                .collect();
            context.insert("foreign_keys".into(), Value::Array(constraints));
        }
        UnitPayload::View { view } => {
            context.insert("schema".into(), json!(view.schema));
            context.insert("view".into(), json!(view.name));
            context.insert("materialized".into(), json!(view.materialized));
            context.insert("definition".into(), json!(view.definition));
        }
        UnitPayload::Trigger { trigger } => {
            context.insert("schema".into(), json!(trigger.schema));
            context.insert("table".into(), json!(trigger.table));
            context.insert("trigger".into(), json!(trigger.name));
            context.insert("timing".into(), json!(trigger.timing));
            context.insert("events".into(), json!(trigger.events));
            context.insert("action".into(), json!(trigger.action));
        }
        UnitPayload::Seeds { tables } => {
            let tables: Vec<Value> = tables
                .iter()
                .map(|t| {
                    json!({
                        "schema": t.schema,
                        "table": t.table,
                        "model_name": naming::model_name(&t.table),
                    })
                })
                .collect();
            context.insert("tables".into(), Value::Array(tables));
        }
    }

    context
}

fn table_context(context: &mut Map<String, Value>, table: &TableRef, model: &SchemaModel) {
    context.insert("schema".into(), json!(table.schema));
    context.insert("table".into(), json!(table.table));

    let Some(descriptor) = model.table(&table.schema, &table.table) else {
        return;
    };
    context.insert("model_name".into(), json!(descriptor.model_name));
    context.insert("comment".into(), json!(descriptor.comment));
    context.insert(
        "columns".into(),
        Value::Array(descriptor.columns.iter().map(column_context).collect()),
    );

    let relationships: Vec<Value> = model
        .relationships_for(table)
        .iter()
        .map(|rel| {
            json!({
                "kind": rel.kind().to_string(),
                "alias": rel.alias(),
                "model": rel.related_model(),
                "declaration": rel.declaration(),
            })
        })
        .collect();
    context.insert("relationships".into(), Value::Array(relationships));
    context.insert(
        "type_definitions".into(),
        json!(type_definitions(&descriptor.columns)),
    );
}

fn column_context(column: &ColumnDescriptor) -> Value {
    json!({
        "name": column.name,
        "property_name": column.property_name,
        "native_type": column.native_type,
        "orm_type": column.mapping.annotated_expression(),
        "host_type": column.mapping.host_type,
        "host_type_expression": column.mapping.host_type_expression,
        "user_type": column.user_type.label(),
        "nullable": column.flags.nullable,
        "primary_key": column.flags.primary_key,
        "auto_increment": column.flags.auto_increment,
        "default_now": column.flags.default_now,
        "default": column.raw_default,
        "custom_accessors": column.mapping.custom_accessors,
        "comment": column.comment,
    })
}

/// Type definitions needed by a table's columns, dependencies first,
/// each name defined once.
fn type_definitions(columns: &[ColumnDescriptor]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut definitions = Vec::new();

    for column in columns {
        if let UserDefinedType::Enum(descriptor) = &column.user_type {
            let name = naming::type_name(&descriptor.name);
            if !names.contains(&name) {
                definitions.push(format!("type {} = {};", name, descriptor.literal_union()));
                names.push(name);
            }
        }
        if let Some(structured) = &column.mapping.structured_type {
            for definition in &structured.definitions {
                if !names.contains(&definition.name) {
                    definitions.push(definition.render());
                    names.push(definition.name.clone());
                }
            }
        }
    }

    definitions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::rows::{ColumnRow, EnumRow, SampleRow, TableRow};
    use crate::catalog::snapshot::{CatalogSnapshot, SnapshotCatalog};
    use crate::config::GeneratorConfig;
    use crate::introspect::Introspector;
    use crate::migration::MigrationCategory;

    fn catalog() -> SnapshotCatalog {
        SnapshotCatalog::new(CatalogSnapshot {
            tables: vec![TableRow::new("public", "users")],
            columns: vec![
                ColumnRow::new("public", "users", "id", "integer").primary_key(),
                ColumnRow::new("public", "users", "mood", "USER-DEFINED").with_udt("public", "mood"),
                ColumnRow::new("public", "users", "settings", "jsonb").nullable(),
            ],
            enums: vec![EnumRow {
                schema: "public".into(),
                name: "mood".into(),
                values: "{sad,happy}".into(),
            }],
            samples: vec![SampleRow {
                schema: "public".into(),
                table: "users".into(),
                column: "settings".into(),
                value: serde_json::json!({"theme": {"name": "dark"}}),
            }],
            ..CatalogSnapshot::default()
        })
    }

    #[tokio::test]
    async fn test_table_context() {
        let config = GeneratorConfig::default().with_base_timestamp("20240101000000");
        let introspector = Introspector::new(catalog(), config).unwrap();
        let (model, plan) = introspector.plan().await.unwrap();

        let unit = plan.units_in(MigrationCategory::Tables)[0];
        let context = unit_context(unit, &model);

        assert_eq!(context["file_name"], json!("20240101000030-tables-public-users"));
        assert_eq!(context["model_name"], json!("User"));
        assert_eq!(context["columns"][0]["host_type_expression"], json!("CreationOptional<number>"));
        assert_eq!(context["columns"][1]["orm_type"], json!("ENUM('sad', 'happy')"));
        assert_eq!(context["columns"][1]["host_type"], json!("Mood"));
        assert_eq!(context["columns"][2]["host_type"], json!("UserSettings"));
        assert_eq!(
            context["type_definitions"],
            json!([
                "type Mood = 'sad' | 'happy';",
                "interface Theme {\n  name: string;\n}",
                "interface UserSettings {\n  theme: Theme;\n}",
            ])
        );
    }

    fn sample(column: &str, value: serde_json::Value) -> SampleRow {
        SampleRow {
            schema: "public".into(),
            table: "users".into(),
            column: column.into(),
            value,
        }
    }

    #[tokio::test]
    async fn test_same_named_subtypes_stay_distinct() {
        let catalog = SnapshotCatalog::new(CatalogSnapshot {
            tables: vec![TableRow::new("public", "users")],
            columns: vec![
                ColumnRow::new("public", "users", "id", "integer").primary_key(),
                ColumnRow::new("public", "users", "status", "USER-DEFINED")
                    .with_udt("public", "status"),
                ColumnRow::new("public", "users", "billing", "jsonb"),
                ColumnRow::new("public", "users", "shipping", "jsonb"),
            ],
            enums: vec![EnumRow {
                schema: "public".into(),
                name: "status".into(),
                values: "{active,banned}".into(),
            }],
            samples: vec![
                sample("billing", json!({"address": {"city": "Lagos"}})),
                sample("shipping", json!({"address": {"zip": "10115"}, "status": {"code": 1}})),
            ],
            ..CatalogSnapshot::default()
        });
        let config = GeneratorConfig::default().with_base_timestamp("20240101000000");
        let (model, plan) = Introspector::new(catalog, config).unwrap().plan().await.unwrap();

        let context = unit_context(plan.units_in(MigrationCategory::Tables)[0], &model);
        assert_eq!(context["columns"][1]["host_type"], json!("Status"));
        assert_eq!(context["columns"][2]["host_type"], json!("UserBilling"));
        assert_eq!(context["columns"][3]["host_type"], json!("UserShipping"));
        assert_eq!(
            context["type_definitions"],
            json!([
                "type Status = 'active' | 'banned';",
                "interface Address {\n  city: string;\n}",
                "interface UserBilling {\n  address: Address;\n}",
                "interface UserShippingAddress {\n  zip: string;\n}",
                "interface UserShippingStatus {\n  code: number;\n}",
                "interface UserShipping {\n  address: UserShippingAddress;\n  status: UserShippingStatus;\n}",
            ])
        );
    }

    #[tokio::test]
    async fn test_seed_context() {
        let config = GeneratorConfig::default().with_base_timestamp("20240101000000");
        let introspector = Introspector::new(catalog(), config).unwrap();
        let (model, plan) = introspector.plan().await.unwrap();

        let unit = plan.units_in(MigrationCategory::Seeds)[0];
        let context = unit_context(unit, &model);
        assert_eq!(context["category"], json!("seeds"));
        assert_eq!(context["tables"][0]["model_name"], json!("User"));
    }
}
