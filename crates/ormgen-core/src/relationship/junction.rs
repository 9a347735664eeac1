//! Inference of declared relationships from foreign keys alone.

use crate::model::{
    ColumnRef, DeclaredRelationship, ForeignKeyDescriptor, JunctionRef, RelationshipKind,
    TableDescriptor, TableRef,
};
use heck::ToSnakeCase;
use std::collections::{HashMap, HashSet};
use tracing::debug;

const TIMESTAMP_COLUMNS: &[&str] = &["created_at", "updated_at", "deleted_at"];

/// Derives the inverse relationship views for catalogs that do not
/// classify relationships themselves.
///
/// A junction table has exactly two foreign keys pointing at other tables,
/// and every remaining column is a primary key, auto-increment or
/// timestamp column.
pub struct JunctionDetector<'a> {
    tables: HashMap<TableRef, &'a TableDescriptor>,
}

impl<'a> JunctionDetector<'a> {
    /// Create a detector over the mapped tables.
    pub fn new(tables: &'a [TableDescriptor]) -> Self {
        Self {
            tables: tables.iter().map(|t| (t.table_ref(), t)).collect(),
        }
    }

    /// Check if a table is a junction given its outbound foreign keys.
    pub fn is_junction(&self, table: &TableRef, outbound: &[&ForeignKeyDescriptor]) -> bool {
        let [first, second] = outbound else {
            return false;
        };
        if first.column == second.column
            || first.is_self_referencing()
            || second.is_self_referencing()
        {
            return false;
        }
        let Some(descriptor) = self.tables.get(table) else {
            return false;
        };

        descriptor
            .columns
            .iter()
            .filter(|c| c.name != first.column && c.name != second.column)
            .all(|c| {
                c.flags.primary_key
                    || c.flags.auto_increment
                    || c.flags.default_now
                    || TIMESTAMP_COLUMNS.contains(&c.name.to_snake_case().as_str())
            })
    }

    /// Infer declared relationship rows, in foreign-key order.
    pub fn infer(&self, foreign_keys: &[ForeignKeyDescriptor]) -> Vec<DeclaredRelationship> {
        let mut outbound: HashMap<TableRef, Vec<&ForeignKeyDescriptor>> = HashMap::new();
        for fk in foreign_keys {
            outbound
                .entry(TableRef::new(fk.schema.clone(), fk.table.clone()))
                .or_default()
                .push(fk);
        }

        let mut declared = Vec::new();
        let mut seen_junctions = HashSet::new();

        for fk in foreign_keys {
            let table = TableRef::new(fk.schema.clone(), fk.table.clone());
            let table_keys = outbound.get(&table).map(Vec::as_slice).unwrap_or(&[]);

            if self.is_junction(&table, table_keys) {
                if seen_junctions.insert(table.clone()) {
                    debug!(table = %table, "junction table detected");
                    let (a, b) = (table_keys[0], table_keys[1]);
                    declared.push(many_to_many(&table, a, b));
                    declared.push(many_to_many(&table, b, a));
                }
                continue;
            }

            let kind = if self.is_unique(&table, &fk.column) {
                RelationshipKind::HasOne
            } else {
                RelationshipKind::HasMany
            };
            declared.push(DeclaredRelationship {
                kind,
                source: ColumnRef::new(fk.schema.clone(), fk.table.clone(), fk.column.clone()),
                target: referenced(fk),
                junction: None,
            });
        }

        declared
    }

    /// Whether `column` alone is unique in `table`.
    fn is_unique(&self, table: &TableRef, column: &str) -> bool {
        let Some(descriptor) = self.tables.get(table) else {
            return false;
        };
        if descriptor.indexes.iter().any(|i| i.is_unique_on(column)) {
            return true;
        }
        let primary_key: Vec<_> = descriptor.primary_key().map(|c| c.name.as_str()).collect();
        primary_key == [column]
    }
}

fn referenced(fk: &ForeignKeyDescriptor) -> ColumnRef {
    ColumnRef::new(
        fk.referenced_schema.clone(),
        fk.referenced_table.clone(),
        fk.referenced_column.clone(),
    )
}

fn many_to_many(
    junction: &TableRef,
    source: &ForeignKeyDescriptor,
    target: &ForeignKeyDescriptor,
) -> DeclaredRelationship {
    DeclaredRelationship {
        kind: RelationshipKind::ManyToMany,
        source: referenced(source),
        target: referenced(target),
        junction: Some(JunctionRef::new(
            junction.schema.clone(),
            junction.table.clone(),
            source.column.clone(),
            target.column.clone(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ColumnDescriptor, ColumnFlags, IndexDescriptor, UserDefinedType};
    use crate::types::{ColumnInput, TypeMapper};
    use crate::catalog::ColumnRow;

    fn column(table: &str, name: &str, flags: ColumnFlags) -> ColumnDescriptor {
        let row = ColumnRow::new("public", table, name, "integer");
        ColumnDescriptor {
            schema: "public".into(),
            table: table.into(),
            name: name.into(),
            property_name: crate::naming::property_name(name),
            native_type: "integer".into(),
            udt_name: None,
            flags,
            raw_default: None,
            default_value: None,
            user_type: UserDefinedType::Plain,
            mapping: TypeMapper::default().map(&ColumnInput::plain(&row)),
            comment: None,
            ordinal_position: 0,
        }
    }

    fn table(name: &str, columns: Vec<ColumnDescriptor>, indexes: Vec<IndexDescriptor>) -> TableDescriptor {
        TableDescriptor {
            schema: "public".into(),
            name: name.into(),
            model_name: crate::naming::model_name(name),
            comment: None,
            columns,
            indexes,
        }
    }

    fn pk() -> ColumnFlags {
        ColumnFlags {
            primary_key: true,
            ..ColumnFlags::default()
        }
    }

    fn fixture() -> (Vec<TableDescriptor>, Vec<ForeignKeyDescriptor>) {
        let tables = vec![
            table("users", vec![column("users", "id", pk())], vec![]),
            table("roles", vec![column("roles", "id", pk())], vec![]),
            table(
                "user_roles",
                vec![
                    column("user_roles", "user_id", pk()),
                    column("user_roles", "role_id", pk()),
                    column("user_roles", "created_at", ColumnFlags::default()),
                ],
                vec![],
            ),
            table(
                "posts",
                vec![
                    column("posts", "id", pk()),
                    column("posts", "user_id", ColumnFlags::default()),
                    column("posts", "title", ColumnFlags::default()),
                ],
                vec![],
            ),
            table(
                "profiles",
                vec![
                    column("profiles", "id", pk()),
                    column("profiles", "user_id", ColumnFlags::default()),
                ],
                vec![IndexDescriptor::new(
                    "public",
                    "profiles",
                    "profiles_user_id_key",
                    vec!["user_id".into()],
                )
                .unique()],
            ),
        ];
        let fks = vec![
            ForeignKeyDescriptor::new("ur_user", "public", "user_roles", "user_id", "users", "id"),
            ForeignKeyDescriptor::new("ur_role", "public", "user_roles", "role_id", "roles", "id"),
            ForeignKeyDescriptor::new("posts_user", "public", "posts", "user_id", "users", "id"),
            ForeignKeyDescriptor::new("profiles_user", "public", "profiles", "user_id", "users", "id"),
        ];
        (tables, fks)
    }

    #[test]
    fn test_junction_produces_both_directions() {
        let (tables, fks) = fixture();
        let declared = JunctionDetector::new(&tables).infer(&fks);

        let many: Vec<_> = declared
            .iter()
            .filter(|d| d.kind == RelationshipKind::ManyToMany)
            .collect();
        assert_eq!(many.len(), 2);
        assert_eq!(many[0].source.table, "users");
        assert_eq!(many[0].target.table, "roles");
        assert_eq!(many[1].source.table, "roles");
        assert_eq!(
            many[0].junction.as_ref().map(|j| j.source_column.as_str()),
            Some("user_id")
        );
    }

    #[test]
    fn test_uniqueness_decides_has_one() {
        let (tables, fks) = fixture();
        let declared = JunctionDetector::new(&tables).infer(&fks);

        let posts = declared.iter().find(|d| d.source.table == "posts").unwrap();
        assert_eq!(posts.kind, RelationshipKind::HasMany);
        let profiles = declared.iter().find(|d| d.source.table == "profiles").unwrap();
        assert_eq!(profiles.kind, RelationshipKind::HasOne);
        assert_eq!(declared.len(), 4);
    }

    #[test]
    fn test_payload_column_disqualifies_junction() {
        let (mut tables, fks) = fixture();
        tables[2]
            .columns
            .push(column("user_roles", "granted_by", ColumnFlags::default()));
        let declared = JunctionDetector::new(&tables).infer(&fks);
        assert!(declared.iter().all(|d| d.kind != RelationshipKind::ManyToMany));
    }
}
