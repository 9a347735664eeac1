//! User-defined type resolution.
//!
//! A column resolves to at most one of enum, composite or domain. Each
//! category is looked up independently; a failed lookup is logged and treated
//! as "not this kind" so the run can continue.

use crate::catalog::rows::ColumnRow;
use crate::catalog::CatalogSource;
use crate::model::user_type::{
    CompositeTypeDescriptor, DomainConstraint, DomainTypeDescriptor, EnumDescriptor,
    UserDefinedType,
};
use tracing::{debug, warn};

/// Outcome of resolving one column.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Resolution {
    /// The classification.
    pub user_type: UserDefinedType,
    /// Number of metadata lookups that failed and were contained.
    pub degraded: usize,
}

/// Resolves columns against the catalog's user-defined type metadata.
pub struct UserDefinedTypeResolver<'a, C: CatalogSource + ?Sized> {
    catalog: &'a C,
}

impl<'a, C: CatalogSource + ?Sized> UserDefinedTypeResolver<'a, C> {
    /// Create a resolver over a catalog.
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Resolve a column. Lookup order is enum, composite, domain.
    pub async fn resolve(&self, column: &ColumnRow) -> Resolution {
        let mut degraded = 0;

        if let Some(type_name) = underlying_type_name(column) {
            let schema = column.type_schema();

            match self.catalog.enum_values(schema, type_name).await {
                Ok(Some(raw)) => {
                    debug!(column = %column.full_name(), type_name, "resolved enum type");
                    return Resolution {
                        user_type: UserDefinedType::Enum(EnumDescriptor::from_raw(
                            schema, type_name, &raw,
                        )),
                        degraded,
                    };
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(column = %column.full_name(), error = %e, "enum metadata unavailable");
                    degraded += 1;
                }
            }

            match self.catalog.composite_type(schema, type_name).await {
                Ok(Some(row)) => match CompositeTypeDescriptor::new(
                    row.schema,
                    row.name,
                    row.attribute_names,
                    row.attribute_types,
                ) {
                    Ok(descriptor) => {
                        debug!(column = %column.full_name(), type_name, "resolved composite type");
                        return Resolution {
                            user_type: UserDefinedType::Composite(descriptor),
                            degraded,
                        };
                    }
                    Err(e) => {
                        warn!(column = %column.full_name(), error = %e, "composite metadata rejected");
                        degraded += 1;
                    }
                },
                Ok(None) => {}
                Err(e) => {
                    warn!(column = %column.full_name(), error = %e, "composite metadata unavailable");
                    degraded += 1;
                }
            }
        }

        if let Some(domain) = column.domain_name.as_deref() {
            let schema = column.domain_schema.as_deref().unwrap_or(&column.schema);
            match self.catalog.domain_type(schema, domain).await {
                Ok(Some(row)) => {
                    debug!(column = %column.full_name(), domain, "resolved domain type");
                    let descriptor = row.constraints.into_iter().fold(
                        DomainTypeDescriptor::new(row.schema, row.name, row.base_type),
                        |descriptor, constraint| {
                            descriptor.with_constraint(DomainConstraint {
                                name: constraint.name,
                                check: constraint.check_clause,
                                not_null: constraint.not_null,
                                default: constraint.default,
                            })
                        },
                    );
                    return Resolution {
                        user_type: UserDefinedType::Domain(descriptor),
                        degraded,
                    };
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(column = %column.full_name(), error = %e, "domain metadata unavailable");
                    degraded += 1;
                }
            }
        }

        Resolution {
            user_type: UserDefinedType::Plain,
            degraded,
        }
    }
}

/// Name of the column's underlying type when it may be user-defined.
fn underlying_type_name(column: &ColumnRow) -> Option<&str> {
    if !column.is_user_defined() && !column.is_array() {
        return None;
    }
    let udt = column.udt_name.as_deref()?.trim();
    let udt = if column.is_array() {
        udt.strip_prefix('_').unwrap_or(udt)
    } else {
        udt
    };
    (!udt.is_empty()).then_some(udt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::rows::{CompositeRow, DomainConstraintRow, DomainRow, EnumRow};
    use crate::catalog::snapshot::{CatalogSnapshot, SnapshotCatalog};

    fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot {
            enums: vec![EnumRow {
                schema: "public".into(),
                name: "mood".into(),
                values: "{sad,ok,happy}".into(),
            }],
            composites: vec![
                CompositeRow {
                    schema: "public".into(),
                    name: "address".into(),
                    attribute_names: vec!["street".into(), "zip".into()],
                    attribute_types: vec!["text".into(), "varchar".into()],
                },
                CompositeRow {
                    schema: "public".into(),
                    name: "broken".into(),
                    attribute_names: vec!["a".into()],
                    attribute_types: vec![],
                },
            ],
            domains: vec![DomainRow {
                schema: "public".into(),
                name: "price".into(),
                base_type: "numeric(10,2)".into(),
                constraints: vec![DomainConstraintRow {
                    name: "price_positive".into(),
                    check_clause: Some("VALUE > 0".into()),
                    not_null: false,
                    default: None,
                }],
            }],
            ..CatalogSnapshot::default()
        }
    }

    #[tokio::test]
    async fn test_resolves_enum() {
        let catalog = SnapshotCatalog::new(snapshot());
        let column = ColumnRow::new("public", "users", "mood", "USER-DEFINED").with_udt("public", "mood");
        let resolution = UserDefinedTypeResolver::new(&catalog).resolve(&column).await;
        match resolution.user_type {
            UserDefinedType::Enum(e) => assert_eq!(e.values, vec!["sad", "ok", "happy"]),
            other => panic!("expected enum, got {:?}", other),
        }
        assert_eq!(resolution.degraded, 0);
    }

    #[tokio::test]
    async fn test_resolves_enum_array() {
        let catalog = SnapshotCatalog::new(snapshot());
        let column = ColumnRow::new("public", "users", "moods", "ARRAY").with_udt("public", "_mood");
        let resolution = UserDefinedTypeResolver::new(&catalog).resolve(&column).await;
        assert_eq!(resolution.user_type.label(), "enum");
    }

    #[tokio::test]
    async fn test_resolves_composite() {
        let catalog = SnapshotCatalog::new(snapshot());
        let column =
            ColumnRow::new("public", "users", "home", "USER-DEFINED").with_udt("public", "address");
        let resolution = UserDefinedTypeResolver::new(&catalog).resolve(&column).await;
        assert_eq!(resolution.user_type.label(), "composite");
    }

    #[tokio::test]
    async fn test_misaligned_composite_is_contained() {
        let catalog = SnapshotCatalog::new(snapshot());
        let column =
            ColumnRow::new("public", "users", "odd", "USER-DEFINED").with_udt("public", "broken");
        let resolution = UserDefinedTypeResolver::new(&catalog).resolve(&column).await;
        assert!(resolution.user_type.is_plain());
        assert_eq!(resolution.degraded, 1);
    }

    #[tokio::test]
    async fn test_resolves_domain() {
        let catalog = SnapshotCatalog::new(snapshot());
        let column = ColumnRow::new("public", "products", "cost", "numeric").with_domain("public", "price");
        let resolution = UserDefinedTypeResolver::new(&catalog).resolve(&column).await;
        match resolution.user_type {
            UserDefinedType::Domain(d) => {
                assert_eq!(d.base_type, "numeric(10,2)");
                assert_eq!(d.checks().collect::<Vec<_>>(), vec!["VALUE > 0"]);
            }
            other => panic!("expected domain, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_failed_category_is_contained() {
        let catalog = SnapshotCatalog::new(snapshot()).fail_query("enum_values");
        let column =
            ColumnRow::new("public", "users", "home", "USER-DEFINED").with_udt("public", "address");
        let resolution = UserDefinedTypeResolver::new(&catalog).resolve(&column).await;
        assert_eq!(resolution.user_type.label(), "composite");
        assert_eq!(resolution.degraded, 1);
    }

    #[tokio::test]
    async fn test_builtin_column_is_plain_without_queries() {
        let catalog = SnapshotCatalog::new(snapshot())
            .fail_query("enum_values")
            .fail_query("composite_type");
        let column = ColumnRow::new("public", "users", "id", "integer").with_udt("pg_catalog", "int4");
        let resolution = UserDefinedTypeResolver::new(&catalog).resolve(&column).await;
        assert!(resolution.user_type.is_plain());
        assert_eq!(resolution.degraded, 0);
    }
}
