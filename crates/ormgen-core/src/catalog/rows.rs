//! Raw catalog rows as returned by a [`CatalogSource`](super::CatalogSource).
//!
//! Facet fields stay textual here; they are parsed by the facet extractor.

use crate::types::facets::RawFacets;
use serde::{Deserialize, Serialize};

/// A schema (namespace).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRow {
    /// Schema name.
    pub name: String,
    /// Optional comment.
    #[serde(default)]
    pub comment: Option<String>,
}

impl SchemaRow {
    /// Create a schema row.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: None,
        }
    }
}

/// A table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    /// Owning schema.
    pub schema: String,
    /// Table name.
    pub name: String,
    /// Optional comment.
    #[serde(default)]
    pub comment: Option<String>,
}

impl TableRow {
    /// Create a table row.
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            comment: None,
        }
    }
}

/// A column with its native type information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRow {
    /// Owning schema.
    pub schema: String,
    /// Owning table.
    pub table: String,
    /// Column name.
    pub name: String,
    /// 1-based position in the table.
    #[serde(default)]
    pub ordinal_position: i32,
    /// `data_type` as reported by the catalog (`integer`, `ARRAY`, `USER-DEFINED`, ...).
    pub data_type: String,
    /// Schema of the underlying type.
    #[serde(default)]
    pub udt_schema: Option<String>,
    /// Underlying type name (`int4`, `_text`, `mood`, ...).
    #[serde(default)]
    pub udt_name: Option<String>,
    /// Schema of the domain, if the column is declared over a domain.
    #[serde(default)]
    pub domain_schema: Option<String>,
    /// Domain name, if the column is declared over a domain.
    #[serde(default)]
    pub domain_name: Option<String>,
    /// Whether the column accepts nulls.
    #[serde(default)]
    pub is_nullable: bool,
    /// Whether the column is part of the primary key.
    #[serde(default)]
    pub is_primary_key: bool,
    /// Whether the column is an identity column.
    #[serde(default)]
    pub is_identity: bool,
    /// Raw default expression.
    #[serde(default)]
    pub column_default: Option<String>,
    /// Textual numeric precision.
    #[serde(default)]
    pub numeric_precision: Option<String>,
    /// Textual numeric scale.
    #[serde(default)]
    pub numeric_scale: Option<String>,
    /// Textual character maximum length.
    #[serde(default)]
    pub character_maximum_length: Option<String>,
    /// Optional comment.
    #[serde(default)]
    pub comment: Option<String>,
}

impl ColumnRow {
    /// Create a column row with the given catalog data type.
    pub fn new(
        schema: impl Into<String>,
        table: impl Into<String>,
        name: impl Into<String>,
        data_type: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            name: name.into(),
            ordinal_position: 0,
            data_type: data_type.into(),
            udt_schema: None,
            udt_name: None,
            domain_schema: None,
            domain_name: None,
            is_nullable: false,
            is_primary_key: false,
            is_identity: false,
            column_default: None,
            numeric_precision: None,
            numeric_scale: None,
            character_maximum_length: None,
            comment: None,
        }
    }

    /// Set the underlying type.
    pub fn with_udt(mut self, schema: impl Into<String>, name: impl Into<String>) -> Self {
        self.udt_schema = Some(schema.into());
        self.udt_name = Some(name.into());
        self
    }

    /// Declare the column over a domain.
    pub fn with_domain(mut self, schema: impl Into<String>, name: impl Into<String>) -> Self {
        self.domain_schema = Some(schema.into());
        self.domain_name = Some(name.into());
        self
    }

    /// Mark as nullable.
    pub fn nullable(mut self) -> Self {
        self.is_nullable = true;
        self
    }

    /// Mark as primary key.
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    /// Mark as identity column.
    pub fn identity(mut self) -> Self {
        self.is_identity = true;
        self
    }

    /// Set the raw default expression.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.column_default = Some(default.into());
        self
    }

    /// Set textual precision and scale.
    pub fn with_precision(mut self, precision: &str, scale: &str) -> Self {
        self.numeric_precision = Some(precision.to_string());
        self.numeric_scale = Some(scale.to_string());
        self
    }

    /// Set textual character length.
    pub fn with_length(mut self, length: &str) -> Self {
        self.character_maximum_length = Some(length.to_string());
        self
    }

    /// Set the ordinal position.
    pub fn at_position(mut self, position: i32) -> Self {
        self.ordinal_position = position;
        self
    }

    /// Check if the catalog reports an array type.
    pub fn is_array(&self) -> bool {
        self.data_type.eq_ignore_ascii_case("ARRAY")
    }

    /// Check if the catalog reports a user-defined type.
    pub fn is_user_defined(&self) -> bool {
        self.data_type.eq_ignore_ascii_case("USER-DEFINED")
    }

    /// Underlying type name, lowercased, with the array underscore removed.
    pub fn normalized_udt_name(&self) -> Option<String> {
        let udt = self.udt_name.as_deref()?.trim();
        let udt = if self.is_array() {
            udt.strip_prefix('_').unwrap_or(udt)
        } else {
            udt
        };
        Some(udt.to_ascii_lowercase())
    }

    /// Schema of the underlying type, defaulting to the column's schema.
    pub fn type_schema(&self) -> &str {
        self.udt_schema.as_deref().unwrap_or(&self.schema)
    }

    /// Native type name assembled from the catalog markers.
    ///
    /// `ARRAY` columns become `<element>[]`; `USER-DEFINED` columns become
    /// the underlying type name; everything else is `data_type` verbatim.
    pub fn native_type(&self) -> String {
        if self.is_array() {
            match self.normalized_udt_name() {
                Some(element) => format!("{}[]", element),
                None => "unknown[]".to_string(),
            }
        } else if self.is_user_defined() {
            self.normalized_udt_name()
                .unwrap_or_else(|| self.data_type.clone())
        } else {
            self.data_type.clone()
        }
    }

    /// Borrow the textual facet fields.
    pub fn raw_facets(&self) -> RawFacets<'_> {
        RawFacets {
            precision: self.numeric_precision.as_deref(),
            scale: self.numeric_scale.as_deref(),
            length: self.character_maximum_length.as_deref(),
        }
    }

    /// Fully qualified column name.
    pub fn full_name(&self) -> String {
        format!("{}.{}.{}", self.schema, self.table, self.name)
    }
}

/// Enum literal values for one user-defined type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumRow {
    /// Schema owning the type.
    pub schema: String,
    /// Type name.
    pub name: String,
    /// Raw delimited literal list (`{a,b}` or `'a','b'`).
    pub values: String,
}

/// Composite type attributes, index-aligned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeRow {
    /// Schema owning the type.
    pub schema: String,
    /// Type name.
    pub name: String,
    /// Attribute names.
    pub attribute_names: Vec<String>,
    /// Attribute native types.
    pub attribute_types: Vec<String>,
}

/// A domain constraint row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConstraintRow {
    /// Constraint name.
    pub name: String,
    /// Check clause.
    #[serde(default)]
    pub check_clause: Option<String>,
    /// Whether the constraint is `NOT NULL`.
    #[serde(default)]
    pub not_null: bool,
    /// Default expression.
    #[serde(default)]
    pub default: Option<String>,
}

/// A domain with its base type and constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRow {
    /// Schema owning the domain.
    pub schema: String,
    /// Domain name.
    pub name: String,
    /// Base type as formatted by the catalog (`numeric(10,2)`).
    pub base_type: String,
    /// Constraints.
    #[serde(default)]
    pub constraints: Vec<DomainConstraintRow>,
}

/// Longest observed JSON payload for a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRow {
    /// Owning schema.
    pub schema: String,
    /// Owning table.
    pub table: String,
    /// Column name.
    pub column: String,
    /// Payload.
    pub value: serde_json::Value,
}

/// A function or procedure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutineRow {
    /// Owning schema.
    pub schema: String,
    /// Routine name.
    pub name: String,
    /// `FUNCTION` or `PROCEDURE`.
    #[serde(default = "default_routine_kind")]
    pub kind: String,
    /// Argument signature.
    #[serde(default)]
    pub arguments: Option<String>,
    /// Return type.
    #[serde(default)]
    pub return_type: Option<String>,
    /// Implementation language.
    #[serde(default)]
    pub language: Option<String>,
    /// Full definition.
    #[serde(default)]
    pub definition: Option<String>,
}

fn default_routine_kind() -> String {
    "FUNCTION".to_string()
}

/// A view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewRow {
    /// Owning schema.
    pub schema: String,
    /// View name.
    pub name: String,
    /// Whether the view is materialized.
    #[serde(default)]
    pub materialized: bool,
    /// View query.
    #[serde(default)]
    pub definition: Option<String>,
}

/// A trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRow {
    /// Owning schema.
    pub schema: String,
    /// Table the trigger fires on.
    pub table: String,
    /// Trigger name.
    pub name: String,
    /// `BEFORE`, `AFTER` or `INSTEAD OF`.
    #[serde(default)]
    pub timing: Option<String>,
    /// Events (`INSERT`, `UPDATE`, ...).
    #[serde(default)]
    pub events: Vec<String>,
    /// Action statement.
    #[serde(default)]
    pub action: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_type_for_arrays() {
        let column = ColumnRow::new("public", "posts", "tags", "ARRAY").with_udt("pg_catalog", "_text");
        assert_eq!(column.native_type(), "text[]");
        assert_eq!(column.normalized_udt_name().as_deref(), Some("text"));
    }

    #[test]
    fn test_native_type_for_user_defined() {
        let column =
            ColumnRow::new("public", "users", "mood", "USER-DEFINED").with_udt("public", "Mood");
        assert_eq!(column.native_type(), "mood");
        assert_eq!(column.type_schema(), "public");
    }

    #[test]
    fn test_native_type_verbatim() {
        let column = ColumnRow::new("public", "users", "id", "integer");
        assert_eq!(column.native_type(), "integer");
        assert_eq!(column.full_name(), "public.users.id");
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let column: ColumnRow = serde_json::from_str(
            r#"{"schema":"public","table":"users","name":"email","data_type":"character varying","character_maximum_length":"255"}"#,
        )
        .unwrap();
        assert!(!column.is_nullable);
        assert_eq!(column.raw_facets().length, Some("255"));
    }
}
