//! Constraint descriptors: foreign keys and indexes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Referential action on update or delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReferentialAction {
    #[default]
    #[serde(rename = "NO ACTION", alias = "NoAction")]
    NoAction,
    #[serde(rename = "RESTRICT", alias = "Restrict")]
    Restrict,
    #[serde(rename = "CASCADE", alias = "Cascade")]
    Cascade,
    #[serde(rename = "SET NULL", alias = "SetNull")]
    SetNull,
    #[serde(rename = "SET DEFAULT", alias = "SetDefault")]
    SetDefault,
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ReferentialAction::NoAction => "NO ACTION",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
        };
        write!(f, "{}", text)
    }
}

/// A single-column foreign key constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDescriptor {
    /// Constraint name.
    pub constraint_name: String,
    /// Constrained schema.
    pub schema: String,
    /// Constrained table.
    pub table: String,
    /// Constrained column.
    pub column: String,
    /// Referenced schema.
    pub referenced_schema: String,
    /// Referenced table.
    pub referenced_table: String,
    /// Referenced column.
    pub referenced_column: String,
    #[serde(default)]
    pub update_rule: ReferentialAction,
    #[serde(default)]
    pub delete_rule: ReferentialAction,
    /// `SIMPLE`, `FULL` or `PARTIAL`.
    #[serde(default)]
    pub match_option: Option<String>,
    #[serde(default)]
    pub deferrable: bool,
    #[serde(default)]
    pub initially_deferred: bool,
    #[serde(default)]
    pub comment: Option<String>,
}

impl ForeignKeyDescriptor {
    /// Create a foreign key within one schema.
    pub fn new(
        constraint_name: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
        referenced_table: impl Into<String>,
        referenced_column: impl Into<String>,
    ) -> Self {
        let schema = schema.into();
        Self {
            constraint_name: constraint_name.into(),
            referenced_schema: schema.clone(),
            schema,
            table: table.into(),
            column: column.into(),
            referenced_table: referenced_table.into(),
            referenced_column: referenced_column.into(),
            update_rule: ReferentialAction::NoAction,
            delete_rule: ReferentialAction::NoAction,
            match_option: None,
            deferrable: false,
            initially_deferred: false,
            comment: None,
        }
    }

    /// Set the delete rule.
    pub fn with_on_delete(mut self, action: ReferentialAction) -> Self {
        self.delete_rule = action;
        self
    }

    /// Set the update rule.
    pub fn with_on_update(mut self, action: ReferentialAction) -> Self {
        self.update_rule = action;
        self
    }

    /// Check if the key references its own table.
    pub fn is_self_referencing(&self) -> bool {
        self.schema == self.referenced_schema && self.table == self.referenced_table
    }
}

/// Kind of constraint backing an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexConstraint {
    Primary,
    Unique,
    #[default]
    None,
}

/// An index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub schema: String,
    pub table: String,
    pub name: String,
    /// Access method (`btree`, `gin`, ...).
    #[serde(default = "default_index_type")]
    pub index_type: String,
    #[serde(default)]
    pub constraint: IndexConstraint,
    /// Indexed columns in key order.
    pub columns: Vec<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

fn default_index_type() -> String {
    "btree".to_string()
}

impl IndexDescriptor {
    /// Create a plain btree index.
    pub fn new(
        schema: impl Into<String>,
        table: impl Into<String>,
        name: impl Into<String>,
        columns: Vec<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            name: name.into(),
            index_type: default_index_type(),
            constraint: IndexConstraint::None,
            columns,
            comment: None,
        }
    }

    /// Mark as unique.
    pub fn unique(mut self) -> Self {
        self.constraint = IndexConstraint::Unique;
        self
    }

    /// Mark as primary key.
    pub fn primary(mut self) -> Self {
        self.constraint = IndexConstraint::Primary;
        self
    }

    /// Set the access method.
    pub fn with_type(mut self, index_type: impl Into<String>) -> Self {
        self.index_type = index_type.into();
        self
    }

    /// Check if this index enforces uniqueness of exactly `column`.
    pub fn is_unique_on(&self, column: &str) -> bool {
        self.constraint != IndexConstraint::None
            && self.columns.len() == 1
            && self.columns[0] == column
    }
}
