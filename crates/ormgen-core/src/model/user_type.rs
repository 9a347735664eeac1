//! User-defined type descriptors: enums, composites and domains.

use crate::error::Error;
use serde::{Deserialize, Serialize};

/// An enum type with its literal values in catalog order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumDescriptor {
    /// Schema owning the type.
    pub schema: String,
    /// Type name.
    pub name: String,
    /// Literal values (catalog order, not sorted).
    pub values: Vec<String>,
}

impl EnumDescriptor {
    /// Create an enum descriptor from already split values.
    pub fn new(schema: impl Into<String>, name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            values,
        }
    }

    /// Create an enum descriptor from the catalog's raw delimited literal list.
    pub fn from_raw(schema: impl Into<String>, name: impl Into<String>, raw: &str) -> Self {
        Self::new(schema, name, parse_literals(raw))
    }

    /// Quoted, comma-joined literal list (`'a', 'b'`).
    pub fn literal_list(&self) -> String {
        self.values
            .iter()
            .map(|v| quote_literal(v))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Literal union usable as a host type (`'a' | 'b'`).
    pub fn literal_union(&self) -> String {
        if self.values.is_empty() {
            return "never".to_string();
        }
        self.values
            .iter()
            .map(|v| quote_literal(v))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "\\'"))
}

/// Split a raw delimited literal string into trimmed, unquoted values.
///
/// Accepts the array form `{a,b,"c d"}` as well as `'a', 'b'`. Separators
/// inside quotes are kept; doubled quote characters unescape to one.
pub fn parse_literals(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    let inner = trimmed
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .unwrap_or(trimmed);

    if inner.trim().is_empty() {
        return Vec::new();
    }

    let mut values = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut chars = inner.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => {
                if chars.peek() == Some(&q) {
                    current.push(q);
                    chars.next();
                } else {
                    quote = None;
                }
            }
            Some(_) if c == '\\' => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            Some(_) => current.push(c),
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == ',' => {
                values.push(current.trim().to_string());
                current.clear();
            }
            None => current.push(c),
        }
    }
    values.push(current.trim().to_string());

    values
}

/// A composite (row) type with index-aligned attribute names and types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositeTypeDescriptor {
    /// Schema owning the type.
    pub schema: String,
    /// Type name.
    pub name: String,
    /// Attribute names in declaration order.
    pub attribute_names: Vec<String>,
    /// Attribute native types, aligned with `attribute_names`.
    pub attribute_types: Vec<String>,
}

impl CompositeTypeDescriptor {
    /// Create a composite descriptor; the attribute lists must be index-aligned.
    pub fn new(
        schema: impl Into<String>,
        name: impl Into<String>,
        attribute_names: Vec<String>,
        attribute_types: Vec<String>,
    ) -> Result<Self, Error> {
        let name = name.into();
        if attribute_names.len() != attribute_types.len() {
            return Err(Error::InvalidMetadata(format!(
                "composite type {} has {} attribute names but {} attribute types",
                name,
                attribute_names.len(),
                attribute_types.len()
            )));
        }
        Ok(Self {
            schema: schema.into(),
            name,
            attribute_names,
            attribute_types,
        })
    }

    /// Iterate `(name, native type)` pairs.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attribute_names
            .iter()
            .map(String::as_str)
            .zip(self.attribute_types.iter().map(String::as_str))
    }

    /// Human-readable field list (`street: text, zip: varchar`).
    pub fn field_list(&self) -> String {
        self.attributes()
            .map(|(name, ty)| format!("{}: {}", name, ty))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// A named constraint attached to a domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConstraint {
    /// Constraint name.
    pub name: String,
    /// Check expression, if this is a check constraint.
    #[serde(default)]
    pub check: Option<String>,
    /// Whether the domain rejects nulls.
    #[serde(default)]
    pub not_null: bool,
    /// Domain-level default expression.
    #[serde(default)]
    pub default: Option<String>,
}

/// A domain type: a base type narrowed by constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainTypeDescriptor {
    /// Schema owning the domain.
    pub schema: String,
    /// Domain name.
    pub name: String,
    /// Base native type (may carry modifiers, e.g. `numeric(10,2)`).
    pub base_type: String,
    /// Constraints in catalog order.
    #[serde(default)]
    pub constraints: Vec<DomainConstraint>,
}

impl DomainTypeDescriptor {
    /// Create a domain descriptor.
    pub fn new(
        schema: impl Into<String>,
        name: impl Into<String>,
        base_type: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            base_type: base_type.into(),
            constraints: Vec::new(),
        }
    }

    /// Add a constraint.
    pub fn with_constraint(mut self, constraint: DomainConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Whether any constraint forbids nulls.
    pub fn is_not_null(&self) -> bool {
        self.constraints.iter().any(|c| c.not_null)
    }

    /// Check expressions in catalog order.
    pub fn checks(&self) -> impl Iterator<Item = &str> {
        self.constraints.iter().filter_map(|c| c.check.as_deref())
    }
}

/// Classification of a column's type. Exactly one case holds per column.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "descriptor", rename_all = "snake_case")]
pub enum UserDefinedType {
    /// Built-in scalar, array or range type.
    #[default]
    Plain,
    /// Enum type.
    Enum(EnumDescriptor),
    /// Composite (row) type.
    Composite(CompositeTypeDescriptor),
    /// Domain over a base type.
    Domain(DomainTypeDescriptor),
}

impl UserDefinedType {
    /// Short label for logs and render contexts.
    pub fn label(&self) -> &'static str {
        match self {
            UserDefinedType::Plain => "plain",
            UserDefinedType::Enum(_) => "enum",
            UserDefinedType::Composite(_) => "composite",
            UserDefinedType::Domain(_) => "domain",
        }
    }

    /// Check if this is a plain type.
    pub fn is_plain(&self) -> bool {
        matches!(self, UserDefinedType::Plain)
    }
}
