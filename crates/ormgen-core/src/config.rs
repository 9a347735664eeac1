//! Generator configuration.

use crate::error::Error;
use crate::migration::{MigrationCategory, TimestampAllocator};
use crate::types::structured::DEFAULT_MAX_DEPTH;
use crate::types::vocabulary::{HostType, OrmScalar, TypeVocabulary};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Schemas that are never introspected.
pub const SYSTEM_SCHEMAS: &[&str] = &["pg_catalog", "information_schema", "pg_toast"];

/// Replacement mapping for one native type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TypeOverride {
    /// ORM vocabulary name (`STRING`, `LTREE`, ...).
    pub orm: String,
    /// Host type (`string`, `number`, ...).
    pub host: String,
}

/// Configuration of an introspection run.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Schemas to introspect; empty means every non-system schema.
    pub schemas: Vec<String>,

    /// Tables to introspect (`table` or `schema.table`); empty means all.
    pub tables: Vec<String>,

    /// Tables to skip (`table` or `schema.table`).
    pub skip_tables: Vec<String>,

    /// Migration categories that are not emitted.
    pub disabled_categories: Vec<MigrationCategory>,

    /// Base instant for timestamp allocation (`YYYYMMDDHHMMSS`); now if unset.
    pub base_timestamp: Option<String>,

    /// Fetch sample payloads for JSON columns.
    pub sample_json: bool,

    /// Maximum nesting depth of synthesized JSON structures.
    pub max_structure_depth: usize,

    /// Native type name to replacement mapping.
    pub type_overrides: BTreeMap<String, TypeOverride>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            schemas: Vec::new(),
            tables: Vec::new(),
            skip_tables: Vec::new(),
            disabled_categories: Vec::new(),
            base_timestamp: None,
            sample_json: true,
            max_structure_depth: DEFAULT_MAX_DEPTH,
            type_overrides: BTreeMap::new(),
        }
    }
}

impl GeneratorConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Restrict to the given schemas.
    pub fn with_schemas(mut self, schemas: Vec<String>) -> Self {
        self.schemas = schemas;
        self
    }

    /// Restrict to the given tables.
    pub fn with_tables(mut self, tables: Vec<String>) -> Self {
        self.tables = tables;
        self
    }

    /// Skip the given tables.
    pub fn with_skip_tables(mut self, tables: Vec<String>) -> Self {
        self.skip_tables = tables;
        self
    }

    /// Disable migration categories.
    pub fn with_disabled_categories(mut self, categories: Vec<MigrationCategory>) -> Self {
        self.disabled_categories = categories;
        self
    }

    /// Set the base timestamp.
    pub fn with_base_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.base_timestamp = Some(timestamp.into());
        self
    }

    /// Enable or disable JSON sampling.
    pub fn with_sample_json(mut self, enabled: bool) -> Self {
        self.sample_json = enabled;
        self
    }

    /// Set the structure synthesis depth limit.
    pub fn with_max_structure_depth(mut self, depth: usize) -> Self {
        self.max_structure_depth = depth;
        self
    }

    /// Override the mapping of a native type.
    pub fn with_type_override(
        mut self,
        native: impl Into<String>,
        orm: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        self.type_overrides.insert(
            native.into(),
            TypeOverride {
                orm: orm.into(),
                host: host.into(),
            },
        );
        self
    }

    /// Check the configuration for invalid values.
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_structure_depth == 0 {
            return Err(Error::InvalidConfig(
                "max_structure_depth must be at least 1".to_string(),
            ));
        }
        if let Some(timestamp) = &self.base_timestamp {
            TimestampAllocator::from_timestamp(timestamp)?;
        }
        for (native, mapping) in &self.type_overrides {
            if native.trim().is_empty() || mapping.orm.trim().is_empty() {
                return Err(Error::InvalidConfig(format!(
                    "type override `{}` needs a native name and an ORM type",
                    native
                )));
            }
        }
        Ok(())
    }

    /// Whether a schema is introspected.
    pub fn includes_schema(&self, schema: &str) -> bool {
        if SYSTEM_SCHEMAS.contains(&schema) || schema.starts_with("pg_temp") {
            return false;
        }
        self.schemas.is_empty() || self.schemas.iter().any(|s| s == schema)
    }

    /// Whether a table is introspected (allow-list, then skip-list).
    pub fn includes_table(&self, schema: &str, table: &str) -> bool {
        let matches = |name: &String| {
            name == table || name.split_once('.') == Some((schema, table))
        };
        let allowed = self.tables.is_empty() || self.tables.iter().any(matches);
        allowed && !self.skip_tables.iter().any(matches)
    }

    /// The vocabulary with overrides applied.
    pub fn vocabulary(&self) -> TypeVocabulary {
        self.type_overrides
            .iter()
            .fold(TypeVocabulary::postgres(), |vocabulary, (native, mapping)| {
                vocabulary.with_override(
                    native,
                    OrmScalar::from_name(&mapping.orm),
                    HostType::from_name(&mapping.host),
                )
            })
    }

    /// A timestamp allocator at the configured base (or now).
    pub fn allocator(&self) -> Result<TimestampAllocator, Error> {
        match &self.base_timestamp {
            Some(timestamp) => TimestampAllocator::from_timestamp(timestamp),
            None => Ok(TimestampAllocator::now()),
        }
    }
}
