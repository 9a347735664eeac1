//! Dependency-ordered emission planning.
//!
//! Schema objects are emitted in dependency order: functions, composite
//! types and domains before the tables that use them; tables before their
//! indexes and the foreign keys between them; views and triggers last,
//! followed by a seed-data placeholder. Every emitted unit takes the next
//! timestamp from the allocator.

use super::allocator::TimestampAllocator;
use crate::catalog::rows::{RoutineRow, TriggerRow, ViewRow};
use crate::error::Error;
use crate::model::{
    CompositeTypeDescriptor, DomainTypeDescriptor, ForeignKeyDescriptor, IndexConstraint,
    IndexDescriptor, SchemaModel, TableRef,
};
use crate::naming;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Category of an emitted unit, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MigrationCategory {
    Functions,
    Composites,
    Domains,
    Tables,
    Indexes,
    ForeignKeys,
    Views,
    Triggers,
    Seeds,
}

impl MigrationCategory {
    /// All categories in emission order.
    pub const ALL: [MigrationCategory; 9] = [
        MigrationCategory::Functions,
        MigrationCategory::Composites,
        MigrationCategory::Domains,
        MigrationCategory::Tables,
        MigrationCategory::Indexes,
        MigrationCategory::ForeignKeys,
        MigrationCategory::Views,
        MigrationCategory::Triggers,
        MigrationCategory::Seeds,
    ];

    /// Stable name used in file names and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            MigrationCategory::Functions => "functions",
            MigrationCategory::Composites => "composites",
            MigrationCategory::Domains => "domains",
            MigrationCategory::Tables => "tables",
            MigrationCategory::Indexes => "indexes",
            MigrationCategory::ForeignKeys => "foreign-keys",
            MigrationCategory::Views => "views",
            MigrationCategory::Triggers => "triggers",
            MigrationCategory::Seeds => "seeds",
        }
    }
}

impl fmt::Display for MigrationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MigrationCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        MigrationCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| Error::InvalidConfig(format!("unknown migration category `{}`", s)))
    }
}

/// What an emitted unit contains.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnitPayload {
    Function { routine: RoutineRow },
    Composite { composite: CompositeTypeDescriptor },
    Domain { domain: DomainTypeDescriptor },
    Table { table: TableRef },
    Indexes { table: TableRef, indexes: Vec<IndexDescriptor> },
    ForeignKeys { foreign_keys: Vec<ForeignKeyDescriptor> },
    View { view: ViewRow },
    Trigger { trigger: TriggerRow },
    Seeds { tables: Vec<TableRef> },
}

/// One unit of emission with its allocated timestamp.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmissionUnit {
    /// 14-digit sortable timestamp.
    pub timestamp: String,
    pub category: MigrationCategory,
    /// Qualified object name (`public.users`).
    pub name: String,
    pub payload: UnitPayload,
}

impl EmissionUnit {
    /// File stem (`20240101000030-tables-public-users`).
    pub fn file_name(&self) -> String {
        format!("{}-{}-{}", self.timestamp, self.category, naming::slug(&self.name))
    }
}

/// Ordered emission units.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmissionPlan {
    pub units: Vec<EmissionUnit>,
}

impl EmissionPlan {
    /// Number of units.
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Check if nothing is emitted.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Units of one category, in order.
    pub fn units_in(&self, category: MigrationCategory) -> Vec<&EmissionUnit> {
        self.units.iter().filter(|u| u.category == category).collect()
    }
}

struct Emitter<'a> {
    allocator: &'a mut TimestampAllocator,
    units: Vec<EmissionUnit>,
}

impl Emitter<'_> {
    fn emit(&mut self, category: MigrationCategory, name: String, payload: UnitPayload) {
        let timestamp = self.allocator.allocate();
        debug!(%category, name = %name, timestamp = %timestamp, "emission unit allocated");
        self.units.push(EmissionUnit {
            timestamp,
            category,
            name,
            payload,
        });
    }
}

/// Sequences a [`SchemaModel`] into an [`EmissionPlan`].
#[derive(Debug)]
pub struct MigrationOrderingEngine {
    allocator: TimestampAllocator,
    disabled: HashSet<MigrationCategory>,
    table_allow_list: Vec<String>,
}

impl MigrationOrderingEngine {
    /// Create an engine that owns the run's allocator.
    pub fn new(allocator: TimestampAllocator) -> Self {
        Self {
            allocator,
            disabled: HashSet::new(),
            table_allow_list: Vec::new(),
        }
    }

    /// Skip the given categories; they consume no timestamps.
    pub fn with_disabled(mut self, categories: impl IntoIterator<Item = MigrationCategory>) -> Self {
        self.disabled.extend(categories);
        self
    }

    /// Restrict table-scoped units to tables named `table` or `schema.table`.
    pub fn with_table_allow_list(mut self, tables: Vec<String>) -> Self {
        self.table_allow_list = tables;
        self
    }

    /// Check if a category is emitted.
    pub fn is_enabled(&self, category: MigrationCategory) -> bool {
        !self.disabled.contains(&category)
    }

    /// The allocator, positioned after the last allocated timestamp.
    pub fn allocator(&self) -> &TimestampAllocator {
        &self.allocator
    }

    fn allows(&self, table: &TableRef) -> bool {
        self.table_allow_list.is_empty()
            || self
                .table_allow_list
                .iter()
                .any(|name| *name == table.table || *name == table.to_string())
    }

    /// Sequence the model. Timestamps continue across calls.
    pub fn sequence(&mut self, model: &SchemaModel) -> EmissionPlan {
        let enabled: HashSet<MigrationCategory> = MigrationCategory::ALL
            .into_iter()
            .filter(|c| self.is_enabled(*c))
            .collect();
        let tables: Vec<TableRef> = model
            .tables
            .iter()
            .map(|t| t.table_ref())
            .filter(|t| self.allows(t))
            .collect();

        let mut emitter = Emitter {
            allocator: &mut self.allocator,
            units: Vec::new(),
        };

        if enabled.contains(&MigrationCategory::Functions) {
            for routine in &model.routines {
                emitter.emit(
                    MigrationCategory::Functions,
                    format!("{}.{}", routine.schema, routine.name),
                    UnitPayload::Function {
                        routine: routine.clone(),
                    },
                );
            }
        }

        if enabled.contains(&MigrationCategory::Composites) {
            for composite in &model.composites {
                emitter.emit(
                    MigrationCategory::Composites,
                    format!("{}.{}", composite.schema, composite.name),
                    UnitPayload::Composite {
                        composite: composite.clone(),
                    },
                );
            }
        }

        if enabled.contains(&MigrationCategory::Domains) {
            for domain in &model.domains {
                emitter.emit(
                    MigrationCategory::Domains,
                    format!("{}.{}", domain.schema, domain.name),
                    UnitPayload::Domain {
                        domain: domain.clone(),
                    },
                );
            }
        }

        if enabled.contains(&MigrationCategory::Tables) {
            for table in &tables {
                emitter.emit(
                    MigrationCategory::Tables,
                    table.to_string(),
                    UnitPayload::Table {
                        table: table.clone(),
                    },
                );
            }
        }

        if enabled.contains(&MigrationCategory::Indexes) {
            for table in &tables {
                let indexes: Vec<IndexDescriptor> = model
                    .table(&table.schema, &table.table)
                    .map(|t| {
                        t.indexes
                            .iter()
                            .filter(|i| i.constraint != IndexConstraint::Primary)
                            .cloned()
                            .collect()
                    })
                    .unwrap_or_default();
                if indexes.is_empty() {
                    continue;
                }
                emitter.emit(
                    MigrationCategory::Indexes,
                    table.to_string(),
                    UnitPayload::Indexes {
                        table: table.clone(),
                        indexes,
                    },
                );
            }
        }

        if enabled.contains(&MigrationCategory::ForeignKeys) {
            let foreign_keys: Vec<ForeignKeyDescriptor> = model
                .foreign_keys
                .iter()
                .filter(|fk| {
                    tables.contains(&TableRef::new(fk.schema.clone(), fk.table.clone()))
                        && tables.contains(&TableRef::new(
                            fk.referenced_schema.clone(),
                            fk.referenced_table.clone(),
                        ))
                })
                .cloned()
                .collect();
            if !foreign_keys.is_empty() {
                emitter.emit(
                    MigrationCategory::ForeignKeys,
                    "foreign-keys".to_string(),
                    UnitPayload::ForeignKeys { foreign_keys },
                );
            }
        }

        if enabled.contains(&MigrationCategory::Views) {
            for view in &model.views {
                emitter.emit(
                    MigrationCategory::Views,
                    format!("{}.{}", view.schema, view.name),
                    UnitPayload::View { view: view.clone() },
                );
            }
        }

        if enabled.contains(&MigrationCategory::Triggers) {
            for trigger in &model.triggers {
                let table = TableRef::new(trigger.schema.clone(), trigger.table.clone());
                if !tables.contains(&table) {
                    continue;
                }
                emitter.emit(
                    MigrationCategory::Triggers,
                    format!("{}.{}", trigger.schema, trigger.name),
                    UnitPayload::Trigger {
                        trigger: trigger.clone(),
                    },
                );
            }
        }

        if enabled.contains(&MigrationCategory::Seeds) {
            emitter.emit(
                MigrationCategory::Seeds,
                "seeds".to_string(),
                UnitPayload::Seeds {
                    tables: tables.clone(),
                },
            );
        }

        EmissionPlan {
            units: emitter.units,
        }
    }
}
