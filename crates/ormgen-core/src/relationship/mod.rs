//! Relationship classification.
//!
//! Foreign keys become `BelongsTo` relationships on their constrained table.
//! The inverse views (`HasOne`, `HasMany`, `ManyToMany`) come from the
//! catalog's declared relationship list, or are inferred by
//! [`JunctionDetector`] when the catalog supplies none. Within one owning
//! table the first relationship to claim an alias keeps it.

pub mod classifier;
pub mod junction;

pub use classifier::RelationshipClassifier;
pub use junction::JunctionDetector;

use crate::model::{RelationshipDescriptor, TableRef};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Relationships owned by one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRelationships {
    /// Owning table.
    pub owner: TableRef,
    /// Kept relationships, in classification order.
    pub relationships: Vec<RelationshipDescriptor>,
    /// Relationships dropped because their alias was already taken.
    pub dropped: Vec<RelationshipDescriptor>,
}

/// All classified relationships, grouped by owning table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RelationshipSet {
    tables: Vec<TableRelationships>,
    dropped_aliases: usize,
}

impl RelationshipSet {
    /// Relationships owned by a table (empty if none).
    pub fn for_table(&self, table: &TableRef) -> &[RelationshipDescriptor] {
        self.tables
            .iter()
            .find(|t| &t.owner == table)
            .map(|t| t.relationships.as_slice())
            .unwrap_or(&[])
    }

    /// Relationships dropped from a table because of alias collisions.
    pub fn dropped_for(&self, table: &TableRef) -> &[RelationshipDescriptor] {
        self.tables
            .iter()
            .find(|t| &t.owner == table)
            .map(|t| t.dropped.as_slice())
            .unwrap_or(&[])
    }

    /// Per-table groups, ordered by owner.
    pub fn tables(&self) -> &[TableRelationships] {
        &self.tables
    }

    /// All kept relationships.
    pub fn iter(&self) -> impl Iterator<Item = &RelationshipDescriptor> {
        self.tables.iter().flat_map(|t| t.relationships.iter())
    }

    /// Number of kept relationships.
    pub fn len(&self) -> usize {
        self.tables.iter().map(|t| t.relationships.len()).sum()
    }

    /// Check if no relationship was kept.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of relationships dropped because of alias collisions.
    pub fn dropped_aliases(&self) -> usize {
        self.dropped_aliases
    }
}

/// Accumulates relationships with first-wins alias deduplication.
#[derive(Debug, Default)]
pub(crate) struct RelationshipSetBuilder {
    tables: BTreeMap<TableRef, TableRelationships>,
    dropped_aliases: usize,
}

impl RelationshipSetBuilder {
    pub(crate) fn insert(&mut self, relationship: RelationshipDescriptor) {
        let owner = relationship.owner();
        let group = self
            .tables
            .entry(owner.clone())
            .or_insert_with(|| TableRelationships {
                owner: owner.clone(),
                relationships: Vec::new(),
                dropped: Vec::new(),
            });

        if group
            .relationships
            .iter()
            .any(|r| r.alias() == relationship.alias())
        {
            debug!(
                table = %owner,
                alias = relationship.alias(),
                kind = %relationship.kind(),
                "duplicate relationship alias dropped"
            );
            group.dropped.push(relationship);
            self.dropped_aliases += 1;
        } else {
            group.relationships.push(relationship);
        }
    }

    pub(crate) fn finish(self) -> RelationshipSet {
        RelationshipSet {
            tables: self.tables.into_values().collect(),
            dropped_aliases: self.dropped_aliases,
        }
    }
}
