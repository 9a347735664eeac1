//! Foreign keys and declared rows to relationship descriptors.

use super::{JunctionDetector, RelationshipSet, RelationshipSetBuilder};
use crate::model::{
    ColumnRef, DeclaredRelationship, ForeignKeyDescriptor, RelationshipDescriptor,
    RelationshipKind, TableDescriptor,
};
use tracing::debug;

/// Classifies foreign keys and declared relationship rows.
pub struct RelationshipClassifier;

impl RelationshipClassifier {
    /// Classify into a [`RelationshipSet`].
    ///
    /// Every foreign key yields a `BelongsTo` on its constrained table,
    /// classified before any declared row so it wins alias collisions.
    /// Declared `BelongsTo` rows are ignored, and a declared `ManyToMany`
    /// without a junction is kept as `HasMany` on the same owner.
    pub fn classify(
        foreign_keys: &[ForeignKeyDescriptor],
        declared: &[DeclaredRelationship],
    ) -> RelationshipSet {
        let mut builder = RelationshipSetBuilder::default();

        for fk in foreign_keys {
            builder.insert(RelationshipDescriptor::belongs_to(
                ColumnRef::new(fk.schema.clone(), fk.table.clone(), fk.column.clone()),
                ColumnRef::new(
                    fk.referenced_schema.clone(),
                    fk.referenced_table.clone(),
                    fk.referenced_column.clone(),
                ),
            ));
        }

        for row in declared {
            let relationship = match (row.kind, &row.junction) {
                (RelationshipKind::BelongsTo, _) => {
                    debug!(source = %row.source.table, "declared belongs-to ignored");
                    continue;
                }
                (RelationshipKind::HasOne, _) => {
                    RelationshipDescriptor::has_one(row.source.clone(), row.target.clone())
                }
                (RelationshipKind::HasMany, _) => {
                    RelationshipDescriptor::has_many(row.source.clone(), row.target.clone())
                }
                (RelationshipKind::ManyToMany, Some(junction)) => {
                    RelationshipDescriptor::many_to_many(
                        row.source.clone(),
                        row.target.clone(),
                        junction.clone(),
                    )
                }
                (RelationshipKind::ManyToMany, None) => {
                    debug!(
                        source = %row.source.table,
                        target = %row.target.table,
                        "many-to-many without junction downgraded to has-many"
                    );
                    RelationshipDescriptor::has_many(row.target.clone(), row.source.clone())
                }
            };
            builder.insert(relationship);
        }

        builder.finish()
    }

    /// Derive declared rows from foreign keys for catalogs that report none.
    pub fn infer_declared(
        tables: &[TableDescriptor],
        foreign_keys: &[ForeignKeyDescriptor],
    ) -> Vec<DeclaredRelationship> {
        JunctionDetector::new(tables).infer(foreign_keys)
    }
}
