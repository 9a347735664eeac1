//! Relationship descriptors.
//!
//! A descriptor carries its kind, both endpoints and (for many-to-many only)
//! the junction table. The junction invariant is enforced by the
//! constructors, so fields are read through accessors.

use crate::naming;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of relationship between two tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipKind {
    /// The constrained side of a foreign key.
    BelongsTo,
    /// Inverse of a unique foreign key.
    HasOne,
    /// Inverse of a non-unique foreign key.
    HasMany,
    /// Two tables linked through a junction table.
    ManyToMany,
}

impl RelationshipKind {
    /// Declaration method name.
    pub fn method(&self) -> &'static str {
        match self {
            RelationshipKind::BelongsTo => "belongsTo",
            RelationshipKind::HasOne => "hasOne",
            RelationshipKind::HasMany => "hasMany",
            RelationshipKind::ManyToMany => "belongsToMany",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationshipKind::BelongsTo => write!(f, "BelongsTo"),
            RelationshipKind::HasOne => write!(f, "HasOne"),
            RelationshipKind::HasMany => write!(f, "HasMany"),
            RelationshipKind::ManyToMany => write!(f, "ManyToMany"),
        }
    }
}

/// A table, ordered by schema then name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub table: String,
}

impl TableRef {
    /// Create a table reference.
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

/// A column endpoint of a relationship.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    pub schema: String,
    pub table: String,
    pub column: String,
}

impl ColumnRef {
    /// Create a column reference.
    pub fn new(schema: impl Into<String>, table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            column: column.into(),
        }
    }

    /// The table this column belongs to.
    pub fn table_ref(&self) -> TableRef {
        TableRef::new(self.schema.clone(), self.table.clone())
    }
}

/// The junction table of a many-to-many relationship.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JunctionRef {
    pub schema: String,
    pub table: String,
    /// Junction column referencing the source table.
    pub source_column: String,
    /// Junction column referencing the target table.
    pub target_column: String,
}

impl JunctionRef {
    /// Create a junction reference.
    pub fn new(
        schema: impl Into<String>,
        table: impl Into<String>,
        source_column: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            source_column: source_column.into(),
            target_column: target_column.into(),
        }
    }
}

/// A relationship row as declared by the catalog, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredRelationship {
    pub kind: RelationshipKind,
    pub source: ColumnRef,
    pub target: ColumnRef,
    #[serde(default)]
    pub junction: Option<JunctionRef>,
}

/// A classified relationship with its alias.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipDescriptor {
    kind: RelationshipKind,
    source: ColumnRef,
    target: ColumnRef,
    junction: Option<JunctionRef>,
    alias: String,
}

impl RelationshipDescriptor {
    /// The constrained side (`source`) points at the referenced key (`target`).
    pub fn belongs_to(source: ColumnRef, target: ColumnRef) -> Self {
        Self::build(RelationshipKind::BelongsTo, source, target, None)
    }

    /// The referenced table owns one row of the constrained `source` table.
    pub fn has_one(source: ColumnRef, target: ColumnRef) -> Self {
        Self::build(RelationshipKind::HasOne, source, target, None)
    }

    /// The referenced table owns many rows of the constrained `source` table.
    pub fn has_many(source: ColumnRef, target: ColumnRef) -> Self {
        Self::build(RelationshipKind::HasMany, source, target, None)
    }

    /// `source` and `target` tables linked through `junction`.
    pub fn many_to_many(source: ColumnRef, target: ColumnRef, junction: JunctionRef) -> Self {
        Self::build(RelationshipKind::ManyToMany, source, target, Some(junction))
    }

    fn build(
        kind: RelationshipKind,
        source: ColumnRef,
        target: ColumnRef,
        junction: Option<JunctionRef>,
    ) -> Self {
        let alias = derive_alias(kind, &source, &target, junction.as_ref());
        Self {
            kind,
            source,
            target,
            junction,
            alias,
        }
    }

    pub fn kind(&self) -> RelationshipKind {
        self.kind
    }

    pub fn source(&self) -> &ColumnRef {
        &self.source
    }

    pub fn target(&self) -> &ColumnRef {
        &self.target
    }

    /// Junction table; present iff the kind is many-to-many.
    pub fn junction(&self) -> Option<&JunctionRef> {
        self.junction.as_ref()
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Table whose model declares this relationship.
    pub fn owner(&self) -> TableRef {
        match self.kind {
            RelationshipKind::BelongsTo | RelationshipKind::ManyToMany => self.source.table_ref(),
            RelationshipKind::HasOne | RelationshipKind::HasMany => self.target.table_ref(),
        }
    }

    /// Model on the other end of the relationship.
    pub fn related_model(&self) -> String {
        match self.kind {
            RelationshipKind::BelongsTo | RelationshipKind::ManyToMany => {
                naming::model_name(&self.target.table)
            }
            RelationshipKind::HasOne | RelationshipKind::HasMany => {
                naming::model_name(&self.source.table)
            }
        }
    }

    /// Declaration fragment for the owning model.
    pub fn declaration(&self) -> String {
        let model = self.related_model();
        match (&self.kind, &self.junction) {
            (RelationshipKind::BelongsTo, _) => format!(
                "belongsTo({}, {{ as: '{}', foreignKey: '{}', targetKey: '{}' }})",
                model,
                self.alias,
                naming::property_name(&self.source.column),
                naming::property_name(&self.target.column),
            ),
            (RelationshipKind::ManyToMany, Some(junction)) => format!(
                "belongsToMany({}, {{ as: '{}', through: () => {}, foreignKey: '{}', otherKey: '{}' }})",
                model,
                self.alias,
                naming::model_name(&junction.table),
                naming::property_name(&junction.source_column),
                naming::property_name(&junction.target_column),
            ),
            (kind, _) => format!(
                "{}({}, {{ as: '{}', foreignKey: '{}', sourceKey: '{}' }})",
                kind.method(),
                model,
                self.alias,
                naming::property_name(&self.source.column),
                naming::property_name(&self.target.column),
            ),
        }
    }
}

fn derive_alias(
    kind: RelationshipKind,
    source: &ColumnRef,
    target: &ColumnRef,
    junction: Option<&JunctionRef>,
) -> String {
    match (kind, junction) {
        (RelationshipKind::BelongsTo, _) => naming::compose_alias(&[
            naming::singularize(&target.table),
            naming::omit_id_suffix(&target.column),
        ]),
        (RelationshipKind::HasOne, _) => naming::compose_alias(&[
            naming::singularize(&source.table),
            naming::omit_id_suffix(&source.column),
        ]),
        (RelationshipKind::HasMany, _) => naming::compose_alias(&[
            naming::singularize(&source.table),
            naming::pluralize(&naming::omit_id_suffix(&source.column)),
        ]),
        (RelationshipKind::ManyToMany, Some(junction)) => {
            let alias = naming::compose_alias(&[
                naming::singularize(&junction.table),
                naming::pluralize(&naming::omit_id_suffix(&source.table)),
            ]);
            format!("{}es", alias)
        }
        (RelationshipKind::ManyToMany, None) => naming::compose_alias(&[
            naming::singularize(&target.table),
            naming::pluralize(&naming::omit_id_suffix(&source.table)),
        ]),
    }
}
