//! Native type vocabulary.
//!
//! Maps PostgreSQL native type names onto the ORM vocabulary and onto host
//! (TypeScript) types. The vocabulary is built once and shared by reference;
//! nothing in it is mutated after construction.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Scalar type names in the ORM vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrmScalar {
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Decimal,
    Boolean,
    String,
    Char,
    Text,
    Citext,
    Uuid,
    DateOnly,
    Date,
    Time,
    Json,
    Jsonb,
    Blob,
    Inet,
    Cidr,
    MacAddr,
    TsVector,
    Geometry,
    Geography,
    Hstore,
    Enum,
    /// Raw passthrough marker for types the vocabulary cannot express.
    Raw,
    /// A name supplied by configuration overrides.
    Custom(String),
}

impl OrmScalar {
    /// Vocabulary name (`INTEGER`, `DECIMAL`, ...).
    pub fn name(&self) -> &str {
        match self {
            OrmScalar::SmallInt => "SMALLINT",
            OrmScalar::Integer => "INTEGER",
            OrmScalar::BigInt => "BIGINT",
            OrmScalar::Real => "REAL",
            OrmScalar::Double => "DOUBLE",
            OrmScalar::Decimal => "DECIMAL",
            OrmScalar::Boolean => "BOOLEAN",
            OrmScalar::String => "STRING",
            OrmScalar::Char => "CHAR",
            OrmScalar::Text => "TEXT",
            OrmScalar::Citext => "CITEXT",
            OrmScalar::Uuid => "UUID",
            OrmScalar::DateOnly => "DATEONLY",
            OrmScalar::Date => "DATE",
            OrmScalar::Time => "TIME",
            OrmScalar::Json => "JSON",
            OrmScalar::Jsonb => "JSONB",
            OrmScalar::Blob => "BLOB",
            OrmScalar::Inet => "INET",
            OrmScalar::Cidr => "CIDR",
            OrmScalar::MacAddr => "MACADDR",
            OrmScalar::TsVector => "TSVECTOR",
            OrmScalar::Geometry => "GEOMETRY",
            OrmScalar::Geography => "GEOGRAPHY",
            OrmScalar::Hstore => "HSTORE",
            OrmScalar::Enum => "ENUM",
            OrmScalar::Raw => "RAW",
            OrmScalar::Custom(name) => name,
        }
    }

    /// Parse a vocabulary name, keeping unknown names as `Custom`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "SMALLINT" => OrmScalar::SmallInt,
            "INTEGER" => OrmScalar::Integer,
            "BIGINT" => OrmScalar::BigInt,
            "REAL" => OrmScalar::Real,
            "DOUBLE" => OrmScalar::Double,
            "DECIMAL" => OrmScalar::Decimal,
            "BOOLEAN" => OrmScalar::Boolean,
            "STRING" => OrmScalar::String,
            "CHAR" => OrmScalar::Char,
            "TEXT" => OrmScalar::Text,
            "CITEXT" => OrmScalar::Citext,
            "UUID" => OrmScalar::Uuid,
            "DATEONLY" => OrmScalar::DateOnly,
            "DATE" => OrmScalar::Date,
            "TIME" => OrmScalar::Time,
            "JSON" => OrmScalar::Json,
            "JSONB" => OrmScalar::Jsonb,
            "BLOB" => OrmScalar::Blob,
            "INET" => OrmScalar::Inet,
            "CIDR" => OrmScalar::Cidr,
            "MACADDR" => OrmScalar::MacAddr,
            "TSVECTOR" => OrmScalar::TsVector,
            "GEOMETRY" => OrmScalar::Geometry,
            "GEOGRAPHY" => OrmScalar::Geography,
            "HSTORE" => OrmScalar::Hstore,
            "ENUM" => OrmScalar::Enum,
            "RAW" => OrmScalar::Raw,
            _ => OrmScalar::Custom(name.trim().to_string()),
        }
    }
}

/// An ORM type: a scalar, or an array/range wrapping another ORM type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrmType {
    Scalar(OrmScalar),
    Array(Box<OrmType>),
    Range(Box<OrmType>),
}

impl OrmType {
    /// Outermost type name (`ARRAY`, `RANGE` or the scalar name).
    pub fn name(&self) -> &str {
        match self {
            OrmType::Scalar(scalar) => scalar.name(),
            OrmType::Array(_) => "ARRAY",
            OrmType::Range(_) => "RANGE",
        }
    }

    /// Innermost scalar.
    pub fn innermost(&self) -> &OrmScalar {
        match self {
            OrmType::Scalar(scalar) => scalar,
            OrmType::Array(inner) | OrmType::Range(inner) => inner.innermost(),
        }
    }

    /// Parametric expression without facets (`ARRAY(TEXT)`).
    pub fn expression(&self) -> String {
        self.expression_with(None)
    }

    /// Parametric expression, appending `facet` to the innermost scalar.
    pub fn expression_with(&self, facet: Option<&str>) -> String {
        match self {
            OrmType::Scalar(scalar) => match facet {
                Some(facet) => format!("{}({})", scalar.name(), facet),
                None => scalar.name().to_string(),
            },
            OrmType::Array(inner) => format!("ARRAY({})", inner.expression_with(facet)),
            OrmType::Range(inner) => format!("RANGE({})", inner.expression_with(facet)),
        }
    }
}

/// A host-language (TypeScript) type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostType {
    Number,
    String,
    Boolean,
    Date,
    Buffer,
    Object,
    Any,
    Unknown,
    Array(Box<HostType>),
    /// Lower/upper bound pair.
    Range(Box<HostType>),
    /// A type referenced by name or spelled out literally.
    Named(String),
}

impl HostType {
    /// Parse a host type name, keeping unknown names as `Named`.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "number" => HostType::Number,
            "string" => HostType::String,
            "boolean" => HostType::Boolean,
            "Date" => HostType::Date,
            "Buffer" => HostType::Buffer,
            "object" => HostType::Object,
            "any" => HostType::Any,
            "unknown" => HostType::Unknown,
            other => HostType::Named(other.to_string()),
        }
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostType::Number => write!(f, "number"),
            HostType::String => write!(f, "string"),
            HostType::Boolean => write!(f, "boolean"),
            HostType::Date => write!(f, "Date"),
            HostType::Buffer => write!(f, "Buffer"),
            HostType::Object => write!(f, "object"),
            HostType::Any => write!(f, "any"),
            HostType::Unknown => write!(f, "unknown"),
            HostType::Array(inner) => write!(f, "Array<{}>", inner),
            HostType::Range(inner) => write!(f, "[{}, {}]", inner, inner),
            HostType::Named(name) => write!(f, "{}", name),
        }
    }
}

/// Broad family of a native type; decides which facets apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeFamily {
    Integer,
    Float,
    /// Fixed-precision numeric; takes precision and scale.
    Decimal,
    /// Bounded character type; takes a length.
    Character,
    Text,
    Temporal,
    Boolean,
    Json,
    Binary,
    Range,
    Other,
}

/// Whether a lookup hit the vocabulary or fell back to the generic type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    /// Every component of the type was recognized.
    Exact,
    /// At least one component degraded to the generic fallback.
    Fallback,
}

impl Confidence {
    /// Combine two confidences; any fallback wins.
    pub fn and(self, other: Confidence) -> Confidence {
        if self == Confidence::Fallback || other == Confidence::Fallback {
            Confidence::Fallback
        } else {
            Confidence::Exact
        }
    }
}

/// One vocabulary entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyEntry {
    /// ORM scalar.
    pub orm: OrmScalar,
    /// Host type.
    pub host: HostType,
    /// Type family.
    pub family: TypeFamily,
}

/// Result of resolving a native type against the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeLookup {
    /// ORM type (arrays and ranges wrapped).
    pub orm: OrmType,
    /// Host type (arrays and ranges wrapped).
    pub host: HostType,
    /// Family of the innermost scalar.
    pub family: TypeFamily,
    /// Exact or fallback.
    pub confidence: Confidence,
}

impl TypeLookup {
    fn fallback() -> Self {
        Self {
            orm: OrmType::Scalar(OrmScalar::String),
            host: HostType::Any,
            family: TypeFamily::Other,
            confidence: Confidence::Fallback,
        }
    }
}

/// A parsed native type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeType {
    /// Lowercased base name without modifiers, array markers or schema.
    pub base: String,
    /// Inline type modifiers (`numeric(10,2)` -> `["10", "2"]`).
    pub modifiers: Vec<String>,
    /// Number of array dimensions.
    pub array_depth: usize,
}

impl NativeType {
    /// Parse a native type name.
    ///
    /// Arrays are recognized by trailing `[]` (any depth) or the catalog's
    /// leading-underscore convention (`_int4`).
    pub fn parse(raw: &str) -> Self {
        let mut text = raw.trim().to_ascii_lowercase();
        let mut array_depth = 0;

        while let Some(stripped) = text.trim_end().strip_suffix("[]") {
            text = stripped.to_string();
            array_depth += 1;
        }
        if array_depth == 0 {
            if let Some(stripped) = text.strip_prefix('_') {
                text = stripped.to_string();
                array_depth = 1;
            }
        }

        let (base, modifiers) = match (text.find('('), text.rfind(')')) {
            (Some(open), Some(close)) if close > open => {
                let modifiers = text[open + 1..close]
                    .split(',')
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .collect();
                (format!("{} {}", &text[..open], &text[close + 1..]), modifiers)
            }
            _ => (text, Vec::new()),
        };

        let base = base.split_whitespace().collect::<Vec<_>>().join(" ");
        let base = match base.rsplit_once('.') {
            Some((_, unqualified)) => unqualified.to_string(),
            None => base,
        };

        Self {
            base: base.trim_matches('"').to_string(),
            modifiers,
            array_depth,
        }
    }

    /// A plain scalar native type.
    pub fn scalar(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            modifiers: Vec::new(),
            array_depth: 0,
        }
    }

    /// Check if this is an array type.
    pub fn is_array(&self) -> bool {
        self.array_depth > 0
    }

    /// The element type of an array (one dimension removed).
    pub fn element(&self) -> NativeType {
        Self {
            base: self.base.clone(),
            modifiers: self.modifiers.clone(),
            array_depth: self.array_depth.saturating_sub(1),
        }
    }

    /// Base type of a range (`int4range` -> `int4`, `tstzrange` -> `timestamptz`).
    pub fn range_base(&self) -> Option<String> {
        let prefix = self.base.strip_suffix("range")?;
        let prefix = prefix.trim_end_matches('_');
        if prefix.is_empty() {
            return None;
        }
        let base = match prefix {
            "num" => "numeric",
            "ts" => "timestamp",
            "tstz" => "timestamptz",
            other => other,
        };
        Some(base.to_string())
    }
}

/// Immutable lookup tables from native type names to ORM and host types.
#[derive(Debug, Clone)]
pub struct TypeVocabulary {
    entries: HashMap<String, VocabularyEntry>,
}

impl TypeVocabulary {
    /// Create an empty vocabulary; every lookup falls back.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// The PostgreSQL vocabulary.
    pub fn postgres() -> Self {
        use HostType as H;
        use OrmScalar as O;
        use TypeFamily as F;

        let table: &[(&[&str], O, H, F)] = &[
            (&["smallint", "int2", "smallserial", "serial2"], O::SmallInt, H::Number, F::Integer),
            (&["integer", "int", "int4", "serial", "serial4", "oid"], O::Integer, H::Number, F::Integer),
            (&["bigint", "int8", "bigserial", "serial8"], O::BigInt, H::String, F::Integer),
            (&["real", "float4"], O::Real, H::Number, F::Float),
            (&["double precision", "float8", "float"], O::Double, H::Number, F::Float),
            (&["numeric", "decimal"], O::Decimal, H::String, F::Decimal),
            (&["money"], O::Decimal, H::String, F::Other),
            (&["boolean", "bool"], O::Boolean, H::Boolean, F::Boolean),
            (&["character varying", "varchar"], O::String, H::String, F::Character),
            (&["character", "char", "bpchar"], O::Char, H::String, F::Character),
            (&["text", "name", "xml"], O::Text, H::String, F::Text),
            (&["citext"], O::Citext, H::String, F::Text),
            (&["uuid"], O::Uuid, H::String, F::Other),
            (&["date"], O::DateOnly, H::String, F::Temporal),
            (
                &["timestamp", "timestamp without time zone", "timestamptz", "timestamp with time zone"],
                O::Date,
                H::Date,
                F::Temporal,
            ),
            (
                &["time", "time without time zone", "timetz", "time with time zone"],
                O::Time,
                H::String,
                F::Temporal,
            ),
            (&["interval"], O::String, H::String, F::Other),
            (&["json"], O::Json, H::Object, F::Json),
            (&["jsonb"], O::Jsonb, H::Object, F::Json),
            (&["bytea"], O::Blob, H::Buffer, F::Binary),
            (&["inet"], O::Inet, H::String, F::Other),
            (&["cidr"], O::Cidr, H::String, F::Other),
            (&["macaddr", "macaddr8"], O::MacAddr, H::String, F::Other),
            (&["tsvector"], O::TsVector, H::String, F::Other),
            (&["bit", "bit varying", "varbit"], O::String, H::String, F::Other),
            (&["geometry", "point", "polygon", "linestring"], O::Geometry, H::Object, F::Other),
            (&["geography"], O::Geography, H::Object, F::Other),
            (
                &["hstore"],
                O::Hstore,
                H::Named("Record<string, string>".to_string()),
                F::Other,
            ),
        ];

        let mut entries = HashMap::new();
        for (names, orm, host, family) in table {
            for name in names.iter() {
                entries.insert(
                    name.to_string(),
                    VocabularyEntry {
                        orm: orm.clone(),
                        host: host.clone(),
                        family: *family,
                    },
                );
            }
        }

        Self { entries }
    }

    /// Add or replace the mapping of a native type name.
    pub fn with_override(mut self, native: &str, orm: OrmScalar, host: HostType) -> Self {
        let key = NativeType::parse(native).base;
        let family = self
            .entries
            .get(&key)
            .map(|entry| entry.family)
            .unwrap_or(TypeFamily::Other);
        self.entries
            .insert(key, VocabularyEntry { orm, host, family });
        self
    }

    /// Number of native names known to the vocabulary.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the vocabulary has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up a scalar entry by its base name.
    pub fn entry(&self, base: &str) -> Option<&VocabularyEntry> {
        self.entries.get(base)
    }

    /// ORM type of a native type, or `None` for an unrecognized scalar.
    ///
    /// Arrays and ranges always resolve; an unknown element degrades to the
    /// generic element type inside the wrapper.
    pub fn lookup(&self, native: &str) -> Option<OrmType> {
        let parsed = NativeType::parse(native);
        if parsed.is_array() || self.entries.contains_key(&parsed.base) || parsed.range_base().is_some() {
            Some(self.resolve_native(&parsed).orm)
        } else {
            None
        }
    }

    /// Resolve a native type name; never fails.
    pub fn resolve(&self, native: &str) -> TypeLookup {
        self.resolve_native(&NativeType::parse(native))
    }

    /// Resolve a parsed native type; never fails.
    pub fn resolve_native(&self, native: &NativeType) -> TypeLookup {
        if native.is_array() {
            let element = self.resolve_native(&native.element());
            return TypeLookup {
                orm: OrmType::Array(Box::new(element.orm)),
                host: HostType::Array(Box::new(element.host)),
                family: element.family,
                confidence: element.confidence,
            };
        }

        if let Some(entry) = self.entries.get(&native.base) {
            return TypeLookup {
                orm: OrmType::Scalar(entry.orm.clone()),
                host: entry.host.clone(),
                family: entry.family,
                confidence: Confidence::Exact,
            };
        }

        if let Some(base) = native.range_base() {
            let inner = self.resolve_native(&NativeType::scalar(base));
            return TypeLookup {
                orm: OrmType::Range(Box::new(inner.orm)),
                host: HostType::Range(Box::new(inner.host)),
                family: TypeFamily::Range,
                confidence: inner.confidence,
            };
        }

        TypeLookup::fallback()
    }
}

impl Default for TypeVocabulary {
    fn default() -> Self {
        Self::postgres()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_native_type() {
        let parsed = NativeType::parse("  NUMERIC(10, 2) ");
        assert_eq!(parsed.base, "numeric");
        assert_eq!(parsed.modifiers, vec!["10", "2"]);
        assert!(!parsed.is_array());

        let parsed = NativeType::parse("timestamp(6) with time zone");
        assert_eq!(parsed.base, "timestamp with time zone");
        assert_eq!(parsed.modifiers, vec!["6"]);

        let parsed = NativeType::parse("varchar(20)[][]");
        assert_eq!(parsed.base, "varchar");
        assert_eq!(parsed.array_depth, 2);

        let parsed = NativeType::parse("_int4");
        assert_eq!(parsed.base, "int4");
        assert_eq!(parsed.array_depth, 1);

        let parsed = NativeType::parse("pg_catalog.int8");
        assert_eq!(parsed.base, "int8");
    }

    #[test]
    fn test_lookup_scalars_case_insensitively() {
        let vocab = TypeVocabulary::postgres();
        assert_eq!(
            vocab.lookup(" Integer "),
            Some(OrmType::Scalar(OrmScalar::Integer))
        );
        assert_eq!(
            vocab.lookup("DOUBLE PRECISION"),
            Some(OrmType::Scalar(OrmScalar::Double))
        );
        assert_eq!(vocab.lookup("made_up_type"), None);
    }

    #[test]
    fn test_arrays_unwrap_recursively() {
        let vocab = TypeVocabulary::postgres();
        let lookup = vocab.resolve("text[]");
        assert_eq!(lookup.orm.expression(), "ARRAY(TEXT)");
        assert_eq!(lookup.host.to_string(), "Array<string>");
        assert_eq!(lookup.confidence, Confidence::Exact);

        let nested = vocab.resolve("int4[][]");
        assert_eq!(nested.orm.expression(), "ARRAY(ARRAY(INTEGER))");
        assert_eq!(nested.host.to_string(), "Array<Array<number>>");
    }

    #[test]
    fn test_unknown_array_element_falls_back() {
        let vocab = TypeVocabulary::postgres();
        let lookup = vocab.resolve("mystery[]");
        assert_eq!(lookup.orm.expression(), "ARRAY(STRING)");
        assert_eq!(lookup.host.to_string(), "Array<any>");
        assert_eq!(lookup.confidence, Confidence::Fallback);
        assert!(vocab.lookup("mystery[]").is_some());
    }

    #[test]
    fn test_ranges_unwrap_to_base() {
        let vocab = TypeVocabulary::postgres();
        let lookup = vocab.resolve("int4range");
        assert_eq!(lookup.orm.expression(), "RANGE(INTEGER)");
        assert_eq!(lookup.host.to_string(), "[number, number]");

        let lookup = vocab.resolve("tstzrange");
        assert_eq!(lookup.orm.expression(), "RANGE(DATE)");
        assert_eq!(lookup.family, TypeFamily::Range);
    }

    #[test]
    fn test_unknown_scalar_falls_back() {
        let vocab = TypeVocabulary::postgres();
        let lookup = vocab.resolve("ltree");
        assert_eq!(lookup.orm, OrmType::Scalar(OrmScalar::String));
        assert_eq!(lookup.host, HostType::Any);
        assert_eq!(lookup.confidence, Confidence::Fallback);
    }

    #[test]
    fn test_override_replaces_mapping() {
        let vocab = TypeVocabulary::postgres().with_override(
            "ltree",
            OrmScalar::from_name("LTREE"),
            HostType::from_name("string"),
        );
        let lookup = vocab.resolve("ltree");
        assert_eq!(lookup.orm.expression(), "LTREE");
        assert_eq!(lookup.host, HostType::String);
        assert_eq!(lookup.confidence, Confidence::Exact);
    }

    #[test]
    fn test_expression_with_facet() {
        let decimal = OrmType::Array(Box::new(OrmType::Scalar(OrmScalar::Decimal)));
        assert_eq!(decimal.expression_with(Some("10, 2")), "ARRAY(DECIMAL(10, 2))");
        assert_eq!(decimal.name(), "ARRAY");
        assert_eq!(decimal.innermost(), &OrmScalar::Decimal);
    }
}
