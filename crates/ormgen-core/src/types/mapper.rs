//! Column type mapping.
//!
//! Produces the ORM type expression and the host type for one column from its
//! native type, its user-defined type classification and, for JSON columns,
//! a sample payload.

use crate::catalog::rows::ColumnRow;
use crate::model::column::DefaultValue;
use crate::model::user_type::{CompositeTypeDescriptor, EnumDescriptor, UserDefinedType};
use crate::types::facets::{NumericFacetExtractor, RawFacets};
use crate::types::structured::{
    Shape, ShapeField, ShapeSynthesizer, StructuredType, TypeDefinition, DEFAULT_MAX_DEPTH,
};
use crate::types::vocabulary::{
    Confidence, NativeType, OrmScalar, OrmType, TypeFamily, TypeVocabulary,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Everything the mapper needs to know about one column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnInput<'a> {
    /// The catalog row.
    pub row: &'a ColumnRow,
    /// Resolved classification.
    pub user_type: &'a UserDefinedType,
    /// Host type name to reference instead of spelling the type out.
    pub type_reference: Option<&'a str>,
    /// Longest sample payload for JSON columns.
    pub sample: Option<&'a Value>,
    /// Parsed column default.
    pub default_value: Option<&'a DefaultValue>,
    /// Type names already used elsewhere in the table.
    pub reserved_names: Option<&'a BTreeSet<String>>,
}

impl<'a> ColumnInput<'a> {
    /// Input for a plain column with nothing but its row.
    pub fn plain(row: &'a ColumnRow) -> Self {
        static PLAIN: UserDefinedType = UserDefinedType::Plain;
        Self {
            row,
            user_type: &PLAIN,
            type_reference: None,
            sample: None,
            default_value: None,
            reserved_names: None,
        }
    }
}

/// Result of mapping a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappedType {
    /// ORM type.
    pub orm_type: OrmType,
    /// Parametric ORM expression (`DECIMAL(10, 2)`, `ARRAY(TEXT)`).
    pub orm_type_expression: String,
    /// Host type.
    pub host_type: String,
    /// Host type as used on model attributes (`CreationOptional<T>` when the
    /// value may be omitted on creation).
    pub host_type_expression: String,
    /// Synthesized structure of a JSON column.
    pub structured_type: Option<StructuredType>,
    /// Free-form note (`domain price`).
    pub annotation: Option<String>,
    /// Whether the model needs custom getters/setters for this column.
    pub custom_accessors: bool,
    /// Exact or fallback.
    pub confidence: Confidence,
}

impl MappedType {
    /// ORM expression with the annotation as a trailing comment.
    pub fn annotated_expression(&self) -> String {
        match &self.annotation {
            Some(annotation) => format!("{} /* {} */", self.orm_type_expression, annotation),
            None => self.orm_type_expression.clone(),
        }
    }
}

/// Maps columns onto ORM and host types.
#[derive(Debug, Clone)]
pub struct TypeMapper {
    vocabulary: Arc<TypeVocabulary>,
    synthesizer: ShapeSynthesizer,
}

impl TypeMapper {
    /// Create a mapper over a shared vocabulary.
    pub fn new(vocabulary: Arc<TypeVocabulary>) -> Self {
        Self {
            vocabulary,
            synthesizer: ShapeSynthesizer::new(DEFAULT_MAX_DEPTH),
        }
    }

    /// Set the maximum nesting depth for structured-type synthesis.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.synthesizer = ShapeSynthesizer::new(max_depth);
        self
    }

    /// The shared vocabulary.
    pub fn vocabulary(&self) -> &TypeVocabulary {
        &self.vocabulary
    }

    /// Map one column.
    pub fn map(&self, input: &ColumnInput<'_>) -> MappedType {
        let native = NativeType::parse(&input.row.native_type());
        let facets = input.row.raw_facets();

        let mut mapped = match input.user_type {
            UserDefinedType::Enum(descriptor) => {
                map_enum(descriptor, native.array_depth, input.type_reference)
            }
            UserDefinedType::Composite(descriptor) => {
                self.map_composite(descriptor, native.array_depth, input.type_reference)
            }
            UserDefinedType::Domain(descriptor) => {
                let base = NativeType::parse(&descriptor.base_type);
                let mut mapped = self.map_plain(&base, &facets, input);
                mapped.annotation = Some(format!("domain {}", descriptor.name));
                mapped
            }
            UserDefinedType::Plain => self.map_plain(&native, &facets, input),
        };

        mapped.host_type_expression = if input.row.is_primary_key || input.row.is_nullable {
            format!("CreationOptional<{}>", mapped.host_type)
        } else {
            mapped.host_type.clone()
        };
        mapped
    }

    fn map_plain(
        &self,
        native: &NativeType,
        facets: &RawFacets<'_>,
        input: &ColumnInput<'_>,
    ) -> MappedType {
        let lookup = self.vocabulary.resolve_native(native);

        let facet = match lookup.family {
            TypeFamily::Decimal => {
                let numeric = if native.modifiers.is_empty() {
                    NumericFacetExtractor::facets(Some(facets))
                } else {
                    NumericFacetExtractor::from_modifiers(&native.modifiers)
                };
                numeric.parameters()
            }
            TypeFamily::Character => native
                .modifiers
                .first()
                .and_then(|m| m.parse::<u32>().ok())
                .or_else(|| NumericFacetExtractor::character_length(Some(facets)))
                .map(|length| length.to_string()),
            _ => None,
        };
        let orm_type_expression = lookup.orm.expression_with(facet.as_deref());

        let structured_type = (lookup.family == TypeFamily::Json && !native.is_array()).then(|| {
            let sample = input
                .sample
                .or_else(|| input.default_value.and_then(DefaultValue::as_json));
            let root = input.type_reference.unwrap_or("Json");
            match input.reserved_names {
                Some(reserved) => self.synthesizer.synthesize_reserved(root, sample, reserved),
                None => self.synthesizer.synthesize(root, sample),
            }
        });
        let host_type = match &structured_type {
            Some(structured) => structured.host_type(),
            None => lookup.host.to_string(),
        };

        MappedType {
            orm_type: lookup.orm,
            orm_type_expression,
            host_type_expression: host_type.clone(),
            host_type,
            structured_type,
            annotation: None,
            custom_accessors: false,
            confidence: lookup.confidence,
        }
    }

    fn map_composite(
        &self,
        descriptor: &CompositeTypeDescriptor,
        array_depth: usize,
        type_reference: Option<&str>,
    ) -> MappedType {
        let expression = format!("RAW({}: {})", descriptor.name, descriptor.field_list());
        let fields: Vec<ShapeField> = descriptor
            .attributes()
            .map(|(name, native)| ShapeField {
                name: name.to_string(),
                shape: Shape::Primitive(self.vocabulary.resolve(native).host),
            })
            .collect();

        let (host, structured_type) = match type_reference {
            Some(reference) => (
                reference.to_string(),
                Some(StructuredType {
                    root: Shape::Named(reference.to_string()),
                    definitions: vec![TypeDefinition {
                        name: reference.to_string(),
                        fields,
                    }],
                }),
            ),
            None => {
                let inline = fields
                    .iter()
                    .map(|f| format!("{}: {}", f.name, f.shape))
                    .collect::<Vec<_>>();
                (format!("{{ {} }}", inline.join("; ")), None)
            }
        };
        let host_type = wrap_host(host, array_depth);

        MappedType {
            orm_type: wrap_orm(OrmType::Scalar(OrmScalar::Raw), array_depth),
            orm_type_expression: wrap_expression(expression, array_depth),
            host_type_expression: host_type.clone(),
            host_type,
            structured_type,
            annotation: Some(format!("composite {}", descriptor.name)),
            custom_accessors: true,
            confidence: Confidence::Exact,
        }
    }
}

impl Default for TypeMapper {
    fn default() -> Self {
        Self::new(Arc::new(TypeVocabulary::postgres()))
    }
}

fn map_enum(
    descriptor: &EnumDescriptor,
    array_depth: usize,
    type_reference: Option<&str>,
) -> MappedType {
    let expression = format!("ENUM({})", descriptor.literal_list());
    let host = type_reference
        .map(str::to_string)
        .unwrap_or_else(|| descriptor.literal_union());
    let host_type = wrap_host(host, array_depth);

    MappedType {
        orm_type: wrap_orm(OrmType::Scalar(OrmScalar::Enum), array_depth),
        orm_type_expression: wrap_expression(expression, array_depth),
        host_type_expression: host_type.clone(),
        host_type,
        structured_type: None,
        annotation: None,
        custom_accessors: false,
        confidence: Confidence::Exact,
    }
}

fn wrap_orm(orm: OrmType, depth: usize) -> OrmType {
    (0..depth).fold(orm, |inner, _| OrmType::Array(Box::new(inner)))
}

fn wrap_expression(expression: String, depth: usize) -> String {
    (0..depth).fold(expression, |inner, _| format!("ARRAY({})", inner))
}

fn wrap_host(host: String, depth: usize) -> String {
    (0..depth).fold(host, |inner, _| format!("Array<{}>", inner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::user_type::DomainTypeDescriptor;
    use serde_json::json;

    fn mapper() -> TypeMapper {
        TypeMapper::default()
    }

    #[test]
    fn test_numeric_with_facets() {
        let row = ColumnRow::new("public", "products", "price", "numeric").with_precision("10", "2");
        let mapped = mapper().map(&ColumnInput::plain(&row));
        assert_eq!(mapped.orm_type_expression, "DECIMAL(10, 2)");
        assert_eq!(mapped.host_type, "string");
        assert_eq!(mapped.confidence, Confidence::Exact);
    }

    #[test]
    fn test_numeric_precision_only() {
        let mut row = ColumnRow::new("public", "products", "qty", "numeric");
        row.numeric_precision = Some("12".into());
        let mapped = mapper().map(&ColumnInput::plain(&row));
        assert_eq!(mapped.orm_type_expression, "DECIMAL(12)");
    }

    #[test]
    fn test_character_length() {
        let row = ColumnRow::new("public", "users", "email", "character varying").with_length("255");
        let mapped = mapper().map(&ColumnInput::plain(&row));
        assert_eq!(mapped.orm_type_expression, "STRING(255)");
        assert_eq!(mapped.host_type, "string");
    }

    #[test]
    fn test_text_array() {
        let row = ColumnRow::new("public", "posts", "tags", "ARRAY").with_udt("pg_catalog", "_text");
        let mapped = mapper().map(&ColumnInput::plain(&row));
        assert_eq!(mapped.orm_type_expression, "ARRAY(TEXT)");
        assert_eq!(mapped.host_type, "Array<string>");
    }

    #[test]
    fn test_unknown_array_element() {
        let row = ColumnRow::new("public", "posts", "paths", "ARRAY").with_udt("public", "_ltree");
        let mapped = mapper().map(&ColumnInput::plain(&row));
        assert_eq!(mapped.host_type, "Array<any>");
        assert_eq!(mapped.confidence, Confidence::Fallback);
    }

    #[test]
    fn test_creation_optional_host_expression() {
        let row = ColumnRow::new("public", "users", "id", "integer").primary_key();
        let mapped = mapper().map(&ColumnInput::plain(&row));
        assert_eq!(mapped.host_type, "number");
        assert_eq!(mapped.host_type_expression, "CreationOptional<number>");

        let row = ColumnRow::new("public", "users", "age", "integer");
        let mapped = mapper().map(&ColumnInput::plain(&row));
        assert_eq!(mapped.host_type_expression, "number");
    }

    #[test]
    fn test_enum_mapping() {
        let row = ColumnRow::new("public", "users", "mood", "USER-DEFINED").with_udt("public", "mood");
        let user_type =
            UserDefinedType::Enum(EnumDescriptor::from_raw("public", "mood", "{sad,happy}"));
        let input = ColumnInput {
            user_type: &user_type,
            ..ColumnInput::plain(&row)
        };
        let mapped = mapper().map(&input);
        assert_eq!(mapped.orm_type_expression, "ENUM('sad', 'happy')");
        assert_eq!(mapped.host_type, "'sad' | 'happy'");

        let input = ColumnInput {
            user_type: &user_type,
            type_reference: Some("Mood"),
            ..ColumnInput::plain(&row)
        };
        assert_eq!(mapper().map(&input).host_type, "Mood");
    }

    #[test]
    fn test_enum_array_mapping() {
        let row = ColumnRow::new("public", "users", "moods", "ARRAY").with_udt("public", "_mood");
        let user_type =
            UserDefinedType::Enum(EnumDescriptor::from_raw("public", "mood", "{sad,happy}"));
        let input = ColumnInput {
            user_type: &user_type,
            type_reference: Some("Mood"),
            ..ColumnInput::plain(&row)
        };
        let mapped = mapper().map(&input);
        assert_eq!(mapped.orm_type_expression, "ARRAY(ENUM('sad', 'happy'))");
        assert_eq!(mapped.host_type, "Array<Mood>");
    }

    #[test]
    fn test_composite_mapping() {
        let row =
            ColumnRow::new("public", "users", "home", "USER-DEFINED").with_udt("public", "address");
        let user_type = UserDefinedType::Composite(
            CompositeTypeDescriptor::new(
                "public",
                "address",
                vec!["street".into(), "zip".into()],
                vec!["text".into(), "integer".into()],
            )
            .unwrap(),
        );
        let input = ColumnInput {
            user_type: &user_type,
            ..ColumnInput::plain(&row)
        };
        let mapped = mapper().map(&input);
        assert_eq!(mapped.orm_type, OrmType::Scalar(OrmScalar::Raw));
        assert_eq!(mapped.orm_type_expression, "RAW(address: street: text, zip: integer)");
        assert_eq!(mapped.host_type, "{ street: string; zip: number }");
        assert!(mapped.custom_accessors);
        assert!(mapped.structured_type.is_none());

        let input = ColumnInput {
            user_type: &user_type,
            type_reference: Some("Address"),
            ..ColumnInput::plain(&row)
        };
        let mapped = mapper().map(&input);
        assert_eq!(mapped.host_type, "Address");
        assert_eq!(
            mapped.structured_type.unwrap().render_definitions(),
            vec!["interface Address {\n  street: string;\n  zip: number;\n}"]
        );
    }

    #[test]
    fn test_domain_maps_like_its_base() {
        let plain = ColumnRow::new("public", "products", "cost", "numeric(10,2)");
        let base = mapper().map(&ColumnInput::plain(&plain));

        let row = ColumnRow::new("public", "products", "cost", "numeric").with_domain("public", "price");
        let user_type =
            UserDefinedType::Domain(DomainTypeDescriptor::new("public", "price", "numeric(10,2)"));
        let input = ColumnInput {
            user_type: &user_type,
            ..ColumnInput::plain(&row)
        };
        let mapped = mapper().map(&input);

        assert_eq!(mapped.orm_type_expression, base.orm_type_expression);
        assert_eq!(mapped.host_type, base.host_type);
        assert_eq!(mapped.annotation.as_deref(), Some("domain price"));
        assert_eq!(mapped.annotated_expression(), "DECIMAL(10, 2) /* domain price */");
    }

    #[test]
    fn test_json_without_sample_is_open() {
        let row = ColumnRow::new("public", "users", "settings", "jsonb");
        let mapped = mapper().map(&ColumnInput::plain(&row));
        assert_eq!(mapped.orm_type_expression, "JSONB");
        assert_eq!(mapped.host_type, "{ [key: string]: unknown }");
        assert!(mapped.structured_type.unwrap().is_open());
    }

    #[test]
    fn test_json_from_sample() {
        let row = ColumnRow::new("public", "users", "settings", "jsonb");
        let sample = json!({"theme": "dark"});
        let input = ColumnInput {
            type_reference: Some("UserSettings"),
            sample: Some(&sample),
            ..ColumnInput::plain(&row)
        };
        let mapped = mapper().map(&input);
        assert_eq!(mapped.host_type, "UserSettings");
        assert_eq!(mapped.structured_type.unwrap().definitions.len(), 1);
    }

    #[test]
    fn test_json_from_default() {
        let row = ColumnRow::new("public", "users", "prefs", "json");
        let default = DefaultValue::Json(json!({"lang": "en"}));
        let input = ColumnInput {
            type_reference: Some("UserPrefs"),
            default_value: Some(&default),
            ..ColumnInput::plain(&row)
        };
        assert_eq!(mapper().map(&input).host_type, "UserPrefs");
    }

    #[test]
    fn test_mapping_is_idempotent() {
        let row = ColumnRow::new("public", "events", "during", "tstzrange").nullable();
        let first = mapper().map(&ColumnInput::plain(&row));
        let second = mapper().map(&ColumnInput::plain(&row));
        assert_eq!(first, second);
        assert_eq!(first.orm_type_expression, "RANGE(DATE)");
        assert_eq!(first.host_type_expression, "CreationOptional<[Date, Date]>");
    }
}
