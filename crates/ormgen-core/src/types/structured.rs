//! Structured-type synthesis for JSON-like columns.
//!
//! A sample payload is walked once. Objects become named sub-types (named
//! after their key), arrays take the shape of their first element, and a
//! named type that reappears on its own descent path is cut off with
//! `unknown`. Names reserved by the caller are never reused: a clashing
//! sub-type is prefixed with the root name.

use crate::naming;
use crate::types::vocabulary::HostType;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::debug;

/// Default maximum nesting depth walked during synthesis.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Open-ended key/value shape used when nothing is known about a payload.
pub const OPEN_SHAPE: &str = "{ [key: string]: unknown }";

/// Shape of one JSON value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    /// A primitive host type.
    Primitive(HostType),
    /// Reference to a synthesized sub-type.
    Named(String),
    /// Array of a shape.
    Array(Box<Shape>),
    /// Open-ended key/value object.
    Open,
    /// Nothing could be inferred (null, empty array, cycle, depth limit).
    Unknown,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Primitive(host) => write!(f, "{}", host),
            Shape::Named(name) => write!(f, "{}", name),
            Shape::Array(inner) => write!(f, "Array<{}>", inner),
            Shape::Open => write!(f, "{}", OPEN_SHAPE),
            Shape::Unknown => write!(f, "unknown"),
        }
    }
}

/// A field of a synthesized sub-type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeField {
    /// JSON key.
    pub name: String,
    /// Field shape.
    pub shape: Shape,
}

/// A named sub-type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDefinition {
    /// Type name (UpperCamelCase).
    pub name: String,
    /// Fields in key order.
    pub fields: Vec<ShapeField>,
}

impl TypeDefinition {
    /// Render as an interface declaration.
    pub fn render(&self) -> String {
        let mut out = format!("interface {} {{\n", self.name);
        for field in &self.fields {
            out.push_str(&format!("  {}: {};\n", property_key(&field.name), field.shape));
        }
        out.push('}');
        out
    }
}

fn property_key(key: &str) -> String {
    let mut chars = key.chars();
    let valid = match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    };
    if valid {
        key.to_string()
    } else {
        format!("'{}'", key.replace('\'', "\\'"))
    }
}

/// Synthesized structure of a JSON column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredType {
    /// Shape of the whole payload.
    pub root: Shape,
    /// Sub-type definitions, dependencies first.
    pub definitions: Vec<TypeDefinition>,
}

impl StructuredType {
    /// The open key/value shape.
    pub fn open() -> Self {
        Self {
            root: Shape::Open,
            definitions: Vec::new(),
        }
    }

    /// Check if this is the open shape.
    pub fn is_open(&self) -> bool {
        self.root == Shape::Open
    }

    /// Host type text for the column.
    pub fn host_type(&self) -> String {
        self.root.to_string()
    }

    /// Rendered definitions, dependencies first.
    pub fn render_definitions(&self) -> Vec<String> {
        self.definitions.iter().map(TypeDefinition::render).collect()
    }
}

struct Synthesis<'a> {
    reserved: &'a BTreeSet<String>,
    prefix: String,
    assigned: BTreeMap<String, String>,
    definitions: Vec<TypeDefinition>,
    path: Vec<String>,
}

impl Synthesis<'_> {
    /// Name for the sub-type naturally called `natural`; stable within one
    /// structure.
    fn claim(&mut self, natural: &str) -> String {
        if let Some(name) = self.assigned.get(natural) {
            return name.clone();
        }

        let base = if self.reserved.contains(natural) && natural != self.prefix {
            format!("{}{}", self.prefix, natural)
        } else {
            natural.to_string()
        };
        let mut name = base.clone();
        let mut suffix = 2;
        while self.is_taken(&name) {
            name = format!("{}{}", base, suffix);
            suffix += 1;
        }
        if name != natural {
            debug!(natural = %natural, name = %name, "sub-type renamed to avoid a clash");
        }

        self.assigned.insert(natural.to_string(), name.clone());
        name
    }

    fn is_taken(&self, name: &str) -> bool {
        self.reserved.contains(name) || self.assigned.values().any(|n| n == name)
    }
}

/// Infers a [`StructuredType`] from a sample payload.
#[derive(Debug, Clone, Copy)]
pub struct ShapeSynthesizer {
    max_depth: usize,
}

impl ShapeSynthesizer {
    /// Create a synthesizer with the given depth limit.
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Synthesize a structure; without a sample the open shape is returned.
    pub fn synthesize(&self, root_name: &str, sample: Option<&Value>) -> StructuredType {
        self.synthesize_reserved(root_name, sample, &BTreeSet::new())
    }

    /// Like [`synthesize`](Self::synthesize), avoiding the `reserved` type
    /// names (other columns' sub-types, enums, composites).
    pub fn synthesize_reserved(
        &self,
        root_name: &str,
        sample: Option<&Value>,
        reserved: &BTreeSet<String>,
    ) -> StructuredType {
        let Some(sample) = sample else {
            return StructuredType::open();
        };

        let mut state = Synthesis {
            reserved,
            prefix: naming::type_name(root_name),
            assigned: BTreeMap::new(),
            definitions: Vec::new(),
            path: Vec::new(),
        };
        let root = self.shape_of(root_name, sample, &mut state, 0);
        StructuredType {
            root,
            definitions: state.definitions,
        }
    }

    fn shape_of(&self, name: &str, value: &Value, state: &mut Synthesis<'_>, depth: usize) -> Shape {
        match value {
            Value::Null => Shape::Unknown,
            Value::Bool(_) => Shape::Primitive(HostType::Boolean),
            Value::Number(_) => Shape::Primitive(HostType::Number),
            Value::String(_) => Shape::Primitive(HostType::String),
            Value::Array(items) => match items.first() {
                Some(first) => {
                    let element = naming::singularize(name);
                    Shape::Array(Box::new(self.shape_of(&element, first, state, depth + 1)))
                }
                None => Shape::Array(Box::new(Shape::Unknown)),
            },
            Value::Object(map) if map.is_empty() => Shape::Open,
            Value::Object(map) => {
                if depth > self.max_depth {
                    debug!(key = %name, depth, "structure depth limit reached");
                    return Shape::Unknown;
                }
                let type_name = state.claim(&naming::type_name(name));

                if state.path.contains(&type_name) {
                    debug!(type_name = %type_name, "cyclic structure reference replaced");
                    return Shape::Unknown;
                }
                if state.definitions.iter().any(|d| d.name == type_name) {
                    return Shape::Named(type_name);
                }

                state.path.push(type_name.clone());
                let fields = map
                    .iter()
                    .map(|(key, value)| ShapeField {
                        name: key.clone(),
                        shape: self.shape_of(key, value, state, depth + 1),
                    })
                    .collect();
                state.path.pop();

                state.definitions.push(TypeDefinition {
                    name: type_name.clone(),
                    fields,
                });
                Shape::Named(type_name)
            }
        }
    }
}

impl Default for ShapeSynthesizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_sample_is_open() {
        let structured = ShapeSynthesizer::default().synthesize("Settings", None);
        assert!(structured.is_open());
        assert_eq!(structured.host_type(), "{ [key: string]: unknown }");
    }

    #[test]
    fn test_flat_object() {
        let sample = json!({"theme": "dark", "fontSize": 12, "beta": true});
        let structured = ShapeSynthesizer::default().synthesize("UserSettings", Some(&sample));

        assert_eq!(structured.host_type(), "UserSettings");
        assert_eq!(structured.definitions.len(), 1);
        assert_eq!(
            structured.definitions[0].render(),
            "interface UserSettings {\n  beta: boolean;\n  fontSize: number;\n  theme: string;\n}"
        );
    }

    #[test]
    fn test_nested_objects_become_named_subtypes() {
        let sample = json!({"address": {"city": "Lagos"}, "tags": [{"label": "x"}], "empty": []});
        let structured = ShapeSynthesizer::default().synthesize("Profile", Some(&sample));

        let names: Vec<_> = structured.definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["Address", "Tag", "Profile"]);

        let profile = structured.definitions.last().unwrap();
        let shapes: Vec<_> = profile.fields.iter().map(|f| f.shape.to_string()).collect();
        assert_eq!(shapes, vec!["Address", "Array<unknown>", "Array<Tag>"]);
    }

    #[test]
    fn test_repeated_names_converge() {
        let sample = json!({"billing": {"address": {"city": "a"}}, "shipping": {"address": {"city": "b"}}});
        let structured = ShapeSynthesizer::default().synthesize("Order", Some(&sample));
        let address_count = structured
            .definitions
            .iter()
            .filter(|d| d.name == "Address")
            .count();
        assert_eq!(address_count, 1);
    }

    #[test]
    fn test_reserved_names_are_prefixed() {
        let reserved: BTreeSet<String> = ["Address".to_string(), "Status".to_string()].into();
        let sample = json!({
            "address": {"zip": "10115"},
            "history": [{"address": {"zip": "10117"}}],
            "status": {"code": 1},
        });
        let structured = ShapeSynthesizer::default().synthesize_reserved(
            "UserShipping",
            Some(&sample),
            &reserved,
        );

        let names: Vec<_> = structured.definitions.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["UserShippingAddress", "History", "UserShippingStatus", "UserShipping"]
        );
        let history = &structured.definitions[1];
        assert_eq!(history.fields[0].shape, Shape::Named("UserShippingAddress".into()));
    }

    #[test]
    fn test_reserved_root_name_gets_suffix() {
        let reserved: BTreeSet<String> = ["UserStatus".to_string()].into();
        let sample = json!({"code": 1});
        let structured =
            ShapeSynthesizer::default().synthesize_reserved("UserStatus", Some(&sample), &reserved);
        assert_eq!(structured.host_type(), "UserStatus2");
    }

    #[test]
    fn test_cycle_is_broken() {
        let sample = json!({"child": {"node": {"value": 1}}});
        let structured = ShapeSynthesizer::default().synthesize("Node", Some(&sample));

        let child = structured
            .definitions
            .iter()
            .find(|d| d.name == "Child")
            .unwrap();
        assert_eq!(child.fields[0].shape, Shape::Unknown);
    }

    #[test]
    fn test_depth_limit() {
        let sample = json!({"a": {"b": {"c": {"d": 1}}}});
        let structured = ShapeSynthesizer::new(1).synthesize("Root", Some(&sample));
        let b = structured.definitions.iter().find(|d| d.name == "B");
        assert!(b.is_none());
    }

    #[test]
    fn test_invalid_identifier_keys_are_quoted() {
        let sample = json!({"content-type": "json"});
        let structured = ShapeSynthesizer::default().synthesize("Headers", Some(&sample));
        assert!(structured.definitions[0].render().contains("'content-type': string;"));
    }
}
