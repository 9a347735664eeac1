//! Column descriptors and default-value parsing.

use crate::model::user_type::UserDefinedType;
use crate::types::mapper::MappedType;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default value of a column, parsed from its raw catalog expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum DefaultValue {
    /// `NULL`.
    Null,
    /// Boolean literal.
    Bool(bool),
    /// Numeric literal, kept textual to preserve precision.
    Number(String),
    /// String literal.
    String(String),
    /// Current timestamp (evaluated at insert time).
    Now,
    /// JSON literal.
    Json(Value),
    /// Any other expression, verbatim.
    Expression(String),
}

const NOW_EXPRESSIONS: &[&str] = &[
    "now()",
    "current_timestamp",
    "current_timestamp()",
    "current_date",
    "current_time",
    "localtimestamp",
    "localtime",
    "transaction_timestamp()",
    "statement_timestamp()",
    "clock_timestamp()",
];

impl DefaultValue {
    /// Parse a raw default expression.
    ///
    /// Sequence defaults (`nextval(...)`) yield `None`; they mark the column
    /// as auto-increment instead.
    pub fn parse(raw: &str) -> Option<DefaultValue> {
        let expression = strip_casts(raw.trim());
        if expression.is_empty() || is_sequence(&expression) {
            return None;
        }

        let lowered = expression.to_ascii_lowercase();
        if lowered == "null" {
            return Some(DefaultValue::Null);
        }
        if lowered == "true" || lowered == "false" {
            return Some(DefaultValue::Bool(lowered == "true"));
        }
        if NOW_EXPRESSIONS.contains(&lowered.as_str()) || lowered.starts_with("current_timestamp(") {
            return Some(DefaultValue::Now);
        }
        if let Some(literal) = unquote(&expression) {
            if literal.eq_ignore_ascii_case("now") {
                return Some(DefaultValue::Now);
            }
            if let Ok(json @ (Value::Object(_) | Value::Array(_))) =
                serde_json::from_str::<Value>(&literal)
            {
                return Some(DefaultValue::Json(json));
            }
            return Some(DefaultValue::String(literal));
        }
        if expression.parse::<f64>().is_ok() {
            return Some(DefaultValue::Number(expression));
        }
        Some(DefaultValue::Expression(expression))
    }

    /// Check if this default is the current timestamp.
    pub fn is_now(&self) -> bool {
        matches!(self, DefaultValue::Now)
    }

    /// JSON payload of a JSON default.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            DefaultValue::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Check if a raw default draws from a sequence.
pub fn is_sequence(raw: &str) -> bool {
    raw.trim().to_ascii_lowercase().starts_with("nextval(")
}

/// Remove casts applied to the whole expression and the parentheses wrapping
/// it, repeatedly. Casts inside an operand or a call are kept.
fn strip_casts(raw: &str) -> String {
    let mut current = raw.trim();
    loop {
        current = match trailing_cast(current) {
            Some(at) => current[..at].trim_end(),
            None if wrapped_in_parens(current) => current[1..current.len() - 1].trim(),
            None => break,
        };
    }
    current.to_string()
}

/// Offset of a final `::type` cast whose operand is a single term.
fn trailing_cast(raw: &str) -> Option<usize> {
    let bytes = raw.as_bytes();
    let mut in_quote = false;
    let mut depth = 0usize;
    let mut cast = None;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\'' => in_quote = !in_quote,
            b'(' if !in_quote => depth += 1,
            b')' if !in_quote => depth = depth.saturating_sub(1),
            b':' if !in_quote && depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                cast = Some(i);
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }

    let at = cast?;
    let operand = raw[..at].trim();
    let target = raw[at + 2..].trim();
    let single_term = !operand.is_empty()
        && !any_top_level(operand, |b| b.is_ascii_whitespace() || b"+*/|<>=%".contains(&b));
    let type_name = !target.is_empty()
        && target
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b" _.,\"[]()".contains(&b));
    (single_term && type_name).then_some(at)
}

/// Check if the whole text is one balanced parenthesized group.
fn wrapped_in_parens(raw: &str) -> bool {
    if !raw.starts_with('(') || !raw.ends_with(')') {
        return false;
    }
    let mut in_quote = false;
    let mut depth = 0usize;
    for (i, b) in raw.bytes().enumerate() {
        match b {
            b'\'' => in_quote = !in_quote,
            b'(' if !in_quote => depth += 1,
            b')' if !in_quote => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return i == raw.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}

/// Check if any byte outside quotes and parentheses matches.
fn any_top_level(raw: &str, pred: impl Fn(u8) -> bool) -> bool {
    let mut in_quote = false;
    let mut depth = 0usize;
    raw.bytes().any(|b| match b {
        b'\'' => {
            in_quote = !in_quote;
            false
        }
        b'(' if !in_quote => {
            depth += 1;
            false
        }
        b')' if !in_quote => {
            depth = depth.saturating_sub(1);
            false
        }
        _ => !in_quote && depth == 0 && pred(b),
    })
}

fn unquote(raw: &str) -> Option<String> {
    let inner = raw.strip_prefix('\'')?.strip_suffix('\'')?;
    Some(inner.replace("''", "'"))
}

/// Boolean flags of a column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFlags {
    /// Accepts nulls.
    pub nullable: bool,
    /// Part of the primary key.
    pub primary_key: bool,
    /// Filled from a sequence or identity.
    pub auto_increment: bool,
    /// Defaults to the current timestamp.
    pub default_now: bool,
}

impl ColumnFlags {
    /// Whether the value may be omitted on creation.
    pub fn creation_optional(&self) -> bool {
        self.primary_key || self.nullable
    }
}

/// A fully mapped column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub schema: String,
    pub table: String,
    pub name: String,
    /// lowerCamelCase property name.
    pub property_name: String,
    /// Native type as assembled from the catalog.
    pub native_type: String,
    /// Normalized user-defined type name, if any.
    pub udt_name: Option<String>,
    pub flags: ColumnFlags,
    /// Raw default expression.
    pub raw_default: Option<String>,
    /// Parsed default.
    pub default_value: Option<DefaultValue>,
    /// Enum / composite / domain / plain classification.
    pub user_type: UserDefinedType,
    pub mapping: MappedType,
    pub comment: Option<String>,
    pub ordinal_position: i32,
}

impl ColumnDescriptor {
    /// ORM type expression.
    pub fn orm_type_expression(&self) -> &str {
        &self.mapping.orm_type_expression
    }

    /// Host type text.
    pub fn host_type(&self) -> &str {
        &self.mapping.host_type
    }

    /// Fully qualified column name.
    pub fn full_name(&self) -> String {
        format!("{}.{}.{}", self.schema, self.table, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_now_defaults() {
        assert_eq!(DefaultValue::parse("CURRENT_TIMESTAMP"), Some(DefaultValue::Now));
        assert_eq!(DefaultValue::parse("now()"), Some(DefaultValue::Now));
        assert_eq!(
            DefaultValue::parse("CURRENT_TIMESTAMP(3)"),
            Some(DefaultValue::Now)
        );
    }

    #[test]
    fn test_parse_sequence_default() {
        assert_eq!(
            DefaultValue::parse("nextval('users_id_seq'::regclass)"),
            None
        );
        assert!(is_sequence("nextval('users_id_seq'::regclass)"));
    }

    #[test]
    fn test_parse_literals() {
        assert_eq!(
            DefaultValue::parse("'draft'::character varying"),
            Some(DefaultValue::String("draft".into()))
        );
        assert_eq!(
            DefaultValue::parse("'it''s'::text"),
            Some(DefaultValue::String("it's".into()))
        );
        assert_eq!(DefaultValue::parse("false"), Some(DefaultValue::Bool(false)));
        assert_eq!(
            DefaultValue::parse("(0)::numeric"),
            Some(DefaultValue::Number("0".into()))
        );
        assert_eq!(DefaultValue::parse("NULL::text"), Some(DefaultValue::Null));
    }

    #[test]
    fn test_parse_json_default() {
        let parsed = DefaultValue::parse("'{\"theme\": \"dark\"}'::jsonb").unwrap();
        assert_eq!(parsed.as_json(), Some(&json!({"theme": "dark"})));
    }

    #[test]
    fn test_parse_expression() {
        assert_eq!(
            DefaultValue::parse("gen_random_uuid()"),
            Some(DefaultValue::Expression("gen_random_uuid()".into()))
        );
    }

    #[test]
    fn test_parse_casts_inside_expressions_are_kept() {
        assert_eq!(
            DefaultValue::parse("(now() + '1 day'::interval)"),
            Some(DefaultValue::Expression("now() + '1 day'::interval".into()))
        );
        assert_eq!(
            DefaultValue::parse("lower('ABC'::text)"),
            Some(DefaultValue::Expression("lower('ABC'::text)".into()))
        );
        assert_eq!(
            DefaultValue::parse("(a) + (b)"),
            Some(DefaultValue::Expression("(a) + (b)".into()))
        );
    }

    #[test]
    fn test_parse_chained_casts_of_now_literal() {
        let parsed = DefaultValue::parse("('now'::text)::timestamp without time zone");
        assert_eq!(parsed, Some(DefaultValue::Now));
        assert!(parsed.unwrap().is_now());
        assert_eq!(DefaultValue::parse("'now'"), Some(DefaultValue::Now));
        assert_eq!(
            DefaultValue::parse("'hello'::character varying(255)"),
            Some(DefaultValue::String("hello".into()))
        );
    }

    #[test]
    fn test_creation_optional() {
        let flags = ColumnFlags {
            primary_key: true,
            ..ColumnFlags::default()
        };
        assert!(flags.creation_optional());
        assert!(!ColumnFlags::default().creation_optional());
    }
}
