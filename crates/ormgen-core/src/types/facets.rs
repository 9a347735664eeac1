//! Numeric and character facets from raw catalog text.

use serde::{Deserialize, Serialize};

/// Raw facet fields as reported by the catalog (all textual).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawFacets<'a> {
    /// `numeric_precision`.
    pub precision: Option<&'a str>,
    /// `numeric_scale`.
    pub scale: Option<&'a str>,
    /// `character_maximum_length`.
    pub length: Option<&'a str>,
}

/// Precision and scale of a numeric type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericFacets {
    /// Total number of digits.
    pub precision: Option<u32>,
    /// Digits after the decimal point.
    pub scale: Option<u32>,
}

impl NumericFacets {
    /// Parametric form (`10, 2`, `10`), or `None` without precision.
    pub fn parameters(&self) -> Option<String> {
        match (self.precision, self.scale) {
            (Some(precision), Some(scale)) => Some(format!("{}, {}", precision, scale)),
            (Some(precision), None) => Some(precision.to_string()),
            (None, _) => None,
        }
    }

    /// Check if no facet is present.
    pub fn is_empty(&self) -> bool {
        self.precision.is_none() && self.scale.is_none()
    }
}

/// Pure transforms from textual facet fields to numbers.
pub struct NumericFacetExtractor;

impl NumericFacetExtractor {
    /// Precision and scale; absent input yields `{None, None}`.
    pub fn facets(raw: Option<&RawFacets<'_>>) -> NumericFacets {
        match raw {
            Some(raw) => NumericFacets {
                precision: raw.precision.and_then(parse_facet),
                scale: raw.scale.and_then(parse_facet),
            },
            None => NumericFacets::default(),
        }
    }

    /// Character length facet.
    pub fn character_length(raw: Option<&RawFacets<'_>>) -> Option<u32> {
        raw.and_then(|raw| raw.length).and_then(parse_facet)
    }

    /// Precision and scale from inline modifiers (`numeric(10,2)`).
    pub fn from_modifiers(modifiers: &[String]) -> NumericFacets {
        NumericFacets {
            precision: modifiers.first().and_then(|m| parse_facet(m)),
            scale: modifiers.get(1).and_then(|m| parse_facet(m)),
        }
    }
}

fn parse_facet(raw: &str) -> Option<u32> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<u32>() {
        return Some(value);
    }
    // Some drivers render integral facets as floats ("10.0").
    match trimmed.parse::<f64>() {
        Ok(value) if value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 => {
            Some(value as u32)
        }
        _ => None,
    }
}
