//! Value shape predicates
//!
//! A shape is the expected form of a column's value (a decimal price, a
//! boolean flag, a catalog SKU). Empty values always satisfy their shape:
//! absence is never an anomaly on its own.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::models::{Record, fields};

static DECIMAL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?$").unwrap());

static INTEGER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+$").unwrap());

static SKU_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9]+(-[A-Za-z0-9]+)*$").unwrap());

static URL_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").unwrap());

/// Expected form of a field value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// Plain decimal number, e.g. `149.95`
    Decimal,
    /// Whole number, possibly negative
    Integer,
    /// `TRUE` or `FALSE` in any case
    Boolean,
    /// Alphanumeric with hyphens, starting with the catalog SKU prefix
    Sku,
    /// Absolute http(s) URL
    Url,
    /// Custom regular expression
    Pattern(String),
}

impl std::fmt::Display for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shape::Decimal => write!(f, "decimal"),
            Shape::Integer => write!(f, "integer"),
            Shape::Boolean => write!(f, "boolean"),
            Shape::Sku => write!(f, "sku"),
            Shape::Url => write!(f, "url"),
            Shape::Pattern(p) => write!(f, "pattern({})", p),
        }
    }
}

/// A field paired with its expected shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldShape {
    pub field: String,
    pub shape: Shape,
}

impl FieldShape {
    pub fn new(field: impl Into<String>, shape: Shape) -> Self {
        Self {
            field: field.into(),
            shape,
        }
    }
}

/// Default shapes for the standard export columns
pub fn default_shapes() -> Vec<FieldShape> {
    vec![
        FieldShape::new(fields::VARIANT_SKU, Shape::Sku),
        FieldShape::new(fields::VARIANT_GRAMS, Shape::Integer),
        FieldShape::new(fields::VARIANT_INVENTORY_QTY, Shape::Integer),
        FieldShape::new(fields::VARIANT_PRICE, Shape::Decimal),
        FieldShape::new(fields::VARIANT_COMPARE_AT_PRICE, Shape::Decimal),
        FieldShape::new(fields::VARIANT_REQUIRES_SHIPPING, Shape::Boolean),
        FieldShape::new(fields::VARIANT_TAXABLE, Shape::Boolean),
        FieldShape::new(fields::IMAGE_SRC, Shape::Url),
        FieldShape::new(fields::IMAGE_POSITION, Shape::Integer),
    ]
}

/// Whether a value is an absolute http(s) URL.
pub fn is_url(value: &str) -> bool {
    URL_REGEX.is_match(value.trim())
}

/// Ordered field→shape table with compiled custom patterns
#[derive(Debug, Clone, Default)]
pub struct ShapeTable {
    sku_prefix: String,
    entries: Vec<FieldShape>,
    patterns: HashMap<String, Regex>,
}

impl ShapeTable {
    /// Build a table; custom patterns are compiled up front.
    pub fn new(sku_prefix: impl Into<String>, entries: Vec<FieldShape>) -> Result<Self, ConfigError> {
        let mut patterns = HashMap::new();
        for entry in &entries {
            if let Shape::Pattern(pattern) = &entry.shape {
                let regex = Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                    context: format!("shape of '{}'", entry.field),
                    pattern: pattern.clone(),
                    source,
                })?;
                patterns.insert(pattern.clone(), regex);
            }
        }
        Ok(Self {
            sku_prefix: sku_prefix.into(),
            entries,
            patterns,
        })
    }

    pub fn sku_prefix(&self) -> &str {
        &self.sku_prefix
    }

    pub fn entries(&self) -> &[FieldShape] {
        &self.entries
    }

    pub fn shape_of(&self, field: &str) -> Option<&Shape> {
        self.entries
            .iter()
            .find(|entry| entry.field == field)
            .map(|entry| &entry.shape)
    }

    /// Whether a non-empty value has the given shape.
    pub fn matches(&self, shape: &Shape, value: &str) -> bool {
        let value = value.trim();
        match shape {
            Shape::Decimal => DECIMAL_REGEX.is_match(value),
            Shape::Integer => INTEGER_REGEX.is_match(value),
            Shape::Boolean => value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false"),
            Shape::Sku => {
                SKU_REGEX.is_match(value)
                    && value
                        .get(..self.sku_prefix.len())
                        .is_some_and(|head| head.eq_ignore_ascii_case(&self.sku_prefix))
            }
            Shape::Url => is_url(value),
            Shape::Pattern(pattern) => self
                .patterns
                .get(pattern)
                .is_some_and(|regex| regex.is_match(value)),
        }
    }

    /// Whether a field's value satisfies its declared shape.
    ///
    /// Empty values and fields without a declared shape always pass.
    pub fn check(&self, field: &str, value: &str) -> bool {
        if value.trim().is_empty() {
            return true;
        }
        match self.shape_of(field) {
            Some(shape) => self.matches(shape, value),
            None => true,
        }
    }

    /// Fields of a record whose values break their declared shape.
    pub fn violations(&self, record: &Record) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| !self.check(&entry.field, record.get(&entry.field)))
            .map(|entry| entry.field.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Header;
    use std::sync::Arc;

    fn table() -> ShapeTable {
        ShapeTable::new("ECOC", default_shapes()).unwrap()
    }

    #[test]
    fn test_builtin_shapes() {
        let table = table();
        assert!(table.matches(&Shape::Decimal, "149.95"));
        assert!(table.matches(&Shape::Decimal, "20"));
        assert!(!table.matches(&Shape::Decimal, "ECOC-BUNDLE-MOD"));
        assert!(table.matches(&Shape::Integer, "-3"));
        assert!(!table.matches(&Shape::Integer, "3.5"));
        assert!(table.matches(&Shape::Boolean, "true"));
        assert!(table.matches(&Shape::Boolean, "FALSE"));
        assert!(!table.matches(&Shape::Boolean, "149.95"));
        assert!(table.matches(&Shape::Url, "https://cdn.example.com/a.png"));
        assert!(!table.matches(&Shape::Url, "a.png"));
        assert!(is_url(" https://cdn.example.com/a.png "));
        assert!(!is_url("widget-c.png"));
    }

    #[test]
    fn test_sku_requires_prefix() {
        let table = table();
        assert!(table.matches(&Shape::Sku, "ECOC-BUNDLE-MOD"));
        assert!(table.matches(&Shape::Sku, "ecoc-12"));
        assert!(!table.matches(&Shape::Sku, "XYZ-12"));
        assert!(!table.matches(&Shape::Sku, "EC"));
        assert!(!table.matches(&Shape::Sku, "149.95"));
    }

    #[test]
    fn test_empty_values_always_pass() {
        let table = table();
        assert!(table.check("Variant Price", ""));
        assert!(table.check("Variant Price", "  "));
        assert!(table.check("Unknown Field", "anything"));
    }

    #[test]
    fn test_custom_pattern_and_invalid_pattern() {
        let table = ShapeTable::new(
            "",
            vec![FieldShape::new("Variant Barcode", Shape::Pattern(r"^\d{12,13}$".into()))],
        )
        .unwrap();
        assert!(table.check("Variant Barcode", "012345678905"));
        assert!(!table.check("Variant Barcode", "12AB"));

        let err = ShapeTable::new("", vec![FieldShape::new("X", Shape::Pattern("(".into()))]);
        assert!(matches!(err, Err(ConfigError::InvalidPattern { .. })));
    }

    #[test]
    fn test_violations_lists_bad_fields() {
        let header = Arc::new(Header::new(["Handle", "Variant Price", "Variant Requires Shipping"]));
        let record = crate::models::Record::from_values(
            header,
            vec!["kit".into(), "ECOC-BUNDLE-MOD".into(), "149.95".into()],
            2,
        );
        assert_eq!(
            table().violations(&record),
            vec!["Variant Price".to_string(), "Variant Requires Shipping".to_string()]
        );
    }

    #[test]
    fn test_shape_from_toml() {
        #[derive(Deserialize)]
        struct Doc {
            shapes: Vec<FieldShape>,
        }
        let doc: Doc = toml::from_str(
            r#"
            [[shapes]]
            field = "Variant Price"
            shape = "decimal"

            [[shapes]]
            field = "Variant Barcode"
            shape = { pattern = "^[0-9]+$" }
            "#,
        )
        .unwrap();
        assert_eq!(doc.shapes[0].shape, Shape::Decimal);
        assert_eq!(doc.shapes[1].shape, Shape::Pattern("^[0-9]+$".into()));
    }
}
