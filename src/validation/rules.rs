//! Declarative column-shift rules
//!
//! A [`ShiftRule`] names a known way in which an upstream export wrote values
//! into the wrong columns: which field shapes identify it, which values move
//! back to which field, and what constant (if any) a vacated field receives.
//! New shift patterns are added as data, not control flow.

use serde::{Deserialize, Serialize};

use super::shapes::{FieldShape, Shape};
use crate::models::{Header, Record, fields};

/// Move the value found in `from` into `to`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMove {
    pub from: String,
    pub to: String,
}

impl FieldMove {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Constant written to a field left without a source value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFallback {
    pub field: String,
    pub value: String,
}

impl FieldFallback {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// A known column-shift pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftRule {
    pub name: String,
    /// Shapes the misplaced values show before repair
    #[serde(default)]
    pub when: Vec<FieldShape>,
    pub moves: Vec<FieldMove>,
    #[serde(default)]
    pub fallbacks: Vec<FieldFallback>,
}

impl ShiftRule {
    /// Rule for a span whose values all landed `magnitude` columns to the right.
    ///
    /// Every field from `start` to `end` (header order) takes the value found
    /// `magnitude` columns later. Returns None if the span does not fit the
    /// header.
    pub fn uniform(
        name: impl Into<String>,
        header: &Header,
        start: &str,
        end: &str,
        magnitude: usize,
    ) -> Option<Self> {
        let first = header.position(start)?;
        let last = header.position(end)?;
        if magnitude == 0 || first > last || last + magnitude >= header.len() {
            return None;
        }
        let names = header.names();
        let moves = (first..=last)
            .map(|idx| FieldMove::new(names[idx + magnitude].clone(), names[idx].clone()))
            .collect();
        Some(Self {
            name: name.into(),
            when: Vec::new(),
            moves,
            fallbacks: Vec::new(),
        })
    }

    /// Every field the rule reads or writes, in header order.
    pub fn span_fields(&self, header: &Header) -> Vec<String> {
        let mut span: Vec<&str> = self
            .moves
            .iter()
            .flat_map(|m| [m.from.as_str(), m.to.as_str()])
            .chain(self.fallbacks.iter().map(|f| f.field.as_str()))
            .collect();
        span.sort_by_key(|field| header.position(field).unwrap_or(usize::MAX));
        span.dedup();
        span.into_iter().map(str::to_string).collect()
    }

    /// Rebuild a record with the rule's moves applied.
    ///
    /// All sources are read from the original row. Sources that are not also
    /// targets are reset to their fallback or left empty; nothing else is
    /// invented.
    pub fn apply(&self, record: &Record) -> Record {
        let mut repaired = record.clone();
        for field in self.vacated() {
            let value = self
                .fallbacks
                .iter()
                .find(|f| f.field == field)
                .map(|f| f.value.clone())
                .unwrap_or_default();
            repaired.set(field, value);
        }
        for mv in &self.moves {
            repaired.set(&mv.to, record.get(&mv.from).to_string());
        }
        for fallback in &self.fallbacks {
            repaired.set_if_empty(&fallback.field, fallback.value.clone());
        }
        repaired
    }

    fn vacated(&self) -> impl Iterator<Item = &str> {
        self.moves
            .iter()
            .map(|m| m.from.as_str())
            .filter(|from| !self.moves.iter().any(|m| m.to == *from))
    }
}

/// Direction in which values landed relative to their declared column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftDirection {
    /// Values sit to the right of where they belong
    Forward,
    /// Values sit to the left of where they belong
    Backward,
}

/// Where a row's values were found displaced, and by which rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftSignature {
    pub rule: String,
    pub start: String,
    pub end: String,
    pub direction: ShiftDirection,
    pub magnitude: usize,
}

impl ShiftSignature {
    /// Describe a rule against a header.
    ///
    /// None when a rule field is missing from the header or the moves do not
    /// all point the same way.
    pub fn from_rule(rule: &ShiftRule, header: &Header) -> Option<Self> {
        if rule.moves.is_empty() {
            return None;
        }
        let mut forward = 0;
        let mut backward = 0;
        let mut magnitude = 0;
        for mv in &rule.moves {
            let from = header.position(&mv.from)?;
            let to = header.position(&mv.to)?;
            if from > to {
                forward += 1;
            } else if from < to {
                backward += 1;
            }
            magnitude = magnitude.max(from.abs_diff(to));
        }
        let direction = match (forward, backward) {
            (f, 0) if f > 0 => ShiftDirection::Forward,
            (0, b) if b > 0 => ShiftDirection::Backward,
            _ => return None,
        };
        let span = rule.span_fields(header);
        Some(Self {
            rule: rule.name.clone(),
            start: span.first()?.clone(),
            end: span.last()?.clone(),
            direction,
            magnitude,
        })
    }
}

/// Built-in rules seen in this catalog's exports
pub fn default_rules() -> Vec<ShiftRule> {
    vec![ShiftRule {
        name: "price-in-shipping-column".to_string(),
        when: vec![
            FieldShape::new(fields::VARIANT_PRICE, Shape::Sku),
            FieldShape::new(fields::VARIANT_REQUIRES_SHIPPING, Shape::Decimal),
        ],
        moves: vec![
            FieldMove::new(fields::VARIANT_PRICE, fields::VARIANT_SKU),
            FieldMove::new(fields::VARIANT_REQUIRES_SHIPPING, fields::VARIANT_PRICE),
        ],
        fallbacks: vec![FieldFallback::new(fields::VARIANT_REQUIRES_SHIPPING, "TRUE")],
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn header() -> Header {
        Header::new(fields::STANDARD_HEADER.iter().copied())
    }

    #[test]
    fn test_default_rule_signature_is_forward() {
        let rule = &default_rules()[0];
        let sig = ShiftSignature::from_rule(rule, &header()).unwrap();
        assert_eq!(sig.start, fields::VARIANT_SKU);
        assert_eq!(sig.end, fields::VARIANT_REQUIRES_SHIPPING);
        assert_eq!(sig.direction, ShiftDirection::Forward);
        assert_eq!(sig.magnitude, 6);
    }

    #[test]
    fn test_apply_moves_values_and_fills_fallback() {
        let header = Arc::new(header());
        let mut record = Record::empty(Arc::clone(&header));
        record.set(fields::HANDLE, "care-kit");
        record.set(fields::VARIANT_PRICE, "ECOC-BUNDLE-MOD");
        record.set(fields::VARIANT_REQUIRES_SHIPPING, "149.95");

        let repaired = default_rules()[0].apply(&record);
        assert_eq!(repaired.get(fields::VARIANT_SKU), "ECOC-BUNDLE-MOD");
        assert_eq!(repaired.get(fields::VARIANT_PRICE), "149.95");
        assert_eq!(repaired.get(fields::VARIANT_REQUIRES_SHIPPING), "TRUE");
        assert_eq!(repaired.handle(), "care-kit");
    }

    #[test]
    fn test_uniform_rule_shifts_span_back() {
        let header = Header::new(["A", "B", "C", "D"]);
        let rule = ShiftRule::uniform("one-right", &header, "A", "B", 1).unwrap();
        assert_eq!(rule.moves, vec![FieldMove::new("B", "A"), FieldMove::new("C", "B")]);

        let header = Arc::new(header);
        let record = Record::from_values(
            Arc::clone(&header),
            vec!["".into(), "a".into(), "b".into(), "d".into()],
            2,
        );
        let repaired = rule.apply(&record);
        assert_eq!(repaired.values(), ["a", "b", "", "d"]);

        let sig = ShiftSignature::from_rule(&rule, &header).unwrap();
        assert_eq!((sig.start.as_str(), sig.end.as_str()), ("A", "C"));
        assert_eq!(sig.magnitude, 1);
    }

    #[test]
    fn test_uniform_rule_rejects_out_of_range_span() {
        let header = Header::new(["A", "B", "C"]);
        assert!(ShiftRule::uniform("x", &header, "B", "C", 1).is_none());
        assert!(ShiftRule::uniform("x", &header, "A", "Z", 1).is_none());
        assert!(ShiftRule::uniform("x", &header, "A", "B", 0).is_none());
    }

    #[test]
    fn test_signature_requires_known_fields() {
        let header = Header::new(["Handle", "Variant Price"]);
        assert!(ShiftSignature::from_rule(&default_rules()[0], &header).is_none());
    }
}
