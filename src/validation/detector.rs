//! Column-shift anomaly detection
//!
//! Flags rows whose values break their column shapes and matches them
//! against the known [`ShiftRule`]s. Only rows inside the caller's
//! [`AllowList`] are ever flagged, so unusual but correct rows elsewhere in
//! the catalog are left alone.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rules::{ShiftRule, ShiftSignature};
use super::shapes::{FieldShape, ShapeTable, default_shapes};
use crate::config::ConfigError;
use crate::models::{GroupContext, Header, Record};

/// Scope of anomaly detection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllowList {
    /// Scan every row regardless of the lists below
    pub any: bool,
    /// Exact handles
    pub handles: Vec<String>,
    /// Substrings of handles
    pub handle_contains: Vec<String>,
    /// Product types or categories, case-insensitive
    pub categories: Vec<String>,
}

impl AllowList {
    pub fn any() -> Self {
        Self {
            any: true,
            ..Default::default()
        }
    }

    pub fn handles<I, S>(handles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            handles: handles.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn permits(&self, ctx: &GroupContext) -> bool {
        if self.any {
            return true;
        }
        let handle = ctx.handle.to_lowercase();
        if handle.is_empty() {
            return false;
        }
        self.handles.iter().any(|h| h.eq_ignore_ascii_case(&ctx.handle))
            || self
                .handle_contains
                .iter()
                .any(|part| !part.is_empty() && handle.contains(&part.to_lowercase()))
            || self.categories.iter().any(|c| {
                c.eq_ignore_ascii_case(&ctx.product_type) || c.eq_ignore_ascii_case(&ctx.category)
            })
    }
}

/// Lookup tables for anomaly detection and repair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Prefix every catalog SKU starts with
    pub sku_prefix: String,
    /// Expected value shape per field
    pub shapes: Vec<FieldShape>,
    /// Known shift patterns, tried in order
    pub shift_rules: Vec<ShiftRule>,
    /// Rows eligible for detection
    pub allow: AllowList,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            sku_prefix: "ECOC".to_string(),
            shapes: default_shapes(),
            shift_rules: super::rules::default_rules(),
            allow: AllowList {
                handle_contains: vec!["bundle".to_string(), "kit".to_string()],
                categories: vec!["Bundle".to_string()],
                ..Default::default()
            },
        }
    }
}

/// Outcome of inspecting one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    /// Every shaped field looks right
    Clean,
    /// Outside the allow-list; not inspected
    OutOfScope,
    /// Matches a known shift rule
    Shifted(ShiftSignature),
    /// Shape violations that no known rule explains
    Unrecognised { violations: Vec<String> },
}

impl Detection {
    pub fn is_anomalous(&self) -> bool {
        matches!(self, Detection::Shifted(_) | Detection::Unrecognised { .. })
    }
}

/// Rule-driven detector for column-shifted rows
#[derive(Debug, Clone)]
pub struct AnomalyDetector {
    shapes: ShapeTable,
    rules: Vec<ShiftRule>,
    allow: AllowList,
}

impl AnomalyDetector {
    pub fn new(shapes: ShapeTable, rules: Vec<ShiftRule>, allow: AllowList) -> Self {
        Self {
            shapes,
            rules,
            allow,
        }
    }

    pub fn from_config(config: &DetectionConfig) -> Result<Self, ConfigError> {
        let shapes = ShapeTable::new(config.sku_prefix.clone(), config.shapes.clone())?;
        for rule in &config.shift_rules {
            if rule.moves.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "shift rule '{}' has no moves",
                    rule.name
                )));
            }
        }
        Ok(Self::new(
            shapes,
            config.shift_rules.clone(),
            config.allow.clone(),
        ))
    }

    /// Replace the allow-list
    pub fn with_allow_list(mut self, allow: AllowList) -> Self {
        self.allow = allow;
        self
    }

    pub fn shapes(&self) -> &ShapeTable {
        &self.shapes
    }

    /// Inspect one record.
    ///
    /// A rule matches when all of its `when` shapes hold, its span covers at
    /// least one violating field, and its moves point forward.
    pub fn detect(&self, record: &Record, ctx: &GroupContext) -> Detection {
        if !self.allow.permits(ctx) {
            return Detection::OutOfScope;
        }
        let violations = self.shapes.violations(record);
        if violations.is_empty() {
            return Detection::Clean;
        }

        let header: &Header = record.header();
        for rule in &self.rules {
            let Some(signature) = ShiftSignature::from_rule(rule, header) else {
                continue;
            };
            if signature.direction != super::rules::ShiftDirection::Forward {
                continue;
            }
            let triggered = rule.when.iter().all(|cond| {
                let value = record.get(&cond.field);
                !value.trim().is_empty() && self.shapes.matches(&cond.shape, value)
            });
            if !triggered {
                continue;
            }
            let span = rule.span_fields(header);
            if violations.iter().any(|field| span.contains(field)) {
                debug!(line = record.line, handle = record.handle(), rule = %rule.name, "Shift detected");
                return Detection::Shifted(signature);
            }
        }

        Detection::Unrecognised { violations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fields;
    use std::sync::Arc;

    fn shifted_row() -> Record {
        let header = Arc::new(Header::new(fields::STANDARD_HEADER.iter().copied()));
        let mut record = Record::empty(header);
        record.set(fields::HANDLE, "eye-care-bundle");
        record.set(fields::VARIANT_PRICE, "ECOC-BUNDLE-MOD");
        record.set(fields::VARIANT_REQUIRES_SHIPPING, "149.95");
        record
    }

    fn detector() -> AnomalyDetector {
        AnomalyDetector::from_config(&DetectionConfig::default()).unwrap()
    }

    #[test]
    fn test_detects_known_shift() {
        let record = shifted_row();
        let ctx = GroupContext::orphan(&record);
        match detector().detect(&record, &ctx) {
            Detection::Shifted(sig) => assert_eq!(sig.rule, "price-in-shipping-column"),
            other => panic!("expected shift, got {:?}", other),
        }
    }

    #[test]
    fn test_rows_outside_allow_list_are_not_flagged() {
        let record = shifted_row();
        let mut ctx = GroupContext::orphan(&record);
        ctx.handle = "omega-softgels".to_string();
        assert_eq!(detector().detect(&record, &ctx), Detection::OutOfScope);
    }

    #[test]
    fn test_unknown_violation_is_unrecognised() {
        let mut record = shifted_row();
        record.set(fields::VARIANT_REQUIRES_SHIPPING, "");
        record.set(fields::VARIANT_TAXABLE, "maybe");
        let ctx = GroupContext::orphan(&record);
        let detection = detector()
            .with_allow_list(AllowList::any())
            .detect(&record, &ctx);
        assert_eq!(
            detection,
            Detection::Unrecognised {
                violations: vec![
                    fields::VARIANT_PRICE.to_string(),
                    fields::VARIANT_TAXABLE.to_string()
                ]
            }
        );
    }

    #[test]
    fn test_clean_row() {
        let mut record = shifted_row();
        record.set(fields::VARIANT_PRICE, "149.95");
        record.set(fields::VARIANT_REQUIRES_SHIPPING, "TRUE");
        let ctx = GroupContext::orphan(&record);
        assert_eq!(detector().detect(&record, &ctx), Detection::Clean);
    }

    #[test]
    fn test_allow_list_matching() {
        let ctx = GroupContext {
            handle: "Relief-Kit".to_string(),
            product_type: "Bundle".to_string(),
            ..Default::default()
        };
        assert!(AllowList::handles(["relief-kit"]).permits(&ctx));
        assert!(!AllowList::handles(["other"]).permits(&ctx));
        assert!(AllowList { categories: vec!["bundle".into()], ..Default::default() }.permits(&ctx));
        assert!(AllowList { handle_contains: vec!["KIT".into()], ..Default::default() }.permits(&ctx));
        assert!(!AllowList::default().permits(&ctx));
        assert!(AllowList::any().permits(&GroupContext::default()));
    }
}
