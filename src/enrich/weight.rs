//! Shipping weight estimation

use serde::{Deserialize, Serialize};

use super::{Outcome, Transform, contains_ci};
use crate::models::{GroupContext, Record, fields};

/// Grams assigned when any keyword occurs in the product title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightRule {
    pub keywords: Vec<String>,
    pub grams: u32,
}

impl WeightRule {
    pub fn new<I, S>(keywords: I, grams: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            grams,
        }
    }

    fn matches(&self, text: &str) -> bool {
        self.keywords.iter().any(|keyword| contains_ci(text, keyword))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    /// Priority order; first match wins
    pub rules: Vec<WeightRule>,
    pub default_grams: u32,
    /// Written to `Variant Weight Unit` alongside the estimate
    pub unit: String,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            rules: vec![
                WeightRule::new(["bundle", "kit"], 500),
                WeightRule::new(["mask", "compress"], 250),
                WeightRule::new(["omega", "softgel", "supplement", "capsule"], 200),
                WeightRule::new(["wipes", "cleanser", "foam"], 120),
                WeightRule::new(["drops", "spray", "gel", "ointment"], 60),
            ],
            default_grams: 150,
            unit: "g".to_string(),
        }
    }
}

/// Fills missing `Variant Grams` on sellable rows
#[derive(Debug, Clone)]
pub struct WeightEstimator {
    config: WeightConfig,
}

impl WeightEstimator {
    pub fn new(config: WeightConfig) -> Self {
        Self { config }
    }

    pub fn estimate(&self, title: &str) -> u32 {
        self.config
            .rules
            .iter()
            .find(|rule| rule.matches(title))
            .map(|rule| rule.grams)
            .unwrap_or(self.config.default_grams)
    }
}

impl Transform for WeightEstimator {
    fn name(&self) -> &'static str {
        "weight"
    }

    fn writes(&self) -> &'static [&'static str] {
        &[fields::VARIANT_GRAMS, fields::VARIANT_WEIGHT_UNIT]
    }

    fn apply(&self, record: &mut Record, ctx: &GroupContext) -> Outcome {
        if !record.is_sellable() {
            return Outcome::Unchanged;
        }
        let current = record.get(fields::VARIANT_GRAMS).trim();
        if !current.is_empty() && current != "0" {
            return Outcome::Unchanged;
        }

        let title = if record.is_primary() {
            record.title().to_string()
        } else {
            ctx.title.clone()
        };
        let grams = self.estimate(&title);
        let mut changed = record.set(fields::VARIANT_GRAMS, grams.to_string());
        if !self.config.unit.is_empty() {
            changed |= record.set(fields::VARIANT_WEIGHT_UNIT, self.config.unit.clone());
        }
        Outcome::from_changed(changed)
    }
}
