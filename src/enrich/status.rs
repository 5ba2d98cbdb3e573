//! Publication status defaults and deactivation rules

use serde::{Deserialize, Serialize};

use super::{Outcome, Transform, contains_ci};
use crate::models::{GroupContext, Record, fields};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    pub status: String,
    pub published: String,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            status: "active".to_string(),
            published: "TRUE".to_string(),
        }
    }
}

/// Fills empty `Status` and `Published` on primary rows
#[derive(Debug, Clone)]
pub struct StatusDefaults {
    config: StatusConfig,
}

impl StatusDefaults {
    pub fn new(config: StatusConfig) -> Self {
        Self { config }
    }
}

impl Transform for StatusDefaults {
    fn name(&self) -> &'static str {
        "status"
    }

    fn writes(&self) -> &'static [&'static str] {
        &[fields::STATUS, fields::PUBLISHED]
    }

    fn apply(&self, record: &mut Record, _ctx: &GroupContext) -> Outcome {
        if !record.is_primary() {
            return Outcome::Unchanged;
        }
        let mut changed = record.set_if_empty(fields::STATUS, self.config.status.clone());
        changed |= record.set_if_empty(fields::PUBLISHED, self.config.published.clone());
        Outcome::from_changed(changed)
    }
}

/// Products matching every keyword should not be sold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivationRule {
    pub name: String,
    pub all_of: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeactivationConfig {
    /// Status written to matching rows
    pub status: String,
    pub rules: Vec<DeactivationRule>,
}

impl Default for DeactivationConfig {
    fn default() -> Self {
        Self {
            status: "draft".to_string(),
            rules: vec![DeactivationRule {
                name: "omega-180ct".to_string(),
                all_of: vec!["180ct".to_string(), "omega".to_string()],
            }],
        }
    }
}

/// Moves products that must not be sold to an inactive status
#[derive(Debug, Clone)]
pub struct Deactivation {
    config: DeactivationConfig,
}

impl Deactivation {
    pub fn new(config: DeactivationConfig) -> Self {
        Self { config }
    }

    /// Name of the first rule the record matches.
    pub fn matching_rule(&self, record: &Record, ctx: &GroupContext) -> Option<&str> {
        let mut descriptor = [
            record.title(),
            record.get(fields::OPTION1_VALUE),
            record.get(fields::VARIANT_SKU),
        ]
        .join(" ");
        if !record.is_primary() {
            descriptor.push(' ');
            descriptor.push_str(&ctx.title);
        }

        self.config
            .rules
            .iter()
            .find(|rule| {
                !rule.all_of.is_empty() && rule.all_of.iter().all(|kw| contains_ci(&descriptor, kw))
            })
            .map(|rule| rule.name.as_str())
    }
}

impl Transform for Deactivation {
    fn name(&self) -> &'static str {
        "deactivation"
    }

    fn writes(&self) -> &'static [&'static str] {
        &[fields::STATUS]
    }

    fn apply(&self, record: &mut Record, ctx: &GroupContext) -> Outcome {
        if record.get(fields::STATUS).eq_ignore_ascii_case(&self.config.status) {
            return Outcome::Unchanged;
        }
        if self.matching_rule(record, ctx).is_none() {
            return Outcome::Unchanged;
        }
        Outcome::from_changed(record.set(fields::STATUS, self.config.status.clone()))
    }
}
