//! Keyword-driven tag inference

use serde::{Deserialize, Serialize};

use super::{Outcome, Transform, contains_ci, strip_html};
use crate::models::{GroupContext, Record, fields};

/// Tag added when `keyword` occurs in the product text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRule {
    pub keyword: String,
    pub tag: String,
}

impl TagRule {
    pub fn new(keyword: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            tag: tag.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagConfig {
    /// Checked in order; inferred tags keep this order
    pub rules: Vec<TagRule>,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            rules: vec![
                TagRule::new("dry eye", "Dry Eye"),
                TagRule::new("drops", "Eye Drops"),
                TagRule::new("omega", "Omega-3"),
                TagRule::new("supplement", "Supplements"),
                TagRule::new("softgel", "Supplements"),
                TagRule::new("mask", "Eye Masks"),
                TagRule::new("compress", "Eye Masks"),
                TagRule::new("wipes", "Lid Care"),
                TagRule::new("eyelid", "Lid Care"),
                TagRule::new("cleanser", "Lid Care"),
                TagRule::new("preservative free", "Preservative Free"),
                TagRule::new("bundle", "Bundles"),
                TagRule::new("kit", "Bundles"),
            ],
        }
    }
}

/// Unions keyword-derived tags into `Tags` on primary rows
#[derive(Debug, Clone)]
pub struct TagInference {
    config: TagConfig,
}

impl TagInference {
    pub fn new(config: TagConfig) -> Self {
        Self { config }
    }

    /// Tags implied by a block of text, in table order, without duplicates.
    pub fn infer(&self, text: &str) -> Vec<String> {
        let mut tags: Vec<String> = Vec::new();
        for rule in &self.config.rules {
            if contains_ci(text, &rule.keyword) {
                push_unique(&mut tags, rule.tag.trim());
            }
        }
        tags
    }
}

fn push_unique(tags: &mut Vec<String>, tag: &str) {
    if !tag.is_empty() && !tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
        tags.push(tag.to_string());
    }
}

impl Transform for TagInference {
    fn name(&self) -> &'static str {
        "tags"
    }

    fn writes(&self) -> &'static [&'static str] {
        &[fields::TAGS]
    }

    fn apply(&self, record: &mut Record, _ctx: &GroupContext) -> Outcome {
        if !record.is_primary() {
            return Outcome::Unchanged;
        }
        let text = format!(
            "{} {}",
            record.title(),
            strip_html(record.get(fields::BODY_HTML))
        );

        let mut tags = Vec::new();
        for existing in record.get(fields::TAGS).split(',') {
            push_unique(&mut tags, existing.trim());
        }
        for inferred in self.infer(&text) {
            push_unique(&mut tags, &inferred);
        }

        Outcome::from_changed(record.set(fields::TAGS, tags.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::test_support::{ctx, record};

    #[test]
    fn test_infers_from_title_and_body() {
        let mut row = record(&[
            (fields::HANDLE, "lid-wipes"),
            (fields::TITLE, "Gentle Lid Wipes"),
            (fields::BODY_HTML, "<p>For <b>dry eye</b> relief</p>"),
        ]);
        let ctx = ctx(&row);
        assert_eq!(TagInference::new(TagConfig::default()).apply(&mut row, &ctx), Outcome::Changed);
        assert_eq!(row.get(fields::TAGS), "Dry Eye, Lid Care");
    }

    #[test]
    fn test_keeps_existing_tags_first_and_dedups() {
        let mut row = record(&[
            (fields::HANDLE, "omega"),
            (fields::TITLE, "Omega Softgels"),
            (fields::TAGS, "featured, omega-3"),
        ]);
        let ctx = ctx(&row);
        TagInference::new(TagConfig::default()).apply(&mut row, &ctx);
        assert_eq!(row.get(fields::TAGS), "featured, omega-3, Supplements");
    }

    #[test]
    fn test_only_primary_rows_and_idempotent() {
        let transform = TagInference::new(TagConfig::default());
        let mut variant = record(&[(fields::HANDLE, "drops"), (fields::OPTION1_VALUE, "Drops 10ml")]);
        let ctx_variant = ctx(&variant);
        assert_eq!(transform.apply(&mut variant, &ctx_variant), Outcome::Unchanged);
        assert_eq!(variant.get(fields::TAGS), "");

        let mut primary = record(&[(fields::HANDLE, "drops"), (fields::TITLE, "Eye Drops")]);
        let ctx_primary = ctx(&primary);
        assert_eq!(transform.apply(&mut primary, &ctx_primary), Outcome::Changed);
        assert_eq!(transform.apply(&mut primary, &ctx_primary), Outcome::Unchanged);
    }

    #[test]
    fn test_no_matches_leaves_empty_tags_alone() {
        let mut row = record(&[(fields::HANDLE, "gift-card"), (fields::TITLE, "Gift Card")]);
        let ctx = ctx(&row);
        assert_eq!(
            TagInference::new(TagConfig::default()).apply(&mut row, &ctx),
            Outcome::Unchanged
        );
    }
}
