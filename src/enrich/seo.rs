//! SEO field defaults

use serde::{Deserialize, Serialize};

use super::{Outcome, Transform, strip_html, truncate_chars};
use crate::models::{GroupContext, Record, fields};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeoConfig {
    pub max_description_chars: usize,
}

impl Default for SeoConfig {
    fn default() -> Self {
        Self {
            max_description_chars: 300,
        }
    }
}

/// Fills empty SEO title and description from the product text
#[derive(Debug, Clone)]
pub struct SeoDefaults {
    config: SeoConfig,
}

impl SeoDefaults {
    pub fn new(config: SeoConfig) -> Self {
        Self { config }
    }

    pub fn description(&self, body_html: &str) -> String {
        let text = strip_html(body_html);
        truncate_chars(&text, self.config.max_description_chars).to_string()
    }
}

impl Transform for SeoDefaults {
    fn name(&self) -> &'static str {
        "seo"
    }

    fn writes(&self) -> &'static [&'static str] {
        &[fields::SEO_TITLE, fields::SEO_DESCRIPTION]
    }

    fn apply(&self, record: &mut Record, _ctx: &GroupContext) -> Outcome {
        if !record.is_primary() {
            return Outcome::Unchanged;
        }
        let title = record.title().trim().to_string();
        let mut changed = record.set_if_empty(fields::SEO_TITLE, title);
        if record.get(fields::SEO_DESCRIPTION).is_empty() {
            let description = self.description(record.get(fields::BODY_HTML));
            changed |= record.set(fields::SEO_DESCRIPTION, description);
        }
        Outcome::from_changed(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::test_support::{ctx, record};

    #[test]
    fn test_fills_from_title_and_body() {
        let transform = SeoDefaults::new(SeoConfig::default());
        let mut row = record(&[
            (fields::HANDLE, "drops"),
            (fields::TITLE, "Lubricating Drops"),
            (fields::BODY_HTML, "<h2>Fast relief</h2><p>Preservative&nbsp;free.</p>"),
        ]);
        let ctx = ctx(&row);
        assert_eq!(transform.apply(&mut row, &ctx), Outcome::Changed);
        assert_eq!(row.get(fields::SEO_TITLE), "Lubricating Drops");
        assert_eq!(row.get(fields::SEO_DESCRIPTION), "Fast relief Preservative free.");
        assert_eq!(transform.apply(&mut row, &ctx), Outcome::Unchanged);
    }

    #[test]
    fn test_description_is_capped() {
        let transform = SeoDefaults::new(SeoConfig { max_description_chars: 10 });
        let mut row = record(&[
            (fields::HANDLE, "mask"),
            (fields::TITLE, "Mask"),
            (fields::BODY_HTML, "<p>A reusable heated eye mask</p>"),
        ]);
        let ctx = ctx(&row);
        transform.apply(&mut row, &ctx);
        assert_eq!(row.get(fields::SEO_DESCRIPTION), "A reusable");
        assert!(row.get(fields::SEO_DESCRIPTION).chars().count() <= 10);
    }

    #[test]
    fn test_existing_values_are_kept() {
        let transform = SeoDefaults::new(SeoConfig::default());
        let mut row = record(&[
            (fields::HANDLE, "mask"),
            (fields::TITLE, "Mask"),
            (fields::SEO_TITLE, "Custom"),
            (fields::SEO_DESCRIPTION, "Hand written"),
        ]);
        let ctx = ctx(&row);
        assert_eq!(transform.apply(&mut row, &ctx), Outcome::Unchanged);
        assert_eq!(row.get(fields::SEO_TITLE), "Custom");
    }
}
