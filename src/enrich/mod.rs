//! Enrichment transforms
//!
//! Each transform fills or corrects a handful of fields on one record at a
//! time, reading product-level text from the record's [`GroupContext`].
//! Transforms are built from explicit config tables and are idempotent:
//! applying one to its own output reports [`Outcome::Unchanged`].

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub mod inventory;
pub mod pricing;
pub mod seo;
pub mod status;
pub mod tags;
pub mod weight;

pub use inventory::{InventoryConfig, InventoryDefaults};
pub use pricing::{PriceCorrection, PriceTier, PricingConfig, ProductPricing};
pub use seo::{SeoConfig, SeoDefaults};
pub use status::{Deactivation, DeactivationConfig, DeactivationRule, StatusConfig, StatusDefaults};
pub use tags::{TagConfig, TagInference, TagRule};
pub use weight::{WeightConfig, WeightEstimator, WeightRule};

use crate::config::CatalogConfig;
use crate::models::{Dataset, GroupContext, Record, RecordIssue};

static TAG_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Result of applying a transform to one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Unchanged,
    Changed,
    /// A lookup key had no entry; the record was left as is
    Missed(String),
}

impl Outcome {
    pub(crate) fn from_changed(changed: bool) -> Self {
        if changed {
            Outcome::Changed
        } else {
            Outcome::Unchanged
        }
    }
}

/// One enrichment pass over a record
pub trait Transform {
    /// Short name used in logs and run summaries
    fn name(&self) -> &'static str;

    /// Fields this transform may write; the dataset header is extended with
    /// them before the transform runs.
    fn writes(&self) -> &'static [&'static str];

    fn apply(&self, record: &mut Record, ctx: &GroupContext) -> Outcome;

    /// Lookup table a miss is reported against
    fn lookup_table(&self) -> &'static str {
        self.name()
    }
}

/// Per-transform counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformCounts {
    pub changed: usize,
    pub missed: usize,
}

/// Counters and issues from one enrichment pass
#[derive(Debug, Clone, Default)]
pub struct EnrichReport {
    pub counts: BTreeMap<String, TransformCounts>,
    pub issues: Vec<RecordIssue>,
}

impl EnrichReport {
    pub fn changed(&self, name: &str) -> usize {
        self.counts.get(name).map(|c| c.changed).unwrap_or(0)
    }

    pub fn missed(&self) -> usize {
        self.counts.values().map(|c| c.missed).sum()
    }
}

/// Ordered chain of transforms
pub struct Enricher {
    transforms: Vec<Box<dyn Transform>>,
}

impl Enricher {
    pub fn new(transforms: Vec<Box<dyn Transform>>) -> Self {
        Self { transforms }
    }

    /// Standard chain: tags, weight, price, status, deactivation, SEO, inventory.
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(vec![
            Box::new(TagInference::new(config.tags.clone())),
            Box::new(WeightEstimator::new(config.weights.clone())),
            Box::new(PriceCorrection::new(config.pricing.clone())),
            Box::new(StatusDefaults::new(config.status.clone())),
            Box::new(Deactivation::new(config.deactivation.clone())),
            Box::new(SeoDefaults::new(config.seo.clone())),
            Box::new(InventoryDefaults::new(config.inventory.clone())),
        ])
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    /// Run every transform over every record, in order.
    pub fn apply(&self, dataset: &mut Dataset) -> EnrichReport {
        let added = dataset.ensure_fields(self.transforms.iter().flat_map(|t| t.writes().iter().copied()));
        if added > 0 {
            debug!(fields_added = added, "Extended header for enrichment");
        }

        let mut report = EnrichReport::default();
        for transform in &self.transforms {
            report.counts.entry(transform.name().to_string()).or_default();
        }

        let mut current = None;
        for record in &mut dataset.records {
            let ctx = GroupContext::advance(&mut current, record);
            for transform in &self.transforms {
                let outcome = transform.apply(record, &ctx);
                let counts = report.counts.entry(transform.name().to_string()).or_default();
                match outcome {
                    Outcome::Unchanged => {}
                    Outcome::Changed => counts.changed += 1,
                    Outcome::Missed(key) => {
                        counts.missed += 1;
                        report.issues.push(RecordIssue::MissingLookup {
                            line: record.line,
                            handle: record.handle().to_string(),
                            table: transform.lookup_table().to_string(),
                            key,
                        });
                    }
                }
            }
        }

        for (name, counts) in &report.counts {
            info!(transform = %name, changed = counts.changed, missed = counts.missed, "Transform applied");
        }
        report
    }
}

/// Remove tags and common entities, collapsing whitespace.
pub fn strip_html(html: &str) -> String {
    let text = TAG_REGEX.replace_all(html, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate to at most `max` characters, never splitting a char.
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].trim_end(),
        None => text,
    }
}

pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    !needle.is_empty() && haystack.to_lowercase().contains(&needle.to_lowercase())
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Header, fields};

    #[test]
    fn test_strip_html() {
        assert_eq!(
            strip_html("<p>Soothing&nbsp;drops</p>\n<ul><li>Fast &amp; gentle</li></ul>"),
            "Soothing drops Fast & gentle"
        );
        assert_eq!(strip_html(""), "");
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 7), "héllo w");
        assert_eq!(truncate_chars("short", 300), "short");
        assert_eq!(truncate_chars("ab cd", 3), "ab");
    }

    #[test]
    fn test_enricher_runs_chain_and_is_idempotent() {
        let mut dataset = Dataset::new(Header::new([
            fields::HANDLE,
            fields::TITLE,
            fields::BODY_HTML,
            fields::VARIANT_SKU,
            fields::VARIANT_PRICE,
        ]));
        dataset.push_values(
            vec![
                "de3-omega-benefits".into(),
                "DE3 Omega Benefits 270ct 3 Month Supply".into(),
                "<p>Omega-3 supplement for dry eye</p>".into(),
                "ECOC-DE3-270".into(),
                "199.00".into(),
            ],
            2,
        );

        let enricher = Enricher::from_config(&CatalogConfig::default());
        let first = enricher.apply(&mut dataset);
        assert_eq!(first.changed("price"), 1);
        assert_eq!(first.changed("tags"), 1);
        assert!(dataset.header().contains(fields::STATUS));
        assert_eq!(dataset.records[0].get(fields::VARIANT_PRICE), "181.95");

        let snapshot = dataset.records.clone();
        let second = enricher.apply(&mut dataset);
        assert!(second.counts.values().all(|c| c.changed == 0));
        assert_eq!(dataset.records, snapshot);
    }
}
