//! One-to-many image row expansion
//!
//! Each input record maps to zero or more output records:
//!
//! - a primary row with authoritative images gets the first URL and is
//!   followed by one image row per remaining URL; the handle's old
//!   image-only rows are dropped in favour of the new ones;
//! - a primary row with a local file gets the synthesized URL at position 1;
//! - an unresolved primary row keeps a public absolute URL; an empty,
//!   private or malformed value is cleared and reported;
//! - any other row has private URLs cleared and passes through.

use std::path::Path;
use std::sync::Arc;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{AssetRef, ImageConfig, ImageError, ImageResolver, Resolution};
use crate::config::ConfigError;
use crate::export::write_atomic;
use crate::models::{Dataset, Header, Record, RecordIssue, fields};
use crate::validation::is_url;

/// How a product's image was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageEntrySource {
    Authoritative,
    Local,
    Retained,
    Unmatched,
}

impl ImageEntrySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authoritative => "authoritative",
            Self::Local => "local",
            Self::Retained => "retained",
            Self::Unmatched => "unmatched",
        }
    }
}

/// One line of the image mapping report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageEntry {
    pub handle: String,
    pub source: ImageEntrySource,
    pub position: Option<usize>,
    pub url: String,
}

/// Per-product image resolution results
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReport {
    pub matched_authoritative: usize,
    pub matched_local: usize,
    pub retained: usize,
    pub unmatched: usize,
    /// Image rows added after primary rows
    pub rows_added: usize,
    /// Stale image-only rows replaced by authoritative ones
    pub rows_dropped: usize,
    /// Private URLs removed from any row
    pub private_cleared: usize,
    pub entries: Vec<ImageEntry>,
    #[serde(skip)]
    pub issues: Vec<RecordIssue>,
}

impl ImageReport {
    pub fn matched(&self) -> usize {
        self.matched_authoritative + self.matched_local
    }

    /// Write the mapping as `Handle,Source,Position,Image Src`.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), ImageError> {
        write_atomic(path.as_ref(), |file| {
            let mut writer = csv::Writer::from_writer(file);
            writer.write_record(["Handle", "Source", "Position", "Image Src"])?;
            for entry in &self.entries {
                let position = entry.position.map(|p| p.to_string()).unwrap_or_default();
                writer.write_record([
                    entry.handle.as_str(),
                    entry.source.as_str(),
                    position.as_str(),
                    entry.url.as_str(),
                ])?;
            }
            writer.flush()?;
            Ok(())
        })?;
        Ok(())
    }
}

/// Dataset stage applying an [`ImageResolver`]
#[derive(Debug, Clone)]
pub struct ImageExpansion {
    resolver: ImageResolver,
    private: Vec<Regex>,
}

impl ImageExpansion {
    pub fn new(resolver: ImageResolver, config: &ImageConfig) -> Result<Self, ConfigError> {
        let private = config
            .private_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                    context: "images.private_patterns".to_string(),
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { resolver, private })
    }

    pub fn is_private(&self, url: &str) -> bool {
        let url = url.trim();
        !url.is_empty() && self.private.iter().any(|regex| regex.is_match(url))
    }

    pub fn expand(&self, dataset: &mut Dataset) -> ImageReport {
        dataset.ensure_fields([fields::IMAGE_SRC, fields::IMAGE_POSITION, fields::IMAGE_ALT_TEXT]);
        let header = Arc::clone(dataset.header());

        let mut report = ImageReport::default();
        let mut replaced: Option<String> = None;
        let mut output = Vec::with_capacity(dataset.len());
        for record in std::mem::take(&mut dataset.records) {
            if record.is_primary() && record.has(fields::HANDLE) {
                replaced = None;
                self.expand_primary(record, &header, &mut replaced, &mut report, &mut output);
                continue;
            }
            if record.is_image_only() && replaced.as_deref() == Some(record.handle()) {
                debug!(line = record.line, handle = record.handle(), "Dropping replaced image row");
                report.rows_dropped += 1;
                continue;
            }
            output.push(self.clear_private(record, &mut report));
        }
        dataset.replace_records(output);

        info!(
            authoritative = report.matched_authoritative,
            local = report.matched_local,
            retained = report.retained,
            unmatched = report.unmatched,
            rows_added = report.rows_added,
            "Images resolved"
        );
        report
    }

    fn expand_primary(
        &self,
        mut record: Record,
        header: &Arc<Header>,
        replaced: &mut Option<String>,
        report: &mut ImageReport,
        output: &mut Vec<Record>,
    ) {
        let handle = record.handle().to_string();
        let title = record.title().to_string();

        match self.resolver.resolve(&handle) {
            Resolution::Authoritative(refs) => {
                report.matched_authoritative += 1;
                let mut refs = refs.into_iter();
                if let Some(first) = refs.next() {
                    set_image(&mut record, &first);
                    record.set_if_empty(fields::IMAGE_ALT_TEXT, title.clone());
                    report.entries.push(entry(&handle, ImageEntrySource::Authoritative, &first));
                }
                output.push(record);
                for asset in refs {
                    let mut row = Record::auxiliary(Arc::clone(header), &handle);
                    set_image(&mut row, &asset);
                    row.set(fields::IMAGE_ALT_TEXT, title.clone());
                    report.entries.push(entry(&handle, ImageEntrySource::Authoritative, &asset));
                    report.rows_added += 1;
                    output.push(row);
                }
                *replaced = Some(handle);
            }
            Resolution::Local(asset) => {
                report.matched_local += 1;
                set_image(&mut record, &asset);
                record.set_if_empty(fields::IMAGE_ALT_TEXT, title);
                report.entries.push(entry(&handle, ImageEntrySource::Local, &asset));
                output.push(record);
            }
            Resolution::Unresolved => {
                let current = record.get(fields::IMAGE_SRC).trim().to_string();
                if current.is_empty() || self.is_private(&current) || !is_url(&current) {
                    if self.is_private(&current) {
                        report.private_cleared += 1;
                    } else if !current.is_empty() {
                        debug!(line = record.line, handle = %handle, value = %current, "Clearing malformed image value");
                    }
                    record.set(fields::IMAGE_SRC, "");
                    record.set(fields::IMAGE_POSITION, "");
                    report.unmatched += 1;
                    report.entries.push(ImageEntry {
                        handle: handle.clone(),
                        source: ImageEntrySource::Unmatched,
                        position: None,
                        url: String::new(),
                    });
                    report.issues.push(RecordIssue::AssetNotFound {
                        line: record.line,
                        handle,
                    });
                } else {
                    report.retained += 1;
                    report.entries.push(ImageEntry {
                        handle,
                        source: ImageEntrySource::Retained,
                        position: record.get(fields::IMAGE_POSITION).trim().parse().ok(),
                        url: current,
                    });
                }
                output.push(record);
            }
        }
    }

    fn clear_private(&self, mut record: Record, report: &mut ImageReport) -> Record {
        if self.is_private(record.get(fields::IMAGE_SRC)) {
            debug!(line = record.line, handle = record.handle(), "Clearing private image URL");
            record.set(fields::IMAGE_SRC, "");
            record.set(fields::IMAGE_POSITION, "");
            report.private_cleared += 1;
        }
        record
    }
}

fn set_image(record: &mut Record, asset: &AssetRef) {
    record.set(fields::IMAGE_SRC, asset.url.clone());
    record.set(fields::IMAGE_POSITION, asset.position.to_string());
}

fn entry(handle: &str, source: ImageEntrySource, asset: &AssetRef) -> ImageEntry {
    ImageEntry {
        handle: handle.to_string(),
        source,
        position: Some(asset.position),
        url: asset.url.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::images::{AuthoritativeImages, LocalAssetDirectory};
    use tempfile::TempDir;

    const BASE: &str = "https://cdn.example.com/products";

    fn catalog(rows: &[[&str; 4]]) -> Dataset {
        let mut dataset = Dataset::new(Header::new([
            fields::HANDLE,
            fields::TITLE,
            fields::VARIANT_SKU,
            fields::IMAGE_SRC,
        ]));
        for (idx, row) in rows.iter().enumerate() {
            dataset.push_values(row.iter().map(|s| s.to_string()).collect(), idx + 2);
        }
        dataset
    }

    fn expansion(authoritative: &[[&str; 3]], local: &[&str]) -> ImageExpansion {
        let mut source = Dataset::new(Header::new([
            fields::HANDLE,
            fields::IMAGE_SRC,
            fields::IMAGE_POSITION,
        ]));
        for row in authoritative {
            source.push_values(row.iter().map(|s| s.to_string()).collect(), 0);
        }
        let resolver = ImageResolver::new(
            AuthoritativeImages::from_dataset(&source),
            LocalAssetDirectory::from_names(local.iter().copied()),
            BASE,
        );
        ImageExpansion::new(resolver, &ImageConfig::default()).unwrap()
    }

    #[test]
    fn test_authoritative_images_expand_after_primary() {
        let mut dataset = catalog(&[
            ["drops", "Eye Drops", "ECOC-D", "https://old.example.com/d.png"],
            ["drops", "", "", "https://old.example.com/d2.png"],
            ["drops", "", "ECOC-D-2", ""],
            ["mask", "Eye Mask", "ECOC-M", ""],
        ]);
        let stage = expansion(
            &[
                ["drops", "https://shop.example.com/d-1.jpg", "1"],
                ["drops", "https://shop.example.com/d-2.jpg", "2"],
                ["drops", "https://shop.example.com/d-3.jpg", "3"],
            ],
            &[],
        );

        let report = stage.expand(&mut dataset);
        let rows: Vec<(&str, &str, &str)> = dataset
            .records
            .iter()
            .map(|r| (r.handle(), r.get(fields::IMAGE_SRC), r.get(fields::IMAGE_POSITION)))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("drops", "https://shop.example.com/d-1.jpg", "1"),
                ("drops", "https://shop.example.com/d-2.jpg", "2"),
                ("drops", "https://shop.example.com/d-3.jpg", "3"),
                ("drops", "", ""),
                ("mask", "", ""),
            ]
        );
        assert_eq!(dataset.records[1].get(fields::IMAGE_ALT_TEXT), "Eye Drops");
        assert_eq!(dataset.records[1].get(fields::VARIANT_SKU), "");
        assert_eq!(report.matched_authoritative, 1);
        assert_eq!(report.rows_added, 2);
        assert_eq!(report.rows_dropped, 1);
        assert_eq!(report.unmatched, 1);
        assert_eq!(report.issues.len(), 1);
    }

    #[test]
    fn test_expansion_is_idempotent() {
        let stage = expansion(
            &[
                ["drops", "https://shop.example.com/d-1.jpg", "1"],
                ["drops", "https://shop.example.com/d-2.jpg", "2"],
            ],
            &["mask.webp"],
        );
        let mut dataset = catalog(&[
            ["drops", "Eye Drops", "ECOC-D", ""],
            ["mask", "Eye Mask", "ECOC-M", ""],
        ]);
        stage.expand(&mut dataset);
        let once = dataset.records.clone();
        stage.expand(&mut dataset);
        assert_eq!(dataset.records, once);
        assert_eq!(dataset.len(), 3);
    }

    #[test]
    fn test_local_match_scenario() {
        let stage = expansion(&[], &["widget-a.png"]);
        let mut dataset = catalog(&[["widget-a", "Widget A", "ECOC-WA", ""]]);
        let report = stage.expand(&mut dataset);
        assert_eq!(
            dataset.records[0].get(fields::IMAGE_SRC),
            format!("{}/widget-a.png", BASE)
        );
        assert_eq!(dataset.records[0].get(fields::IMAGE_POSITION), "1");
        assert_eq!(report.matched_local, 1);
    }

    #[test]
    fn test_private_url_is_cleared_when_unresolved() {
        let stage = expansion(&[], &["widget-a.png"]);
        let mut dataset = catalog(&[
            ["widget-b", "Widget B", "ECOC-WB", "https://files.example.com/private/widget-b.png"],
            ["widget-c", "Widget C", "ECOC-WC", "https://shop.example.com/widget-c.png"],
        ]);
        let report = stage.expand(&mut dataset);
        assert_eq!(dataset.records[0].get(fields::IMAGE_SRC), "");
        assert_eq!(
            dataset.records[1].get(fields::IMAGE_SRC),
            "https://shop.example.com/widget-c.png"
        );
        assert_eq!(report.unmatched, 1);
        assert_eq!(report.retained, 1);
        assert_eq!(report.private_cleared, 1);
        assert!(matches!(
            report.issues[0],
            RecordIssue::AssetNotFound { line: 2, .. }
        ));
    }

    #[test]
    fn test_malformed_image_value_is_cleared_when_unresolved() {
        let stage = expansion(&[], &[]);
        let mut dataset = catalog(&[
            ["widget-c", "Widget C", "ECOC-WC", "widget-c.png"],
            ["widget-d", "Widget D", "ECOC-WD", "https://shop.example.com/widget-d.png"],
        ]);
        let report = stage.expand(&mut dataset);
        assert_eq!(dataset.records[0].get(fields::IMAGE_SRC), "");
        assert_eq!(report.unmatched, 1);
        assert_eq!(report.retained, 1);
        assert_eq!(report.private_cleared, 0);
        assert_eq!(report.issues.len(), 1);
        assert!(matches!(
            &report.issues[0],
            RecordIssue::AssetNotFound { handle, .. } if handle == "widget-c"
        ));
    }

    #[test]
    fn test_variant_rows_lose_private_urls() {
        let stage = expansion(&[], &[]);
        let mut dataset = catalog(&[
            ["drops", "Eye Drops", "ECOC-D", "https://shop.example.com/d.png"],
            ["drops", "", "ECOC-D-2", "http://localhost:3000/d2.png"],
        ]);
        stage.expand(&mut dataset);
        assert_eq!(dataset.records[1].get(fields::IMAGE_SRC), "");
        assert_eq!(dataset.records[1].get(fields::VARIANT_SKU), "ECOC-D-2");
    }

    #[test]
    fn test_invalid_private_pattern() {
        let config = ImageConfig {
            private_patterns: vec!["(".to_string()],
            ..Default::default()
        };
        let err = ImageExpansion::new(ImageResolver::default(), &config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn test_report_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("image_mapping.csv");
        let stage = expansion(&[], &["widget-a.png"]);
        let mut dataset = catalog(&[
            ["widget-a", "Widget A", "ECOC-WA", ""],
            ["widget-b", "Widget B", "ECOC-WB", ""],
        ]);
        stage.expand(&mut dataset).write_csv(&path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Handle,Source,Position,Image Src");
        assert_eq!(
            lines[1],
            "widget-a,local,1,https://cdn.example.com/products/widget-a.png"
        );
        assert_eq!(lines[2], "widget-b,unmatched,,");
    }
}
