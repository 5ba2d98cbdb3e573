//! CSV catalog reader
//!
//! Reads a product export into header-keyed records. Rows whose field count
//! does not match the header are kept (padded or cut to the header width) and
//! reported, with their original text preserved for the repair stage.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder, WriterBuilder};
use tracing::{debug, warn};

use super::{ImportError, ImportResult};
use crate::models::{Dataset, Header, LineEnding, RecordIssue};

const UTF8_BOM: &str = "\u{feff}";

/// CSV importer for catalog exports
#[derive(Debug, Clone)]
pub struct CsvImporter {
    /// Field delimiter
    pub delimiter: u8,
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvImporter {
    /// Create a new importer with the default comma delimiter
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different field delimiter
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Read a catalog file from disk
    pub fn read_path(&self, path: &Path) -> Result<ImportResult, ImportError> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.to_path_buf()));
        }
        let file = File::open(path).map_err(|source| ImportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Reading catalog");
        self.read(file)
    }

    /// Read a catalog from any byte source
    pub fn read<R: Read>(&self, reader: R) -> Result<ImportResult, ImportError> {
        let mut reader = BufReader::new(reader);
        let line_ending = LineEnding::detect(reader.fill_buf().map_err(csv::Error::from)?);

        let mut rdr = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(reader);

        let mut issues = Vec::new();
        let mut raw = ByteRecord::new();

        if !rdr.read_byte_record(&mut raw)? {
            return Err(ImportError::EmptyInput);
        }
        let names = decode_fields(&raw);
        let mut header = Header::default();
        for (idx, name) in names.iter().enumerate() {
            let name = if idx == 0 {
                name.trim_start_matches(UTF8_BOM)
            } else {
                name.as_str()
            };
            if !header.push(name) {
                issues.push(RecordIssue::MalformedInput {
                    line: 1,
                    reason: format!("duplicate header field '{}'", name.trim()),
                    raw: join_csv_line(&names),
                });
            }
        }
        if header.is_empty() {
            return Err(ImportError::EmptyInput);
        }

        let width = names.len();
        let mut dataset = Dataset::new(header);
        dataset.line_ending = line_ending;

        loop {
            match rdr.read_byte_record(&mut raw) {
                Ok(false) => break,
                Ok(true) => {
                    let line = raw.position().map(|p| p.line() as usize).unwrap_or(0);
                    let values = decode_fields(&raw);
                    let malformed = values.len() != width;
                    let text = join_csv_line(&values);
                    let values = realign(values, &names, dataset.header());

                    let record = dataset.push_values(values, line);
                    if malformed {
                        warn!(line, expected = width, found = raw.len(), "Row does not match header width");
                        record.raw = Some(text.clone());
                        issues.push(RecordIssue::MalformedInput {
                            line,
                            reason: format!("expected {} fields, found {}", width, raw.len()),
                            raw: text,
                        });
                    }
                }
                Err(err) if err.is_io_error() => return Err(ImportError::Csv(err)),
                Err(err) => {
                    let line = err.position().map(|p| p.line() as usize).unwrap_or(0);
                    warn!(line, error = %err, "Unparseable row kept for inspection");
                    let text = String::from_utf8_lossy(raw.as_slice()).into_owned();
                    let record = dataset.push_values(Vec::new(), line);
                    record.raw = Some(text.clone());
                    issues.push(RecordIssue::MalformedInput {
                        line,
                        reason: err.to_string(),
                        raw: text,
                    });
                }
            }
        }

        debug!(
            records = dataset.len(),
            fields = dataset.header().len(),
            malformed = issues.len(),
            "Catalog read"
        );

        Ok(ImportResult { dataset, issues })
    }
}

fn decode_fields(record: &ByteRecord) -> Vec<String> {
    record
        .iter()
        .map(|field| String::from_utf8_lossy(field).into_owned())
        .collect()
}

/// Map raw positional values onto the de-duplicated header.
///
/// Values under a duplicated header name are dropped so the remaining values
/// keep their declared positions.
fn realign(values: Vec<String>, names: &[String], header: &Header) -> Vec<String> {
    if names.len() == header.len() {
        return values;
    }
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| match names.get(*idx) {
            Some(name) => seen.insert(name.trim().trim_start_matches(UTF8_BOM).to_string()),
            None => true,
        })
        .map(|(_, value)| value)
        .collect()
}

/// Render fields as a single CSV line without the trailing newline.
pub fn join_csv_line(fields: &[String]) -> String {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    if writer.write_record(fields).is_err() {
        return fields.join(",");
    }
    match writer.into_inner() {
        Ok(bytes) => String::from_utf8_lossy(&bytes).trim_end_matches(['\r', '\n']).to_string(),
        Err(_) => fields.join(","),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_simple_catalog() {
        let input = "Handle,Title,Variant Price\ndrops,Eye Drops,19.95\ndrops,,24.95\n";
        let result = CsvImporter::new().read(input.as_bytes()).unwrap();

        assert!(result.issues.is_empty());
        assert_eq!(result.dataset.len(), 2);
        let first = &result.dataset.records[0];
        assert_eq!(first.handle(), "drops");
        assert_eq!(first.get("Variant Price"), "19.95");
        assert_eq!(first.line, 2);
        assert!(!result.dataset.records[1].is_primary());
    }

    #[test]
    fn test_quoted_fields_with_commas_and_newlines() {
        let input = "Handle,Body (HTML)\ndrops,\"<p>Soothing, gentle\nrelief</p>\"\n";
        let result = CsvImporter::new().read(input.as_bytes()).unwrap();
        assert_eq!(
            result.dataset.records[0].get("Body (HTML)"),
            "<p>Soothing, gentle\nrelief</p>"
        );
    }

    #[test]
    fn test_malformed_row_is_retained() {
        let input = "Handle,Title,Variant Price\ndrops,Eye Drops,19.95,EXTRA\nmask,Mask\n";
        let result = CsvImporter::new().read(input.as_bytes()).unwrap();

        assert_eq!(result.dataset.len(), 2);
        assert_eq!(result.malformed_count(), 2);

        let long = &result.dataset.records[0];
        assert_eq!(long.get("Variant Price"), "19.95");
        assert_eq!(long.raw.as_deref(), Some("drops,Eye Drops,19.95,EXTRA"));

        let short = &result.dataset.records[1];
        assert_eq!(short.get("Variant Price"), "");
        assert!(short.raw.is_some());
    }

    #[test]
    fn test_bom_and_duplicate_header() {
        let input = "\u{feff}Handle,Title,Title\ndrops,Eye Drops,ignored\n";
        let result = CsvImporter::new().read(input.as_bytes()).unwrap();

        assert_eq!(result.dataset.header().names(), ["Handle", "Title"]);
        assert_eq!(result.dataset.records[0].title(), "Eye Drops");
        assert_eq!(result.malformed_count(), 1);
    }

    #[test]
    fn test_crlf_input_and_padded_header_names() {
        let input = "Handle, Title\r\ndrops,Eye Drops\r\n";
        let result = CsvImporter::new().read(input.as_bytes()).unwrap();

        assert_eq!(result.dataset.line_ending, LineEnding::CrLf);
        assert_eq!(result.dataset.header().names(), ["Handle", " Title"]);
        assert_eq!(result.dataset.records[0].title(), "Eye Drops");
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let err = CsvImporter::new().read("".as_bytes()).unwrap_err();
        assert!(matches!(err, ImportError::EmptyInput));
    }

    #[test]
    fn test_join_csv_line_quotes_when_needed() {
        let line = join_csv_line(&["a".to_string(), "b,c".to_string()]);
        assert_eq!(line, "a,\"b,c\"");
    }
}
