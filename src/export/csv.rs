//! CSV catalog writer

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, WriterBuilder};
use tracing::debug;

use super::{ExportError, ExportResult};
use crate::models::{Dataset, LineEnding};

/// CSV exporter for catalog datasets
#[derive(Debug, Clone)]
pub struct CsvExporter {
    /// Field delimiter
    pub delimiter: u8,
}

impl Default for CsvExporter {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Serialize the dataset: one header line, then one line per record,
    /// ending lines the way the source file did.
    pub fn write<W: Write>(&self, dataset: &Dataset, writer: W) -> Result<ExportResult, ExportError> {
        let terminator = match dataset.line_ending {
            LineEnding::Lf => Terminator::Any(b'\n'),
            LineEnding::CrLf => Terminator::CRLF,
        };
        let mut wtr = WriterBuilder::new()
            .delimiter(self.delimiter)
            .quote_style(QuoteStyle::Necessary)
            .terminator(terminator)
            .from_writer(writer);

        let header = dataset.header();
        wtr.write_record(header.names())?;
        for record in &dataset.records {
            // Records built before a header extension are padded on write.
            let values = record.values();
            if values.len() == header.len() {
                wtr.write_record(values)?;
            } else {
                let padded = (0..header.len()).map(|idx| values.get(idx).map(String::as_str).unwrap_or(""));
                wtr.write_record(padded)?;
            }
        }
        wtr.flush()?;

        Ok(ExportResult {
            path: None,
            rows: dataset.len(),
            fields: header.len(),
        })
    }

    /// Serialize to a string.
    pub fn to_string(&self, dataset: &Dataset) -> Result<String, ExportError> {
        let mut buf = Vec::new();
        self.write(dataset, &mut buf)?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Write the dataset to `path` through a temporary sibling file.
    ///
    /// The destination is only replaced once the whole file has been written.
    pub fn write_path(&self, dataset: &Dataset, path: &Path) -> Result<ExportResult, ExportError> {
        let mut result = None;
        write_atomic(path, |writer| {
            result = Some(self.write(dataset, writer)?);
            Ok(())
        })?;
        debug!(path = %path.display(), rows = dataset.len(), "Catalog written");
        let mut result = result.unwrap_or(ExportResult {
            path: None,
            rows: dataset.len(),
            fields: dataset.header().len(),
        });
        result.path = Some(path.to_path_buf());
        Ok(result)
    }
}

/// Temporary path used while writing `path`.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "output".into());
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write a file via temp-then-rename.
///
/// On any failure the temporary file is removed and the destination is left
/// as it was.
pub fn write_atomic<F>(path: &Path, write: F) -> Result<(), ExportError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), ExportError>,
{
    let tmp = temp_path(path);
    let file = File::create(&tmp).map_err(|e| ExportError::output(path, e))?;
    let mut writer = BufWriter::new(file);

    let written = write(&mut writer).and_then(|_| writer.flush().map_err(|e| ExportError::output(path, e)));
    drop(writer);
    if let Err(err) = written {
        let _ = fs::remove_file(&tmp);
        return Err(match err {
            ExportError::Io(source) => ExportError::output(path, source),
            other => other,
        });
    }

    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        ExportError::output(path, e)
    })
}
