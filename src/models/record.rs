//! Header-keyed catalog records
//!
//! A [`Dataset`] owns an ordered [`Header`] and the records read from one
//! catalog file. Every record holds exactly one value per header field, in
//! header order; empty strings stand for absent values. Record order is
//! significant: consecutive records sharing a handle form one product.

use std::collections::HashMap;
use std::sync::Arc;

use super::fields;

/// Ordered, de-duplicated list of field names
///
/// Names are kept as written for output; lookups ignore surrounding
/// whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Header {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Header {
    /// Build a header, keeping the first occurrence of duplicate names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut header = Self::default();
        for name in names {
            header.push(name);
        }
        header
    }

    /// Append a field name; returns false if it was already present.
    pub fn push(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        let key = name.trim();
        if self.index.contains_key(key) {
            return false;
        }
        self.index.insert(key.to_string(), self.names.len());
        self.names.push(name);
        true
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name.trim()).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name.trim())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// One catalog row keyed by its dataset header
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    header: Arc<Header>,
    values: Vec<String>,
    /// 1-based line number in the source file (0 for synthesized rows)
    pub line: usize,
    /// Original line text for rows that did not fit the header
    pub raw: Option<String>,
}

impl Record {
    /// Create a record from positional values.
    ///
    /// Missing trailing values are filled with empty strings and surplus
    /// values are dropped, so the record always matches the header width.
    pub fn from_values(header: Arc<Header>, mut values: Vec<String>, line: usize) -> Self {
        values.resize(header.len(), String::new());
        Self {
            header,
            values,
            line,
            raw: None,
        }
    }

    /// Create an empty record.
    pub fn empty(header: Arc<Header>) -> Self {
        Self::from_values(header, Vec::new(), 0)
    }

    /// Create an auxiliary row that carries only the handle.
    pub fn auxiliary(header: Arc<Header>, handle: &str) -> Self {
        let mut record = Self::empty(header);
        record.set(fields::HANDLE, handle);
        record
    }

    pub fn header(&self) -> &Arc<Header> {
        &self.header
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Value of a field, empty if the field is unknown or absent.
    pub fn get(&self, field: &str) -> &str {
        self.header
            .position(field)
            .and_then(|idx| self.values.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Set a field value.
    ///
    /// Returns true when the stored value changed. Unknown fields are left
    /// alone; extend the header through [`Dataset::ensure_field`] first.
    pub fn set(&mut self, field: &str, value: impl Into<String>) -> bool {
        let Some(idx) = self.header.position(field) else {
            return false;
        };
        let value = value.into();
        if self.values[idx] == value {
            return false;
        }
        self.values[idx] = value;
        true
    }

    /// Set a field only when it is currently empty.
    pub fn set_if_empty(&mut self, field: &str, value: impl Into<String>) -> bool {
        if !self.get(field).is_empty() {
            return false;
        }
        self.set(field, value)
    }

    pub fn has(&self, field: &str) -> bool {
        !self.get(field).trim().is_empty()
    }

    pub fn handle(&self) -> &str {
        self.get(fields::HANDLE)
    }

    pub fn title(&self) -> &str {
        self.get(fields::TITLE)
    }

    /// The first row of a product carries its title.
    pub fn is_primary(&self) -> bool {
        self.has(fields::TITLE)
    }

    /// Rows that describe a purchasable variant.
    pub fn is_sellable(&self) -> bool {
        self.has(fields::VARIANT_SKU)
            || self.has(fields::VARIANT_PRICE)
            || self.has(fields::OPTION1_VALUE)
    }

    /// Auxiliary rows carrying nothing but an image.
    pub fn is_image_only(&self) -> bool {
        !self.is_primary() && !self.is_sellable() && self.has(fields::IMAGE_SRC)
    }

    fn rebase(&mut self, header: Arc<Header>) {
        self.values.resize(header.len(), String::new());
        self.header = header;
    }
}

/// Product-level attributes of the handle group a row belongs to
///
/// Auxiliary rows carry no title or type of their own, so stages that key
/// off product text read it from here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupContext {
    pub handle: String,
    pub title: String,
    pub product_type: String,
    pub category: String,
}

impl GroupContext {
    pub fn from_primary(record: &Record) -> Self {
        Self {
            handle: record.handle().to_string(),
            title: record.title().to_string(),
            product_type: record.get(fields::TYPE).to_string(),
            category: record.get(fields::PRODUCT_CATEGORY).to_string(),
        }
    }

    /// Context for a row whose group has no primary row.
    pub fn orphan(record: &Record) -> Self {
        Self {
            handle: record.handle().to_string(),
            ..Default::default()
        }
    }

    /// Track the context while walking records in order.
    ///
    /// Primary rows start a new context; auxiliary rows reuse the current
    /// one when their handle matches.
    pub fn advance(current: &mut Option<GroupContext>, record: &Record) -> GroupContext {
        if record.is_primary() {
            let ctx = Self::from_primary(record);
            *current = Some(ctx.clone());
            return ctx;
        }
        match current {
            Some(ctx) if !ctx.handle.is_empty() && ctx.handle == record.handle() => ctx.clone(),
            _ => Self::orphan(record),
        }
    }
}

/// Line terminator of a catalog file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    /// Terminator of the first line in `bytes`; `Lf` when none is present.
    pub fn detect(bytes: &[u8]) -> Self {
        match bytes.iter().position(|b| *b == b'\n') {
            Some(idx) if idx > 0 && bytes[idx - 1] == b'\r' => LineEnding::CrLf,
            _ => LineEnding::Lf,
        }
    }
}

/// An ordered sequence of records sharing one header
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    header: Arc<Header>,
    pub records: Vec<Record>,
    /// Terminator used when the dataset is written back out
    pub line_ending: LineEnding,
}

impl Dataset {
    pub fn new(header: Header) -> Self {
        Self {
            header: Arc::new(header),
            records: Vec::new(),
            line_ending: LineEnding::default(),
        }
    }

    pub fn header(&self) -> &Arc<Header> {
        &self.header
    }

    /// Append a row of positional values.
    pub fn push_values(&mut self, values: Vec<String>, line: usize) -> &mut Record {
        let record = Record::from_values(Arc::clone(&self.header), values, line);
        self.records.push(record);
        let last = self.records.len() - 1;
        &mut self.records[last]
    }

    /// Make sure a field exists, extending the header and padding every record.
    ///
    /// Returns true if the header grew.
    pub fn ensure_field(&mut self, name: &str) -> bool {
        if self.header.contains(name) {
            return false;
        }
        let mut header = (*self.header).clone();
        header.push(name);
        self.header = Arc::new(header);
        for record in &mut self.records {
            record.rebase(Arc::clone(&self.header));
        }
        true
    }

    pub fn ensure_fields<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) -> usize {
        names
            .into_iter()
            .filter(|name| self.ensure_field(name))
            .count()
    }

    /// Replace the record list, rebasing every record on the current header.
    pub fn replace_records(&mut self, records: Vec<Record>) {
        self.records = records;
        let header = Arc::clone(&self.header);
        for record in &mut self.records {
            if !Arc::ptr_eq(record.header(), &header) {
                record.rebase(Arc::clone(&header));
            }
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
