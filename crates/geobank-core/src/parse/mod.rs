// crates/geobank-core/src/parse/mod.rs

//! # Flat-File Parsers
//!
//! Handles the line layer (blank / comment lines, tab splitting, column
//! counts, UTF-8) and delegates each line to a format-specific
//! [`RowFormat`]. A line that does not fit its format is a [`Parsed::Skip`]
//! marker, counted in [`ParseStats`], never an error.
//!
//! Sources are re-readable: [`parse_tsv`] borrows the raw bytes and
//! [`ArchiveSource`] reopens the inner entry on every call.

use crate::error::{GeoError, Result};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read, Seek};
use std::path::Path;
use tracing::debug;

mod alternate;
mod city;
mod country;
mod reference;
mod region;

pub use alternate::{AlternateName, AlternateNameFormat};
pub use city::{CityFormat, CityRow};
pub use country::{parse_calling_codes, parse_language_tags, CountryFormat, CountryRow};
pub use reference::{parse_reference, ReferenceData};
pub use region::{RegionFormat, RegionRow};

// -----------------------------------------------------------------------------
// PARSE OUTCOME
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    Blank,
    Comment,
    TooFewColumns,
    /// The join key (geoname id, code) is missing or not a number.
    BadKey,
    /// Well-formed, but rejected by a caller-supplied filter.
    Filtered,
    InvalidUtf8,
}

/// Result of parsing one line: either a record or an explicit skip marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    Record(T),
    Skip(SkipReason),
}

/// Skip counters accumulated over one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub records: u64,
    pub blank: u64,
    pub comment: u64,
    pub too_few_columns: u64,
    pub bad_key: u64,
    pub filtered: u64,
    pub invalid_utf8: u64,
}

impl ParseStats {
    pub fn record_skip(&mut self, reason: SkipReason) {
        let slot = match reason {
            SkipReason::Blank => &mut self.blank,
            SkipReason::Comment => &mut self.comment,
            SkipReason::TooFewColumns => &mut self.too_few_columns,
            SkipReason::BadKey => &mut self.bad_key,
            SkipReason::Filtered => &mut self.filtered,
            SkipReason::InvalidUtf8 => &mut self.invalid_utf8,
        };
        *slot += 1;
    }

    /// Lines dropped as malformed (blank and comment lines excluded).
    pub fn malformed(&self) -> u64 {
        self.too_few_columns + self.bad_key + self.invalid_utf8
    }
}

impl fmt::Display for ParseStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} records, {} filtered, {} malformed (columns: {}, key: {}, utf8: {})",
            self.records,
            self.filtered,
            self.malformed(),
            self.too_few_columns,
            self.bad_key,
            self.invalid_utf8
        )
    }
}

// -----------------------------------------------------------------------------
// ROW FORMATS
// -----------------------------------------------------------------------------

/// A tab-separated line format.
pub trait RowFormat {
    type Row;

    /// Lines with fewer columns are skipped without calling [`Self::parse`].
    const MIN_COLUMNS: usize;

    /// Whether lines starting with `#` are comments in this format.
    const COMMENTS: bool = true;

    fn parse(&self, columns: &[&str]) -> Parsed<Self::Row>;
}

/// Parses a line without its terminator.
pub fn parse_line<F: RowFormat>(format: &F, line: &str) -> Parsed<F::Row> {
    if line.trim().is_empty() {
        return Parsed::Skip(SkipReason::Blank);
    }
    if F::COMMENTS && line.starts_with('#') {
        return Parsed::Skip(SkipReason::Comment);
    }
    let columns: Vec<&str> = line.split('\t').collect();
    if columns.len() < F::MIN_COLUMNS {
        return Parsed::Skip(SkipReason::TooFewColumns);
    }
    format.parse(&columns)
}

/// Geoname ids are the join key: unparsable means the line is unusable.
pub(crate) fn parse_id(column: &str) -> Option<u64> {
    column.trim().parse().ok()
}

/// Empty or unparsable numbers become `None` instead of failing the record.
pub(crate) fn parse_opt<T: std::str::FromStr>(column: &str) -> Option<T> {
    let column = column.trim();
    if column.is_empty() {
        return None;
    }
    column.parse().ok()
}

// -----------------------------------------------------------------------------
// LINE READER
// -----------------------------------------------------------------------------

/// Lazy iterator of records over any buffered reader.
///
/// Only I/O failures surface as `Err`; every other problem becomes a skip.
pub struct TsvReader<R, F> {
    reader: R,
    format: F,
    buf: Vec<u8>,
    stats: ParseStats,
    done: bool,
}

impl<R: BufRead, F: RowFormat> TsvReader<R, F> {
    pub fn new(reader: R, format: F) -> Self {
        Self {
            reader,
            format,
            buf: Vec::with_capacity(256),
            stats: ParseStats::default(),
            done: false,
        }
    }

    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Advances to the next line; `Ok(None)` at end of input.
    fn next_line(&mut self) -> std::io::Result<Option<Parsed<F::Row>>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
            self.buf.pop();
        }
        let parsed = match std::str::from_utf8(&self.buf) {
            Ok(line) => parse_line(&self.format, line),
            Err(_) => Parsed::Skip(SkipReason::InvalidUtf8),
        };
        Ok(Some(parsed))
    }
}

impl<R: BufRead, F: RowFormat> Iterator for TsvReader<R, F> {
    type Item = Result<F::Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.next_line() {
                Ok(Some(Parsed::Record(row))) => {
                    self.stats.records += 1;
                    return Some(Ok(row));
                }
                Ok(Some(Parsed::Skip(reason))) => self.stats.record_skip(reason),
                Ok(None) => {
                    self.done = true;
                    debug!("parse finished: {}", self.stats);
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(GeoError::Io(e)));
                }
            }
        }
    }
}

/// Parses an in-memory tab-separated payload.
pub fn parse_tsv<F: RowFormat>(bytes: &[u8], format: F) -> TsvReader<Cursor<&[u8]>, F> {
    TsvReader::new(Cursor::new(bytes), format)
}

// -----------------------------------------------------------------------------
// ZIP ARCHIVES
// -----------------------------------------------------------------------------

/// A zip archive holding a tab-separated entry.
///
/// The entry is decompressed while it is read, never materialized whole.
pub struct ArchiveSource<R> {
    archive: zip::ZipArchive<R>,
}

impl ArchiveSource<File> {
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            GeoError::NotFound(format!("Archive not found at {}: {}", path.display(), e))
        })?;
        Self::new(file)
    }
}

impl<'a> ArchiveSource<Cursor<&'a [u8]>> {
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self> {
        Self::new(Cursor::new(bytes))
    }
}

impl<R: Read + Seek> ArchiveSource<R> {
    pub fn new(reader: R) -> Result<Self> {
        Ok(Self {
            archive: zip::ZipArchive::new(reader)?,
        })
    }

    /// Opens `entry` and parses it line by line.
    pub fn records<'s, F: RowFormat>(
        &'s mut self,
        entry: &str,
        format: F,
    ) -> Result<TsvReader<BufReader<Box<dyn Read + 's>>, F>> {
        let file = match self.archive.by_name(entry) {
            Ok(file) => file,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(GeoError::MissingEntry(entry.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let body: Box<dyn Read + 's> = Box::new(file);
        Ok(TsvReader::new(BufReader::new(body), format))
    }
}
