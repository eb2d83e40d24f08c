use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{Result, ScoutError};

/// Tabular input exactly as read, before any header or value cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// SHA-256 of the source bytes, hex encoded.
    pub fingerprint: String,
}

impl RawTable {
    /// Build a table from in-memory rows. The fingerprint covers headers and cells.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        for row in &rows {
            check_width(&headers, row)?;
        }
        let mut hasher = Sha256::new();
        for cell in headers.iter().chain(rows.iter().flatten()) {
            hasher.update(cell.as_bytes());
            hasher.update([0x1f]);
        }
        Ok(Self {
            headers,
            rows,
            fingerprint: format!("{:x}", hasher.finalize()),
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn load_csv(path: &Path) -> Result<RawTable> {
    let bytes = fs::read(path)?;
    debug!(path = %path.display(), bytes = bytes.len(), "loaded csv");
    read_csv(&bytes)
}

pub fn read_csv(bytes: &[u8]) -> Result<RawTable> {
    let fingerprint = format!("{:x}", Sha256::digest(bytes));
    // A leading BOM would otherwise end up glued to the first header.
    let body = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body);
    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Vec<String> = record.iter().map(str::to_string).collect();
        check_width(&headers, &row)?;
        rows.push(row);
    }
    debug!(columns = headers.len(), rows = rows.len(), "parsed csv");

    Ok(RawTable {
        headers,
        rows,
        fingerprint,
    })
}

fn check_width(headers: &[String], row: &[String]) -> Result<()> {
    if row.len() == headers.len() {
        return Ok(());
    }
    // Name the first header the row fails to cover, or the first surplus cell.
    let column = headers
        .get(row.len())
        .cloned()
        .unwrap_or_else(|| format!("<extra column {}>", headers.len() + 1));
    Err(ScoutError::schema(column))
}
