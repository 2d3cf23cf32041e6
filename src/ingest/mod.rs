//! Upload decoding
//!
//! Turns uploaded bytes into ordered transaction rows (first sheet of a
//! workbook, or a CSV file) or into document text. The first row is always
//! the header.

use std::fmt;
use std::io::Cursor;

use calamine::{Data, Reader};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScreeningError};

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

/// A single spreadsheet cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Empty,
}

impl CellValue {
    /// Text content, if this is a non-blank string cell
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) if !s.trim().is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    fn from_csv_field(field: &str) -> Self {
        let trimmed = field.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }
        match trimmed.parse::<f64>() {
            Ok(n) if n.is_finite() => Self::Number(n),
            _ => Self::Text(field.to_string()),
        }
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::String(s) => Self::Text(s.clone()),
            Data::Float(f) => Self::Number(*f),
            Data::Int(i) => Self::Number(*i as f64),
            Data::Bool(b) => Self::Bool(*b),
            Data::DateTime(dt) => Self::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Self::Text(s.clone()),
            Data::Error(_) | Data::Empty => Self::Empty,
        }
    }
}

/// String form used for extraction and identifiers. Integral numbers drop
/// the fractional part (`5000000`, not `5000000.0`).
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Empty => Ok(()),
        }
    }
}

/// One spreadsheet row as ordered (column, value) pairs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRow {
    pub cells: Vec<(String, CellValue)>,
}

impl TransactionRow {
    pub fn new(cells: Vec<(String, CellValue)>) -> Self {
        Self { cells }
    }

    /// Build a row of text cells
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            cells: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), CellValue::Text(v.to_string())))
                .collect(),
        }
    }

    /// Value of the first column with this name
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(name, _)| name == column).map(|(_, v)| v)
    }

    /// Non-blank string cells in column order
    pub fn text_cells(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells
            .iter()
            .filter_map(|(name, value)| value.as_text().map(|text| (name.as_str(), text)))
    }

    fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.is_empty())
    }
}

/// Decode a spreadsheet upload into rows.
///
/// Zip or OLE magic bytes select the workbook reader (xlsx/xlsm/ods/xls);
/// anything else is read as CSV. Fully blank rows are dropped.
pub fn parse_spreadsheet(bytes: &[u8]) -> Result<Vec<TransactionRow>> {
    let rows = if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
        parse_workbook(bytes)?
    } else {
        parse_csv(bytes)?
    };
    Ok(rows.into_iter().filter(|row| !row.is_blank()).collect())
}

fn header_names(raw: impl Iterator<Item = String>) -> Vec<String> {
    raw.enumerate()
        .map(|(idx, name)| {
            let name = name.trim();
            if name.is_empty() {
                format!("Column {}", idx + 1)
            } else {
                name.to_string()
            }
        })
        .collect()
}

fn parse_workbook(bytes: &[u8]) -> Result<Vec<TransactionRow>> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ScreeningError::Spreadsheet("workbook has no sheets".to_string()))??;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    let columns = header_names(header.iter().map(|d| CellValue::from(d).to_string()));

    Ok(rows
        .map(|cells| {
            TransactionRow::new(
                columns
                    .iter()
                    .zip(cells.iter())
                    .map(|(name, data)| (name.clone(), CellValue::from(data)))
                    .collect(),
            )
        })
        .collect())
}

fn parse_csv(bytes: &[u8]) -> Result<Vec<TransactionRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes));

    let columns = header_names(reader.headers()?.iter().map(str::to_string));

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(TransactionRow::new(
            columns
                .iter()
                .zip(record.iter())
                .map(|(name, field)| (name.clone(), CellValue::from_csv_field(field)))
                .collect(),
        ));
    }
    Ok(rows)
}

/// Decode an uploaded text document as UTF-8, dropping a leading BOM
pub fn decode_text(bytes: &[u8]) -> Result<String> {
    let text = String::from_utf8(bytes.to_vec())?;
    Ok(text.strip_prefix('\u{feff}').map(str::to_string).unwrap_or(text))
}
