use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

/// A single tabular cell. This is the neutral value space shared by the
/// spreadsheet adapters and the Notion property translation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum Cell {
    /// Absent or blank value.
    Empty,
    /// Plain text.
    Text(String),
    /// Floating point number.
    Number(f64),
    /// Boolean flag.
    Bool(bool),
    /// Point in time, without timezone attachment.
    Timestamp(NaiveDateTime),
    /// Multi-valued text, used for multi-selects, relations, and file lists.
    TextList(Vec<String>),
}

impl Cell {
    /// Returns `true` for [`Cell::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(value) => write!(f, "{value}"),
            Cell::Number(value) => write!(f, "{value}"),
            Cell::Bool(value) => write!(f, "{value}"),
            Cell::Timestamp(value) => write!(f, "{}", format_timestamp(value)),
            Cell::TextList(values) => write!(f, "{}", values.join(", ")),
        }
    }
}

/// An in-memory table: named columns and uniformly wide rows of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Frame {
    /// Creates an empty frame with the provided column names. Column names
    /// must be unique and non-empty.
    pub fn new(columns: Vec<String>) -> Result<Self> {
        for (index, column) in columns.iter().enumerate() {
            if column.trim().is_empty() {
                return Err(SyncError::InvalidWorkbook(format!(
                    "column {index} has an empty name"
                )));
            }
            if columns[..index].contains(column) {
                return Err(SyncError::InvalidWorkbook(format!(
                    "duplicate column name '{column}'"
                )));
            }
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
        })
    }

    /// Appends a row. The row must be exactly as wide as the column set.
    pub fn push_row(&mut self, row: Vec<Cell>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(SyncError::InvalidWorkbook(format!(
                "row {} has {} cells, expected {}",
                self.rows.len(),
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Column names, in order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows, in insertion order.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` when the frame holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the named column, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// The cell at the given row for the named column.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let index = self.column_index(column)?;
        self.rows.get(row).and_then(|cells| cells.get(index))
    }

    /// Iterates over every cell of the named column.
    pub fn column_cells<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Cell>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().filter_map(move |row| row.get(index)))
    }
}

/// Parses an ISO 8601 date or datetime string into a naive timestamp.
///
/// Accepted shapes are RFC 3339 ("2023-01-15T10:30:00.000+00:00"), a local
/// datetime without offset, and a bare date (midnight is assumed).
pub fn parse_timestamp(value: &str) -> Result<NaiveDateTime> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.naive_utc());
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(parsed);
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(parsed.and_time(NaiveTime::MIN));
    }
    Err(SyncError::InvalidTimestamp(value.to_string()))
}

/// Formats a timestamp the way Notion date values expect it: a bare date when
/// the time component is midnight, a full datetime otherwise.
pub fn format_timestamp(value: &NaiveDateTime) -> String {
    if value.time() == NaiveTime::MIN {
        value.format("%Y-%m-%d").to_string()
    } else {
        value.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}
