use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};

use crate::error::{Result, SyncError};
use crate::frame::{Cell, Frame, parse_timestamp};
use crate::io::{DATA_SHEET, SCHEMA_SHEET};
use crate::schema::{DatabaseSchema, PropertyConfig};

/// Reads a workbook following the conventions produced by the
/// [`excel_write`](crate::io::excel_write) module: a mandatory data sheet and
/// an optional schema sheet typing the columns.
pub fn read_frame(path: &Path) -> Result<(Frame, Option<DatabaseSchema>)> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;

    let schema = match workbook.worksheet_range(SCHEMA_SHEET) {
        Some(range) => Some(parse_schema_sheet(&range.map_err(SyncError::from)?)?),
        None => None,
    };

    let data_range = workbook
        .worksheet_range(DATA_SHEET)
        .ok_or_else(|| SyncError::InvalidWorkbook(format!("missing sheet '{DATA_SHEET}'")))?
        .map_err(SyncError::from)?;

    let mut rows = data_range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(first_row) => first_row
            .iter()
            .map(|cell| cell_to_string(Some(cell)))
            .collect(),
        None => {
            return Err(SyncError::InvalidWorkbook(format!(
                "sheet '{DATA_SHEET}' has no header row"
            )));
        }
    };

    let mut frame = Frame::new(headers.clone())?;
    for row in rows {
        let mut cells = Vec::with_capacity(headers.len());
        for (col_idx, header) in headers.iter().enumerate() {
            let config = schema.as_ref().and_then(|schema| schema.get(header));
            let cell = row
                .get(col_idx)
                .map(|raw| cell_to_value(header, raw, config))
                .transpose()?
                .unwrap_or(Cell::Empty);
            cells.push(cell);
        }
        if cells.iter().all(Cell::is_empty) {
            continue;
        }
        frame.push_row(cells)?;
    }

    Ok((frame, schema))
}

fn parse_schema_sheet(range: &calamine::Range<DataType>) -> Result<DatabaseSchema> {
    let mut configs = Vec::new();

    for row in range.rows().skip(1) {
        let column = cell_to_string(row.first());
        if column.is_empty() {
            continue;
        }
        let raw_config = cell_to_string(row.get(2));
        let config: PropertyConfig = serde_json::from_str(&raw_config).map_err(|err| {
            SyncError::InvalidWorkbook(format!(
                "column '{column}' has an invalid schema entry: {err}"
            ))
        })?;
        configs.push((column, config));
    }

    DatabaseSchema::new(configs)
}

/// Converts one raw worksheet cell into a frame cell, refined by the column
/// configuration when a schema sheet is present.
fn cell_to_value(column: &str, raw: &DataType, config: Option<&PropertyConfig>) -> Result<Cell> {
    let base = match raw {
        DataType::Empty => return Ok(Cell::Empty),
        DataType::String(value) => {
            if value.trim().is_empty() {
                return Ok(Cell::Empty);
            }
            return string_to_value(column, value, config);
        }
        DataType::Float(value) => Cell::Number(*value),
        DataType::Int(value) => Cell::Number(*value as f64),
        DataType::Bool(value) => Cell::Bool(*value),
        DataType::DateTime(_) => raw
            .as_datetime()
            .map(Cell::Timestamp)
            .unwrap_or(Cell::Empty),
        other => Cell::Text(other.to_string()),
    };
    Ok(base)
}

fn string_to_value(column: &str, value: &str, config: Option<&PropertyConfig>) -> Result<Cell> {
    match config {
        Some(PropertyConfig::Date { .. }) => Ok(Cell::Timestamp(parse_timestamp(value)?)),
        Some(PropertyConfig::Number { .. }) => value
            .trim()
            .parse::<f64>()
            .map(Cell::Number)
            .map_err(|_| SyncError::InvalidValue {
                column: column.to_string(),
                value: value.to_string(),
                reason: "expected a number".to_string(),
            }),
        Some(PropertyConfig::Checkbox { .. }) => match value.trim() {
            "true" | "TRUE" => Ok(Cell::Bool(true)),
            "false" | "FALSE" => Ok(Cell::Bool(false)),
            _ => Err(SyncError::InvalidValue {
                column: column.to_string(),
                value: value.to_string(),
                reason: "expected a boolean".to_string(),
            }),
        },
        Some(
            PropertyConfig::MultiSelect { .. }
            | PropertyConfig::Relation { .. }
            | PropertyConfig::People { .. }
            | PropertyConfig::Files { .. },
        ) => Ok(Cell::TextList(parse_list(value))),
        Some(_) => Ok(Cell::Text(value.to_string())),
        None => {
            // Without a schema sheet, string arrays written by the Excel
            // writer are still recognised; everything else stays text.
            if value.starts_with('[') {
                if let Ok(items) = serde_json::from_str::<Vec<String>>(value) {
                    return Ok(Cell::TextList(items));
                }
            }
            Ok(Cell::Text(value.to_string()))
        }
    }
}

/// Splits a list cell: a JSON string array round-trips exactly, anything
/// else falls back to comma separation for hand-authored sheets.
fn parse_list(value: &str) -> Vec<String> {
    if value.starts_with('[') {
        if let Ok(items) = serde_json::from_str::<Vec<String>>(value) {
            return items;
        }
    }
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.clone(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
