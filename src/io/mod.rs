//! Workbook adapters converting between frames and Excel files.

pub mod excel_read;
pub mod excel_write;

/// Sheet holding the tabular data itself.
pub const DATA_SHEET: &str = "Data";
/// Sheet holding the per-column property configuration, so a pulled workbook
/// can be pushed back without re-inferring the schema.
pub const SCHEMA_SHEET: &str = "Schema";
