use std::path::Path;

use rust_xlsxwriter::Workbook;

use crate::error::Result;
use crate::frame::{Cell, Frame, format_timestamp};
use crate::io::{DATA_SHEET, SCHEMA_SHEET};
use crate::schema::DatabaseSchema;

/// Writes the frame to the given path. When a schema is provided it is
/// stored in a companion sheet next to the data.
pub fn write_frame(path: &Path, frame: &Frame, schema: Option<&DatabaseSchema>) -> Result<()> {
    let mut workbook = Workbook::new();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(DATA_SHEET)?;

    for (col_idx, header) in frame.columns().iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    for (row_idx, row) in frame.rows().iter().enumerate() {
        let row_idx = (row_idx + 1) as u32;
        for (col_idx, cell) in row.iter().enumerate() {
            let col_idx = col_idx as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(value) => {
                    worksheet.write_string(row_idx, col_idx, value)?;
                }
                Cell::Number(value) => {
                    worksheet.write_number(row_idx, col_idx, *value)?;
                }
                Cell::Bool(value) => {
                    worksheet.write_boolean(row_idx, col_idx, *value)?;
                }
                Cell::Timestamp(value) => {
                    worksheet.write_string(row_idx, col_idx, &format_timestamp(value))?;
                }
                Cell::TextList(values) => {
                    worksheet.write_string(row_idx, col_idx, &serde_json::to_string(values)?)?;
                }
            }
        }
    }

    let mut excel_table = rust_xlsxwriter::Table::new();
    excel_table.set_autofilter(true);
    let col_end = (frame.columns().len() as u16).saturating_sub(1);
    let row_end = if frame.is_empty() {
        0
    } else {
        frame.len() as u32
    };
    worksheet.add_table(0, 0, row_end, col_end, &excel_table)?;

    if let Some(schema) = schema {
        write_schema_sheet(&mut workbook, schema)?;
    }

    workbook.save(path)?;
    Ok(())
}

fn write_schema_sheet(workbook: &mut Workbook, schema: &DatabaseSchema) -> Result<()> {
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SCHEMA_SHEET)?;

    for (col_idx, header) in ["column", "type", "config"].iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, *header)?;
    }

    for (row_idx, (name, config)) in schema.iter().enumerate() {
        let row_idx = (row_idx + 1) as u32;
        worksheet.write_string(row_idx, 0, name)?;
        worksheet.write_string(row_idx, 1, config.type_name())?;
        worksheet.write_string(row_idx, 2, &serde_json::to_string(config)?)?;
    }

    Ok(())
}
