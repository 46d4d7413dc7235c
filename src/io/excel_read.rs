use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::{MergeError, Result};
use crate::model::{CellValue, Table};

/// Reads the first worksheet of an Excel workbook into a [`Table`]. The
/// first row supplies the column names; subsequent rows become typed cells.
pub fn read_table(path: &Path) -> Result<Table> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| MergeError::InvalidWorkbook("workbook contains no sheets".into()))?;
    let range = workbook
        .worksheet_range(&sheet)
        .ok_or_else(|| MergeError::InvalidWorkbook(format!("missing sheet '{sheet}'")))?
        .map_err(MergeError::from)?;

    let mut rows = range.rows();
    let columns: Vec<String> = match rows.next() {
        Some(header) => header
            .iter()
            .map(|cell| cell_to_value(cell).to_text())
            .collect(),
        None => Vec::new(),
    };

    let mut table = Table::new(columns);
    for row in rows {
        table.push_row(row.iter().map(cell_to_value).collect());
    }

    debug!(
        sheet = %sheet,
        rows = table.row_count(),
        columns = table.columns.len(),
        "read spreadsheet table"
    );
    Ok(table)
}

fn cell_to_value(cell: &DataType) -> CellValue {
    match cell {
        DataType::String(value) => CellValue::Text(value.clone()),
        DataType::Int(value) => CellValue::Integer(*value),
        DataType::Float(value) => CellValue::Float(*value),
        DataType::Bool(value) => CellValue::Boolean(*value),
        DataType::DateTime(serial) => serial_to_datetime(*serial)
            .map(CellValue::Date)
            .unwrap_or(CellValue::Missing),
        DataType::Empty => CellValue::Missing,
        other => CellValue::Text(other.to_string()),
    }
}

// Excel serial dates count days from 1899-12-30, fractions carrying the
// time of day.
fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let seconds = (serial * 86_400.0).round() as i64;
    Some(epoch + Duration::seconds(seconds))
}
