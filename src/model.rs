use std::collections::BTreeSet;

use chrono::{NaiveDateTime, NaiveTime};

use crate::error::{MergeError, Result};

/// A single cell as loaded from either input. Values stay typed until the
/// normalisation step coerces the merged table to text.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// Plain text.
    Text(String),
    /// Whole number.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Logical value.
    Boolean(bool),
    /// Calendar date, with an optional time-of-day component.
    Date(NaiveDateTime),
    /// Absent value (empty spreadsheet cell, blank DBF field).
    Missing,
}

impl CellValue {
    /// Canonical text form of the value. Integers render as plain decimal
    /// digits, floats use the shortest round-trip representation (so a
    /// whole-valued float renders without a trailing `.0`), dates render as
    /// `%Y-%m-%d` unless they carry a time of day, and missing values render
    /// as the empty string.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Text(value) => value.clone(),
            CellValue::Integer(value) => value.to_string(),
            CellValue::Float(value) => value.to_string(),
            CellValue::Boolean(value) => value.to_string(),
            CellValue::Date(value) => {
                if value.time() == NaiveTime::MIN {
                    value.format("%Y-%m-%d").to_string()
                } else {
                    value.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
            CellValue::Missing => String::new(),
        }
    }

    /// True for cells that carry no content: missing values and empty text.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Missing => true,
            CellValue::Text(value) => value.is_empty(),
            _ => false,
        }
    }
}

/// An in-memory table: ordered column names plus row-major cell storage.
/// Every row holds exactly one cell per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    /// Creates an empty table with the provided column names.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding short rows with missing cells and dropping
    /// cells beyond the column count.
    pub fn push_row(&mut self, mut cells: Vec<CellValue>) {
        cells.resize(self.columns.len(), CellValue::Missing);
        self.rows.push(cells);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Column names as an unordered set, used for schema comparison.
    pub fn column_set(&self) -> BTreeSet<&str> {
        self.columns.iter().map(String::as_str).collect()
    }

    /// Drops rows where every cell is blank and replaces the remaining
    /// missing cells with empty text. Idempotent.
    pub fn cleaned(&self) -> Table {
        let rows = self
            .rows
            .iter()
            .filter(|row| row.iter().any(|cell| !cell.is_blank()))
            .map(|row| {
                row.iter()
                    .map(|cell| match cell {
                        CellValue::Missing => CellValue::Text(String::new()),
                        other => other.clone(),
                    })
                    .collect()
            })
            .collect();

        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Returns a copy of the table with its columns rearranged into the
    /// given order. Fails if a requested column is absent.
    pub fn reordered(&self, order: &[String]) -> Result<Table> {
        let mut indices = Vec::with_capacity(order.len());
        for name in order {
            let index = self
                .columns
                .iter()
                .position(|column| column == name)
                .ok_or_else(|| MergeError::SchemaMismatch {
                    legacy: order.to_vec(),
                    incoming: self.columns.clone(),
                })?;
            indices.push(index);
        }

        let rows = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&index| row[index].clone()).collect())
            .collect();

        Ok(Table {
            columns: order.to_vec(),
            rows,
        })
    }

    /// Appends the other table's rows after this table's rows. The caller is
    /// responsible for harmonising column order first.
    pub fn concat(mut self, other: Table) -> Table {
        self.rows.extend(other.rows);
        self
    }

    /// Coerces every cell to its canonical text form.
    pub fn normalized(&self) -> Table {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| CellValue::Text(cell.to_text()))
                    .collect()
            })
            .collect();

        Table {
            columns: self.columns.clone(),
            rows,
        }
    }
}
