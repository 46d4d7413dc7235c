//! dBASE III attribute-table codec.
//!
//! File layout:
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │ Header (32 bytes)                                │
//! │   - Version: u8 (0x03)                           │
//! │   - Last update: yy mm dd (yy = years from 1900) │
//! │   - Record count: u32 LE                         │
//! │   - Header length: u16 LE                        │
//! │   - Record length: u16 LE                        │
//! ├──────────────────────────────────────────────────┤
//! │ Field descriptors (32 bytes each)                │
//! │   - Name: 11 bytes, NUL padded                   │
//! │   - Type: u8 ('C', 'N', 'F', 'L', 'D')           │
//! │   - Length: u8, decimal count: u8                │
//! ├──────────────────────────────────────────────────┤
//! │ 0x0D terminator                                  │
//! ├──────────────────────────────────────────────────┤
//! │ Records: deletion flag + fixed-width fields      │
//! ├──────────────────────────────────────────────────┤
//! │ 0x1A end-of-file marker                          │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! The writer declares every column as a character field of
//! [`OUTPUT_FIELD_WIDTH`] bytes; oversized values are rejected outright
//! rather than truncated, before the output file is created.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use chrono::{Datelike, Local, NaiveDate};
use tracing::debug;

use crate::error::{MergeError, Result};
use crate::model::{CellValue, Table};

const HEADER_SIZE: usize = 32;
const DESCRIPTOR_SIZE: usize = 32;
const HEADER_TERMINATOR: u8 = 0x0D;
const EOF_MARKER: u8 = 0x1A;
const RECORD_LIVE: u8 = b' ';
const RECORD_DELETED: u8 = b'*';
const VERSION_DBASE3: u8 = 0x03;
const MAX_FIELD_NAME: usize = 10;

/// Width declared for every character field in the merged output.
pub const OUTPUT_FIELD_WIDTH: usize = 255;

struct FieldDescriptor {
    name: String,
    kind: u8,
    length: usize,
    decimals: u8,
}

fn malformed(reason: &str) -> MergeError {
    MergeError::MalformedDbf(reason.to_string())
}

/// Reads a DBF file into a [`Table`]. Deleted records are skipped; field
/// values are decoded to their declared types, with blank or unparsable
/// numeric, logical, and date fields becoming missing cells.
pub fn read_table(path: &Path) -> Result<Table> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut header = [0u8; HEADER_SIZE];
    reader
        .read_exact(&mut header)
        .map_err(|_| malformed("truncated header"))?;

    let record_count = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as usize;
    let header_len = u16::from_le_bytes([header[8], header[9]]) as usize;
    let record_len = u16::from_le_bytes([header[10], header[11]]) as usize;

    if header_len <= HEADER_SIZE || (header_len - HEADER_SIZE - 1) % DESCRIPTOR_SIZE != 0 {
        return Err(malformed("inconsistent header length"));
    }
    let field_count = (header_len - HEADER_SIZE - 1) / DESCRIPTOR_SIZE;

    let mut fields = Vec::with_capacity(field_count);
    for _ in 0..field_count {
        let mut raw = [0u8; DESCRIPTOR_SIZE];
        reader
            .read_exact(&mut raw)
            .map_err(|_| malformed("truncated field descriptors"))?;
        let name_end = raw[..11].iter().position(|&byte| byte == 0).unwrap_or(11);
        fields.push(FieldDescriptor {
            name: String::from_utf8_lossy(&raw[..name_end]).into_owned(),
            kind: raw[11],
            length: raw[16] as usize,
            decimals: raw[17],
        });
    }

    let mut terminator = [0u8; 1];
    reader
        .read_exact(&mut terminator)
        .map_err(|_| malformed("missing header terminator"))?;
    if terminator[0] != HEADER_TERMINATOR {
        return Err(malformed("missing header terminator"));
    }

    let expected_len = 1 + fields.iter().map(|field| field.length).sum::<usize>();
    if expected_len != record_len {
        return Err(malformed("record length does not match field widths"));
    }

    let mut table = Table::new(fields.iter().map(|field| field.name.clone()).collect());
    let mut record = vec![0u8; record_len];
    for _ in 0..record_count {
        reader
            .read_exact(&mut record)
            .map_err(|_| malformed("truncated record section"))?;
        if record[0] == RECORD_DELETED {
            continue;
        }
        let mut offset = 1;
        let mut cells = Vec::with_capacity(fields.len());
        for field in &fields {
            cells.push(decode_field(field, &record[offset..offset + field.length]));
            offset += field.length;
        }
        table.push_row(cells);
    }

    debug!(
        rows = table.row_count(),
        columns = table.columns.len(),
        "read DBF table"
    );
    Ok(table)
}

fn decode_field(field: &FieldDescriptor, raw: &[u8]) -> CellValue {
    let text = String::from_utf8_lossy(raw);
    match field.kind {
        b'N' | b'F' => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                CellValue::Missing
            } else if field.decimals == 0 {
                trimmed
                    .parse::<i64>()
                    .map(CellValue::Integer)
                    .or_else(|_| trimmed.parse::<f64>().map(CellValue::Float))
                    .unwrap_or(CellValue::Missing)
            } else {
                trimmed
                    .parse::<f64>()
                    .map(CellValue::Float)
                    .unwrap_or(CellValue::Missing)
            }
        }
        b'L' => match raw.first() {
            Some(b'T' | b't' | b'Y' | b'y') => CellValue::Boolean(true),
            Some(b'F' | b'f' | b'N' | b'n') => CellValue::Boolean(false),
            _ => CellValue::Missing,
        },
        b'D' => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                CellValue::Missing
            } else {
                NaiveDate::parse_from_str(trimmed, "%Y%m%d")
                    .ok()
                    .and_then(|date| date.and_hms_opt(0, 0, 0))
                    .map(CellValue::Date)
                    .unwrap_or(CellValue::Missing)
            }
        }
        // 'C' and anything unrecognised: keep the text, dropping the
        // right-side space padding the format mandates.
        _ => CellValue::Text(text.trim_end().to_string()),
    }
}

/// Writes the table as a DBF whose schema declares every column as a
/// character field of [`OUTPUT_FIELD_WIDTH`] bytes. Field names and cell
/// values are validated before the output file is created, so a rejected
/// table leaves no partial file behind.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    let record_len = 1 + table.columns.len() * OUTPUT_FIELD_WIDTH;
    if record_len > u16::MAX as usize {
        return Err(MergeError::MalformedDbf(format!(
            "{} columns exceed the record size limit",
            table.columns.len()
        )));
    }

    let mut names = Vec::with_capacity(table.columns.len());
    for column in &table.columns {
        if column.is_empty() || column.len() > MAX_FIELD_NAME || !column.is_ascii() {
            return Err(MergeError::FieldName(column.clone()));
        }
        names.push(column.as_bytes());
    }

    let mut rows = Vec::with_capacity(table.row_count());
    for row in &table.rows {
        let mut encoded = Vec::with_capacity(row.len());
        for (column, cell) in table.columns.iter().zip(row) {
            let value = cell.to_text();
            if value.len() > OUTPUT_FIELD_WIDTH {
                return Err(MergeError::FieldOverflow {
                    column: column.clone(),
                    length: value.len(),
                    width: OUTPUT_FIELD_WIDTH,
                });
            }
            encoded.push(value.into_bytes());
        }
        rows.push(encoded);
    }

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let header_len = HEADER_SIZE + table.columns.len() * DESCRIPTOR_SIZE + 1;
    let today = Local::now().date_naive();
    let mut header = [0u8; HEADER_SIZE];
    header[0] = VERSION_DBASE3;
    header[1] = (today.year() - 1900) as u8;
    header[2] = today.month() as u8;
    header[3] = today.day() as u8;
    header[4..8].copy_from_slice(&(rows.len() as u32).to_le_bytes());
    header[8..10].copy_from_slice(&(header_len as u16).to_le_bytes());
    header[10..12].copy_from_slice(&(record_len as u16).to_le_bytes());
    writer.write_all(&header)?;

    for name in names {
        let mut descriptor = [0u8; DESCRIPTOR_SIZE];
        descriptor[..name.len()].copy_from_slice(name);
        descriptor[11] = b'C';
        descriptor[16] = OUTPUT_FIELD_WIDTH as u8;
        writer.write_all(&descriptor)?;
    }
    writer.write_all(&[HEADER_TERMINATOR])?;

    let padding = [b' '; OUTPUT_FIELD_WIDTH];
    for row in &rows {
        writer.write_all(&[RECORD_LIVE])?;
        for value in row {
            writer.write_all(value)?;
            writer.write_all(&padding[value.len()..])?;
        }
    }
    writer.write_all(&[EOF_MARKER])?;
    writer.flush()?;

    debug!(rows = rows.len(), path = %path.display(), "wrote DBF table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    fn text(value: &str) -> CellValue {
        CellValue::Text(value.to_string())
    }

    fn sample_table() -> Table {
        let mut table = Table::new(vec!["NAME".to_string(), "AGE".to_string()]);
        table.push_row(vec![text("Alice"), text("30")]);
        table.push_row(vec![text("Bob"), text("41")]);
        table
    }

    #[test]
    fn write_read_roundtrip_preserves_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.dbf");

        write_table(&path, &sample_table()).unwrap();
        let restored = read_table(&path).unwrap();

        assert_eq!(restored.columns, vec!["NAME", "AGE"]);
        assert_eq!(restored.rows, sample_table().rows);
    }

    #[test]
    fn deleted_records_are_skipped() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.dbf");
        write_table(&path, &sample_table()).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        let header_len = HEADER_SIZE + 2 * DESCRIPTOR_SIZE + 1;
        bytes[header_len] = RECORD_DELETED;
        fs::write(&path, bytes).unwrap();

        let restored = read_table(&path).unwrap();
        assert_eq!(restored.row_count(), 1);
        assert_eq!(restored.rows[0][0], text("Bob"));
    }

    #[test]
    fn garbage_input_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.dbf");
        fs::write(&path, b"definitely not a dbf").unwrap();

        assert!(matches!(
            read_table(&path),
            Err(MergeError::MalformedDbf(_))
        ));
    }

    #[test]
    fn oversized_values_are_rejected_without_creating_a_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.dbf");

        let mut table = Table::new(vec!["NOTES".to_string()]);
        table.push_row(vec![text(&"x".repeat(OUTPUT_FIELD_WIDTH + 1))]);

        assert!(matches!(
            write_table(&path, &table),
            Err(MergeError::FieldOverflow { .. })
        ));
        assert!(!path.exists());
    }

    #[test]
    fn long_field_names_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.dbf");

        let table = Table::new(vec!["WAY_TOO_LONG_NAME".to_string()]);
        assert!(matches!(
            write_table(&path, &table),
            Err(MergeError::FieldName(_))
        ));
        assert!(!path.exists());
    }
}
