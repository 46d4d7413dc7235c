use std::path::Path;

use csv::Writer;
use tracing::debug;

use crate::error::Result;
use crate::model::Table;

/// Writes the table as delimited text: one header record of column names,
/// then one record per row. Quoting follows RFC 4180, so fields containing
/// delimiters or quotes re-parse to the exact original text.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    let mut writer = Writer::from_path(path)?;

    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|cell| cell.to_text()))?;
    }
    writer.flush()?;

    debug!(rows = table.row_count(), path = %path.display(), "wrote CSV backup");
    Ok(())
}
