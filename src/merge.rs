use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::error::{MergeError, Result};
use crate::io::{csv_write, dbf, excel_read};
use crate::model::Table;

/// Paths and counts produced by a successful merge run.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeOutcome {
    pub backup_path: PathBuf,
    pub final_path: PathBuf,
    pub merged_rows: usize,
}

/// Runs the whole pipeline: load both inputs, clean the new records,
/// validate the column sets, reconcile column order, coerce the merged rows
/// to text, and write the CSV backup followed by the final DBF. Any failure
/// aborts the remainder of the run; nothing is written before the column
/// sets have been validated.
#[instrument(
    level = "info",
    skip_all,
    fields(legacy = %legacy.display(), records = %records.display())
)]
pub fn merge_files(legacy: &Path, records: &Path) -> Result<MergeOutcome> {
    let legacy_table = dbf::read_table(legacy)?;
    info!(rows = legacy_table.row_count(), "loaded legacy table");

    let new_records = excel_read::read_table(records)?;
    info!(rows = new_records.row_count(), "loaded new records");

    let new_records = new_records.cleaned();
    debug!(rows = new_records.row_count(), "cleaned new records");

    check_columns(&legacy_table, &new_records)?;

    let reordered = new_records.reordered(&legacy_table.columns)?;
    let merged = legacy_table.concat(reordered).normalized();
    info!(rows = merged.row_count(), "merged tables");

    let backup_path = output_path(legacy, "csv");
    csv_write::write_table(&backup_path, &merged)?;
    info!(path = %backup_path.display(), "wrote backup");

    let final_path = output_path(legacy, "dbf");
    dbf::write_table(&final_path, &merged)?;
    info!(path = %final_path.display(), "wrote final table");

    Ok(MergeOutcome {
        backup_path,
        final_path,
        merged_rows: merged.row_count(),
    })
}

/// Exact, case-sensitive set equality between the two column-name sets.
/// Order is deliberately ignored; the reconciler handles it afterwards.
fn check_columns(legacy: &Table, incoming: &Table) -> Result<()> {
    if legacy.column_set() != incoming.column_set() {
        return Err(MergeError::SchemaMismatch {
            legacy: legacy.columns.clone(),
            incoming: incoming.columns.clone(),
        });
    }
    Ok(())
}

// Output files sit next to the legacy input, sharing its stem.
fn output_path(legacy: &Path, extension: &str) -> PathBuf {
    let stem = legacy
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    legacy.with_file_name(format!("{stem}_final.{extension}"))
}
