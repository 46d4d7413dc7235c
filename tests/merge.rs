use dbfmerge::MergeError;
use dbfmerge::io::dbf;
use dbfmerge::merge;
use dbfmerge::model::{CellValue, Table};
use rust_xlsxwriter::Workbook;
use std::path::Path;
use tempfile::tempdir;

fn text(value: &str) -> CellValue {
    CellValue::Text(value.to_string())
}

fn write_legacy_dbf(path: &Path) {
    let mut table = Table::new(vec!["NAME".to_string(), "AGE".to_string()]);
    table.push_row(vec![text("Alice"), text("30")]);
    table.push_row(vec![text("Bob"), text("41")]);
    dbf::write_table(path, &table).expect("legacy DBF written");
}

#[test]
fn reordered_rows_merge_after_the_legacy_rows() {
    let temp_dir = tempdir().expect("temporary directory");
    let legacy_path = temp_dir.path().join("parcels.dbf");
    write_legacy_dbf(&legacy_path);

    // Columns deliberately reversed relative to the legacy table, with one
    // fully blank row that the cleaner must drop.
    let records_path = temp_dir.path().join("new_rows.xlsx");
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "AGE").expect("header written");
    worksheet.write_string(0, 1, "NAME").expect("header written");
    worksheet.write_number(1, 0, 27.0).expect("age written");
    worksheet.write_string(1, 1, "Carol").expect("name written");
    worksheet.write_string(2, 0, "").expect("blank cell written");
    worksheet.write_string(2, 1, "").expect("blank cell written");
    workbook.save(&records_path).expect("workbook saved");

    let outcome = merge::merge_files(&legacy_path, &records_path).expect("merge succeeded");
    assert_eq!(outcome.merged_rows, 3);
    assert_eq!(outcome.backup_path, temp_dir.path().join("parcels_final.csv"));
    assert_eq!(outcome.final_path, temp_dir.path().join("parcels_final.dbf"));

    let merged = dbf::read_table(&outcome.final_path).expect("final DBF read");
    assert_eq!(merged.columns, vec!["NAME", "AGE"]);
    assert_eq!(merged.row_count(), 3);
    assert_eq!(merged.rows[0], vec![text("Alice"), text("30")]);
    assert_eq!(merged.rows[2], vec![text("Carol"), text("27")]);
}

#[test]
fn numeric_cells_render_as_plain_decimal_text() {
    let temp_dir = tempdir().expect("temporary directory");
    let legacy_path = temp_dir.path().join("parcels.dbf");
    write_legacy_dbf(&legacy_path);

    let records_path = temp_dir.path().join("new_rows.xlsx");
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "NAME").expect("header written");
    worksheet.write_string(0, 1, "AGE").expect("header written");
    worksheet.write_string(1, 0, "Dana").expect("name written");
    worksheet.write_number(1, 1, 42.0).expect("age written");
    workbook.save(&records_path).expect("workbook saved");

    let outcome = merge::merge_files(&legacy_path, &records_path).expect("merge succeeded");

    let mut reader = csv::Reader::from_path(&outcome.backup_path).expect("backup opened");
    let records: Vec<csv::StringRecord> = reader
        .records()
        .collect::<Result<_, _>>()
        .expect("backup parsed");
    assert_eq!(&records[2][1], "42");

    let merged = dbf::read_table(&outcome.final_path).expect("final DBF read");
    assert_eq!(merged.rows[2][1], text("42"));
}

#[test]
fn schema_mismatch_halts_before_any_output_is_written() {
    let temp_dir = tempdir().expect("temporary directory");
    let legacy_path = temp_dir.path().join("parcels.dbf");
    write_legacy_dbf(&legacy_path);

    let records_path = temp_dir.path().join("new_rows.xlsx");
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "NAME").expect("header written");
    worksheet.write_string(0, 1, "ADDRESS").expect("header written");
    worksheet.write_string(1, 0, "Carol").expect("name written");
    worksheet.write_string(1, 1, "12 High St").expect("address written");
    workbook.save(&records_path).expect("workbook saved");

    let result = merge::merge_files(&legacy_path, &records_path);
    assert!(matches!(result, Err(MergeError::SchemaMismatch { .. })));
    assert!(!temp_dir.path().join("parcels_final.csv").exists());
    assert!(!temp_dir.path().join("parcels_final.dbf").exists());
}

#[test]
fn oversized_values_leave_the_backup_but_no_final_table() {
    let temp_dir = tempdir().expect("temporary directory");
    let legacy_path = temp_dir.path().join("notes.dbf");

    let mut legacy = Table::new(vec!["NOTES".to_string()]);
    legacy.push_row(vec![text("short note")]);
    dbf::write_table(&legacy_path, &legacy).expect("legacy DBF written");

    let records_path = temp_dir.path().join("new_rows.xlsx");
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.write_string(0, 0, "NOTES").expect("header written");
    worksheet
        .write_string(1, 0, "x".repeat(300).as_str())
        .expect("oversized note written");
    workbook.save(&records_path).expect("workbook saved");

    let result = merge::merge_files(&legacy_path, &records_path);
    assert!(matches!(result, Err(MergeError::FieldOverflow { .. })));
    assert!(temp_dir.path().join("notes_final.csv").exists());
    assert!(!temp_dir.path().join("notes_final.dbf").exists());
}

#[test]
fn corrupt_workbooks_fail_as_parse_errors() {
    let temp_dir = tempdir().expect("temporary directory");
    let legacy_path = temp_dir.path().join("parcels.dbf");
    write_legacy_dbf(&legacy_path);

    let records_path = temp_dir.path().join("new_rows.xlsx");
    std::fs::write(&records_path, b"not a workbook").expect("garbage written");

    let result = merge::merge_files(&legacy_path, &records_path);
    assert!(matches!(result, Err(MergeError::ExcelRead(_))));
    assert!(!temp_dir.path().join("parcels_final.csv").exists());
    assert!(!temp_dir.path().join("parcels_final.dbf").exists());
}
