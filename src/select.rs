use std::path::PathBuf;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::error::{MergeError, Result};

/// Supplies the two input paths for a run. The CLI injects either the
/// interactive prompt or fixed paths from its arguments; tests substitute
/// fixed paths to stay headless.
pub trait PathProvider {
    /// The existing DBF attribute table to update.
    fn legacy_file(&self) -> Result<PathBuf>;
    /// The spreadsheet holding the rows to append.
    fn new_records_file(&self) -> Result<PathBuf>;
}

/// Preselected input paths, verified to exist when requested.
pub struct FixedPaths {
    pub legacy: PathBuf,
    pub records: PathBuf,
}

impl PathProvider for FixedPaths {
    fn legacy_file(&self) -> Result<PathBuf> {
        existing(self.legacy.clone())
    }

    fn new_records_file(&self) -> Result<PathBuf> {
        existing(self.records.clone())
    }
}

/// Terminal line-editor prompt standing in for a desktop file dialog.
pub struct InteractivePrompt;

impl PathProvider for InteractivePrompt {
    fn legacy_file(&self) -> Result<PathBuf> {
        existing(prompt("Select the existing DBF file: ", "DBF file")?)
    }

    fn new_records_file(&self) -> Result<PathBuf> {
        existing(prompt(
            "Select the XLSX file with the new records: ",
            "XLSX file",
        )?)
    }
}

fn existing(path: PathBuf) -> Result<PathBuf> {
    if path.exists() {
        Ok(path)
    } else {
        Err(MergeError::MissingInput(path))
    }
}

fn prompt(label: &str, what: &'static str) -> Result<PathBuf> {
    let mut editor =
        DefaultEditor::new().map_err(|error| MergeError::Prompt(error.to_string()))?;
    let line = match editor.readline(label) {
        Ok(line) => line,
        Err(ReadlineError::Interrupted | ReadlineError::Eof) => String::new(),
        Err(error) => return Err(MergeError::Prompt(error.to_string())),
    };

    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(MergeError::NoSelection(what));
    }
    Ok(PathBuf::from(trimmed))
}
