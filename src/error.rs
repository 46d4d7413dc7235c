use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, MergeError>;

/// Error type covering the different failure cases that can occur while the
/// tool loads, reconciles, or emits tables.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors bubbled up from the spreadsheet reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Errors bubbled up from the CSV writer implementation.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Raised when a DBF file does not follow the expected structure, or a
    /// table cannot be represented within the format's limits.
    #[error("invalid DBF structure: {0}")]
    MalformedDbf(String),

    /// Raised when a workbook does not follow the expected conventions.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when the operator declines to select an input file.
    #[error("no {0} selected")]
    NoSelection(&'static str),

    /// Raised when the interactive file prompt cannot be read.
    #[error("file selection failed: {0}")]
    Prompt(String),

    /// Raised when the two inputs do not share the same column set. Both
    /// sets are carried so the operator can see the difference in the log.
    #[error("column sets differ: legacy has {legacy:?}, new records have {incoming:?}")]
    SchemaMismatch {
        legacy: Vec<String>,
        incoming: Vec<String>,
    },

    /// Raised when a cell value does not fit the fixed-width output field.
    #[error("value in column '{column}' is {length} bytes, exceeding the {width}-byte field width")]
    FieldOverflow {
        column: String,
        length: usize,
        width: usize,
    },

    /// Raised when a column name cannot be encoded in the output schema.
    #[error("column name '{0}' cannot be used as a DBF field name")]
    FieldName(String),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}
