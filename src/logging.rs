use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use tracing_subscriber::EnvFilter;

use crate::error::{MergeError, Result};

/// Initialises the per-run observability sink: a timestamped log file in
/// `log_dir` (created on demand) receiving every pipeline trace. Returns
/// the path of the log file so the CLI can point the operator at it.
pub fn init(log_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(log_dir)?;
    let log_path = log_dir.join(format!("log_{}.txt", Local::now().format("%Y%m%d_%H%M%S")));
    let file = File::create(&log_path)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|error| MergeError::Logging(error.to_string()))?;

    Ok(log_path)
}
