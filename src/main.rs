use std::path::PathBuf;

use clap::Parser;
use dbfmerge::Result;
use dbfmerge::logging;
use dbfmerge::merge::{self, MergeOutcome};
use dbfmerge::select::{FixedPaths, InteractivePrompt, PathProvider};
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let log_path = match logging::init(&cli.log_dir) {
        Ok(path) => path,
        Err(error) => {
            eprintln!("error: {error}");
            std::process::exit(1);
        }
    };

    match run(&cli) {
        Ok(outcome) => {
            info!(rows = outcome.merged_rows, "run complete");
            println!(
                "Merged {} rows into {}",
                outcome.merged_rows,
                outcome.final_path.display()
            );
            println!("Backup written to {}", outcome.backup_path.display());
            println!("Log written to {}", log_path.display());
        }
        Err(failure) => {
            error!(%failure, "run failed");
            eprintln!("error: {failure}");
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<MergeOutcome> {
    let provider: Box<dyn PathProvider> = match (&cli.legacy, &cli.records) {
        (Some(legacy), Some(records)) => Box::new(FixedPaths {
            legacy: legacy.clone(),
            records: records.clone(),
        }),
        _ => Box::new(InteractivePrompt),
    };

    let legacy = provider.legacy_file()?;
    let records = provider.new_records_file()?;
    info!(legacy = %legacy.display(), records = %records.display(), "inputs selected");

    merge::merge_files(&legacy, &records)
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Merge new spreadsheet rows into an existing DBF attribute table."
)]
struct Cli {
    /// Existing DBF file to update. Prompted for when omitted.
    #[arg(long, requires = "records")]
    legacy: Option<PathBuf>,

    /// Spreadsheet with the rows to append. Prompted for when omitted.
    #[arg(long, requires = "legacy")]
    records: Option<PathBuf>,

    /// Directory receiving one log file per run.
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,
}
