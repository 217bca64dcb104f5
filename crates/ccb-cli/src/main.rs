//! # ccb-import CLI
//!
//! Batch front end for the conversion engine: takes a list of staged legacy
//! scene files plus the three path/URL contexts, wires up the filesystem
//! collaborators, and runs the files in order. Exits non-zero when any file
//! fails to parse.

mod hosts;

use anyhow::Result;
use ccb_import::{ImportOptions, Importer};
use clap::Parser;
use hosts::{FsAssetDb, FsSources};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "ccb-import")]
#[command(about = "Converts CocosBuilder scene files into prefab trees and animation clips")]
#[command(version)]
struct Cli {
    /// Legacy scene files to convert, in order (JSON-encoded documents)
    files: Vec<PathBuf>,

    /// Staging directory converted resources are written to
    #[arg(long, default_value = "temp/resources")]
    res_temp: PathBuf,

    /// Staging directory holding the legacy scene files
    #[arg(long, default_value = "temp/ccbs")]
    ccbs_temp: PathBuf,

    /// Logical root URL converted assets are registered under
    #[arg(long, default_value = "db://assets")]
    root_url: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    if cli.files.is_empty() {
        anyhow::bail!("no input files given");
    }

    let mut importer = Importer::new(
        Box::new(FsAssetDb::new(cli.root_url.clone(), cli.res_temp.clone())),
        Box::new(FsSources),
        Box::new(FsSources),
        ImportOptions {
            res_root_url: cli.root_url,
            res_temp_path: cli.res_temp,
            ccbs_temp_path: cli.ccbs_temp,
        },
    );

    let report = importer.import_files(&cli.files);
    info!(
        converted = report.imported.len(),
        missing = report.missing.len(),
        failed = report.failures.len(),
        "batch finished"
    );

    if !report.is_clean() {
        for (path, err) in &report.failures {
            error!(file = %path.display(), "{err:#}");
        }
        anyhow::bail!("{} file(s) failed to convert", report.failures.len());
    }

    Ok(())
}
