//! CLI entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `gridpad_core` linkage.
//! - Export a persisted grid to xlsx without the host app.

use clap::Parser;
use gridpad_core::{
    export_success_message, GridStore, SheetExporter, SqliteKeyValueStore, EXPORT_FAILED_MESSAGE,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(about = "GridPad core smoke check and headless xlsx export")]
struct Args {
    /// SQLite file holding the saved grid. Without it only the linkage smoke check runs.
    #[arg(requires = "output")]
    db_path: Option<PathBuf>,

    /// Workbook to write; replaced if it exists.
    #[arg(requires = "db_path")]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match (args.db_path, args.output) {
        (Some(db_path), Some(output)) => export_persisted(&db_path, &output),
        _ => {
            println!("gridpad_core ping={}", gridpad_core::ping());
            println!("gridpad_core version={}", gridpad_core::core_version());
            ExitCode::SUCCESS
        }
    }
}

fn export_persisted(db_path: &Path, output: &Path) -> ExitCode {
    let store = match SqliteKeyValueStore::open(db_path) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("{EXPORT_FAILED_MESSAGE} ({err})");
            return ExitCode::FAILURE;
        }
    };

    let grid = GridStore::with_defaults(store).load();
    match SheetExporter::default().export(&grid, output) {
        Ok(receipt) => {
            println!("{}", export_success_message(&receipt.path));
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{EXPORT_FAILED_MESSAGE} ({err})");
            ExitCode::FAILURE
        }
    }
}
