use anyhow::{Context, Result};
use clap::Parser;
use library_catalog::LibraryConfig;
use library_catalog::cli::Shell;
use library_catalog::config::DEFAULT_DATA_FILE;
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "library-catalog")]
#[command(about = "Interactive catalog of books, borrowers and loans")]
struct Cli {
    /// JSON file the catalog is loaded from and saved to
    #[arg(long, default_value = DEFAULT_DATA_FILE)]
    data_file: PathBuf,

    /// Do not save pending changes when exiting
    #[arg(long)]
    no_save_on_exit: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let config = LibraryConfig::new(&cli.data_file).save_on_exit(!cli.no_save_on_exit);
    config.validate().context("Invalid configuration")?;
    tracing::info!(data_file = %config.data_file.display(), "starting library catalog");

    let stdin = io::stdin();
    let mut shell = Shell::open(&config, stdin.lock(), io::stdout())
        .with_context(|| format!("Failed to open catalog '{}'", config.data_file.display()))?;
    shell.run().context("Terminal I/O failed")?;

    Ok(())
}
