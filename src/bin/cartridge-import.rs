//! Cartridge Import CLI
//!
//! Identifies Super Famicom dumps and writes them into a normalized library.

use anyhow::{bail, Context};
use cartridge_import::{ImportReport, LibraryBuilder};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "cartridge-import")]
#[command(about = "Import Super Famicom cartridge dumps into a game library")]
struct Args {
    /// Settings file (TOML)
    #[arg(short = 's', long, global = true)]
    settings: Option<PathBuf>,

    /// Known-cartridge database (BML)
    #[arg(short = 'd', long, global = true)]
    database: Option<PathBuf>,

    /// Library root, overriding Library/Location
    #[arg(short = 'l', long, global = true)]
    library: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import each location (a directory of fragments or an image file)
    Import {
        #[arg(required = true)]
        locations: Vec<PathBuf>,

        /// Also write manifest.bml into each package
        #[arg(short = 'm', long)]
        manifests: bool,

        /// Print one JSON report per location
        #[arg(long)]
        json: bool,
    },

    /// Print the manifest a location resolves to, without importing
    Manifest { location: PathBuf },
}

fn print_report(report: &ImportReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }
    match (&report.target, &report.error) {
        (Some(target), _) => println!("{}: {}", report.location.display(), target.display()),
        (None, Some(error)) => eprintln!("{}: {}", report.location.display(), error),
        (None, None) => {}
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut builder = LibraryBuilder::new();
    if let Some(path) = &args.settings {
        builder = builder.settings_file(path);
    }
    if let Some(path) = &args.database {
        builder = builder.database_file(path);
    }
    if let Some(path) = &args.library {
        builder = builder.location(path);
    }

    match args.command {
        Command::Import {
            locations,
            manifests,
            json,
        } => {
            if manifests {
                builder = builder.with_manifests();
            }
            let library = builder.build().context("failed to load settings or database")?;

            let reports = library.import_all(&locations);
            for report in &reports {
                print_report(report, json)?;
            }

            let failed = reports.iter().filter(|r| !r.is_success()).count();
            info!("{} imported, {} failed", reports.len() - failed, failed);
            if failed > 0 {
                bail!("{} of {} imports failed", failed, reports.len());
            }
        }
        Command::Manifest { location } => {
            let library = builder.build().context("failed to load settings or database")?;
            let markup = library
                .manifest(&location)
                .with_context(|| format!("cannot resolve {}", location.display()))?;
            print!("{}", markup);
        }
    }

    Ok(())
}
