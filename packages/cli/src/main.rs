#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command line entry point for plan asset extraction.
//!
//! Downloads annual reports, locates the Swiss defined benefit plan asset
//! table, parses it into year records, and exports DATA/META bundles.
//!
//! Uses `indicatif-log-bridge` (via [`progress::init_logger`]) to route
//! `log` output through `indicatif::MultiProgress` so that log lines and
//! progress bars never fight for the terminal.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;
mod progress;

/// Extract pension plan asset allocations from annual report PDFs.
#[derive(Parser)]
#[command(name = "plan_assets")]
#[command(about = "Extract pension plan asset allocations from annual report PDFs")]
struct Cli {
    /// Parser configuration overrides (TOML). Only changed keys are needed.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Find the page holding the plan asset table.
    Locate {
        /// Annual report PDF.
        pdf: PathBuf,
    },

    /// Parse the plan asset table of one report.
    Parse {
        /// Annual report PDF.
        pdf: PathBuf,

        /// Read the table grid from this CSV instead of the PDF layout.
        #[arg(long)]
        table_csv: Option<PathBuf>,

        /// Skip page location and use this 1-based page.
        #[arg(long)]
        page: Option<u32>,

        /// Print records as JSON.
        #[arg(long)]
        json: bool,

        /// Write the extracted grid to this CSV file.
        #[arg(long)]
        dump_grid: Option<PathBuf>,
    },

    /// Parse several reports and write a merged DATA/META bundle.
    Export {
        /// Annual report PDFs, in any order.
        #[arg(required = true)]
        pdfs: Vec<PathBuf>,

        /// Directory receiving timestamped run directories and `latest/`.
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,

        /// Export naming and metadata overrides (TOML).
        #[arg(long)]
        export_config: Option<PathBuf>,

        /// Abort on the first report that fails to parse.
        #[arg(long)]
        fail_fast: bool,
    },

    /// Download annual reports by year.
    Download {
        /// Report URL containing a `{year}` placeholder.
        #[arg(long)]
        url_template: String,

        /// Years to fetch, comma separated.
        #[arg(long, value_delimiter = ',', required = true)]
        years: Vec<i32>,

        /// Directory the PDFs are written to.
        #[arg(long, default_value = "downloads")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = progress::init_logger();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => plan_assets_parser::ParserConfig::load(path)?,
        None => plan_assets_parser::ParserConfig::default(),
    };

    match cli.command {
        Commands::Locate { pdf } => commands::locate(&multi, pdf, &config).await,
        Commands::Parse {
            pdf,
            table_csv,
            page,
            json,
            dump_grid,
        } => {
            commands::parse(
                &multi,
                pdf,
                &commands::ParseOptions {
                    table_csv,
                    page,
                    json,
                    dump_grid,
                },
                &config,
            )
            .await
        }
        Commands::Export {
            pdfs,
            output_dir,
            export_config,
            fail_fast,
        } => {
            let export_config = match export_config {
                Some(path) => plan_assets_export::ExportConfig::load(&path)?,
                None => plan_assets_export::ExportConfig::default(),
            };
            commands::export(&multi, pdfs, &output_dir, fail_fast, &config, &export_config).await
        }
        Commands::Download {
            url_template,
            years,
            dir,
        } => commands::download(&multi, &url_template, &years, &dir).await,
    }
}
