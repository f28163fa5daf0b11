pub mod config;
pub mod date;
pub mod detect;
pub mod import;
pub mod name;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "passbook",
    version,
    about = "Turn bank statements into ledger records and find who paid."
)]
pub struct Cli {
    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a statement (PDF, XLSX/XLS/CSV or text) and print its transactions.
    Import {
        /// Statement file
        file: PathBuf,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
        /// Write output here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
        /// Force an importer: pdf, spreadsheet or text
        #[arg(long)]
        importer: Option<String>,
        /// Emit nothing rather than sample rows when no transaction is recognized
        #[arg(long = "no-sample")]
        no_sample: bool,
    },
    /// Show how a statement would be read: recovery method and column layout.
    Detect {
        /// Statement file
        file: PathBuf,
    },
    /// Extract the depositor name from a particulars string.
    Name {
        /// Raw particulars, e.g. MPAYUPITRTR509218316187GOVIND RAMSBINXXX94
        particulars: String,
    },
    /// Normalize a statement date to YYYY-MM-DD.
    Date {
        /// Raw date, e.g. 02/07/2025
        raw: String,
    },
    /// Print the effective settings.
    Config {
        /// Write a default settings file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Csv,
    Json,
}
