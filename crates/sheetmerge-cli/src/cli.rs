use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use sheetmerge::{LayoutSettings, OutputFormat};

/// Merge a spreadsheet and PDF page tables into a macro-enabled workbook template.
#[derive(Debug, Parser)]
#[command(name = "sheetmerge", about, version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the upload web service
    Serve {
        /// Address to bind
        #[arg(long, env = "HOST", default_value = "0.0.0.0")]
        host: String,

        /// Port to listen on
        #[arg(long, env = "PORT", default_value_t = 5000)]
        port: u16,

        /// Path to the macro-enabled template workbook
        #[arg(long, env = "SHEETMERGE_TEMPLATE", value_name = "PATH")]
        template: PathBuf,

        /// Maximum request body size in MiB
        #[arg(long, default_value_t = 16)]
        max_upload_mb: usize,

        /// Default output when a request does not choose one
        #[arg(long, default_value_t = OutputFormat::Xlsm)]
        output: OutputFormat,

        #[command(flatten)]
        layout: LayoutArgs,

        /// Log at debug level
        #[arg(long, env = "DEBUG")]
        debug: bool,
    },

    /// Merge files once and write the result to disk
    Merge {
        /// Path to the macro-enabled template workbook
        #[arg(long, value_name = "PATH")]
        template: PathBuf,

        /// Spreadsheet to copy into the template (xls, xlsx, xlsm)
        #[arg(long, value_name = "FILE")]
        excel: PathBuf,

        /// PDF whose pages become new sheets (repeatable)
        #[arg(long = "pdf", value_name = "FILE")]
        pdfs: Vec<PathBuf>,

        /// Output path. Default: Processed_Result.xlsm or .zip
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Write a ZIP bundle with the PDFs and a layout report
        #[arg(long)]
        zip: bool,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Print the reconstructed table of each PDF page
    Layout {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Page range (e.g. '1,3-5'). Default: all pages
        #[arg(long)]
        pages: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = LayoutFormat::Text)]
        format: LayoutFormat,

        /// Horizontal tolerance for grouping characters into words
        #[arg(long, default_value_t = 3.0)]
        x_tolerance: f64,

        #[command(flatten)]
        layout: LayoutArgs,
    },
}

/// Layout heuristic tunables shared by every subcommand.
#[derive(Debug, Clone, Copy, Args)]
pub struct LayoutArgs {
    /// Vertical tolerance for grouping words into lines
    #[arg(long, default_value_t = 5.0)]
    pub y_tolerance: f64,

    /// Minimum horizontal gap between column boundaries
    #[arg(long, default_value_t = 20.0)]
    pub min_gap: f64,
}

impl LayoutArgs {
    pub fn settings(&self) -> LayoutSettings {
        LayoutSettings {
            y_tolerance: self.y_tolerance,
            min_column_gap: self.min_gap,
            ..LayoutSettings::default()
        }
    }
}

/// Output format for the `layout` subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LayoutFormat {
    Text,
    Json,
    Csv,
}
