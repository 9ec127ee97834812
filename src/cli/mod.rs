//! Command-line interface.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};
use crate::models::ExtractionMethod;

#[derive(Parser)]
#[command(
    name = "dtx",
    version,
    about = "Extract text from PDF and DOCX documents"
)]
pub struct Cli {
    /// Path to a TOML config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the data directory.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text from a document.
    Extract {
        /// Input .pdf or .docx file.
        file: PathBuf,

        /// Extraction method.
        #[arg(long, value_enum, default_value_t = ExtractionMethod::Direct)]
        method: ExtractionMethod,

        /// Output text file. Defaults to `<input stem>_extracted.txt`
        /// beside the input.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the extracted text to stdout instead of writing a file.
        #[arg(long, conflicts_with = "output")]
        stdout: bool,

        /// Render resolution for OCR extraction.
        #[arg(long)]
        dpi: Option<u32>,

        /// Gemini model for OCR extraction.
        #[arg(long)]
        model: Option<String>,

        /// API credential for the OCR service.
        #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// Render the first page of a PDF to a PNG preview.
    Preview {
        /// Input .pdf file.
        file: PathBuf,

        /// Output image path. Defaults to `<input stem>_preview.png`.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Render resolution.
        #[arg(long, default_value_t = 96)]
        dpi: u32,
    },

    /// Show recently processed documents.
    History {
        /// Number of entries to show.
        #[arg(long, default_value_t = 5)]
        limit: usize,

        /// Clear the history log.
        #[arg(long)]
        clear: bool,
    },
}

/// Parse arguments and dispatch.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = load_settings_with_options(LoadOptions {
        config_path: cli.config,
        data_dir: cli.data_dir,
    });

    match cli.command {
        Commands::Extract {
            file,
            method,
            output,
            stdout,
            dpi,
            model,
            api_key,
        } => {
            commands::cmd_extract(
                &settings,
                commands::ExtractArgs {
                    file,
                    method,
                    output,
                    stdout,
                    dpi,
                    model,
                    api_key,
                },
            )
            .await
        }
        Commands::Preview { file, output, dpi } => commands::cmd_preview(&file, output, dpi),
        Commands::History { limit, clear } => commands::cmd_history(&settings, limit, clear),
    }
}
