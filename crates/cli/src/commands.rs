use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use passcan_core::{validate, Language};
use passcan_ocr::{prepare_for_ocr_from_bytes, Extractor, ScanSession};
use tokio::io::AsyncReadExt;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::report;

#[derive(Parser, Debug)]
#[command(name = "passcan")]
#[command(about = "Extract passport data fields from scanned images")]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Recognize a passport image and extract its fields
    Scan {
        /// Image file (JPEG, PNG, BMP, WEBP)
        image: PathBuf,

        /// Recognition language code, e.g. eng or urd
        #[arg(short, long)]
        lang: Option<Language>,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,

        /// Also print the raw recognized text
        #[arg(long)]
        show_text: bool,
    },
    /// Extract fields from already-recognized text
    Extract {
        /// Text file; reads stdin when omitted or `-`
        file: Option<PathBuf>,

        /// Print the record and validation as JSON
        #[arg(long)]
        json: bool,
    },
    /// List the supported recognition languages
    Languages,
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = Config::resolve(cli.config.as_deref())?;
    match cli.command {
        Commands::Scan { image, lang, json, show_text } => {
            let language = lang.unwrap_or_else(|| config.language.clone());
            cmd_scan(&config, &image, language, json, show_text).await
        }
        Commands::Extract { file, json } => cmd_extract(&config, file.as_deref(), json).await,
        Commands::Languages => {
            print!("{}", report::language_table());
            Ok(())
        }
    }
}

async fn cmd_scan(
    config: &Config,
    image: &Path,
    language: Language,
    json: bool,
    show_text: bool,
) -> Result<()> {
    if !language.is_supported() {
        tracing::warn!(%language, "language is not in the supported list, passing it to the engine as-is");
    }

    let bytes = tokio::fs::read(image)
        .await
        .with_context(|| format!("Failed to read image {}", image.display()))?;
    let bytes = if config.preprocess {
        prepare_for_ocr_from_bytes(&bytes, &config.preprocess_options)
            .with_context(|| format!("Failed to prepare {} for recognition", image.display()))?
    } else {
        bytes
    };

    let mut session = ScanSession::with_extractor(engine(config), Extractor::with_config(config.extraction));
    let mut updates = session.subscribe();
    let printer = tokio::spawn(async move {
        while let Some(update) = updates.recv().await {
            eprintln!("{}", report::progress_line(&update));
        }
    });

    let result = session.run(bytes, language).await;
    // Dropping the session closes the channel so the printer drains and exits.
    drop(session);
    join_printer(printer).await;

    let outcome = result.with_context(|| format!("Failed to scan {}", image.display()))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }
    if show_text {
        println!("{}\n", outcome.text.trim_end());
    }
    print!("{}", report::field_report(&outcome.data, &outcome.validation));
    Ok(())
}

/// Wait for the progress printer. A printer that panicked or was cancelled
/// is logged; the scan result still stands.
async fn join_printer(printer: JoinHandle<()>) -> bool {
    match printer.await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!("progress printer stopped: {e}");
            false
        }
    }
}

async fn cmd_extract(config: &Config, file: Option<&Path>, json: bool) -> Result<()> {
    let text = match file {
        Some(path) if path != Path::new("-") => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read stdin")?;
            buf
        }
    };

    let data = Extractor::with_config(config.extraction).parse(&text);
    let validation = validate(&data);
    tracing::info!(fields = data.fields().count(), valid = validation.is_valid, "extracted");

    if json {
        let value = serde_json::json!({ "data": data, "validation": validation });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        print!("{}", report::field_report(&data, &validation));
    }
    Ok(())
}

#[cfg(feature = "tesseract")]
fn engine(config: &Config) -> passcan_ocr::TesseractRecognizer {
    let data_path = config
        .tessdata_dir
        .as_ref()
        .map(|dir| dir.to_string_lossy().into_owned());
    passcan_ocr::TesseractRecognizer::new(data_path)
}

#[cfg(not(feature = "tesseract"))]
fn engine(_config: &Config) -> passcan_ocr::UnavailableRecognizer {
    passcan_ocr::UnavailableRecognizer
}
