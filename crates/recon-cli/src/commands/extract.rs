//! Extract command - pull invoice records out of a single document.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use recon_core::{DocumentKind, InvoicePipeline, RawDocument, ReconConfig};

use super::load_config;
use super::output::{format_document, DocumentReport, OutputFormat};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (PDF or plain text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Skip OCR and use only the PDF text layer
    #[arg(long)]
    text_only: bool,

    /// Include the extracted text in JSON output
    #[arg(long)]
    raw_text: bool,
}

/// Apply the OCR-related flags shared by `extract` and `batch`.
pub fn apply_overrides(config: &mut ReconConfig, model_dir: Option<&PathBuf>, text_only: bool) {
    if let Some(dir) = model_dir {
        config.models.model_dir = dir.clone();
    }
    if text_only {
        config.pdf.ocr_fallback = false;
    }
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, args.model_dir.as_ref(), args.text_only);

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let kind = DocumentKind::from_path(&args.input)?;
    info!("Processing {:?} file: {}", kind, args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")?,
    );
    pb.set_message("Extracting invoices...");

    let data = fs::read(&args.input)?;
    let pipeline = InvoicePipeline::from_config(&config);
    let result = pipeline.process(&RawDocument::new(&data, kind))?;

    pb.finish_and_clear();

    for warning in &result.warnings {
        eprintln!("{} {}", style("⚠").yellow(), warning);
    }

    let report = DocumentReport::new(&args.input, &result, args.raw_text);
    let output = format_document(&report, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
