//! Batch processing command for multiple invoice documents.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use futures_util::StreamExt;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use recon_core::{
    DocumentKind, ExtractionResult, Invoice, InvoicePipeline, Payment, RawDocument, ReconConfig,
    ReconciliationMatcher,
};

use super::extract::apply_overrides;
use super::output::{format_document, format_reconciliation, DocumentReport, OutputFormat};
use super::{load_config, read_json};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Number of parallel workers
    #[arg(short = 'j', long, default_value = "4")]
    jobs: usize,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Skip OCR and use only the PDF text layer
    #[arg(long)]
    text_only: bool,

    /// Reconcile all extracted invoices against this payments JSON file
    #[arg(long)]
    payments: Option<PathBuf>,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    result: Option<ExtractionResult>,
    error: Option<String>,
    processing_time_ms: u64,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    apply_overrides(&mut config, args.model_dir.as_ref(), args.text_only);

    // Load payments up front so a bad file fails before any extraction work
    let payments: Option<Vec<Payment>> = args.payments.as_deref().map(read_json).transpose()?;

    let mut files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .and_then(|e| DocumentKind::from_extension(&e.to_lowercase()))
                .is_some()
        })
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    eprintln!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        check_output_names(&files)?;
        fs::create_dir_all(output_dir)?;
    }

    let overall_pb = ProgressBar::new(files.len() as u64);
    overall_pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    // Each worker builds its own pipeline; output keeps input order
    let mut outcomes = futures_util::stream::iter(files.into_iter().map(|path| {
        let config = config.clone();
        async move {
            let file_start = Instant::now();
            let task_path = path.clone();
            let outcome = tokio::task::spawn_blocking(move || process_file(&task_path, &config))
                .await
                .unwrap_or_else(|e| Err(anyhow::anyhow!("worker failed: {}", e)));
            (path, outcome, file_start.elapsed().as_millis() as u64)
        }
    }))
    .buffered(args.jobs.max(1));

    let mut results = Vec::new();
    while let Some((path, outcome, processing_time_ms)) = outcomes.next().await {
        match outcome {
            Ok(result) => {
                results.push(ProcessResult {
                    path,
                    result: Some(result),
                    error: None,
                    processing_time_ms,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path,
                        result: None,
                        error: Some(error_msg),
                        processing_time_ms,
                    });
                } else {
                    overall_pb.abandon();
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
            }
        }

        overall_pb.inc(1);
    }

    overall_pb.finish_and_clear();

    if let Some(ref output_dir) = args.output_dir {
        write_outputs(output_dir, &results, args.format)?;
    }

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        eprintln!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let successful = results.iter().filter(|r| r.result.is_some()).count();
    let failed: Vec<_> = results.iter().filter(|r| r.error.is_some()).collect();
    let record_count: usize = results
        .iter()
        .filter_map(|r| r.result.as_ref())
        .map(|r| r.records.len())
        .sum();

    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}, {} invoice records",
        style("✓").green(),
        results.len(),
        start.elapsed(),
        record_count
    );
    eprintln!(
        "   {} successful, {} failed",
        style(successful).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        eprintln!();
        eprintln!("{}", style("Failed files:").red());
        for result in &failed {
            eprintln!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    if let Some(payments) = payments {
        reconcile_batch(&results, &payments, &config, &args)?;
    }

    Ok(())
}

fn process_file(path: &Path, config: &ReconConfig) -> anyhow::Result<ExtractionResult> {
    let kind = DocumentKind::from_path(path)?;
    let data = fs::read(path)?;

    let pipeline = InvoicePipeline::from_config(config);
    let result = pipeline.process(&RawDocument::new(&data, kind))?;
    debug!(
        "{}: {} records via {:?}",
        path.display(),
        result.records.len(),
        result.method
    );
    Ok(result)
}

fn write_outputs(
    output_dir: &Path,
    results: &[ProcessResult],
    format: OutputFormat,
) -> anyhow::Result<()> {
    for process_result in results {
        let Some(result) = &process_result.result else {
            continue;
        };

        let output_path = output_dir.join(format!(
            "{}.{}",
            output_name(&process_result.path),
            format.extension()
        ));

        let report = DocumentReport::new(&process_result.path, result, false);
        fs::write(&output_path, format_document(&report, format)?)?;
        debug!("Wrote output to {}", output_path.display());
    }
    Ok(())
}

/// Per-file output name: the full source file name, so `a.pdf` and `a.txt`
/// write `a.pdf.json` and `a.txt.json`, and no input can land on
/// `summary.csv`, `invoices.json` or `reconciliation.*`.
fn output_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "invoice".to_string())
}

/// Refuse to run when two inputs from different directories share a file name.
fn check_output_names(files: &[PathBuf]) -> anyhow::Result<()> {
    let mut seen: HashMap<String, &Path> = HashMap::new();
    for path in files {
        if let Some(first) = seen.insert(output_name(path), path) {
            anyhow::bail!(
                "{} and {} would write the same output file; process them separately",
                first.display(),
                path.display()
            );
        }
    }
    Ok(())
}

/// Turn every extracted record into an invoice and match the lot.
fn reconcile_batch(
    results: &[ProcessResult],
    payments: &[Payment],
    config: &ReconConfig,
    args: &BatchArgs,
) -> anyhow::Result<()> {
    let mut invoices: Vec<Invoice> = results
        .iter()
        .filter_map(|r| r.result.as_ref())
        .flat_map(|r| r.records.iter().cloned())
        .zip(1..)
        .map(|(record, id)| Invoice::from_record(id, record))
        .collect();

    let matcher =
        ReconciliationMatcher::new().with_tolerance(config.reconciliation.amount_tolerance);
    let reconciliation = matcher.reconcile(&invoices, payments);

    reconciliation.apply(&mut invoices)?;

    eprintln!(
        "{} Reconciled {} invoices: {} matched, {} unmatched",
        style("✓").green(),
        invoices.len(),
        style(reconciliation.matched_count()).green(),
        style(reconciliation.unmatched_count()).yellow()
    );

    match &args.output_dir {
        Some(output_dir) => {
            let invoices_path = output_dir.join("invoices.json");
            fs::write(&invoices_path, serde_json::to_string_pretty(&invoices)?)?;

            let results_path =
                output_dir.join(format!("reconciliation.{}", args.format.extension()));
            fs::write(
                &results_path,
                format_reconciliation(&reconciliation, args.format)?,
            )?;
            eprintln!(
                "{} Invoices written to {}, results to {}",
                style("✓").green(),
                invoices_path.display(),
                results_path.display()
            );
        }
        None => println!("{}", format_reconciliation(&reconciliation, args.format)?),
    }

    Ok(())
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "filename",
        "status",
        "method",
        "records",
        "warnings",
        "processing_time_ms",
        "error",
    ])?;

    for process_result in results {
        let filename = process_result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        if let Some(result) = &process_result.result {
            wtr.write_record([
                filename,
                "success",
                &format!("{:?}", result.method),
                &result.records.len().to_string(),
                &result.warnings.join("; "),
                &process_result.processing_time_ms.to_string(),
                "",
            ])?;
        } else {
            wtr.write_record([
                filename,
                "error",
                "",
                "",
                "",
                &process_result.processing_time_ms.to_string(),
                process_result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
