//! Reconcile command - match stored invoices against payments.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use rust_decimal::Decimal;
use tracing::info;

use recon_core::{Invoice, Payment, ReconciliationMatcher};

use super::output::{format_reconciliation, OutputFormat};
use super::{load_config, read_json, write_json_atomic};

/// Arguments for the reconcile command.
#[derive(Args)]
pub struct ReconcileArgs {
    /// Invoices JSON file (array of {id, invoice_number, vendor, amount, status})
    #[arg(short, long)]
    invoices: PathBuf,

    /// Payments JSON file (array of {id, vendor, paid_amount})
    #[arg(short, long)]
    payments: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Maximum amount difference that still counts as a match
    #[arg(short, long)]
    tolerance: Option<Decimal>,

    /// Write the new statuses back into the invoices file
    #[arg(long)]
    update: bool,
}

pub async fn run(args: ReconcileArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    let mut invoices: Vec<Invoice> = read_json(&args.invoices)?;
    let payments: Vec<Payment> = read_json(&args.payments)?;
    info!(
        "Loaded {} invoices and {} payments",
        invoices.len(),
        payments.len()
    );

    let tolerance = args
        .tolerance
        .unwrap_or(config.reconciliation.amount_tolerance);
    let reconciliation = ReconciliationMatcher::new()
        .with_tolerance(tolerance)
        .reconcile(&invoices, &payments);

    let output = format_reconciliation(&reconciliation, args.format)?;
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.update {
        // Statuses are applied to all invoices or none, then the file is swapped in one rename
        reconciliation.apply(&mut invoices)?;
        write_json_atomic(&args.invoices, &invoices)?;
        eprintln!(
            "{} Updated {} invoice statuses in {}",
            style("✓").green(),
            invoices.len(),
            args.invoices.display()
        );
    }

    eprintln!(
        "{} {} matched, {} unmatched",
        style("ℹ").blue(),
        style(reconciliation.matched_count()).green(),
        style(reconciliation.unmatched_count()).yellow()
    );

    Ok(())
}
