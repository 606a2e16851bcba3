//! Output formatting for extraction and reconciliation results.

use std::path::Path;

use serde::Serialize;

use recon_core::{ExtractionMethod, ExtractionResult, ParsedInvoiceRecord, Reconciliation};

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Text => "txt",
        }
    }
}

/// Serialized view of one processed document.
#[derive(Serialize)]
pub struct DocumentReport<'a> {
    pub file: String,
    pub method: ExtractionMethod,
    pub records: &'a [ParsedInvoiceRecord],
    pub warnings: &'a [String],
    pub processing_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_text: Option<&'a str>,
}

impl<'a> DocumentReport<'a> {
    pub fn new(path: &Path, result: &'a ExtractionResult, include_text: bool) -> Self {
        Self {
            file: path.display().to_string(),
            method: result.method,
            records: &result.records,
            warnings: &result.warnings,
            processing_time_ms: result.processing_time_ms,
            raw_text: include_text.then_some(result.raw_text.as_str()),
        }
    }
}

pub fn format_document(report: &DocumentReport<'_>, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Csv => format_records_csv(report.records),
        OutputFormat::Text => Ok(format_records_text(report)),
    }
}

fn format_records_csv(records: &[ParsedInvoiceRecord]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["invoice_number", "vendor", "amount"])?;
    for record in records {
        wtr.write_record([
            record.invoice_number.clone().unwrap_or_default(),
            record.vendor.clone().unwrap_or_default(),
            record.amount.map(|a| a.to_string()).unwrap_or_default(),
        ])?;
    }

    let data = String::from_utf8(wtr.into_inner()?)?;
    Ok(data)
}

fn format_records_text(report: &DocumentReport<'_>) -> String {
    let mut output = String::new();

    output.push_str(&format!("File: {}\n", report.file));
    output.push_str(&format!("Method: {:?}\n", report.method));
    output.push_str(&format!("Records: {}\n", report.records.len()));

    for (i, record) in report.records.iter().enumerate() {
        output.push('\n');
        output.push_str(&format!("Invoice {}:\n", i + 1));
        output.push_str(&format!(
            "  Number: {}\n",
            record.invoice_number.as_deref().unwrap_or("-")
        ));
        output.push_str(&format!(
            "  Vendor: {}\n",
            record.vendor.as_deref().unwrap_or("-")
        ));
        output.push_str(&format!(
            "  Amount: {}\n",
            record.amount.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string())
        ));
    }

    output
}

pub fn format_reconciliation(
    reconciliation: &Reconciliation,
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&reconciliation.results)?),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(vec![]);
            wtr.write_record(["invoice_id", "payment_id", "status"])?;
            for result in &reconciliation.results {
                wtr.write_record([
                    result.invoice_id.to_string(),
                    result.payment_id.map(|id| id.to_string()).unwrap_or_default(),
                    result.status.to_string(),
                ])?;
            }
            Ok(String::from_utf8(wtr.into_inner()?)?)
        }
        OutputFormat::Text => {
            let mut output = String::new();
            for result in &reconciliation.results {
                match result.payment_id {
                    Some(payment_id) => output.push_str(&format!(
                        "Invoice {}: {} (payment {})\n",
                        result.invoice_id, result.status, payment_id
                    )),
                    None => output.push_str(&format!(
                        "Invoice {}: {}\n",
                        result.invoice_id, result.status
                    )),
                }
            }
            output.push_str(&format!(
                "\n{} matched, {} unmatched\n",
                reconciliation.matched_count(),
                reconciliation.unmatched_count()
            ));
            Ok(output)
        }
    }
}
