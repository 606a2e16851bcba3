//! Invoice parser for free-form text produced by PDF extraction or OCR.
//!
//! The text is noisy and field order inside an invoice is unreliable, so the
//! parser works in two independent passes: a document-wide scan for vendor
//! labels and a split of the document on invoice-number labels. Vendors are
//! then tied to blocks according to [`VendorAssignment`].

use std::ops::Range;

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::models::config::VendorAssignment;
use crate::models::invoice::ParsedInvoiceRecord;

use super::amounts::parse_grouped_amount;
use super::patterns::{GRAND_TOTAL, INVOICE_NUMBER_LABEL, LEADING_INVOICE_NUMBER, VENDOR_LABEL};
use super::{InvoiceParser, Result};

/// A vendor name found by the document-wide label scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorCandidate {
    /// Cleaned vendor name.
    pub name: String,
    /// Byte offset of the label in the document.
    pub offset: usize,
}

/// Full outcome of a structured parse.
#[derive(Debug, Clone, Default)]
pub struct StructuredParse {
    /// Records that carried an amount, in block order.
    pub records: Vec<ParsedInvoiceRecord>,
    /// Number of invoice blocks found, including those without an amount.
    pub block_count: usize,
    /// Vendor names found anywhere in the document, in document order.
    pub vendor_candidates: Vec<String>,
}

impl StructuredParse {
    /// Positional assignment is only trustworthy when every block has exactly
    /// one vendor label.
    pub fn counts_agree(&self) -> bool {
        self.block_count == self.vendor_candidates.len()
    }
}

/// One invoice block: the text after an invoice-number label up to the next one.
struct Block<'t> {
    /// Offset of the label that opens the block.
    label_start: usize,
    body: Range<usize>,
    text: &'t str,
}

/// Parser for free-form invoice text.
pub struct StructuredInvoiceParser {
    vendor_assignment: VendorAssignment,
}

impl StructuredInvoiceParser {
    /// Create a parser using positional vendor assignment.
    pub fn new() -> Self {
        Self {
            vendor_assignment: VendorAssignment::Positional,
        }
    }

    /// Set the vendor assignment strategy.
    pub fn with_vendor_assignment(mut self, vendor_assignment: VendorAssignment) -> Self {
        self.vendor_assignment = vendor_assignment;
        self
    }

    /// Parse the text and report block/vendor counts alongside the records.
    pub fn analyze(&self, text: &str) -> StructuredParse {
        let candidates = vendor_candidates(text);
        let blocks = split_blocks(text);

        let vendors = match self.vendor_assignment {
            VendorAssignment::Positional => assign_positional(&candidates, blocks.len()),
            VendorAssignment::Scoped => assign_scoped(&candidates, &blocks),
        };

        if self.vendor_assignment == VendorAssignment::Positional
            && candidates.len() != blocks.len()
        {
            warn!(
                "Found {} invoice blocks but {} vendor labels, vendors may be misassigned",
                blocks.len(),
                candidates.len()
            );
        }

        let mut records = Vec::new();
        for (idx, (block, vendor)) in blocks.iter().zip(vendors).enumerate() {
            let Some(amount) = grand_total(block.text) else {
                debug!("Block {} has no grand total, skipping", idx);
                continue;
            };

            records.push(ParsedInvoiceRecord {
                invoice_number: leading_invoice_number(block.text),
                vendor,
                amount: Some(amount),
            });
        }

        debug!(
            "Parsed {} records from {} blocks",
            records.len(),
            blocks.len()
        );

        StructuredParse {
            records,
            block_count: blocks.len(),
            vendor_candidates: candidates.into_iter().map(|c| c.name).collect(),
        }
    }
}

impl Default for StructuredInvoiceParser {
    fn default() -> Self {
        Self::new()
    }
}

impl InvoiceParser for StructuredInvoiceParser {
    fn parse(&self, text: &str) -> Result<Vec<ParsedInvoiceRecord>> {
        Ok(self.analyze(text).records)
    }
}

/// Scan the whole document for vendor labels.
pub fn vendor_candidates(text: &str) -> Vec<VendorCandidate> {
    VENDOR_LABEL
        .captures_iter(text)
        .filter_map(|caps| {
            let label = caps.get(0)?;
            let name = caps[1].trim_matches(|c| c == ' ' || c == ',');
            Some(VendorCandidate {
                name: name.to_string(),
                offset: label.start(),
            })
        })
        .collect()
}

/// Split on invoice-number labels, dropping the preamble before the first one.
fn split_blocks(text: &str) -> Vec<Block<'_>> {
    let labels: Vec<_> = INVOICE_NUMBER_LABEL.find_iter(text).collect();

    labels
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let end = labels.get(i + 1).map_or(text.len(), |next| next.start());
            Block {
                label_start: label.start(),
                body: label.end()..end,
                text: &text[label.end()..end],
            }
        })
        .collect()
}

fn leading_invoice_number(block: &str) -> Option<String> {
    LEADING_INVOICE_NUMBER
        .captures(block)
        .map(|caps| caps[1].to_string())
}

fn grand_total(block: &str) -> Option<Decimal> {
    let caps = GRAND_TOTAL.captures(block)?;
    parse_grouped_amount(&caps[1])
}

/// The i-th vendor label goes to the i-th block, wherever it sits.
fn assign_positional(candidates: &[VendorCandidate], block_count: usize) -> Vec<Option<String>> {
    (0..block_count)
        .map(|idx| candidates.get(idx).map(|c| c.name.clone()))
        .collect()
}

/// Single pass over label offsets. When the document opens with a vendor
/// label, each block takes the last label between the previous invoice-number
/// label and its own; otherwise it takes the first label inside its body.
fn assign_scoped(candidates: &[VendorCandidate], blocks: &[Block<'_>]) -> Vec<Option<String>> {
    let vendor_first = match (candidates.first(), blocks.first()) {
        (Some(vendor), Some(block)) => vendor.offset < block.label_start,
        _ => false,
    };

    let mut window_start = 0;
    blocks
        .iter()
        .map(|block| {
            let chosen = if vendor_first {
                let window = window_start..block.label_start;
                window_start = block.label_start;
                candidates.iter().rev().find(|c| window.contains(&c.offset))
            } else {
                candidates.iter().find(|c| block.body.contains(&c.offset))
            };
            chosen.map(|c| c.name.clone())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn record(number: Option<&str>, vendor: Option<&str>, amount: &str) -> ParsedInvoiceRecord {
        ParsedInvoiceRecord {
            invoice_number: number.map(str::to_string),
            vendor: vendor.map(str::to_string),
            amount: Some(dec(amount)),
        }
    }

    #[test]
    fn test_parse_marketplace_invoices() {
        let text = r#"
            Tax Invoice/Bill of Supply
            Sold By: ACME TRADERS PVT. LTD.,
            Invoice Number # IN58213
            Order Date: 12.01.2024
            Grand Total ₹1,234.50

            Sold By: Blue Ocean & Co
            Invoice Number #IN58214
            Grand Total ₹ 89.00
        "#;

        let records = StructuredInvoiceParser::new().parse(text).unwrap();

        assert_eq!(
            records,
            vec![
                record(Some("IN58213"), Some("ACME TRADERS PVT. LTD."), "1234.50"),
                record(Some("IN58214"), Some("Blue Ocean & Co"), "89.00"),
            ]
        );
    }

    #[test]
    fn test_vendor_assigned_by_position_not_proximity() {
        // Both vendor labels sit in the preamble, far from their blocks
        let text = "Sold By: NORTHWIND\nSold By: CONTOSO\n\
                    Invoice Number #A1\nSold By nobody here\nGrand Total 100\n\
                    Invoice Number #B2\nGrand Total 200\n";

        let records = StructuredInvoiceParser::new().parse(text).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].vendor.as_deref(), Some("NORTHWIND"));
        assert_eq!(records[1].vendor.as_deref(), Some("CONTOSO"));
    }

    #[test]
    fn test_block_without_grand_total_is_dropped() {
        let text = "Sold By: NORTHWIND\nInvoice Number #A1\nTotal due 100";
        let parse = StructuredInvoiceParser::new().analyze(text);

        assert!(parse.records.is_empty());
        assert_eq!(parse.block_count, 1);
        assert_eq!(parse.vendor_candidates, vec!["NORTHWIND".to_string()]);
    }

    #[test]
    fn test_dropped_block_still_consumes_its_vendor_slot() {
        let text = "Sold By: FIRST\nSold By: SECOND\n\
                    Invoice Number A1 no total\n\
                    Invoice Number B2 Grand Total 10";

        let records = StructuredInvoiceParser::new().parse(text).unwrap();
        assert_eq!(records, vec![record(Some("B2"), Some("SECOND"), "10")]);
    }

    #[test]
    fn test_missing_number_and_vendor_still_emitted() {
        let text = "Invoice Number: see below\nGrand Total ₹450.00";
        let records = StructuredInvoiceParser::new().parse(text).unwrap();

        // ':' is not an invoice-number character, and there is no vendor label
        assert_eq!(records, vec![record(None, None, "450.00")]);
    }

    #[test]
    fn test_preamble_is_ignored() {
        let text = "Grand Total 999\nInvoice Number #Z9\nGrand Total 5";
        let records = StructuredInvoiceParser::new().parse(text).unwrap();
        assert_eq!(records, vec![record(Some("Z9"), None, "5")]);
    }

    #[test]
    fn test_no_invoice_blocks() {
        let parse = StructuredInvoiceParser::new().analyze("");
        assert!(parse.records.is_empty());
        assert!(parse.counts_agree());
    }

    #[test]
    fn test_positional_surplus_blocks_get_no_vendor() {
        let text = "Sold By: ONLY ONE\nInvoice Number #A1 Grand Total 1\nInvoice Number #A2 Grand Total 2";
        let parse = StructuredInvoiceParser::new().analyze(text);

        assert!(!parse.counts_agree());
        assert_eq!(parse.records[0].vendor.as_deref(), Some("ONLY ONE"));
        assert_eq!(parse.records[1].vendor, None);
    }

    #[test]
    fn test_scoped_assignment_vendor_before_number() {
        let text = "Sold By: NORTHWIND\nInvoice Number #A1\nGrand Total 100\n\
                    Invoice Number #B2\nGrand Total 200\n\
                    Sold By: CONTOSO\nInvoice Number #C3\nGrand Total 300\n";

        let scoped = StructuredInvoiceParser::new()
            .with_vendor_assignment(VendorAssignment::Scoped)
            .parse(text)
            .unwrap();
        let vendors: Vec<_> = scoped.iter().map(|r| r.vendor.as_deref()).collect();
        assert_eq!(vendors, vec![Some("NORTHWIND"), None, Some("CONTOSO")]);

        let positional = StructuredInvoiceParser::new().parse(text).unwrap();
        let vendors: Vec<_> = positional.iter().map(|r| r.vendor.as_deref()).collect();
        assert_eq!(vendors, vec![Some("NORTHWIND"), Some("CONTOSO"), None]);
    }

    #[test]
    fn test_scoped_assignment_vendor_after_number() {
        let text = "Invoice Number #A1\nSold By: NORTHWIND\nGrand Total 100\n\
                    Invoice Number #B2\nSold By: CONTOSO\nGrand Total 200\n";

        let records = StructuredInvoiceParser::new()
            .with_vendor_assignment(VendorAssignment::Scoped)
            .parse(text)
            .unwrap();

        assert_eq!(
            records,
            vec![
                record(Some("A1"), Some("NORTHWIND"), "100"),
                record(Some("B2"), Some("CONTOSO"), "200"),
            ]
        );
    }
}
