//! Parser for hand-written `label: value` invoice blocks.

use tracing::{debug, trace};

use crate::error::ExtractionError;
use crate::models::invoice::ParsedInvoiceRecord;

use super::amounts::parse_number;
use super::{InvoiceParser, Result};

/// Field a line contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    InvoiceNumber,
    Vendor,
    Amount,
}

impl Field {
    /// Keyword lookup for one line. A line mentioning several keywords feeds
    /// only the first field in this order.
    fn for_line(line: &str) -> Option<Self> {
        let lower = line.to_lowercase();
        if lower.contains("invoice") {
            Some(Field::InvoiceNumber)
        } else if lower.contains("vendor") {
            Some(Field::Vendor)
        } else if lower.contains("amount") {
            Some(Field::Amount)
        } else {
            None
        }
    }
}

/// Parser for blank-line separated blocks of labeled lines.
///
/// ```text
/// Invoice: INV-001
/// Vendor: ACME
/// Amount: 120.50
///
/// Invoice: INV-002
/// ...
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DelimitedInvoiceParser;

impl DelimitedInvoiceParser {
    pub fn new() -> Self {
        Self
    }

    fn parse_block(&self, block: &str) -> Result<Option<ParsedInvoiceRecord>> {
        let mut record = ParsedInvoiceRecord::default();

        for line in block.lines() {
            let Some(field) = Field::for_line(line) else {
                continue;
            };
            let value = field_value(line);
            trace!("{:?} = {:?}", field, value);

            match field {
                Field::InvoiceNumber => record.invoice_number = Some(value.to_string()),
                Field::Vendor => record.vendor = Some(value.to_string()),
                Field::Amount => {
                    let amount = parse_number(value).ok_or_else(|| ExtractionError::Parse {
                        field: "amount".to_string(),
                        value: value.to_string(),
                    })?;
                    record.amount = Some(amount);
                }
            }
        }

        Ok(record.is_complete().then_some(record))
    }
}

impl InvoiceParser for DelimitedInvoiceParser {
    fn parse(&self, text: &str) -> Result<Vec<ParsedInvoiceRecord>> {
        let text = text.replace("\r\n", "\n");

        let mut records = Vec::new();
        for (idx, block) in text.trim().split("\n\n").enumerate() {
            match self.parse_block(block)? {
                Some(record) => records.push(record),
                None => debug!("Block {} is incomplete, skipping", idx),
            }
        }

        Ok(records)
    }
}

/// Everything after the last colon, or the whole line without one.
fn field_value(line: &str) -> &str {
    line.rsplit_once(':').map_or(line, |(_, value)| value).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn record(number: &str, vendor: &str, amount: &str) -> ParsedInvoiceRecord {
        ParsedInvoiceRecord {
            invoice_number: Some(number.to_string()),
            vendor: Some(vendor.to_string()),
            amount: Some(Decimal::from_str(amount).unwrap()),
        }
    }

    #[test]
    fn test_parse_blocks() {
        let text = "Invoice: INV-1\nVendor: ACME\nAmount: 120.50\n\n\
                    Amount: 7\nVendor: Globex\nInvoice: INV-2\n";

        let records = DelimitedInvoiceParser::new().parse(text).unwrap();
        assert_eq!(
            records,
            vec![record("INV-1", "ACME", "120.50"), record("INV-2", "Globex", "7")]
        );
    }

    #[test]
    fn test_value_after_last_colon() {
        let text = "Invoice: INV:001\nVendor: ACME\nAmount: 10";
        let records = DelimitedInvoiceParser::new().parse(text).unwrap();
        assert_eq!(records[0].invoice_number.as_deref(), Some("001"));
    }

    #[test]
    fn test_incomplete_block_dropped() {
        let text = "Invoice: A\nVendor: ACME\n\nInvoice: B\nVendor: ACME\nAmount: 3";
        let records = DelimitedInvoiceParser::new().parse(text).unwrap();
        assert_eq!(records, vec![record("B", "ACME", "3")]);
    }

    #[test]
    fn test_keywords_are_case_insensitive_substrings() {
        let text = "INVOICE NO: X9\nvendor name: Initech\nTotal AMOUNT due: 1e2";
        let records = DelimitedInvoiceParser::new().parse(text).unwrap();
        assert_eq!(records, vec![record("X9", "Initech", "100")]);
    }

    #[test]
    fn test_invoice_keyword_wins_over_amount() {
        // "Invoice amount" counts as the invoice number line, so amount is missing
        let text = "Invoice amount: 50\nVendor: ACME";
        assert!(DelimitedInvoiceParser::new().parse(text).unwrap().is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let text = "Invoice: A\nVendor: First\nVendor: Second\nAmount: 1\nAmount: 2";
        let records = DelimitedInvoiceParser::new().parse(text).unwrap();
        assert_eq!(records, vec![record("A", "Second", "2")]);
    }

    #[test]
    fn test_bad_amount_is_fatal() {
        let text = "Invoice: A\nVendor: ACME\nAmount: 1\n\nInvoice: B\nVendor: ACME\nAmount: twelve";
        let err = DelimitedInvoiceParser::new().parse(text).unwrap_err();

        assert!(matches!(
            err,
            ExtractionError::Parse { ref field, ref value } if field == "amount" && value == "twelve"
        ));
    }

    #[test]
    fn test_crlf_and_surrounding_blank_lines() {
        let text = "\r\n\r\nInvoice: A\r\nVendor: ACME\r\nAmount: 4\r\n\r\nInvoice: B\r\nVendor: ACME\r\nAmount: 5\r\n\r\n";
        let records = DelimitedInvoiceParser::new().parse(text).unwrap();
        assert_eq!(records, vec![record("A", "ACME", "4"), record("B", "ACME", "5")]);
    }

    #[test]
    fn test_empty_text() {
        assert!(DelimitedInvoiceParser::new().parse("  \n").unwrap().is_empty());
    }
}
