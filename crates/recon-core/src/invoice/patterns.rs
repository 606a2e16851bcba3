//! Label patterns for invoice extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Vendor label followed by the seller name, up to the end of the line
    pub static ref VENDOR_LABEL: Regex = Regex::new(
        r"(?i)Sold By:\s*([A-Z][A-Z &.,]+)"
    ).unwrap();

    // Invoice blocks start after this label
    pub static ref INVOICE_NUMBER_LABEL: Regex = Regex::new(
        r"(?i)Invoice Number\s*#?\s*"
    ).unwrap();

    pub static ref LEADING_INVOICE_NUMBER: Regex = Regex::new(
        r"^([A-Z0-9]+)"
    ).unwrap();

    // Total amount with optional rupee glyph and comma grouping
    pub static ref GRAND_TOTAL: Regex = Regex::new(
        r"(?i)Grand Total\s*₹?\s*([\d,]+(?:\.\d{2})?)"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_label_stops_at_line_end() {
        let caps = VENDOR_LABEL.captures("sold by:  Acme & Sons, Ltd.\nGSTIN 29AB").unwrap();
        assert_eq!(&caps[1], "Acme & Sons, Ltd.");
    }

    #[test]
    fn test_invoice_number_label_variants() {
        assert!(INVOICE_NUMBER_LABEL.is_match("INVOICE NUMBER#A1"));
        assert!(INVOICE_NUMBER_LABEL.is_match("Invoice Number # A1"));
        assert!(!INVOICE_NUMBER_LABEL.is_match("Invoice No. A1"));
    }

    #[test]
    fn test_leading_invoice_number_is_case_sensitive() {
        assert_eq!(&LEADING_INVOICE_NUMBER.captures("INV42\n").unwrap()[1], "INV42");
        assert!(LEADING_INVOICE_NUMBER.captures("inv42").is_none());
    }

    #[test]
    fn test_grand_total() {
        let caps = GRAND_TOTAL.captures("grand total ₹ 12,400.75 only").unwrap();
        assert_eq!(&caps[1], "12,400.75");

        let caps = GRAND_TOTAL.captures("Grand Total 99.5").unwrap();
        assert_eq!(&caps[1], "99");
    }
}
