//! Invoice and payment data models.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An invoice record parsed out of document text.
///
/// Every field is optional; each parser decides which fields a record needs
/// before it is emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedInvoiceRecord {
    /// Invoice number/identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,

    /// Vendor (seller) name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,

    /// Total amount due.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
}

impl ParsedInvoiceRecord {
    /// Check whether all three fields were found.
    pub fn is_complete(&self) -> bool {
        self.invoice_number.is_some() && self.vendor.is_some() && self.amount.is_some()
    }
}

/// Reconciliation status of an invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    /// No payment satisfied the invoice.
    #[default]
    Unmatched,
    /// A payment from the same vendor within tolerance was found.
    Matched,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Unmatched => "UNMATCHED",
            InvoiceStatus::Matched => "MATCHED",
        }
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored invoice, owned by the caller's persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,

    /// Unique business key.
    #[serde(default)]
    pub invoice_number: Option<String>,

    #[serde(default)]
    pub vendor: Option<String>,

    #[serde(default)]
    pub amount: Option<Decimal>,

    #[serde(default)]
    pub status: InvoiceStatus,
}

impl Invoice {
    /// Create an unmatched invoice.
    pub fn new(id: i64, vendor: impl Into<String>, amount: Decimal) -> Self {
        Self {
            id,
            invoice_number: None,
            vendor: Some(vendor.into()),
            amount: Some(amount),
            status: InvoiceStatus::Unmatched,
        }
    }

    /// Turn a freshly parsed record into an unmatched invoice.
    pub fn from_record(id: i64, record: ParsedInvoiceRecord) -> Self {
        Self {
            id,
            invoice_number: record.invoice_number,
            vendor: record.vendor,
            amount: record.amount,
            status: InvoiceStatus::Unmatched,
        }
    }
}

/// A payment received from a vendor. Read-only to the matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,

    #[serde(default)]
    pub vendor: Option<String>,

    #[serde(default)]
    pub paid_amount: Option<Decimal>,
}

impl Payment {
    pub fn new(id: i64, vendor: impl Into<String>, paid_amount: Decimal) -> Self {
        Self {
            id,
            vendor: Some(vendor.into()),
            paid_amount: Some(paid_amount),
        }
    }
}
