//! Invoice-to-payment reconciliation.
//!
//! The matcher never touches invoices directly. It reads snapshots and returns
//! a [`Reconciliation`] that the caller applies in one step, typically inside
//! whatever transaction persists the new statuses.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ReconciliationError;
use crate::models::invoice::{Invoice, InvoiceStatus, Payment};

/// Largest absolute difference between invoice amount and paid amount that
/// still counts as a match, in the invoice's currency unit.
pub const AMOUNT_TOLERANCE: Decimal = Decimal::ONE;

/// Outcome for one invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub invoice_id: i64,
    pub payment_id: Option<i64>,
    pub status: InvoiceStatus,
}

/// Results of one reconciliation run, one per invoice in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub results: Vec<MatchResult>,
}

impl Reconciliation {
    /// New status for every reconciled invoice.
    pub fn status_updates(&self) -> impl Iterator<Item = (i64, InvoiceStatus)> + '_ {
        self.results.iter().map(|r| (r.invoice_id, r.status))
    }

    /// Write the statuses onto the invoices that were reconciled.
    ///
    /// `invoices` must be the same invoices, in the same order, that were
    /// passed to the matcher. Nothing is written unless every position lines up.
    pub fn apply(&self, invoices: &mut [Invoice]) -> Result<(), ReconciliationError> {
        if invoices.len() != self.results.len() {
            let position = invoices.len().min(self.results.len());
            return match self.results.get(position) {
                Some(result) => Err(ReconciliationError::InvoiceMismatch {
                    position,
                    expected: result.invoice_id,
                    found: None,
                }),
                None => Err(ReconciliationError::LengthMismatch {
                    expected: self.results.len(),
                    actual: invoices.len(),
                }),
            };
        }

        for (position, (invoice, result)) in invoices.iter().zip(&self.results).enumerate() {
            if invoice.id != result.invoice_id {
                return Err(ReconciliationError::InvoiceMismatch {
                    position,
                    expected: result.invoice_id,
                    found: Some(invoice.id),
                });
            }
        }

        for (invoice, result) in invoices.iter_mut().zip(&self.results) {
            invoice.status = result.status;
        }
        Ok(())
    }

    pub fn matched_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == InvoiceStatus::Matched)
            .count()
    }

    pub fn unmatched_count(&self) -> usize {
        self.results.len() - self.matched_count()
    }
}

/// First-match reconciliation by vendor equality and amount tolerance.
///
/// Payments are never consumed: one payment may settle any number of invoices.
/// Among several qualifying payments the earliest in list order wins,
/// regardless of how close its amount is.
#[derive(Debug, Clone, Copy)]
pub struct ReconciliationMatcher {
    tolerance: Decimal,
}

impl ReconciliationMatcher {
    pub fn new() -> Self {
        Self {
            tolerance: AMOUNT_TOLERANCE,
        }
    }

    /// Override the amount tolerance.
    pub fn with_tolerance(mut self, tolerance: Decimal) -> Self {
        self.tolerance = tolerance.abs();
        self
    }

    /// First payment that settles the invoice, if any.
    ///
    /// A difference too large to represent is never within tolerance.
    pub fn find_payment<'p>(&self, invoice: &Invoice, payments: &'p [Payment]) -> Option<&'p Payment> {
        let vendor = invoice.vendor.as_deref()?;
        let amount = invoice.amount?;

        payments.iter().find(|payment| {
            payment.vendor.as_deref() == Some(vendor)
                && payment
                    .paid_amount
                    .and_then(|paid| paid.checked_sub(amount))
                    .is_some_and(|diff| diff.abs() <= self.tolerance)
        })
    }

    /// Reconcile every invoice against the payment list.
    pub fn reconcile(&self, invoices: &[Invoice], payments: &[Payment]) -> Reconciliation {
        let results: Vec<MatchResult> = invoices
            .iter()
            .map(|invoice| match self.find_payment(invoice, payments) {
                Some(payment) => {
                    debug!("Invoice {} matched payment {}", invoice.id, payment.id);
                    MatchResult {
                        invoice_id: invoice.id,
                        payment_id: Some(payment.id),
                        status: InvoiceStatus::Matched,
                    }
                }
                None => {
                    debug!("Invoice {} has no matching payment", invoice.id);
                    MatchResult {
                        invoice_id: invoice.id,
                        payment_id: None,
                        status: InvoiceStatus::Unmatched,
                    }
                }
            })
            .collect();

        let reconciliation = Reconciliation { results };
        info!(
            "Reconciled {} invoices against {} payments: {} matched, {} unmatched",
            invoices.len(),
            payments.len(),
            reconciliation.matched_count(),
            reconciliation.unmatched_count()
        );
        reconciliation
    }
}

impl Default for ReconciliationMatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Reconcile with the default tolerance.
pub fn reconcile(invoices: &[Invoice], payments: &[Payment]) -> Reconciliation {
    ReconciliationMatcher::new().reconcile(invoices, payments)
}
