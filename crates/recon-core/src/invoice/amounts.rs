//! Amount parsing for invoice fields.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse a comma-grouped amount such as `1,234.50`.
///
/// Grouping commas are stripped; anything else that is not a plain decimal
/// literal yields `None`.
pub fn parse_grouped_amount(s: &str) -> Option<Decimal> {
    let cleaned = s.replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

/// Parse a free-form numeric literal (`12`, `-3.5`, `+7`, `2.5e3`).
///
/// Infinities, NaN and values outside `Decimal`'s range are rejected.
pub fn parse_number(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}
