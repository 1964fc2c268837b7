//! Input validation utilities.
//!
//! Every check here runs before a collection is touched, so a failing operation never leaves a
//! half-applied mutation behind.

use crate::constants::DATE_FORMAT;
use crate::{RecordsError, RecordsResult};
use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Parses a required `YYYY-MM-DD` calendar date.
///
/// # Errors
///
/// Returns [`RecordsError::Validation`] if the input is blank or not a valid date.
pub fn parse_date(field: &str, input: &str) -> RecordsResult<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(RecordsError::Validation(format!("{field} is required")));
    }

    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|e| {
        RecordsError::Validation(format!(
            "{field} must be a date in YYYY-MM-DD form, got '{trimmed}': {e}"
        ))
    })
}

/// Amounts owed may be zero but never negative.
pub fn require_non_negative(field: &str, amount: Decimal) -> RecordsResult<()> {
    if amount < Decimal::ZERO {
        return Err(RecordsError::Validation(format!(
            "{field} cannot be negative, got {amount}"
        )));
    }
    Ok(())
}

/// Payments must move money.
pub fn require_positive(field: &str, amount: Decimal) -> RecordsResult<()> {
    if amount <= Decimal::ZERO {
        return Err(RecordsError::Validation(format!(
            "{field} must be greater than zero, got {amount}"
        )));
    }
    Ok(())
}
