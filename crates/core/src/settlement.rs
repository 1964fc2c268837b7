//! Invoice settlement.
//!
//! An invoice's status is a pure function of its amount and the sum of its payments:
//!
//! ```text
//! Paid    if paid_total >= amount
//! Partial if 0 < paid_total < amount
//! Unpaid  otherwise
//! ```
//!
//! The function is sum-based rather than count-based, so it is independent of payment order.
//! While payments are only ever appended with positive amounts, an invoice moves one way:
//! Unpaid → Partial → Paid. A zero-amount invoice is Paid from the start.

use crate::billing::Invoice;
use crate::config::OverpaymentPolicy;
use crate::validation::require_positive;
use crate::{RecordsError, RecordsResult};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Unpaid,
    Partial,
    Paid,
}

impl InvoiceStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "Unpaid",
            InvoiceStatus::Partial => "Partial",
            InvoiceStatus::Paid => "Paid",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derives the status from the amount owed and the amount paid so far.
pub fn derive_status(amount: Decimal, paid_total: Decimal) -> InvoiceStatus {
    if paid_total >= amount {
        InvoiceStatus::Paid
    } else if paid_total > Decimal::ZERO {
        InvoiceStatus::Partial
    } else {
        InvoiceStatus::Unpaid
    }
}

/// Everything derived from an invoice's payment history.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub status: InvoiceStatus,
    pub paid_total: Decimal,
    /// What is still owed; never negative.
    pub balance_due: Decimal,
    /// How much was paid beyond the amount owed; never negative.
    pub overpaid_by: Decimal,
}

pub fn settle(invoice: &Invoice) -> Settlement {
    let paid_total: Decimal = invoice.payments.iter().map(|p| p.amount).sum();
    let difference = invoice.amount - paid_total;

    Settlement {
        status: derive_status(invoice.amount, paid_total),
        paid_total,
        balance_due: difference.max(Decimal::ZERO),
        overpaid_by: (-difference).max(Decimal::ZERO),
    }
}

/// Checks a prospective payment against an invoice before anything is recorded.
///
/// # Errors
///
/// Returns [`RecordsError::Validation`] if `amount` is not positive, or if `policy` is
/// [`OverpaymentPolicy::Reject`] and the payment would take the paid total past the amount owed.
pub fn check_payment(
    invoice: &Invoice,
    amount: Decimal,
    policy: OverpaymentPolicy,
) -> RecordsResult<()> {
    require_positive("payment amount", amount)?;

    let settlement = settle(invoice);
    if amount > settlement.balance_due {
        match policy {
            OverpaymentPolicy::Reject => {
                return Err(RecordsError::Validation(format!(
                    "payment of {amount} exceeds the outstanding balance of {} on invoice {}",
                    settlement.balance_due, invoice.id
                )));
            }
            OverpaymentPolicy::Allow => {
                tracing::warn!(
                    invoice_id = %invoice.id,
                    %amount,
                    balance_due = %settlement.balance_due,
                    "accepting overpayment"
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::Payment;
    use chrono::{NaiveDate, Utc};
    use clinic_ids::{InvoiceId, PatientId, PaymentId};
    use clinic_types::NonEmptyText;

    fn money(value: &str) -> Decimal {
        value.parse().expect("valid decimal")
    }

    fn invoice(amount: &str, payments: &[&str]) -> Invoice {
        Invoice {
            id: InvoiceId::new(5004),
            patient_id: PatientId::new(1004),
            date: NaiveDate::from_ymd_opt(2025, 10, 20).unwrap(),
            amount: money(amount),
            items: vec![],
            payments: payments
                .iter()
                .enumerate()
                .map(|(i, amount)| Payment {
                    id: PaymentId::new(i as u64 + 1),
                    method: NonEmptyText::new("Cash").unwrap(),
                    amount: money(amount),
                    reference: None,
                    recorded_at: Utc::now(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_derive_status_table() {
        assert_eq!(derive_status(money("1000"), money("0")), InvoiceStatus::Unpaid);
        assert_eq!(derive_status(money("1000"), money("400")), InvoiceStatus::Partial);
        assert_eq!(derive_status(money("1000"), money("1000")), InvoiceStatus::Paid);
        assert_eq!(derive_status(money("1000"), money("1200")), InvoiceStatus::Paid);
        assert_eq!(derive_status(money("0"), money("0")), InvoiceStatus::Paid);
    }

    #[test]
    fn test_negative_total_is_unpaid() {
        assert_eq!(derive_status(money("100"), money("-5")), InvoiceStatus::Unpaid);
    }

    #[test]
    fn test_status_is_order_independent() {
        let forwards = settle(&invoice("1000", &["100", "250.50", "649.50"]));
        let backwards = settle(&invoice("1000", &["649.50", "250.50", "100"]));
        assert_eq!(forwards, backwards);
        assert_eq!(forwards.status, InvoiceStatus::Paid);
    }

    #[test]
    fn test_status_never_regresses_while_appending() {
        let mut inv = invoice("1000", &[]);
        let mut previous = settle(&inv).status;
        for (i, amount) in ["150", "0.01", "300", "549.99", "75"].iter().enumerate() {
            inv.payments.push(Payment {
                id: PaymentId::new(i as u64 + 10),
                method: NonEmptyText::new("Card").unwrap(),
                amount: money(amount),
                reference: None,
                recorded_at: Utc::now(),
            });
            let current = settle(&inv).status;
            assert!(current >= previous, "{previous} -> {current} went backwards");
            previous = current;
        }
        assert_eq!(previous, InvoiceStatus::Paid);
    }

    #[test]
    fn test_settlement_figures() {
        let partial = settle(&invoice("1000", &["400"]));
        assert_eq!(partial.paid_total, money("400"));
        assert_eq!(partial.balance_due, money("600"));
        assert_eq!(partial.overpaid_by, Decimal::ZERO);

        let over = settle(&invoice("1000", &["400", "700"]));
        assert_eq!(over.balance_due, Decimal::ZERO);
        assert_eq!(over.overpaid_by, money("100"));
    }

    #[test]
    fn test_check_payment_rejects_non_positive() {
        let inv = invoice("1000", &[]);
        assert!(check_payment(&inv, Decimal::ZERO, OverpaymentPolicy::Allow).is_err());
        assert!(check_payment(&inv, money("-10"), OverpaymentPolicy::Allow).is_err());
    }

    #[test]
    fn test_check_payment_overpayment_policy() {
        let inv = invoice("1000", &["400"]);

        assert!(check_payment(&inv, money("600"), OverpaymentPolicy::Reject).is_ok());
        assert!(check_payment(&inv, money("600.01"), OverpaymentPolicy::Reject).is_err());
        assert!(check_payment(&inv, money("600.01"), OverpaymentPolicy::Allow).is_ok());
    }
}
