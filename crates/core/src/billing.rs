//! Invoices, line items and payments.
//!
//! An invoice's status is never stored as truth. [`Invoice::status`] derives it from the
//! payment list on every call; the `status` written into snapshots is a convenience for readers
//! of the raw JSON and is discarded on load.

use crate::constants::LEGACY_PAYMENT_METHOD;
use crate::settlement::{self, InvoiceStatus, Settlement};
use crate::validation::require_non_negative;
use crate::RecordsResult;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clinic_ids::{InvoiceId, PatientId, PaymentId};
use clinic_types::NonEmptyText;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredInvoice", into = "StoredInvoice")]
pub struct Invoice {
    pub id: InvoiceId,
    pub patient_id: PatientId,
    /// Issue date.
    pub date: NaiveDate,
    /// Total owed; equals the sum of `items` when items are present.
    pub amount: Decimal,
    pub items: Vec<LineItem>,
    pub payments: Vec<Payment>,
}

impl Invoice {
    pub fn status(&self) -> InvoiceStatus {
        self.settlement().status
    }

    pub fn settlement(&self) -> Settlement {
        settlement::settle(self)
    }

    pub fn paid_total(&self) -> Decimal {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// Highest payment id on this invoice, if any payment has been recorded.
    pub fn last_payment_id(&self) -> Option<PaymentId> {
        self.payments.iter().map(|p| p.id).max()
    }
}

/// A billable line on an invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "desc")]
    pub description: NonEmptyText,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
}

impl LineItem {
    pub fn new(description: impl AsRef<str>, amount: Decimal) -> RecordsResult<Self> {
        require_non_negative("line item amount", amount)?;
        Ok(Self {
            description: NonEmptyText::required("line item description", description)?,
            amount,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub method: NonEmptyText,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "date")]
    pub recorded_at: DateTime<Utc>,
}

/// Input for [`EntityStore::record_payment`](crate::EntityStore::record_payment).
#[derive(Debug, Clone)]
pub struct NewPayment {
    pub amount: Decimal,
    /// Defaults to `Cash`.
    pub method: Option<String>,
    pub reference: Option<String>,
}

impl NewPayment {
    pub fn new(amount: Decimal) -> Self {
        Self {
            amount,
            method: None,
            reference: None,
        }
    }
}

/// On-disk shape of an invoice.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredInvoice {
    invoice_id: InvoiceId,
    patient_id: PatientId,
    date: NaiveDate,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    amount: Decimal,
    #[serde(default)]
    status: Option<InvoiceStatus>,
    #[serde(default)]
    items: Vec<LineItem>,
    #[serde(default)]
    payments: Vec<Payment>,
}

impl From<Invoice> for StoredInvoice {
    fn from(invoice: Invoice) -> Self {
        let status = Some(invoice.status());
        Self {
            invoice_id: invoice.id,
            patient_id: invoice.patient_id,
            date: invoice.date,
            amount: invoice.amount,
            status,
            items: invoice.items,
            payments: invoice.payments,
        }
    }
}

impl TryFrom<StoredInvoice> for Invoice {
    type Error = clinic_types::TextError;

    fn try_from(stored: StoredInvoice) -> Result<Self, Self::Error> {
        let mut payments = stored.payments;

        // Older snapshots marked invoices Paid without recording how; keep them settled by
        // giving them a single settlement payment for the full amount.
        if payments.is_empty()
            && stored.status == Some(InvoiceStatus::Paid)
            && stored.amount > Decimal::ZERO
        {
            payments.push(Payment {
                id: PaymentId::new(stored.invoice_id.get()),
                method: NonEmptyText::new(LEGACY_PAYMENT_METHOD)?,
                amount: stored.amount,
                reference: None,
                recorded_at: stored.date.and_time(NaiveTime::MIN).and_utc(),
            });
        } else if payments.is_empty() && stored.status == Some(InvoiceStatus::Partial) {
            tracing::warn!(
                invoice_id = %stored.invoice_id,
                "invoice stored as Partial without payments; treating as Unpaid"
            );
        }

        Ok(Self {
            id: stored.invoice_id,
            patient_id: stored.patient_id,
            date: stored.date,
            amount: stored.amount,
            items: stored.items,
            payments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn money(value: &str) -> Decimal {
        value.parse().expect("valid decimal")
    }

    #[test]
    fn test_legacy_paid_invoice_gets_settlement_payment() {
        let json = r#"{ "invoiceId": 5001, "patientId": 1001, "date": "2025-10-10",
                        "amount": 500.00, "status": "Paid" }"#;
        let invoice: Invoice = serde_json::from_str(json).expect("should parse");

        assert_eq!(invoice.payments.len(), 1);
        assert_eq!(invoice.payments[0].amount, money("500"));
        assert_eq!(invoice.payments[0].method.as_str(), LEGACY_PAYMENT_METHOD);
        assert_eq!(invoice.status(), InvoiceStatus::Paid);
    }

    #[test]
    fn test_stored_status_is_not_trusted() {
        let json = r#"{ "invoiceId": 5009, "patientId": 1001, "date": "2025-10-10",
                        "amount": 1000, "status": "Paid",
                        "payments": [ { "id": 1760000000000, "method": "Cash", "amount": 250,
                                        "date": "2025-10-10T08:00:00Z" } ] }"#;
        let invoice: Invoice = serde_json::from_str(json).unwrap();

        assert_eq!(invoice.payments.len(), 1, "no synthetic payment when payments exist");
        assert_eq!(invoice.status(), InvoiceStatus::Partial);
    }

    #[test]
    fn test_legacy_unpaid_invoice_stays_unpaid() {
        let json = r#"{ "invoiceId": 5003, "patientId": 1001, "date": "2025-10-12",
                        "amount": 1200.00, "status": "Unpaid" }"#;
        let invoice: Invoice = serde_json::from_str(json).unwrap();
        assert!(invoice.payments.is_empty());
        assert_eq!(invoice.status(), InvoiceStatus::Unpaid);
    }

    #[test]
    fn test_serialises_derived_status_and_numbers() {
        let invoice = Invoice {
            id: InvoiceId::new(5004),
            patient_id: PatientId::new(1004),
            date: NaiveDate::from_ymd_opt(2025, 10, 20).unwrap(),
            amount: money("500"),
            items: vec![LineItem::new("Consultation", money("500")).unwrap()],
            payments: vec![],
        };
        let json = serde_json::to_value(&invoice).unwrap();

        assert_eq!(json["invoiceId"], 5004);
        assert_eq!(json["patientId"], 1004);
        assert_eq!(json["status"], "Unpaid");
        assert_eq!(json["amount"], 500.0);
        assert_eq!(json["items"][0]["desc"], "Consultation");

        let back: Invoice = serde_json::from_value(json).unwrap();
        assert_eq!(back, invoice);
    }

    #[test]
    fn test_line_item_validation() {
        assert!(matches!(
            LineItem::new("  ", money("10")),
            Err(crate::RecordsError::Validation(msg)) if msg == "line item description is required"
        ));
        assert!(LineItem::new("Consultation", money("-1")).is_err());
        assert!(LineItem::new("Consultation", Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_last_payment_id() {
        let json = r#"{ "invoiceId": 5010, "patientId": 1001, "date": "2025-10-10", "amount": 100,
                        "payments": [
                          { "id": 30, "method": "Cash", "amount": 10, "date": "2025-10-10T08:00:00Z" },
                          { "id": 42, "method": "Card", "amount": 10, "reference": "A-1",
                            "date": "2025-10-10T09:00:00Z" } ] }"#;
        let invoice: Invoice = serde_json::from_str(json).unwrap();
        assert_eq!(invoice.last_payment_id(), Some(PaymentId::new(42)));
        assert_eq!(invoice.paid_total(), money("20"));
        assert_eq!(invoice.payments[1].reference.as_deref(), Some("A-1"));
    }
}
