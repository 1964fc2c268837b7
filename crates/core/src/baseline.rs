//! The dataset the application ships with.
//!
//! Used as the fallback snapshot when nothing has been stored yet. It is kept in the legacy wire
//! shape (no result statuses, invoice statuses without payments) so that loading it goes through
//! the same migration as an old snapshot would.

use crate::billing::Invoice;
use crate::diagnostics::DiagnosticResult;
use crate::patient::Patient;

const PATIENTS_JSON: &str = r#"[
  { "id": 1001, "name": "Naruto D. Monki", "dob": "1985-04-12", "contact": "09171234567",
    "address": "Ermita, Manila", "history": "Hypertension, Allergic to penicillin" },
  { "id": 1002, "name": "Ronian", "dob": "1992-08-25", "contact": "09287654321",
    "address": "Sampaloc, Manila", "history": "Asthma" },
  { "id": 1003, "name": "Pares overload", "dob": "1970-01-30", "contact": "09998887777",
    "address": "Paco, Manila", "history": "None" }
]"#;

const RESULTS_JSON: &str = r#"[
  { "resultId": 1, "patientId": 1001, "date": "2025-10-10", "testName": "CBC", "result": "Normal" },
  { "resultId": 2, "patientId": 1001, "date": "2025-10-12", "testName": "X-Ray", "result": "Pending" },
  { "resultId": 3, "patientId": 1002, "date": "2025-10-11", "testName": "Urinalysis", "result": "Normal" }
]"#;

const BILLING_JSON: &str = r#"[
  { "invoiceId": 5001, "patientId": 1001, "date": "2025-10-10", "amount": 500.00, "status": "Paid" },
  { "invoiceId": 5002, "patientId": 1002, "date": "2025-10-11", "amount": 350.00, "status": "Paid" },
  { "invoiceId": 5003, "patientId": 1001, "date": "2025-10-12", "amount": 1200.00, "status": "Unpaid" }
]"#;

pub fn baseline_patients() -> Vec<Patient> {
    serde_json::from_str(PATIENTS_JSON).expect("baseline patients are valid")
}

pub fn baseline_results() -> Vec<DiagnosticResult> {
    serde_json::from_str(RESULTS_JSON).expect("baseline results are valid")
}

pub fn baseline_invoices() -> Vec<Invoice> {
    serde_json::from_str(BILLING_JSON).expect("baseline invoices are valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InvoiceStatus, ResultStatus};
    use clinic_ids::PatientId;

    #[test]
    fn test_baseline_parses() {
        assert_eq!(baseline_patients().len(), 3);
        assert_eq!(baseline_results().len(), 3);
        assert_eq!(baseline_invoices().len(), 3);
    }

    #[test]
    fn test_baseline_references_resolve() {
        let patients = baseline_patients();
        let known = |id: PatientId| patients.iter().any(|p| p.id == id);

        assert!(baseline_results().iter().all(|r| known(r.patient_id)));
        assert!(baseline_invoices().iter().all(|i| known(i.patient_id)));
    }

    #[test]
    fn test_baseline_statuses() {
        let results = baseline_results();
        let pending = results
            .iter()
            .filter(|r| r.status == ResultStatus::Pending)
            .count();
        assert_eq!(pending, 1);

        let statuses: Vec<_> = baseline_invoices().iter().map(Invoice::status).collect();
        assert_eq!(
            statuses,
            vec![InvoiceStatus::Paid, InvoiceStatus::Paid, InvoiceStatus::Unpaid]
        );
    }
}
