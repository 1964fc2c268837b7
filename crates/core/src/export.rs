//! Exports: the billing CSV and per-patient JSON profiles.

use crate::billing::Invoice;
use crate::constants::{DATE_FORMAT, INVOICE_CSV_HEADER};
use crate::diagnostics::DiagnosticResult;
use crate::patient::Patient;
use crate::store::EntityStore;
use crate::{RecordsError, RecordsResult};
use clinic_ids::{Collection, PatientId};
use serde::Serialize;
use std::borrow::Cow;

/// Renders every invoice as CSV, one row per invoice in id order, with the derived status.
///
/// Lines are separated by `\n`, with no trailing newline.
pub fn invoices_csv(store: &EntityStore) -> String {
    let mut lines = vec![INVOICE_CSV_HEADER.to_owned()];
    lines.extend(store.invoices().map(csv_row));
    lines.join("\n")
}

fn csv_row(invoice: &Invoice) -> String {
    let fields = [
        invoice.id.to_string(),
        invoice.patient_id.to_string(),
        invoice.date.format(DATE_FORMAT).to_string(),
        invoice.amount.normalize().to_string(),
        invoice.status().to_string(),
    ];
    fields
        .iter()
        .map(|f| csv_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

fn csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// One patient together with everything recorded against them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientProfile {
    pub patient: Patient,
    pub results: Vec<DiagnosticResult>,
    pub invoices: Vec<Invoice>,
}

pub fn patient_profile(store: &EntityStore, patient_id: PatientId) -> RecordsResult<PatientProfile> {
    let patient = store
        .patient(patient_id)
        .ok_or_else(|| RecordsError::not_found(Collection::Patient, patient_id))?;

    Ok(PatientProfile {
        patient: patient.clone(),
        results: store
            .results_for_patient(patient_id)
            .into_iter()
            .cloned()
            .collect(),
        invoices: store
            .invoices_for_patient(patient_id)
            .into_iter()
            .cloned()
            .collect(),
    })
}

/// The profile as pretty-printed JSON, in the same field names as the snapshots.
pub fn patient_profile_json(store: &EntityStore, patient_id: PatientId) -> RecordsResult<String> {
    let profile = patient_profile(store, patient_id)?;
    Ok(serde_json::to_string_pretty(&profile)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::baseline::{baseline_invoices, baseline_patients, baseline_results};
    use crate::billing::NewPayment;
    use crate::config::OverpaymentPolicy;
    use clinic_ids::InvoiceId;

    fn baseline_store() -> EntityStore {
        EntityStore::from_snapshots(
            baseline_patients(),
            baseline_results(),
            baseline_invoices(),
            OverpaymentPolicy::Allow,
        )
    }

    #[test]
    fn test_invoices_csv_on_baseline() {
        let mut store = baseline_store();
        store
            .record_payment(InvoiceId::new(5003), NewPayment::new("0.5".parse().unwrap()))
            .unwrap();

        let csv = invoices_csv(&store);
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(
            lines,
            vec![
                "InvoiceId,PatientId,Date,Amount,Status",
                "5001,1001,2025-10-10,500,Paid",
                "5002,1002,2025-10-11,350,Paid",
                "5003,1001,2025-10-12,1200,Partial",
            ]
        );
    }

    #[test]
    fn test_invoices_csv_empty_store_is_header_only() {
        assert_eq!(invoices_csv(&EntityStore::default()), INVOICE_CSV_HEADER);
    }

    #[test]
    fn test_csv_field_quoting() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_patient_profile_merges_records() {
        let store = baseline_store();
        let profile = patient_profile(&store, PatientId::new(1001)).expect("profile should build");

        assert_eq!(profile.patient.name.as_str(), "Naruto D. Monki");
        assert_eq!(profile.results.len(), 2);
        assert_eq!(profile.invoices.len(), 2);

        let json: serde_json::Value =
            serde_json::from_str(&patient_profile_json(&store, PatientId::new(1001)).unwrap())
                .unwrap();
        assert_eq!(json["patient"]["id"], 1001);
        assert_eq!(json["results"][0]["testName"], "CBC");
        assert_eq!(json["invoices"][1]["status"], "Unpaid");
    }

    #[test]
    fn test_patient_profile_unknown_patient() {
        let err = patient_profile(&baseline_store(), PatientId::new(1)).expect_err("should fail");
        assert!(matches!(err, RecordsError::NotFound { id: 1, .. }));
    }
}
