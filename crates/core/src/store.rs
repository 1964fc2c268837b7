//! The in-memory entity store.
//!
//! Three collections (patients, diagnostic results, invoices) are held as ordered maps keyed by
//! their typed id. The store owns every mutation and keeps two invariants:
//!
//! - a result or invoice can only be created for a patient that exists at that moment;
//! - deleting a patient removes every result and invoice that refers to it, in the same call.
//!
//! Every operation validates its input and resolves its references before touching a
//! collection, so an error always leaves the store exactly as it was.
//!
//! The store is not synchronised. [`ClinicService`](crate::ClinicService) wraps it in a lock
//! for callers that share it between threads.

use crate::billing::{Invoice, LineItem, NewPayment, Payment};
use crate::config::OverpaymentPolicy;
use crate::constants::DEFAULT_PAYMENT_METHOD;
use crate::diagnostics::{Attachment, DiagnosticResult, NewDiagnosticResult, ResultStatus, ResultUpdate};
use crate::patient::{Document, NewPatient, Patient, PatientUpdate};
use crate::settlement::check_payment;
use crate::validation::require_non_negative;
use crate::{RecordsError, RecordsResult};
use chrono::Utc;
use clinic_files::{FileRecord, FileUpload};
use clinic_ids::{next_id, next_timestamp_id, Collection, InvoiceId, PatientId, RecordId, ResultId};
use clinic_types::NonEmptyText;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// What a patient deletion removed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CascadeSummary {
    pub patient_removed: bool,
    pub results_removed: usize,
    pub invoices_removed: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityStore {
    patients: BTreeMap<PatientId, Patient>,
    results: BTreeMap<ResultId, DiagnosticResult>,
    invoices: BTreeMap<InvoiceId, Invoice>,
    overpayment: OverpaymentPolicy,
}

impl EntityStore {
    /// An empty store.
    pub fn new(overpayment: OverpaymentPolicy) -> Self {
        Self {
            overpayment,
            ..Self::default()
        }
    }

    /// Builds a store from loaded snapshots.
    ///
    /// Snapshots are trusted as written: a later record with a duplicate id replaces the earlier
    /// one, and records whose patient is missing are kept (with a warning) rather than dropped.
    pub fn from_snapshots(
        patients: Vec<Patient>,
        results: Vec<DiagnosticResult>,
        invoices: Vec<Invoice>,
        overpayment: OverpaymentPolicy,
    ) -> Self {
        let mut store = Self::new(overpayment);

        for patient in patients {
            if let Some(previous) = store.patients.insert(patient.id, patient) {
                tracing::warn!(patient_id = %previous.id, "duplicate patient id in snapshot");
            }
        }
        for result in results {
            if let Some(previous) = store.results.insert(result.id, result) {
                tracing::warn!(result_id = %previous.id, "duplicate result id in snapshot");
            }
        }
        for invoice in invoices {
            if let Some(previous) = store.invoices.insert(invoice.id, invoice) {
                tracing::warn!(invoice_id = %previous.id, "duplicate invoice id in snapshot");
            }
        }

        let orphans = store
            .results
            .values()
            .map(|r| r.patient_id)
            .chain(store.invoices.values().map(|i| i.patient_id))
            .filter(|patient_id| !store.patients.contains_key(patient_id))
            .count();
        if orphans > 0 {
            tracing::warn!(orphans, "snapshot holds records for patients that do not exist");
        }

        store
    }

    pub fn overpayment_policy(&self) -> OverpaymentPolicy {
        self.overpayment
    }

    // Lookups

    pub fn patient(&self, id: PatientId) -> Option<&Patient> {
        self.patients.get(&id)
    }

    /// All patients in id order.
    pub fn patients(&self) -> impl Iterator<Item = &Patient> + '_ {
        self.patients.values()
    }

    pub fn patient_count(&self) -> usize {
        self.patients.len()
    }

    /// Patients whose name, id, contact or address contains `term`; a blank term matches all.
    pub fn search_patients(&self, term: &str) -> Vec<&Patient> {
        self.patients.values().filter(|p| p.matches(term)).collect()
    }

    pub fn diagnostic_result(&self, id: ResultId) -> Option<&DiagnosticResult> {
        self.results.get(&id)
    }

    pub fn diagnostic_results(&self) -> impl Iterator<Item = &DiagnosticResult> + '_ {
        self.results.values()
    }

    pub fn results_for_patient(&self, patient_id: PatientId) -> Vec<&DiagnosticResult> {
        self.results
            .values()
            .filter(|r| r.patient_id == patient_id)
            .collect()
    }

    pub fn invoice(&self, id: InvoiceId) -> Option<&Invoice> {
        self.invoices.get(&id)
    }

    pub fn invoices(&self) -> impl Iterator<Item = &Invoice> + '_ {
        self.invoices.values()
    }

    pub fn invoices_for_patient(&self, patient_id: PatientId) -> Vec<&Invoice> {
        self.invoices
            .values()
            .filter(|i| i.patient_id == patient_id)
            .collect()
    }

    fn require_patient(&self, patient_id: PatientId) -> RecordsResult<()> {
        if self.patients.contains_key(&patient_id) {
            Ok(())
        } else {
            Err(RecordsError::Integrity { patient_id })
        }
    }

    // Patients

    /// Creates a patient with a freshly allocated id.
    ///
    /// # Errors
    ///
    /// Fails if name, date of birth or contact is blank, or if the date of birth is not a
    /// `YYYY-MM-DD` date.
    pub fn create_patient(&mut self, new: NewPatient) -> RecordsResult<&Patient> {
        let fields = new.validate()?;
        let id: PatientId = next_id(self.patients.keys().copied())?;

        let mut documents: Vec<Document> = Vec::with_capacity(new.documents.len());
        for upload in new.documents {
            append_file(&mut documents, upload)?;
        }

        let patient = Patient {
            id,
            name: fields.name,
            dob: fields.dob,
            contact: fields.contact,
            address: fields.address,
            history: fields.history,
            documents,
        };

        tracing::info!(patient_id = %id, "patient created");
        Ok(&*self.patients.entry(id).or_insert(patient))
    }

    /// Replaces the provided fields of an existing patient.
    pub fn update_patient(&mut self, id: PatientId, update: &PatientUpdate) -> RecordsResult<&Patient> {
        let slot = self
            .patients
            .get_mut(&id)
            .ok_or_else(|| RecordsError::not_found(Collection::Patient, id))?;

        *slot = update.apply_to(slot)?;

        tracing::info!(patient_id = %id, "patient updated");
        Ok(&*slot)
    }

    /// Removes a patient and every result and invoice that refers to it.
    ///
    /// Deleting a patient that does not exist is a no-op and reports nothing removed.
    pub fn delete_patient(&mut self, id: PatientId) -> CascadeSummary {
        if self.patients.remove(&id).is_none() {
            tracing::debug!(patient_id = %id, "delete of unknown patient ignored");
            return CascadeSummary::default();
        }

        let results_before = self.results.len();
        self.results.retain(|_, r| r.patient_id != id);
        let invoices_before = self.invoices.len();
        self.invoices.retain(|_, i| i.patient_id != id);

        let summary = CascadeSummary {
            patient_removed: true,
            results_removed: results_before - self.results.len(),
            invoices_removed: invoices_before - self.invoices.len(),
        };

        tracing::info!(
            patient_id = %id,
            results_removed = summary.results_removed,
            invoices_removed = summary.invoices_removed,
            "patient deleted"
        );
        summary
    }

    /// Appends a document to a patient's file list.
    pub fn upload_document(&mut self, patient_id: PatientId, upload: FileUpload) -> RecordsResult<&Document> {
        let patient = self
            .patients
            .get_mut(&patient_id)
            .ok_or_else(|| RecordsError::not_found(Collection::Patient, patient_id))?;

        let document = append_file(&mut patient.documents, upload)?;
        tracing::info!(patient_id = %patient_id, document_id = %document.id, "document uploaded");
        Ok(document)
    }

    // Diagnostic results

    /// Records a diagnostic result for an existing patient.
    ///
    /// # Errors
    ///
    /// [`RecordsError::Integrity`] if the patient does not exist; a validation error if the
    /// test name is blank.
    pub fn create_diagnostic_result(&mut self, new: NewDiagnosticResult) -> RecordsResult<&DiagnosticResult> {
        self.require_patient(new.patient_id)?;
        let test_name = NonEmptyText::required("test name", &new.test_name)?;
        let id: ResultId = next_id(self.results.keys().copied())?;

        let mut attachments: Vec<Attachment> = Vec::with_capacity(new.attachments.len());
        for upload in new.attachments {
            append_file(&mut attachments, upload)?;
        }

        let result = DiagnosticResult {
            id,
            patient_id: new.patient_id,
            date: new.date.unwrap_or_else(|| Utc::now().date_naive()),
            test_name,
            value: clinic_types::optional_text(new.value.as_deref()),
            status: new.status.unwrap_or(ResultStatus::Pending),
            attachments,
        };

        tracing::info!(result_id = %id, patient_id = %result.patient_id, "diagnostic result created");
        Ok(&*self.results.entry(id).or_insert(result))
    }

    pub fn update_diagnostic_result(&mut self, id: ResultId, update: &ResultUpdate) -> RecordsResult<&DiagnosticResult> {
        let slot = self
            .results
            .get_mut(&id)
            .ok_or_else(|| RecordsError::not_found(Collection::DiagnosticResult, id))?;

        *slot = update.apply_to(slot)?;

        tracing::info!(result_id = %id, "diagnostic result updated");
        Ok(&*slot)
    }

    /// Removes a diagnostic result, returning it.
    pub fn delete_diagnostic_result(&mut self, id: ResultId) -> RecordsResult<DiagnosticResult> {
        let removed = self
            .results
            .remove(&id)
            .ok_or_else(|| RecordsError::not_found(Collection::DiagnosticResult, id))?;

        tracing::info!(result_id = %id, "diagnostic result deleted");
        Ok(removed)
    }

    /// Appends an attachment; attachment ids are sequential within the result, starting at 1.
    pub fn attach_file_to_result(&mut self, result_id: ResultId, upload: FileUpload) -> RecordsResult<&Attachment> {
        let result = self
            .results
            .get_mut(&result_id)
            .ok_or_else(|| RecordsError::not_found(Collection::DiagnosticResult, result_id))?;

        let attachment = append_file(&mut result.attachments, upload)?;
        tracing::info!(result_id = %result_id, attachment_id = %attachment.id, "file attached to result");
        Ok(attachment)
    }

    // Invoices

    /// Issues an invoice dated today with no payments.
    ///
    /// A zero-amount invoice is settled from the start.
    pub fn create_invoice(&mut self, patient_id: PatientId, amount: Decimal) -> RecordsResult<&Invoice> {
        require_non_negative("invoice amount", amount)?;
        self.insert_invoice(patient_id, amount, Vec::new())
    }

    /// Issues an invoice whose amount is the sum of its line items.
    pub fn create_invoice_with_items(&mut self, patient_id: PatientId, items: Vec<LineItem>) -> RecordsResult<&Invoice> {
        for item in &items {
            require_non_negative("line item amount", item.amount)?;
        }
        let amount = items.iter().map(|i| i.amount).sum();
        self.insert_invoice(patient_id, amount, items)
    }

    fn insert_invoice(&mut self, patient_id: PatientId, amount: Decimal, items: Vec<LineItem>) -> RecordsResult<&Invoice> {
        self.require_patient(patient_id)?;
        let id: InvoiceId = next_id(self.invoices.keys().copied())?;

        let invoice = Invoice {
            id,
            patient_id,
            date: Utc::now().date_naive(),
            amount,
            items,
            payments: Vec::new(),
        };

        tracing::info!(
            invoice_id = %id,
            patient_id = %patient_id,
            %amount,
            status = %invoice.status(),
            "invoice created"
        );
        Ok(&*self.invoices.entry(id).or_insert(invoice))
    }

    /// Appends a payment to an invoice; the invoice status follows from the new payment list.
    ///
    /// # Errors
    ///
    /// [`RecordsError::NotFound`] if the invoice does not exist; a validation error if the
    /// amount is not positive, or if it overpays the invoice under
    /// [`OverpaymentPolicy::Reject`].
    pub fn record_payment(&mut self, invoice_id: InvoiceId, payment: NewPayment) -> RecordsResult<&Payment> {
        let method = NonEmptyText::required(
            "payment method",
            payment.method.as_deref().unwrap_or(DEFAULT_PAYMENT_METHOD),
        )?;
        let reference = payment
            .reference
            .map(|r| r.trim().to_owned())
            .filter(|r| !r.is_empty());

        let last_payment_id = self
            .invoices
            .values()
            .filter_map(Invoice::last_payment_id)
            .max();

        let invoice = self
            .invoices
            .get_mut(&invoice_id)
            .ok_or_else(|| RecordsError::not_found(Collection::Invoice, invoice_id))?;

        check_payment(invoice, payment.amount, self.overpayment)?;
        let id = next_timestamp_id(last_payment_id)?;

        let index = invoice.payments.len();
        invoice.payments.push(Payment {
            id,
            method,
            amount: payment.amount,
            reference,
            recorded_at: Utc::now(),
        });

        let settlement = invoice.settlement();
        tracing::info!(
            invoice_id = %invoice_id,
            payment_id = %id,
            amount = %payment.amount,
            paid_total = %settlement.paid_total,
            status = %settlement.status,
            "payment recorded"
        );
        Ok(&invoice.payments[index])
    }
}

/// Gives `upload` the next id in `files` and appends it, returning the stored record.
fn append_file<I: RecordId>(files: &mut Vec<FileRecord<I>>, upload: FileUpload) -> RecordsResult<&FileRecord<I>> {
    let id: I = next_id(files.iter().map(|f| f.id))?;
    let index = files.len();
    files.push(upload.into_record(id, Utc::now()));
    Ok(&files[index])
}
