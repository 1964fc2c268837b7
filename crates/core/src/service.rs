//! Shared, persisted access to the entity store.
//!
//! [`ClinicService`] is the entry point for callers. It serialises writers behind one lock over
//! the whole store, so id allocation and foreign-key checks never race, and writes the touched
//! collections to the snapshot transport after each successful mutation, while still holding
//! the lock. Readers share the lock and may run concurrently with each other.

use crate::aggregation::{self, DashboardCounters, MonthlyFigures, ReportTotals, StatusBreakdown};
use crate::billing::{Invoice, LineItem, NewPayment, Payment};
use crate::config::CoreConfig;
use crate::diagnostics::{Attachment, DiagnosticResult, NewDiagnosticResult, ResultUpdate};
use crate::export::{self, PatientProfile};
use crate::patient::{Document, NewPatient, Patient, PatientUpdate};
use crate::persistence::{CollectionKey, JsonFileStore, PersistenceAdapter, SnapshotStore};
use crate::store::{CascadeSummary, EntityStore};
use crate::{RecordsError, RecordsResult};
use chrono::NaiveDate;
use clinic_files::FileUpload;
use clinic_ids::{Collection, InvoiceId, PatientId, ResultId};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

const PATIENTS: &[CollectionKey] = &[CollectionKey::Patients];
const RESULTS: &[CollectionKey] = &[CollectionKey::Results];
const BILLING: &[CollectionKey] = &[CollectionKey::Billing];

#[derive(Clone, Debug)]
pub struct ClinicService {
    cfg: Arc<CoreConfig>,
    store: Arc<RwLock<EntityStore>>,
    persistence: Arc<PersistenceAdapter>,
}

impl ClinicService {
    /// Opens the JSON snapshots under the configured data directory and loads them.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError::StorageDirCreation`] if the data directory cannot be created.
    pub fn open(cfg: Arc<CoreConfig>) -> RecordsResult<Self> {
        let transport = JsonFileStore::new(cfg.data_dir())?;
        Ok(Self::with_transport(cfg, Box::new(transport)))
    }

    /// Loads the store through an arbitrary snapshot transport.
    pub fn with_transport(cfg: Arc<CoreConfig>, transport: Box<dyn SnapshotStore>) -> Self {
        let persistence = PersistenceAdapter::new(transport);
        let store = persistence.load_store(&cfg);

        Self {
            cfg,
            store: Arc::new(RwLock::new(store)),
            persistence: Arc::new(persistence),
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    /// Runs `f` against the store under the shared lock.
    pub fn read<R>(&self, f: impl FnOnce(&EntityStore) -> R) -> R {
        let guard = self.store.read().unwrap_or_else(PoisonError::into_inner);
        f(&*guard)
    }

    /// Runs `f` under the exclusive lock, then persists `keys` if it succeeded.
    fn write<R>(
        &self,
        keys: &[CollectionKey],
        f: impl FnOnce(&mut EntityStore) -> RecordsResult<R>,
    ) -> RecordsResult<R> {
        let mut guard = self.store.write().unwrap_or_else(PoisonError::into_inner);
        let value = f(&mut *guard)?;
        self.persistence.save_store(&guard, keys);
        Ok(value)
    }

    /// Writes every collection, e.g. to seed a fresh data directory with the baseline.
    pub fn save_all(&self) -> bool {
        self.read(|store| self.persistence.save_store(store, &CollectionKey::ALL))
    }

    // Patients

    pub fn create_patient(&self, new: NewPatient) -> RecordsResult<Patient> {
        self.write(PATIENTS, |store| store.create_patient(new).cloned())
    }

    pub fn update_patient(&self, id: PatientId, update: &PatientUpdate) -> RecordsResult<Patient> {
        self.write(PATIENTS, |store| store.update_patient(id, update).cloned())
    }

    /// Deletes a patient and everything recorded against them.
    pub fn delete_patient(&self, id: PatientId) -> CascadeSummary {
        let mut guard = self.store.write().unwrap_or_else(PoisonError::into_inner);
        let summary = guard.delete_patient(id);
        if summary.patient_removed {
            self.persistence.save_store(&guard, &CollectionKey::ALL);
        }
        summary
    }

    pub fn upload_document(&self, patient_id: PatientId, upload: FileUpload) -> RecordsResult<Document> {
        self.write(PATIENTS, |store| store.upload_document(patient_id, upload).cloned())
    }

    pub fn patient(&self, id: PatientId) -> RecordsResult<Patient> {
        self.read(|store| {
            store
                .patient(id)
                .cloned()
                .ok_or_else(|| RecordsError::not_found(Collection::Patient, id))
        })
    }

    pub fn patients(&self) -> Vec<Patient> {
        self.read(|store| store.patients().cloned().collect())
    }

    pub fn search_patients(&self, term: &str) -> Vec<Patient> {
        self.read(|store| store.search_patients(term).into_iter().cloned().collect())
    }

    // Diagnostic results

    pub fn create_diagnostic_result(&self, new: NewDiagnosticResult) -> RecordsResult<DiagnosticResult> {
        self.write(RESULTS, |store| store.create_diagnostic_result(new).cloned())
    }

    pub fn update_diagnostic_result(&self, id: ResultId, update: &ResultUpdate) -> RecordsResult<DiagnosticResult> {
        self.write(RESULTS, |store| store.update_diagnostic_result(id, update).cloned())
    }

    pub fn delete_diagnostic_result(&self, id: ResultId) -> RecordsResult<DiagnosticResult> {
        self.write(RESULTS, |store| store.delete_diagnostic_result(id))
    }

    pub fn attach_file_to_result(&self, result_id: ResultId, upload: FileUpload) -> RecordsResult<Attachment> {
        self.write(RESULTS, |store| store.attach_file_to_result(result_id, upload).cloned())
    }

    pub fn diagnostic_results(&self) -> Vec<DiagnosticResult> {
        self.read(|store| store.diagnostic_results().cloned().collect())
    }

    pub fn results_for_patient(&self, patient_id: PatientId) -> Vec<DiagnosticResult> {
        self.read(|store| store.results_for_patient(patient_id).into_iter().cloned().collect())
    }

    // Invoices

    pub fn create_invoice(&self, patient_id: PatientId, amount: Decimal) -> RecordsResult<Invoice> {
        self.write(BILLING, |store| store.create_invoice(patient_id, amount).cloned())
    }

    pub fn create_invoice_with_items(&self, patient_id: PatientId, items: Vec<LineItem>) -> RecordsResult<Invoice> {
        self.write(BILLING, |store| store.create_invoice_with_items(patient_id, items).cloned())
    }

    pub fn record_payment(&self, invoice_id: InvoiceId, payment: NewPayment) -> RecordsResult<Payment> {
        self.write(BILLING, |store| store.record_payment(invoice_id, payment).cloned())
    }

    pub fn invoice(&self, id: InvoiceId) -> RecordsResult<Invoice> {
        self.read(|store| {
            store
                .invoice(id)
                .cloned()
                .ok_or_else(|| RecordsError::not_found(Collection::Invoice, id))
        })
    }

    pub fn invoices(&self) -> Vec<Invoice> {
        self.read(|store| store.invoices().cloned().collect())
    }

    pub fn invoices_for_patient(&self, patient_id: PatientId) -> Vec<Invoice> {
        self.read(|store| store.invoices_for_patient(patient_id).into_iter().cloned().collect())
    }

    // Aggregation and exports

    pub fn dashboard_counters(&self) -> DashboardCounters {
        self.read(aggregation::dashboard_counters)
    }

    pub fn daily_revenue_series(&self) -> BTreeMap<NaiveDate, Decimal> {
        self.read(aggregation::daily_revenue_series)
    }

    pub fn monthly_financial_series(&self) -> BTreeMap<String, MonthlyFigures> {
        self.read(aggregation::monthly_financial_series)
    }

    pub fn status_breakdown(&self) -> StatusBreakdown {
        self.read(aggregation::status_breakdown)
    }

    pub fn report_totals(&self) -> ReportTotals {
        self.read(aggregation::report_totals)
    }

    pub fn invoices_csv(&self) -> String {
        self.read(export::invoices_csv)
    }

    pub fn patient_profile(&self, patient_id: PatientId) -> RecordsResult<PatientProfile> {
        self.read(|store| export::patient_profile(store, patient_id))
    }

    pub fn patient_profile_json(&self, patient_id: PatientId) -> RecordsResult<String> {
        self.read(|store| export::patient_profile_json(store, patient_id))
    }
}
