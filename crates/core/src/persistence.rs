//! Snapshot persistence.
//!
//! Each collection is stored as one full JSON array under its own key. Writes replace the whole
//! snapshot, so a lost write drops the most recent mutation but can never leave a half-updated
//! collection behind.
//!
//! The adapter never fails the caller. A missing or unreadable snapshot falls back to a default
//! collection, and a failed write is logged and reported as `false`; the in-memory store stays
//! authoritative for the session either way.

use crate::baseline::{baseline_invoices, baseline_patients, baseline_results};
use crate::config::CoreConfig;
use crate::constants::{BILLING_KEY, PATIENTS_KEY, RESULTS_KEY, SNAPSHOT_EXTENSION};
use crate::store::EntityStore;
use crate::{RecordsError, RecordsResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// The three persisted collections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CollectionKey {
    Patients,
    Results,
    Billing,
}

impl CollectionKey {
    pub const ALL: [CollectionKey; 3] = [
        CollectionKey::Patients,
        CollectionKey::Results,
        CollectionKey::Billing,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            CollectionKey::Patients => PATIENTS_KEY,
            CollectionKey::Results => RESULTS_KEY,
            CollectionKey::Billing => BILLING_KEY,
        }
    }
}

/// A key-value transport for snapshots.
pub trait SnapshotStore: Send + Sync {
    /// Returns `Ok(None)` when nothing has been stored under `key`.
    fn read(&self, key: &str) -> io::Result<Option<String>>;

    fn write(&self, key: &str, contents: &str) -> io::Result<()>;
}

/// Stores each snapshot as `<key>.json` under a data directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    data_dir: PathBuf,
}

impl JsonFileStore {
    /// Opens (creating if needed) the data directory.
    ///
    /// # Errors
    ///
    /// Returns [`RecordsError::StorageDirCreation`] if the directory cannot be created.
    pub fn new(data_dir: impl Into<PathBuf>) -> RecordsResult<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).map_err(RecordsError::StorageDirCreation)?;
        Ok(Self { data_dir })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn snapshot_path(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{key}.{SNAPSHOT_EXTENSION}"))
    }
}

impl SnapshotStore for JsonFileStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.snapshot_path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&self, key: &str, contents: &str) -> io::Result<()> {
        let target = self.snapshot_path(key);
        let staging = self.data_dir.join(format!(".{key}.{SNAPSHOT_EXTENSION}.tmp"));

        // Rename is atomic on the same filesystem, so readers see the old or new snapshot.
        fs::write(&staging, contents)?;
        fs::rename(&staging, &target)
    }
}

/// Keeps snapshots in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, contents: impl Into<String>) {
        self.lock().insert(key.to_owned(), contents.into());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.lock().get(key).cloned())
    }

    fn write(&self, key: &str, contents: &str) -> io::Result<()> {
        self.lock().insert(key.to_owned(), contents.to_owned());
        Ok(())
    }
}

/// Loads and saves collections through a [`SnapshotStore`].
pub struct PersistenceAdapter {
    transport: Box<dyn SnapshotStore>,
}

impl PersistenceAdapter {
    pub fn new(transport: Box<dyn SnapshotStore>) -> Self {
        Self { transport }
    }

    /// Reads the snapshot under `key`, or returns `default` if it is absent or cannot be read.
    pub fn load_collection<T: DeserializeOwned>(&self, key: CollectionKey, default: Vec<T>) -> Vec<T> {
        let key = key.as_str();
        let raw = match self.transport.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::debug!(key, "no snapshot stored; using default");
                return default;
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read snapshot; using default");
                return default;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(key, error = %e, "snapshot is corrupt; using default");
                default
            }
        }
    }

    /// Writes a full snapshot of `records` under `key`. Failures are logged, not raised.
    pub fn save_collection<T: Serialize>(&self, key: CollectionKey, records: &[T]) -> bool {
        let key = key.as_str();
        let result = serde_json::to_string(records)
            .map_err(RecordsError::from)
            .and_then(|json| self.transport.write(key, &json).map_err(RecordsError::from));

        match result {
            Ok(()) => {
                tracing::debug!(key, records = records.len(), "snapshot written");
                true
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to write snapshot");
                false
            }
        }
    }

    /// Builds a store from the three snapshots.
    ///
    /// With `seed_baseline` set, any missing or corrupt collection falls back to the shipped
    /// baseline; otherwise it starts empty.
    pub fn load_store(&self, cfg: &CoreConfig) -> EntityStore {
        let seed = cfg.seed_baseline();
        let patients = self.load_collection(CollectionKey::Patients, fallback(seed, baseline_patients));
        let results = self.load_collection(CollectionKey::Results, fallback(seed, baseline_results));
        let invoices = self.load_collection(CollectionKey::Billing, fallback(seed, baseline_invoices));

        tracing::info!(
            patients = patients.len(),
            results = results.len(),
            invoices = invoices.len(),
            "records loaded"
        );
        EntityStore::from_snapshots(patients, results, invoices, cfg.overpayment())
    }

    /// Writes the named collections of `store`; returns `false` if any write failed.
    pub fn save_store(&self, store: &EntityStore, keys: &[CollectionKey]) -> bool {
        let mut all_saved = true;
        for key in keys {
            let saved = match key {
                CollectionKey::Patients => {
                    self.save_collection(*key, &store.patients().collect::<Vec<_>>())
                }
                CollectionKey::Results => {
                    self.save_collection(*key, &store.diagnostic_results().collect::<Vec<_>>())
                }
                CollectionKey::Billing => {
                    self.save_collection(*key, &store.invoices().collect::<Vec<_>>())
                }
            };
            all_saved &= saved;
        }
        all_saved
    }
}

impl std::fmt::Debug for PersistenceAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistenceAdapter").finish_non_exhaustive()
    }
}

fn fallback<T>(seed: bool, baseline: fn() -> Vec<T>) -> Vec<T> {
    if seed {
        baseline()
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OverpaymentPolicy;
    use crate::patient::NewPatient;
    use clinic_ids::PatientId;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn config(dir: &Path, seed_baseline: bool) -> CoreConfig {
        CoreConfig::new(dir.to_path_buf(), OverpaymentPolicy::Allow, seed_baseline)
            .expect("config should build")
    }

    fn new_patient(name: &str) -> NewPatient {
        NewPatient {
            name: name.into(),
            dob: "1999-12-31".into(),
            contact: "555-0100".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_json_file_store_creates_dir_and_round_trips() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let data_dir = temp_dir.path().join("nested").join("data");
        let store = JsonFileStore::new(&data_dir).expect("store should open");

        assert!(data_dir.is_dir());
        assert_eq!(store.read(PATIENTS_KEY).unwrap(), None);

        store.write(PATIENTS_KEY, "[]").unwrap();
        assert_eq!(store.read(PATIENTS_KEY).unwrap().as_deref(), Some("[]"));
        assert!(data_dir.join("clinic_patients_v1.json").is_file());

        store.write(PATIENTS_KEY, "[1]").unwrap();
        assert_eq!(store.read(PATIENTS_KEY).unwrap().as_deref(), Some("[1]"));
    }

    #[test]
    fn test_json_file_store_rejects_file_as_dir() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let blocker = temp_dir.path().join("not-a-dir");
        fs::write(&blocker, "x").unwrap();

        let err = JsonFileStore::new(blocker.join("data")).expect_err("should fail");
        assert!(matches!(err, RecordsError::StorageDirCreation(_)));
    }

    #[test]
    fn test_absent_snapshot_uses_default() {
        let adapter = PersistenceAdapter::new(Box::new(MemoryStore::new()));
        let loaded = adapter.load_collection(CollectionKey::Patients, baseline_patients());
        assert_eq!(loaded, baseline_patients());
    }

    #[test]
    fn test_corrupt_snapshot_uses_default() {
        let memory = MemoryStore::new();
        memory.insert(RESULTS_KEY, "{ not json");
        let adapter = PersistenceAdapter::new(Box::new(memory));

        let loaded = adapter.load_collection(CollectionKey::Results, baseline_results());
        assert_eq!(loaded.len(), 3);
    }

    #[test]
    fn test_snapshot_with_blank_required_field_uses_default() {
        let memory = MemoryStore::new();
        memory.insert(
            PATIENTS_KEY,
            r#"[{ "id": 1, "name": "  ", "dob": "2000-01-01", "contact": "1" }]"#,
        );
        let adapter = PersistenceAdapter::new(Box::new(memory));

        let loaded: Vec<crate::patient::Patient> =
            adapter.load_collection(CollectionKey::Patients, Vec::new());
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_load_store_seeds_baseline_or_empty() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let adapter = PersistenceAdapter::new(Box::new(JsonFileStore::new(temp_dir.path()).unwrap()));

        let seeded = adapter.load_store(&config(temp_dir.path(), true));
        assert_eq!(seeded.patient_count(), 3);
        assert_eq!(seeded.invoices().count(), 3);

        let empty = adapter.load_store(&config(temp_dir.path(), false));
        assert_eq!(empty.patient_count(), 0);
        assert_eq!(empty.diagnostic_results().count(), 0);
    }

    #[test]
    fn test_store_survives_reload_from_disk() {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let cfg = config(temp_dir.path(), true);

        let adapter = PersistenceAdapter::new(Box::new(JsonFileStore::new(temp_dir.path()).unwrap()));
        let mut store = adapter.load_store(&cfg);
        let id = store.create_patient(new_patient("Persisted")).unwrap().id;
        let invoice_id = store.create_invoice(id, "300".parse().unwrap()).unwrap().id;
        store
            .record_payment(invoice_id, crate::billing::NewPayment::new("120".parse().unwrap()))
            .unwrap();
        assert!(adapter.save_store(&store, &CollectionKey::ALL));

        let reopened = PersistenceAdapter::new(Box::new(JsonFileStore::new(temp_dir.path()).unwrap()));
        let reloaded = reopened.load_store(&cfg);

        assert_eq!(reloaded, store);
        assert_eq!(reloaded.patient(PatientId::new(1004)).unwrap().name.as_str(), "Persisted");
        assert_eq!(
            reloaded.invoice(invoice_id).unwrap().status(),
            crate::InvoiceStatus::Partial
        );
    }

    #[test]
    fn test_reload_keeps_every_decimal_digit() {
        let cfg = config(Path::new("unused"), false);
        let adapter = PersistenceAdapter::new(Box::new(MemoryStore::new()));
        let mut store = adapter.load_store(&cfg);
        let id = store.create_patient(new_patient("Precise")).unwrap().id;

        let amount: Decimal = "1234567890123.4567".parse().unwrap();
        let paid: Decimal = "1000000000000.3333".parse().unwrap();
        let invoice_id = store.create_invoice(id, amount).unwrap().id;
        store
            .record_payment(invoice_id, crate::billing::NewPayment::new(paid))
            .unwrap();
        assert!(adapter.save_store(&store, &CollectionKey::ALL));

        let reloaded = adapter.load_store(&cfg);
        let invoice = reloaded.invoice(invoice_id).unwrap();
        assert_eq!(invoice.amount, amount);
        assert_eq!(invoice.payments[0].amount, paid);
        assert_eq!(invoice.settlement().balance_due, amount - paid);
        assert_eq!(reloaded, store);
    }

    #[test]
    fn test_save_collection_reports_failure() {
        struct FailingStore;
        impl SnapshotStore for FailingStore {
            fn read(&self, _key: &str) -> io::Result<Option<String>> {
                Ok(None)
            }
            fn write(&self, _key: &str, _contents: &str) -> io::Result<()> {
                Err(io::Error::new(ErrorKind::PermissionDenied, "read-only"))
            }
        }

        let adapter = PersistenceAdapter::new(Box::new(FailingStore));
        assert!(!adapter.save_collection(CollectionKey::Patients, &baseline_patients()));
        assert!(!adapter.save_store(&EntityStore::default(), &CollectionKey::ALL));
    }
}
