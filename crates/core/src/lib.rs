//! # Clinic Core
//!
//! Record keeping for a small clinic: patients, diagnostic results, invoices and payments.
//!
//! This crate contains the data model and every operation on it:
//! - [`EntityStore`]: the three collections and their mutations, with referential integrity
//!   enforced on create and cascade on patient delete
//! - [`settlement`]: invoice status derived from payments, never stored as truth
//! - [`aggregation`]: dashboard counters and revenue series
//! - [`persistence`]: full-collection JSON snapshots behind a [`SnapshotStore`] transport
//! - [`ClinicService`]: a lock around the store that persists after each write
//!
//! **No presentation concerns**: argument parsing and output formatting belong in the binary.

pub mod aggregation;
pub mod baseline;
pub mod billing;
pub mod config;
pub mod constants;
pub mod diagnostics;
mod error;
pub mod export;
pub mod patient;
pub mod persistence;
pub mod service;
pub mod settlement;
pub mod store;
mod validation;

pub use aggregation::{DashboardCounters, MonthlyFigures, ReportTotals, StatusBreakdown};
pub use billing::{Invoice, LineItem, NewPayment, Payment};
pub use config::{CoreConfig, OverpaymentPolicy};
pub use diagnostics::{
    Attachment, DiagnosticResult, NewDiagnosticResult, ResultStatus, ResultUpdate,
};
pub use error::{RecordsError, RecordsResult};
pub use export::PatientProfile;
pub use patient::{Document, NewPatient, Patient, PatientUpdate};
pub use persistence::{CollectionKey, JsonFileStore, MemoryStore, PersistenceAdapter, SnapshotStore};
pub use service::ClinicService;
pub use settlement::{InvoiceStatus, Settlement};
pub use store::{CascadeSummary, EntityStore};
pub use validation::parse_date;

// Leaf crates, re-exported so callers need only depend on this one.
pub use clinic_files::{DataUri, FileRecord, FileUpload};
pub use clinic_ids::{
    AttachmentId, Collection, DocumentId, InvoiceId, PatientId, PaymentId, ResultId,
};
pub use clinic_types::NonEmptyText;
