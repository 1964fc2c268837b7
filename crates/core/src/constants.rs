//! Constants used throughout the clinic core crate.

/// Snapshot key for the patient collection.
pub const PATIENTS_KEY: &str = "clinic_patients_v1";

/// Snapshot key for the diagnostic result collection.
pub const RESULTS_KEY: &str = "clinic_results_v1";

/// Snapshot key for the invoice collection.
pub const BILLING_KEY: &str = "clinic_billing_v1";

/// Extension given to snapshot files by the JSON file store.
pub const SNAPSHOT_EXTENSION: &str = "json";

/// Default directory for snapshot storage when none is configured.
pub const DEFAULT_DATA_DIR: &str = "clinic_data";

/// Payment method recorded when the caller does not name one.
pub const DEFAULT_PAYMENT_METHOD: &str = "Cash";

/// Payment method given to settlements synthesised for legacy paid invoices.
pub const LEGACY_PAYMENT_METHOD: &str = "Legacy";

/// Calendar date format used on the wire and in exports.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Header row of the invoice CSV export.
pub const INVOICE_CSV_HEADER: &str = "InvoiceId,PatientId,Date,Amount,Status";
