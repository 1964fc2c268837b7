//! Record identifiers and identifier allocation.
//!
//! Every record in the clinic store is keyed by a small positive integer. Each collection gets
//! its own newtype ([`PatientId`], [`ResultId`], [`InvoiceId`], [`PaymentId`], [`DocumentId`],
//! [`AttachmentId`]) so an invoice id can never be passed where a patient id is expected.
//!
//! ## Allocation
//!
//! New ids are `max(existing ids, floor) + 1`, recomputed from the live collection on every call.
//! There is no persisted counter: deleting the current maximum and re-allocating cannot collide
//! with anything still stored, and out-of-band edits to a snapshot are picked up automatically.
//!
//! Floors keep generated ids clear of the baseline dataset the application ships with:
//!
//! | Collection        | Floor | First generated id |
//! |-------------------|-------|--------------------|
//! | Patient           | 1000  | 1001               |
//! | Invoice           | 5000  | 5001               |
//! | Diagnostic result | 0     | 1                  |
//! | Payment           | 0     | timestamp-derived  |
//! | Document          | 0     | 1 (per patient)    |
//! | Attachment        | 0     | 1 (per result)     |
//!
//! Payment ids are derived from the wall clock (unix milliseconds) and bumped past the previous
//! id when the clock has not advanced; see [`next_timestamp_id`].
//!
//! Allocation is not synchronised. Callers that can race must hold exclusive access to the
//! collection while allocating and inserting.

mod allocator;
mod record_id;
mod timestamp;

pub use allocator::{next_id, Collection, RecordId};
pub use record_id::{AttachmentId, DocumentId, InvoiceId, PatientId, PaymentId, ResultId};
pub use timestamp::{next_timestamp_id, next_timestamp_id_at};

/// Error type for identifier operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    /// Invalid input provided
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The id space of a collection is used up
    #[error("no identifiers left for {0}")]
    Exhausted(Collection),
}

/// Result type for identifier operations.
pub type IdResult<T> = Result<T, IdError>;
