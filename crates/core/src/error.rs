use clinic_ids::{Collection, IdError, PatientId};
use clinic_types::TextError;

#[derive(Debug, thiserror::Error)]
pub enum RecordsError {
    /// A required field is missing or blank, or a value is out of range.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The operation targets an id that is not in its collection.
    #[error("{collection} {id} not found")]
    NotFound { collection: Collection, id: u64 },

    /// A foreign key does not resolve to a live patient.
    #[error("patient {patient_id} does not exist")]
    Integrity { patient_id: PatientId },

    #[error("invalid identifier: {0}")]
    Id(#[from] IdError),
    #[error("invalid file: {0}")]
    Files(#[from] clinic_files::FilesError),

    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to access snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialise snapshot: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RecordsError {
    pub(crate) fn not_found(collection: Collection, id: impl Into<u64>) -> Self {
        RecordsError::NotFound {
            collection,
            id: id.into(),
        }
    }
}

/// A blank required field is a validation failure like any other.
impl From<TextError> for RecordsError {
    fn from(err: TextError) -> Self {
        RecordsError::Validation(err.to_string())
    }
}

pub type RecordsResult<T> = std::result::Result<T, RecordsError>;
