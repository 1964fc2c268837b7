//! Clinic file payloads
//!
//! Patient documents and diagnostic-result attachments are stored inline in the record
//! snapshots, so the whole record graph stays a single JSON document. Binary content is carried
//! as a self-describing data URI:
//!
//! ```text
//! data:<media type>;base64,<payload>
//! ```
//!
//! alongside a display name and an upload timestamp ([`FileRecord`]).
//!
//! ## Example Usage
//!
//! ```
//! use clinic_files::FileUpload;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let upload = FileUpload::from_bytes("cbc.txt", b"WBC 6.1", Some("text/plain"))?;
//! assert_eq!(upload.media_type().as_str(), "text/plain");
//! assert!(upload.data().starts_with("data:text/plain;base64,"));
//! # Ok(())
//! # }
//! ```

mod constants;
mod data_uri;
mod record;

pub use constants::DEFAULT_MEDIA_TYPE;
pub use data_uri::DataUri;
pub use record::{FileRecord, FileUpload};

/// Errors that can occur while building or decoding file payloads
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// The string is not a `data:<type>;base64,<payload>` URI
    #[error("invalid data URI: {0}")]
    InvalidDataUri(String),

    /// The payload base64 does not decode
    #[error("invalid base64 payload: {0}")]
    InvalidPayload(#[from] base64::DecodeError),

    /// A file name or media type was blank
    #[error("invalid file metadata: {0}")]
    Text(#[from] clinic_types::TextError),

    /// I/O error occurred while reading a source file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Results that can fail with a [`FilesError`].
pub type FilesResult<T> = Result<T, FilesError>;
