//! Upload inputs and stored file records.

use crate::constants::DEFAULT_MEDIA_TYPE;
use crate::{DataUri, FilesResult};
use chrono::{DateTime, Utc};
use clinic_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A file ready to be attached to a record, before it has been given an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    name: NonEmptyText,
    media_type: NonEmptyText,
    data: String,
}

impl FileUpload {
    /// Builds an upload from raw bytes.
    ///
    /// The media type is `declared_type` when given and non-blank; otherwise it is sniffed
    /// from the content, falling back to [`DEFAULT_MEDIA_TYPE`]. Detection is best-effort and
    /// should not be treated as authoritative.
    pub fn from_bytes(
        name: impl AsRef<str>,
        bytes: &[u8],
        declared_type: Option<&str>,
    ) -> FilesResult<Self> {
        let name = NonEmptyText::required("file name", name)?;
        let media_type = match declared_type.and_then(|t| NonEmptyText::new(t).ok()) {
            Some(declared) => declared,
            None => NonEmptyText::new(
                infer::get(bytes)
                    .map(|kind| kind.mime_type())
                    .unwrap_or(DEFAULT_MEDIA_TYPE),
            )?,
        };

        let data = DataUri::new(media_type.as_str(), bytes.to_vec()).to_string();

        Ok(Self {
            name,
            media_type,
            data,
        })
    }

    /// Reads a file from disk; the display name is the file's own name.
    pub fn from_path(source_path: &Path, declared_type: Option<&str>) -> FilesResult<Self> {
        let bytes = fs::read(source_path).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "failed to read source file {}: {}",
                    source_path.display(),
                    e
                ),
            )
        })?;

        let name = source_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unnamed");

        Self::from_bytes(name, &bytes, declared_type)
    }

    /// Accepts an already-encoded data URI, as produced by a browser file reader.
    pub fn from_data_uri(name: impl AsRef<str>, data_uri: &str) -> FilesResult<Self> {
        let name = NonEmptyText::required("file name", name)?;
        let decoded = DataUri::parse(data_uri)?;
        let media_type = NonEmptyText::new(decoded.media_type())?;

        Ok(Self {
            name,
            media_type,
            data: decoded.to_string(),
        })
    }

    pub fn name(&self) -> &NonEmptyText {
        &self.name
    }

    pub fn media_type(&self) -> &NonEmptyText {
        &self.media_type
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    /// Stamps the upload with its id and upload time.
    pub fn into_record<I>(self, id: I, uploaded_at: DateTime<Utc>) -> FileRecord<I> {
        FileRecord {
            id,
            name: self.name,
            media_type: self.media_type,
            data: self.data,
            uploaded_at,
        }
    }
}

/// A stored file: a patient document or a result attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord<I> {
    /// Unique within the owning record's file list.
    pub id: I,
    pub name: NonEmptyText,
    #[serde(rename = "type")]
    pub media_type: NonEmptyText,
    /// `data:<media type>;base64,<payload>`
    pub data: String,
    pub uploaded_at: DateTime<Utc>,
}

impl<I> FileRecord<I> {
    /// Decodes the stored payload back into bytes for download.
    pub fn decode(&self) -> FilesResult<Vec<u8>> {
        DataUri::parse(&self.data).map(DataUri::into_payload)
    }
}
