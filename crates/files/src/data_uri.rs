//! `data:` URI encoding for inline binary payloads.

use crate::constants::{BASE64_MARKER, DATA_URI_SCHEME, DEFAULT_MEDIA_TYPE};
use crate::{FilesError, FilesResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::{fmt, str::FromStr};

/// A decoded `data:<media type>;base64,<payload>` URI.
///
/// Only base64 payloads are accepted; percent-encoded text URIs are rejected. Media type
/// parameters (for example `;charset=utf-8`) are dropped on parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    media_type: String,
    payload: Vec<u8>,
}

impl DataUri {
    pub fn new(media_type: impl Into<String>, payload: Vec<u8>) -> Self {
        let media_type = media_type.into();
        let media_type = if media_type.trim().is_empty() {
            DEFAULT_MEDIA_TYPE.to_owned()
        } else {
            media_type.trim().to_owned()
        };
        Self {
            media_type,
            payload,
        }
    }

    /// Parses and decodes a data URI.
    ///
    /// # Errors
    ///
    /// Returns [`FilesError::InvalidDataUri`] if the scheme, separator or base64 marker is
    /// missing, and [`FilesError::InvalidPayload`] if the payload is not valid base64.
    pub fn parse(input: &str) -> FilesResult<Self> {
        let rest = input
            .trim()
            .strip_prefix(DATA_URI_SCHEME)
            .ok_or_else(|| FilesError::InvalidDataUri("missing 'data:' scheme".into()))?;

        let (header, encoded) = rest.split_once(',').ok_or_else(|| {
            FilesError::InvalidDataUri("missing ',' between header and payload".into())
        })?;

        let media = header.strip_suffix(BASE64_MARKER).ok_or_else(|| {
            FilesError::InvalidDataUri("only base64-encoded payloads are supported".into())
        })?;

        let media_type = media.split(';').next().unwrap_or_default();
        let payload = STANDARD.decode(encoded)?;

        Ok(Self::new(media_type, payload))
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{DATA_URI_SCHEME}{}{BASE64_MARKER},{}",
            self.media_type,
            STANDARD.encode(&self.payload)
        )
    }
}

impl FromStr for DataUri {
    type Err = FilesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataUri::parse(s)
    }
}
