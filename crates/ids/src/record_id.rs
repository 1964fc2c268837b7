//! Typed numeric identifiers.

use crate::allocator::{Collection, RecordId};
use crate::IdError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident => $collection:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(value: u64) -> Self {
                Self(value)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl RecordId for $name {
            const COLLECTION: Collection = $collection;
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for u64 {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse::<u64>().map(Self).map_err(|e| {
                    IdError::InvalidInput(format!(
                        "{} id must be a non-negative integer, got '{}': {}",
                        $collection, s, e
                    ))
                })
            }
        }
    };
}

record_id!(
    /// Identifies a patient. Allocated above 1000.
    PatientId => Collection::Patient
);
record_id!(
    /// Identifies a diagnostic result across the whole result collection.
    ResultId => Collection::DiagnosticResult
);
record_id!(
    /// Identifies an invoice. Allocated above 5000.
    InvoiceId => Collection::Invoice
);
record_id!(
    /// Identifies a payment; derived from the wall clock in unix milliseconds.
    PaymentId => Collection::Payment
);
record_id!(
    /// Identifies a document within its owning patient.
    DocumentId => Collection::Document
);
record_id!(
    /// Identifies an attachment within its owning diagnostic result.
    AttachmentId => Collection::Attachment
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_id() {
        let id: PatientId = "1004".parse().expect("should parse");
        assert_eq!(id, PatientId::new(1004));
        assert_eq!(id.to_string(), "1004");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let id: InvoiceId = " 5003 ".parse().expect("should parse");
        assert_eq!(id.get(), 5003);
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        let err = "abc".parse::<ResultId>().expect_err("should reject");
        match err {
            IdError::InvalidInput(msg) => assert!(msg.contains("diagnostic result id")),
            other => panic!("Expected InvalidInput error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_negative() {
        assert!("-1".parse::<PatientId>().is_err());
    }

    #[test]
    fn test_serialises_as_bare_number() {
        let json = serde_json::to_string(&PatientId::new(1001)).unwrap();
        assert_eq!(json, "1001");

        let id: InvoiceId = serde_json::from_str("5002").unwrap();
        assert_eq!(id.get(), 5002);
    }
}
