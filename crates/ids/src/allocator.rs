use crate::{IdError, IdResult};
use std::fmt;

/// The collections that own an identifier space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Collection {
    Patient,
    DiagnosticResult,
    Invoice,
    Payment,
    Document,
    Attachment,
}

impl Collection {
    /// Ids at or below the floor are reserved for the shipped baseline dataset.
    pub const fn floor(self) -> u64 {
        match self {
            Collection::Patient => 1000,
            Collection::Invoice => 5000,
            Collection::DiagnosticResult
            | Collection::Payment
            | Collection::Document
            | Collection::Attachment => 0,
        }
    }

    /// Returns `max(existing, floor) + 1`.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::Exhausted`] if the largest existing id is `u64::MAX`.
    pub fn next_id(self, existing: impl IntoIterator<Item = u64>) -> IdResult<u64> {
        let highest = existing.into_iter().fold(self.floor(), u64::max);
        highest.checked_add(1).ok_or(IdError::Exhausted(self))
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Collection::Patient => "patient",
            Collection::DiagnosticResult => "diagnostic result",
            Collection::Invoice => "invoice",
            Collection::Payment => "payment",
            Collection::Document => "document",
            Collection::Attachment => "attachment",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed identifier belonging to exactly one [`Collection`].
pub trait RecordId: Copy + Ord + From<u64> + Into<u64> {
    const COLLECTION: Collection;
}

/// Allocates the next id of type `I` given the ids currently held by its collection.
pub fn next_id<I: RecordId>(existing: impl IntoIterator<Item = I>) -> IdResult<I> {
    I::COLLECTION
        .next_id(existing.into_iter().map(Into::into))
        .map(I::from)
}
