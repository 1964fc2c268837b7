//! Validated primitive types shared by the clinic crates.
//!
//! Required text fields on patients, results and invoices (names, contacts, test names, line
//! item descriptions) are carried as [`NonEmptyText`] so a blank value can never reach a
//! stored record.

mod text;

pub use text::{optional_text, NonEmptyText};

/// Errors that can occur when creating validated text types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("text cannot be empty")]
    Empty,
    /// A named field was empty or contained only whitespace
    #[error("{0} is required")]
    MissingField(&'static str),
}
