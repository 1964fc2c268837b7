use crate::TextError;
use serde::{Deserialize, Serialize};

/// A trimmed string that always contains at least one non-whitespace character.
///
/// Serialises as a plain JSON string. Deserialising a blank string fails, so a corrupt snapshot
/// cannot smuggle an empty required field into memory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Trims `input` and wraps it, failing with [`TextError::Empty`] when nothing is left.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Like [`NonEmptyText::new`], but names the offending field in the error.
    pub fn required(field: &'static str, input: impl AsRef<str>) -> Result<Self, TextError> {
        Self::new(input).map_err(|_| TextError::MissingField(field))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// Case-insensitive substring match, used by record search.
    pub fn contains_ignore_case(&self, needle: &str) -> bool {
        self.0.to_lowercase().contains(&needle.to_lowercase())
    }
}

/// Trims an optional free-text input, mapping `None` to an empty string.
pub fn optional_text(input: Option<impl AsRef<str>>) -> String {
    input
        .map(|s| s.as_ref().trim().to_owned())
        .unwrap_or_default()
}

impl TryFrom<String> for NonEmptyText {
    type Error = TextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyText> for String {
    fn from(value: NonEmptyText) -> Self {
        value.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_whitespace() {
        let text = NonEmptyText::new("  Naruto  ").expect("should accept padded text");
        assert_eq!(text.as_str(), "Naruto");
    }

    #[test]
    fn test_new_rejects_blank() {
        assert_eq!(NonEmptyText::new("   "), Err(TextError::Empty));
        assert_eq!(NonEmptyText::new(""), Err(TextError::Empty));
    }

    #[test]
    fn test_required_names_field() {
        let err = NonEmptyText::required("contact", " \t").expect_err("blank should fail");
        assert_eq!(err, TextError::MissingField("contact"));
        assert_eq!(err.to_string(), "contact is required");
    }

    #[test]
    fn test_contains_ignore_case() {
        let text = NonEmptyText::new("Sampaloc, Manila").unwrap();
        assert!(text.contains_ignore_case("manila"));
        assert!(text.contains_ignore_case("SAMP"));
        assert!(!text.contains_ignore_case("Paco"));
    }

    #[test]
    fn test_optional_text_defaults_to_empty() {
        assert_eq!(optional_text(None::<&str>), "");
        assert_eq!(optional_text(Some("  Asthma ")), "Asthma");
    }

    #[test]
    fn test_serde_rejects_blank_string() {
        let ok: NonEmptyText = serde_json::from_str("\"CBC\"").expect("should deserialise");
        assert_eq!(ok.as_str(), "CBC");
        assert_eq!(serde_json::to_string(&ok).unwrap(), "\"CBC\"");

        let err = serde_json::from_str::<NonEmptyText>("\"  \"");
        assert!(err.is_err(), "blank strings must not deserialise");
    }
}
