//! Error types for value parsing and settings loading.

use thiserror::Error;

/// A dimension or unit string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised dimension: {input:?} (expected `<number>px`, `<number>%` or a bare number)")]
pub struct ParseUnitsError {
    input: String,
}

impl ParseUnitsError {
    #[must_use]
    pub fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }

    /// The rejected input.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }
}

/// Failure while loading [`DialogSettings`](crate::DialogSettings).
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "policy-config")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[cfg(feature = "policy-config")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

impl SettingsError {
    /// Individual validation messages, if this is a validation failure.
    #[must_use]
    pub fn validation_messages(&self) -> &[String] {
        match self {
            Self::Validation(messages) => messages,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_joins_messages() {
        let err = SettingsError::Validation(vec!["a must be > 0".into(), "b too".into()]);
        assert_eq!(err.to_string(), "validation errors: a must be > 0; b too");
        assert_eq!(err.validation_messages().len(), 2);
    }

    #[test]
    fn parse_error_keeps_input() {
        let err = ParseUnitsError::new("12em");
        assert_eq!(err.input(), "12em");
        assert!(err.to_string().contains("\"12em\""));
    }
}
