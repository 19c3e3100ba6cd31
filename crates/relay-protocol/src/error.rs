//! Error types for the relay translation layer.

use thiserror::Error;

/// Errors surfaced by the translators and the part converter.
///
/// An empty result ("nothing to emit") is never an error; translators return
/// `Ok(None)` for it.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invocation context is required")]
    MissingContext,
    #[error("unrecognized event type: {kind}")]
    UnrecognizedEvent { kind: String },
    #[error("failed to convert part {index} ({kind}): {reason}")]
    PartConversion {
        index: usize,
        kind: String,
        reason: String,
    },
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl RelayError {
    pub fn part(index: usize, kind: impl Into<String>, reason: impl ToString) -> Self {
        Self::PartConversion {
            index,
            kind: kind.into(),
            reason: reason.to_string(),
        }
    }

    /// Contract violations are programming errors on the caller's side.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::MissingContext | Self::UnrecognizedEvent { .. })
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Convenience result type for translation operations.
pub type RelayResult<T> = Result<T, RelayError>;
