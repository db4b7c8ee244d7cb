//! Dialog error types

use crate::runtime::SendError;
use thiserror::Error;

/// Hard failures surfaced to the caller of a turn.
///
/// A failed recognition or a rejected validation is not an error; prompts
/// model those as data and re-prompt.
#[derive(Debug, Error)]
pub enum DialogError {
    /// Caller misuse: missing or invalid options, bad registration
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// A frame or begin call names a dialog that isn't registered
    #[error("Dialog not found: {0}")]
    UnknownDialog(String),
    /// A frame holds state belonging to a different kind of dialog
    #[error("Dialog '{dialog_id}' expected {expected} state")]
    StateMismatch {
        dialog_id: String,
        expected: &'static str,
    },
    #[error(transparent)]
    Send(#[from] SendError),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DialogError {
    /// True for errors that mean persisted state can't be trusted
    pub fn is_corruption(&self) -> bool {
        matches!(self, Self::UnknownDialog(_) | Self::StateMismatch { .. })
    }
}
