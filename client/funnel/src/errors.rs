//! Application-wide error types.

use thiserror::Error;

use crate::validator::FieldError;

#[derive(Debug, Error)]
pub enum FunnelError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Validation failed: {}", join_messages(.0))]
    Validation(Vec<FieldError>),

    #[error("Unsupported proof type: {0} (only images or PDF documents are accepted)")]
    UnsupportedProof(String),

    #[error("Please upload payment proof")]
    MissingProof,

    #[error("Payment ID is missing")]
    MissingReference,

    #[error("A payment submission is already in flight")]
    Busy,

    #[error("Cannot {action} while on the {step} step")]
    InvalidStep {
        action: &'static str,
        step: &'static str,
    },
}

impl FunnelError {
    /// Network and server failures the user may simply retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Rejected { .. } | Self::MalformedResponse(_)
        )
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message)
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, FunnelError>;
