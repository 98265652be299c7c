//! Error taxonomy for the orchestration core
//!
//! Every failure a caller can observe from the pipeline maps to one of
//! these variants. Image acquisition deliberately has no variant here:
//! a broken image never fails a call, it only yields a missing filename.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// The session id is unknown, or its handle was destroyed or crashed.
    /// Fatal to the single call, never to the system.
    #[error("webview \"{id}\" is unavailable: {reason}")]
    SessionUnavailable { id: String, reason: String },

    /// The main frame reported a load failure with a non-benign code.
    #[error("navigation failed: {code} {description}")]
    NavigationFailed { code: i32, description: String },

    /// No load-finished or load-failed signal arrived within the window.
    #[error("navigation timed out ({timeout_secs}s)")]
    NavigationTimeout { timeout_secs: u64 },

    /// The injected script did not settle within its window.
    #[error("script execution ({label}) timed out ({timeout_secs}s)")]
    ExecutionTimeout { label: String, timeout_secs: u64 },

    /// The script settled but its value did not carry the tagged
    /// `{ success, data | error }` shape. Indicates a script defect.
    #[error("script returned a malformed extraction result: {detail}")]
    InvalidExtractionResult { detail: String },

    /// The script reported `success: false` with its own error message.
    #[error("extraction failed: {message}")]
    ExtractionFailed { message: String },

    /// Tracker dataset could not be written back.
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl CoreError {
    pub fn session_unavailable(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SessionUnavailable {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Whether a retry by the caller could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NavigationFailed { .. }
                | Self::NavigationTimeout { .. }
                | Self::ExecutionTimeout { .. }
        )
    }
}
