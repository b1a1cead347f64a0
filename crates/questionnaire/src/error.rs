//! Error types for the questionnaire client.

use thiserror::Error;

/// Failures talking to the intake service.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The request never produced a usable HTTP response.
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a failure envelope or a non-success status.
    #[error("service rejected the request ({status}): {message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message from the envelope, or the raw body when there was none.
        message: String,
        /// Machine-readable error code, when the envelope carried one.
        code: Option<String>,
    },

    /// The service answered successfully with a body this client cannot read.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// The configured base URL cannot be used.
    #[error("invalid service URL '{0}'")]
    InvalidUrl(String),
}

/// Failures driving the questionnaire state machine.
#[derive(Debug, Error)]
pub enum WizardError {
    /// A submission outcome arrived while no submission was in flight.
    #[error("no submission is in flight")]
    NotSubmitting,

    /// The submission was sent and failed; the draft is kept.
    #[error("submission failed: {0}")]
    Submission(#[from] GatewayError),
}
