//! Backend fault taxonomy.
//!
//! Configuration failures use `anyhow` at startup (see [`crate::config`]);
//! caller-input validation never produces an error at all — the tool surface
//! converts it to descriptive string results. Everything that can go wrong
//! *inside* a backend lands here.

use thiserror::Error;

/// Failures raised by a [`GraphBackend`](crate::backend::GraphBackend)
/// implementation. Always surfaced to the caller as a descriptive message,
/// never as a raw stack trace or a transport-level fault.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("extraction failed: {0}")]
    Extraction(String),

    #[error("query failed: {0}")]
    Query(String),

    /// Transport-level failure talking to the model endpoint, including
    /// client-side timeouts.
    #[error("model request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The model endpoint answered with a non-success HTTP status.
    #[error("model endpoint returned {status}: {body}")]
    Api { status: u16, body: String },

    /// The model responded, but the payload could not be parsed into the
    /// expected structure.
    #[error("model returned unparsable output: {0}")]
    Malformed(String),
}
