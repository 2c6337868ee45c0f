//! CPR client errors.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failure of a single lookup.
#[derive(Error, Debug)]
pub enum CprError {
    #[error("Invalid CPR number")]
    InvalidIdentifier,

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Malformed registry response: {0}")]
    MalformedResponse(String),
}

/// Failure talking to the registry endpoint.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to load client certificate {path}: {reason}")]
    CertificateLoad { path: PathBuf, reason: String },

    /// Connection or TLS handshake failed, or the registry refused the
    /// client certificate.
    #[error("Handshake failed: {0}")]
    Handshake(String),

    #[error("Timed out during {phase} after {after:?}")]
    Timeout {
        phase: &'static str,
        after: Duration,
    },

    /// The registry answered with a SOAP fault or an error status.
    ///
    /// `message` is the registry's fault text. It can quote the queried CPR
    /// number, so it is left out of `Display`.
    #[error("Remote fault (HTTP {status})")]
    RemoteFault { status: u16, message: String },

    #[error("Invalid transport configuration: {0}")]
    Configuration(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl CprError {
    /// True when the failure came from a timeout on the registry call.
    pub fn is_timeout(&self) -> bool {
        matches!(self, CprError::Transport(TransportError::Timeout { .. }))
    }
}
