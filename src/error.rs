//! Error taxonomy for the streaming pipeline.
//!
//! Every error carries a [`Severity`] that tells the caller how far the
//! failure propagates:
//!
//! | Severity | Meaning | Examples |
//! |----------|---------|----------|
//! | `Message` | abort this one operation, keep going | invalid pause request, bad name |
//! | `Session` | halt the current session, process keeps running | store connection lost, upstream 420 |
//! | `Process` | the affected feature cannot run at all | missing trained artifact, bad config |
//!
//! Only configuration and resource-loading failures reach process severity.

use std::path::PathBuf;

use thiserror::Error;

/// How far an error propagates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Affects a single message; expected during normal operation.
    Message,
    /// Halts the current stream session; retry is manual.
    Session,
    /// The process cannot proceed into the affected feature.
    Process,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(
        "missing trained artifact: {path}\n\
         Train the classifiers offline and place the artifact file there, \
         then run `senti check` to verify before streaming."
    )]
    MissingArtifact { path: PathBuf },

    #[error("malformed trained artifact {path}: {source}")]
    MalformedArtifact {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("lost connection to the document store: {0}")]
    StoreConnection(String),

    #[error("upstream error {status}: {reason}")]
    Upstream { status: u16, reason: String },

    #[error("stream disconnected: {0}")]
    Disconnected(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid session transition: {0}")]
    InvalidTransition(String),
}

impl Error {
    /// Classify this error per the propagation policy.
    pub fn severity(&self) -> Severity {
        match self {
            Error::Config(_) | Error::MissingArtifact { .. } | Error::MalformedArtifact { .. } => {
                Severity::Process
            }
            Error::StoreConnection(_) | Error::Upstream { .. } | Error::Disconnected(_) => {
                Severity::Session
            }
            // Validation failures abort before any side effect; they never
            // terminate an already-running session. Duplicate inserts are
            // not errors at all: the store reports them as an outcome and
            // the session counts them as ignored.
            Error::InvalidInput(_) | Error::InvalidTransition(_) => Severity::Message,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
