//! Error types for the store authorization lifecycle.
//!
//! Every failure in this crate maps to a distinct [`AuthorizationError`]
//! variant so callers can tell apart caller mistakes (rejected before any
//! network activity), protocol violations by a server, authentication
//! failures, and damage to locally stored credentials.

use std::path::PathBuf;

use thiserror::Error;

/// The common error type used by this crate.
#[derive(Error, Debug)]
pub enum AuthorizationError {
    /// The caller supplied invalid input; no network request was made
    #[error("Invalid input: {0}")]
    Input(String),

    /// A server response was missing a required field or otherwise
    /// violated the documented exchange
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The root token did not carry exactly one third-party caveat
    /// addressed to the identity authority
    #[error("Expected exactly one third-party caveat for {location}, found {count}")]
    CaveatSelection { location: String, count: usize },

    /// The identity authority rejected the authentication attempt
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// No credential is stored under the given name
    #[error("No credential stored under {0:?}")]
    NotFound(String),

    /// A stored credential file exists but could not be parsed
    #[error("Corrupt credential file at {}; delete it and authenticate again", .path.display())]
    CorruptCredential {
        /// Path of the unreadable file
        path: PathBuf,
    },

    /// Refreshing a stale discharge failed; the triggering request is
    /// not retried
    #[error("Failed to refresh discharge: {0}")]
    RefreshFailed(String),

    /// A macaroon could not be deserialized, bound or reserialized
    #[error("Token error: {0}")]
    Token(String),

    /// Credential encoding failed
    #[error("Failed to encode credential: {0}")]
    Encoding(#[from] serde_json::Error),

    /// An HTTP transport failure
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// A filesystem failure in the credential store or prompt
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<macaroon::MacaroonError> for AuthorizationError {
    fn from(error: macaroon::MacaroonError) -> Self {
        AuthorizationError::Token(error.to_string())
    }
}
