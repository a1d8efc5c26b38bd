//! Error types for the reco-client crate.
//!
//! Every operation on [`RecommendationClient`](crate::RecommendationClient)
//! fails with one of these variants. None of them are retried by the client.

use thiserror::Error;

/// Errors that can occur when talking to the recommendations service
#[derive(Error, Debug)]
pub enum RecoError {
    /// The service answered with a non-2xx status.
    ///
    /// `context` names the operation and its logical parameters, `detail`
    /// is the reason phrase optionally followed by `->` and the body text.
    #[error("Error {status}: Failed to {context}, \n reason {detail}")]
    Service {
        status: u16,
        context: String,
        detail: String,
    },

    /// A successful response lacked an expected element or held a value
    /// the client cannot interpret
    #[error("Failed to parse {context}: {reason}")]
    Parse { context: String, reason: String },

    /// A request payload could not be rendered
    #[error("Failed to encode {context}: {reason}")]
    Encode { context: String, reason: String },

    /// A local file could not be opened for import
    #[error("Failed to open file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The request never produced a response (connection, DNS, TLS)
    #[error("Request to {context} failed: {source}")]
    Transport {
        context: String,
        #[source]
        source: reqwest::Error,
    },
}

impl RecoError {
    pub fn parse(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status code carried by a service error
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, RecoError>;
