//! Error handling for the RumahRapih storefront client

use std::fmt;
use thiserror::Error;

use crate::flow::Action;
use crate::validation::Issues;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the storefront client
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP related errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Filesystem errors (proof files, file-backed draft store)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Local schema rejection, carrying every failing field
    #[error("Validation failed: {0}")]
    Validation(Issues),

    /// The requested record does not exist on the server
    #[error("Not found: {0}")]
    NotFound(String),

    /// The server answered with a non-success status
    #[error("Request failed with status {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Response body or server message
        message: String,
    },

    /// A flow step was entered without the state it depends on
    #[error("Prerequisite missing: {0}")]
    PrerequisiteMissing(String),

    /// The same action is already waiting on a response
    #[error("{0} is already in progress")]
    Busy(Action),

    /// A response settled after the user navigated elsewhere
    #[error("Response discarded after navigation")]
    Superseded,

    /// Draft store errors
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),
}

/// Coarse classification of [`Error`] used to pick what the user sees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Field-level input problems, fixed in place
    Validation,
    /// Missing remote record, shown as its own state
    NotFound,
    /// Network or server failure, shown as a generic message
    Transport,
    /// Flow guard violation, handled by redirecting
    PrerequisiteMissing,
    /// Re-submission while a request is pending
    Busy,
    /// Stale response that was dropped
    Superseded,
    /// Local persistence failure
    Storage,
    /// Invalid client configuration
    Config,
}

impl Error {
    /// Create a new not-found error
    pub fn not_found<T: fmt::Display>(what: T) -> Self {
        Error::NotFound(what.to_string())
    }

    /// Create a new store error
    pub fn store<T: fmt::Display>(msg: T) -> Self {
        Error::Store(msg.to_string())
    }

    /// Create a new config error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Create a new prerequisite error
    pub fn prerequisite<T: fmt::Display>(msg: T) -> Self {
        Error::PrerequisiteMissing(msg.to_string())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Http(_) | Error::Json(_) | Error::Api { .. } => ErrorKind::Transport,
            Error::PrerequisiteMissing(_) => ErrorKind::PrerequisiteMissing,
            Error::Busy(_) => ErrorKind::Busy,
            Error::Superseded => ErrorKind::Superseded,
            Error::Io(_) | Error::Store(_) => ErrorKind::Storage,
            Error::Url(_) | Error::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether this error means the remote record is missing
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::Issue;

    #[test]
    fn test_kind_classification() {
        assert_eq!(Error::not_found("service x").kind(), ErrorKind::NotFound);
        assert_eq!(
            Error::Api { status: 500, message: "boom".into() }.kind(),
            ErrorKind::Transport
        );
        assert_eq!(Error::prerequisite("cart").kind(), ErrorKind::PrerequisiteMissing);
        assert_eq!(Error::store("disk full").kind(), ErrorKind::Storage);
        assert_eq!(Error::Busy(Action::SubmitPayment).kind(), ErrorKind::Busy);

        let issues = Issues::from(vec![Issue::new("email", "Invalid email address")]);
        assert_eq!(Error::Validation(issues).kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_display() {
        let err = Error::Api { status: 422, message: "bad input".into() };
        assert_eq!(err.to_string(), "Request failed with status 422: bad input");
        assert_eq!(
            Error::Busy(Action::SubmitPayment).to_string(),
            "payment submission is already in progress"
        );
    }
}
