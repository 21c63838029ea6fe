//! Error types for the catalog client.

use thiserror::Error;

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, SearchError>;

/// Broad classification of a [`SearchError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The source or settings are misconfigured; nothing was sent.
    Configuration,
    /// Network failure or deadline expiry, after retries.
    Transport,
    /// The remote answered, but not with a usable result.
    RemoteProtocol,
    /// The caller cancelled the operation.
    Cancellation,
    /// Anything else.
    Other,
}

/// Errors that can occur while talking to video sources.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The source has no API URL configured.
    #[error("Video source '{0}' has no API URL configured")]
    MissingApiUrl(String),

    /// No source with the given id exists in the settings.
    #[error("Unknown video source: {0}")]
    UnknownSource(String),

    /// The settings document could not be loaded.
    #[error("Failed to load settings: {0}")]
    Settings(String),

    /// No sources were supplied.
    #[error("No video sources configured")]
    NoSources,

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Request deadline exceeded.
    #[error("Request timeout exceeded")]
    Timeout,

    /// Network failure reported by a non-reqwest fetcher.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The relay or upstream answered with a non-success HTTP status.
    #[error("API request failed with status {0}")]
    Status(u16),

    /// The remote API reported a failure.
    #[error("Remote API error: {0}")]
    Remote(String),

    /// Failed to parse response.
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// The operation was cancelled by the caller.
    #[error("Search cancelled")]
    Cancelled,

    /// URL parsing error.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for SearchError {
    fn from(err: serde_json::Error) -> Self {
        SearchError::Parse(err.to_string())
    }
}

impl SearchError {
    /// Classifies the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SearchError::MissingApiUrl(_)
            | SearchError::UnknownSource(_)
            | SearchError::Settings(_)
            | SearchError::NoSources
            | SearchError::UrlParse(_) => ErrorKind::Configuration,
            SearchError::Http(_) | SearchError::Timeout | SearchError::Transport(_) => {
                ErrorKind::Transport
            }
            SearchError::Status(_) | SearchError::Remote(_) | SearchError::Parse(_) => {
                ErrorKind::RemoteProtocol
            }
            SearchError::Cancelled => ErrorKind::Cancellation,
            SearchError::Other(_) => ErrorKind::Other,
        }
    }

    /// Returns true if the error is a caller-requested cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SearchError::Cancelled)
    }
}
