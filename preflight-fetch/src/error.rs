//! Typed error variants for remote profile fetching.

use thiserror::Error;

/// Errors that can occur while downloading or unpacking a profile bundle.
///
/// All of these are recoverable from the manager's point of view: the caller
/// logs them, keeps the last-known-good cache, and records the failed
/// download state.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered 2xx but did not declare a zip media type.
    ///
    /// Reading a non-zip stream as zip would "succeed" with zero entries, so
    /// an empty or wrong payload must fail loudly instead of silently
    /// producing an empty profile set.
    #[error("server did not return a ZIP file containing the selected profiles (content type {content_type:?})")]
    BadContentType {
        /// The `Content-Type` the server actually sent, if any.
        content_type: Option<String>,
    },

    /// The server answered with a status other than 2xx or 304. The message
    /// is derived from a short text body, the status reason phrase, or the
    /// numeric status, in that order of preference.
    #[error("{0}")]
    Download(String),

    /// Transport-level failure (DNS, connect, TLS, timeout, read).
    #[error("http transport error: {0}")]
    Transport(#[from] Box<ureq::Error>),

    /// The profile location could not be turned into a request URL.
    #[error("invalid profile location: {0}")]
    InvalidUrl(String),

    /// The downloaded bundle could not be read as a zip archive.
    #[error("zip extraction failed: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Filesystem failure while caching the bundle.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ureq::Error> for FetchError {
    fn from(e: ureq::Error) -> Self {
        FetchError::Transport(Box::new(e))
    }
}
