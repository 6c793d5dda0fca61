//! Typed error variants for the profile pipeline.

use thiserror::Error;

/// Errors surfaced by providers, the resolver, and the manager.
///
/// Only `UnsupportedScheme` and `MissingLocation` abort an apply call;
/// download and preference-file problems are logged and degrade to the
/// last-known-good state instead.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// A provider's location has a URI scheme the resolver cannot handle.
    #[error("profiles from '{0}' locations are not supported")]
    UnsupportedScheme(String),

    /// A provider was asked for its location but has none configured.
    #[error("no profile location was provided")]
    MissingLocation,

    /// A location could not be interpreted (e.g. a `file:` URL with no
    /// usable path).
    #[error("invalid profile location '{location}': {reason}")]
    InvalidLocation {
        /// The offending location.
        location: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Remote fetch failure, wrapped for logging by the manager.
    #[error(transparent)]
    Fetch(#[from] preflight_fetch::FetchError),

    /// Preference-file parse or store failure.
    #[error(transparent)]
    Config(#[from] preflight_config::ConfigError),

    /// Filesystem failure while resolving or combining profiles.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
