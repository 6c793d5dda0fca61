//! Preference-file model for the preflight profile manager.
//!
//! This crate provides the pieces of the profile pipeline that deal with
//! configuration text rather than providers or transport:
//!
//! - Ordered `key=value` property-text parsing and byte-oriented storing
//! - The five-stage variable substitution chain with `$${...}` escaping

pub mod error;
pub mod properties;
pub mod vars;

// Re-export main types for convenience
pub use error::ConfigError;
pub use properties::Properties;
pub use vars::{ReplacerChain, process_properties, unescape_literals};
