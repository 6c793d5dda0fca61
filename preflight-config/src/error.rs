//! Typed error variants for the preflight-config crate.
//!
//! Produced by the property-text codec when loading or storing preference
//! files. Exposed so library consumers can match on specific failure modes
//! instead of opaque `anyhow` strings.

use std::fmt;

/// Errors that can occur when reading or writing preference files.
#[derive(Debug)]
pub enum ConfigError {
    /// An I/O error occurred reading or writing the file.
    Io(std::io::Error),

    /// A line of property text could not be parsed.
    ///
    /// `line` is 1-based and refers to the first physical line of the
    /// offending logical line (continuation lines count separately).
    Parse {
        /// Line number where parsing failed.
        line: usize,
        /// Description of what was wrong.
        message: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "I/O error reading preferences: {e}"),
            ConfigError::Parse { line, message } => {
                write!(f, "Parse error in preferences at line {line}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse { .. } => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}
