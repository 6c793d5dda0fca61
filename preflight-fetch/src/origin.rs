//! Persisted snapshot of HTTP response headers from the last profile fetch.
//!
//! Saved beside the downloaded profile directories so that a later
//! `${origin:header-name}` substitution can read the headers without
//! re-issuing the request. Refreshed on every successful (2xx) and
//! not-modified (304) response.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::FetchError;

/// File name of the record inside the cache root.
pub const ORIGIN_HEADERS_FILE: &str = ".originHeaders";

/// Header-name/value snapshot from the origin server.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OriginHeaders {
    headers: BTreeMap<String, String>,
}

impl OriginHeaders {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the record file for a given cache root.
    pub fn record_path(cache_root: &Path) -> PathBuf {
        cache_root.join(ORIGIN_HEADERS_FILE)
    }

    /// Load the record stored in `cache_root`.
    ///
    /// A missing or unreadable record is treated as empty — origin variables
    /// then simply resolve to nothing and stay verbatim in preference values.
    pub fn load(cache_root: &Path) -> Self {
        let path = Self::record_path(cache_root);
        match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::debug!("Ignoring malformed origin-headers record {path:?}: {e}");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save the record into `cache_root`.
    ///
    /// Uses the write-temp-then-rename pattern so a crash never leaves a
    /// truncated record behind.
    pub fn save(&self, cache_root: &Path) -> Result<(), FetchError> {
        let path = Self::record_path(cache_root);
        let temp_path = cache_root.join(format!("{ORIGIN_HEADERS_FILE}.tmp"));
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &path)?;
        Ok(())
    }

    /// Record one header. Names are stored as received; HTTP header names
    /// arrive lowercased from the transport.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    /// Case-insensitive lookup of a header value.
    pub fn get(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.headers.get(name) {
            return Some(value);
        }
        self.headers
            .iter()
            .find(|(stored, _)| stored.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Number of recorded headers.
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// Whether the record holds no headers.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }
}
