//! Remote profile download and cache maintenance for the preflight profile
//! manager.
//!
//! Provides:
//! - `http`: blocking agent with native-tls and tight startup timeouts
//! - `download`: conditional fetch, zip enforcement, atomic cache swap
//! - `origin`: persisted snapshot of the last response's headers

pub mod download;
pub mod error;
pub mod http;
pub mod origin;

pub use download::{DownloadOutcome, PROFILES_MEDIA_TYPE, PROFILES_QUERY_PARAM, download_profiles};
pub use error::FetchError;
pub use origin::{ORIGIN_HEADERS_FILE, OriginHeaders};
