//! HTTP client helper with native-tls support.

use std::time::Duration;
use ureq::Agent;
use ureq::tls::{RootCerts, TlsConfig, TlsProvider};

/// Default connect/read timeout for profile downloads (2 seconds). Startup
/// blocks on this request, so the bound is deliberately tight.
const DEFAULT_TIMEOUT_MS: u64 = 2000;

/// Environment variable overriding the connect timeout, in milliseconds.
pub const CONNECT_TIMEOUT_VAR: &str = "PREFLIGHT_CONNECT_TIMEOUT_MS";

/// Environment variable overriding the read timeout, in milliseconds.
pub const READ_TIMEOUT_VAR: &str = "PREFLIGHT_READ_TIMEOUT_MS";

/// Maximum accepted size of a profile bundle (256 MB).
pub const MAX_BUNDLE_SIZE: u64 = 256 * 1024 * 1024;

/// Maximum number of error-body bytes read for diagnostic messages.
pub const MAX_ERROR_BODY_SIZE: u64 = 4096;

fn timeout_from_env(var: &str) -> Duration {
    std::env::var(var)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_millis(DEFAULT_TIMEOUT_MS))
}

/// Create a new HTTP agent configured with native-tls and the profile
/// download timeouts.
///
/// Non-2xx statuses are returned as regular responses rather than errors so
/// the download step can inspect 304 and error bodies itself. The proxy
/// configuration comes from the standard environment variables
/// (`HTTP_PROXY`/`HTTPS_PROXY`), which ureq's default config picks up.
pub fn agent() -> Agent {
    let tls_config = TlsConfig::builder()
        .provider(TlsProvider::NativeTls)
        .root_certs(RootCerts::PlatformVerifier)
        .build();

    Agent::config_builder()
        .tls_config(tls_config)
        .http_status_as_error(false)
        .timeout_connect(Some(timeout_from_env(CONNECT_TIMEOUT_VAR)))
        .timeout_global(Some(timeout_from_env(READ_TIMEOUT_VAR)))
        .build()
        .into()
}
