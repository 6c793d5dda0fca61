//! Conditional download, extraction, and atomic replacement of remote
//! profile bundles.
//!
//! The flow mirrors what a careful updater does: fetch the bundle (with a
//! conditional request when nothing new is being asked for), unpack it next
//! to the cache, and only then swap it into place with a rename so a reader
//! never observes a half-extracted directory. On 304 the cache is left
//! untouched and only the origin-headers record is refreshed.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use ureq::http::HeaderMap;
use url::Url;

use crate::error::FetchError;
use crate::http;
use crate::origin::OriginHeaders;

/// Media type the profile server must declare for bundle responses.
pub const PROFILES_MEDIA_TYPE: &str = "application/zip";

/// Query parameter carrying the comma-joined requested profile names.
pub const PROFILES_QUERY_PARAM: &str = "profiles";

/// What a successful call to [`download_profiles`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// A new bundle was downloaded and swapped into the cache root.
    Downloaded,
    /// The server answered 304; the existing cache root was kept.
    NotModified,
}

/// Download the requested profiles from `location` into `cache_root`.
///
/// The request always lists the full requested-name set in the `profiles`
/// query parameter; the diff against the locally cached directories only
/// decides whether the request may be conditional. Asking for a name that is
/// not cached yet forces an unconditional request, because a 304 would
/// otherwise serve the new profile from a stale cache.
pub fn download_profiles(
    location: &Url,
    requested: &[String],
    cache_root: &Path,
) -> Result<DownloadOutcome, FetchError> {
    let state_dir = cache_root
        .parent()
        .ok_or_else(|| std::io::Error::other("cache root has no parent directory"))?
        .to_path_buf();
    fs::create_dir_all(&state_dir)?;

    let request_url = profiles_request_url(location, requested);
    let conditional = missing_names(cache_root, requested)?.is_empty() && cache_root.is_dir();

    let agent = http::agent();
    let mut request = agent.get(request_url.as_str());
    if conditional {
        let modified = fs::metadata(cache_root)?.modified()?;
        let date = http_date(modified);
        request = request.header("If-Modified-Since", date.as_str());
    }

    let response = request.call()?;
    let (parts, mut body) = response.into_parts();
    let code = parts.status.as_u16();

    if (200..300).contains(&code) {
        let content_type = header_value(&parts.headers, "Content-Type");
        if !content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with(PROFILES_MEDIA_TYPE))
        {
            return Err(FetchError::BadContentType { content_type });
        }
        let bundle = body
            .with_config()
            .limit(http::MAX_BUNDLE_SIZE)
            .read_to_vec()?;
        replace_cache(&state_dir, cache_root, &bundle)?;
        capture_headers(&parts.headers).save(cache_root)?;
        Ok(DownloadOutcome::Downloaded)
    } else if code == 304 {
        if cache_root.is_dir() {
            capture_headers(&parts.headers).save(cache_root)?;
        }
        Ok(DownloadOutcome::NotModified)
    } else {
        Err(FetchError::Download(extract_http_error(&parts, body)))
    }
}

/// Build the request URL by appending the full requested-name list as one
/// comma-joined query parameter.
fn profiles_request_url(location: &Url, requested: &[String]) -> Url {
    let mut url = location.clone();
    url.query_pairs_mut()
        .append_pair(PROFILES_QUERY_PARAM, &requested.join(","));
    url
}

/// Requested names that are not present as cached subdirectories yet.
fn missing_names(cache_root: &Path, requested: &[String]) -> Result<Vec<String>, std::io::Error> {
    let mut missing: Vec<String> = requested.to_vec();
    if cache_root.is_dir() {
        for entry in fs::read_dir(cache_root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                let name = entry.file_name().to_string_lossy().into_owned();
                missing.retain(|requested_name| *requested_name != name);
            }
        }
    }
    Ok(missing)
}

/// Format a filesystem timestamp as an RFC 1123 HTTP date.
fn http_date(time: SystemTime) -> String {
    let datetime: chrono::DateTime<chrono::Utc> = time.into();
    datetime.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn capture_headers(headers: &HeaderMap) -> OriginHeaders {
    let mut record = OriginHeaders::new();
    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            record.insert(name.as_str(), value);
        }
    }
    record
}

/// Unpack the bundle beside the cache root, then swap it into place.
///
/// The previous cache root is removed only after the new bundle extracted
/// successfully, and the final step is a rename on the same filesystem.
fn replace_cache(state_dir: &Path, cache_root: &Path, bundle: &[u8]) -> Result<(), FetchError> {
    let pid = std::process::id();
    let temp_zip = state_dir.join(format!("profile-download-{pid}.zip"));
    fs::write(&temp_zip, bundle)?;

    let temp_dir = state_dir.join(format!("profile-extract-{pid}"));
    if temp_dir.exists() {
        fs::remove_dir_all(&temp_dir)?;
    }
    fs::create_dir_all(&temp_dir)?;

    if let Err(e) = extract_zip(&temp_zip, &temp_dir) {
        let _ = fs::remove_dir_all(&temp_dir);
        let _ = fs::remove_file(&temp_zip);
        return Err(e);
    }

    if cache_root.exists() {
        fs::remove_dir_all(cache_root)?;
    }
    fs::rename(&temp_dir, cache_root)?;
    fs::remove_file(&temp_zip)?;
    Ok(())
}

/// Extract a zip archive into `target`, skipping entries whose names would
/// escape it.
fn extract_zip(archive_path: &Path, target: &Path) -> Result<(), FetchError> {
    let file = fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let outpath = match entry.enclosed_name() {
            Some(path) => target.join(path),
            None => continue,
        };

        if entry.is_dir() {
            fs::create_dir_all(&outpath)?;
            continue;
        }
        if let Some(parent) = outpath.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut outfile = fs::File::create(&outpath)?;
        std::io::copy(&mut entry, &mut outfile)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                fs::set_permissions(&outpath, fs::Permissions::from_mode(mode))?;
            }
        }
    }
    Ok(())
}

/// Derive a diagnostic message from an error response: a short text body if
/// one was sent, else the status reason phrase, else the numeric status.
fn extract_http_error(parts: &ureq::http::response::Parts, mut body: ureq::Body) -> String {
    let content_type = header_value(&parts.headers, "Content-Type");
    if content_type.as_deref().is_some_and(|ct| ct.starts_with("text/")) {
        if let Ok(text) = body
            .with_config()
            .limit(http::MAX_ERROR_BODY_SIZE)
            .read_to_string()
        {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }
    if let Some(reason) = parts.status.canonical_reason() {
        return reason.to_string();
    }
    format!("server returned status {}", parts.status.as_u16())
}
