//! Resolution of requested profile names to local directories.
//!
//! Classifies a provider's location by URI scheme, maps remote locations to
//! their per-provider cache root, and filters requested names down to safe,
//! existing directories.

use std::path::{Component, Path, PathBuf};

use url::Url;

use crate::error::ProfileError;
use crate::provider::ProfileProvider;

/// A resolved profile: a named directory under a provider's profile root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// The requested profile name.
    pub name: String,
    /// The directory holding this profile's files.
    pub local_path: PathBuf,
    /// Index of the owning provider in the manager's priority-ordered list.
    pub provider_index: usize,
}

/// Whether the location points at a local directory.
pub fn is_local(location: &Url) -> bool {
    location.scheme().eq_ignore_ascii_case("file")
}

/// Whether the location points at a remote profile server.
pub fn is_remote(location: &Url) -> bool {
    location.scheme().to_ascii_lowercase().starts_with("http")
}

/// The cache directory used for a provider's downloaded profiles.
pub fn cache_root(state_dir: &Path, provider: &dyn ProfileProvider) -> PathBuf {
    state_dir.join("profiles").join(provider.cache_key())
}

/// The local directory a provider's profiles resolve to: the location itself
/// for `file:` locations, the provider's cache root for remote ones.
///
/// Returns `Ok(None)` when the provider has no location configured; fails
/// with `UnsupportedScheme` for anything that is neither `file` nor `http*`.
pub fn local_profiles_location(
    state_dir: &Path,
    provider: &dyn ProfileProvider,
) -> Result<Option<PathBuf>, ProfileError> {
    let location = match provider.profiles_location() {
        Ok(location) => location,
        Err(ProfileError::MissingLocation) => return Ok(None),
        Err(e) => return Err(e),
    };
    if is_local(&location) {
        Ok(Some(file_url_to_path(&location)?))
    } else if is_remote(&location) {
        Ok(Some(cache_root(state_dir, provider)))
    } else {
        Err(ProfileError::UnsupportedScheme(
            location.scheme().to_string(),
        ))
    }
}

/// Convert a `file:` URL to a filesystem path.
pub fn file_url_to_path(location: &Url) -> Result<PathBuf, ProfileError> {
    location
        .to_file_path()
        .map_err(|()| ProfileError::InvalidLocation {
            location: location.to_string(),
            reason: "not a usable file path".to_string(),
        })
}

/// Resolve requested names against a profile root, keeping only names that
/// are existing directories *inside* the root.
///
/// Traversal names such as `../evil` normalize to somewhere outside the root
/// and are dropped, as are names with no matching directory. Both are
/// silent by design — "no profile found" is not an error. Output order
/// follows the requested order.
pub fn filter_profiles(root: &Path, names: &[String], provider_index: usize) -> Vec<Profile> {
    let root_normalized = normalize(root);
    names
        .iter()
        .filter_map(|name| {
            let candidate = normalize(&root.join(name));
            (candidate.is_dir() && candidate.starts_with(&root_normalized)).then(|| Profile {
                name: name.clone(),
                local_path: candidate,
                provider_index,
            })
        })
        .collect()
}

/// Lexical path normalization: removes `.` components and resolves `..`
/// against preceding components without touching the filesystem. The escape
/// check must judge the *requested* path, not whatever a symlink-aware
/// canonicalization would produce.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
