//! Profile providers: where profile names and locations come from.
//!
//! A provider supplies an ordered list of requested profile names, a location
//! to fetch them from, and optionally values for `${custom:...}` variables.
//! Priority between providers is positional — the manager applies providers
//! from lowest to highest priority so later ones override earlier ones.

use std::path::{Path, PathBuf};

use url::Url;

use crate::error::ProfileError;
use preflight_config::Properties;

/// A source of requested profile names plus a location to fetch them from.
pub trait ProfileProvider {
    /// Ordered list of profile names to apply; later names override earlier
    /// ones within this provider.
    fn requested_profiles(&self) -> Vec<String>;

    /// Where the profiles live: a `file:` directory or an `http(s):`
    /// endpoint.
    fn profiles_location(&self) -> Result<Url, ProfileError>;

    /// Resolve a `${custom:name}` variable. Unknown names return `None` and
    /// the reference stays verbatim in preference values.
    fn resolve_variable(&self, _name: &str) -> Option<String> {
        None
    }

    /// Stable identifier used to segregate this provider's download cache
    /// from other providers'.
    fn cache_key(&self) -> String;
}

/// Split a `-profileList` value into names. Comma, semicolon, and colon all
/// work as separators; empty segments are dropped.
pub(crate) fn split_profile_list(raw: &str) -> Vec<String> {
    raw.split([',', ';', ':'])
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Interpret a location argument: a value with a URI scheme is used as-is,
/// anything else is treated as a filesystem path, resolved against
/// `base_dir` when relative, and made absolute.
pub(crate) fn parse_location(raw: &str, base_dir: Option<&Path>) -> Option<Url> {
    if let Ok(url) = Url::parse(raw) {
        return Some(url);
    }
    let mut path = PathBuf::from(raw);
    if path.is_relative()
        && let Some(base) = base_dir
    {
        path = base.join(path);
    }
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir().ok()?.join(path)
    };
    match Url::from_file_path(&absolute) {
        Ok(url) => Some(url),
        Err(()) => {
            log::warn!("Could not interpret profile location '{raw}' as URI or path");
            None
        }
    }
}

/// Provider that reads `-profileList` and `-profileLocation` from the
/// application's raw argument list.
pub struct CommandLineProvider {
    requested: Vec<String>,
    location: Option<Url>,
}

impl CommandLineProvider {
    /// Scan `args` for the profile arguments. A flag without a following
    /// value is ignored. Scheme-less locations are resolved relative to
    /// `install_dir` (the installation directory) and made absolute.
    pub fn from_args(args: &[String], install_dir: Option<&Path>) -> Self {
        let mut requested = Vec::new();
        let mut location = None;
        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "-profileList" | "--profileList" if i + 1 < args.len() => {
                    i += 1;
                    requested = split_profile_list(&args[i]);
                }
                "-profileLocation" | "--profileLocation" if i + 1 < args.len() => {
                    i += 1;
                    location = parse_location(&args[i], install_dir);
                }
                _ => {}
            }
            i += 1;
        }
        Self {
            requested,
            location,
        }
    }
}

impl ProfileProvider for CommandLineProvider {
    fn requested_profiles(&self) -> Vec<String> {
        self.requested.clone()
    }

    fn profiles_location(&self) -> Result<Url, ProfileError> {
        self.location.clone().ok_or(ProfileError::MissingLocation)
    }

    fn cache_key(&self) -> String {
        "commandline".to_string()
    }
}

/// File name (under the workspace directory) holding the workspace provider's
/// configuration.
pub const WORKSPACE_PREFS_FILE: &str = ".preflight/profiles.prefs";

/// Provider configured through a small property file in the workspace:
/// `profileList` and `profileLocation` keys, the latter resolved against the
/// workspace directory when it has no scheme.
pub struct WorkspaceProvider {
    requested: Vec<String>,
    location: Option<Url>,
}

impl WorkspaceProvider {
    pub fn new(workspace_dir: &Path) -> Self {
        let prefs_path = workspace_dir.join(WORKSPACE_PREFS_FILE);
        if !prefs_path.is_file() {
            return Self {
                requested: Vec::new(),
                location: None,
            };
        }
        match Properties::load_from_path(&prefs_path) {
            Ok(prefs) => {
                let requested = prefs
                    .get("profileList")
                    .map(split_profile_list)
                    .unwrap_or_default();
                let location = prefs
                    .get("profileLocation")
                    .and_then(|raw| parse_location(raw, Some(workspace_dir)));
                Self {
                    requested,
                    location,
                }
            }
            Err(e) => {
                log::warn!("Could not read workspace profile preferences {prefs_path:?}: {e}");
                Self {
                    requested: Vec::new(),
                    location: None,
                }
            }
        }
    }
}

impl ProfileProvider for WorkspaceProvider {
    fn requested_profiles(&self) -> Vec<String> {
        self.requested.clone()
    }

    fn profiles_location(&self) -> Result<Url, ProfileError> {
        self.location.clone().ok_or(ProfileError::MissingLocation)
    }

    fn cache_key(&self) -> String {
        "workspace".to_string()
    }
}

/// Fallback provider used when no candidate requests any profiles.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyProvider;

impl ProfileProvider for EmptyProvider {
    fn requested_profiles(&self) -> Vec<String> {
        Vec::new()
    }

    fn profiles_location(&self) -> Result<Url, ProfileError> {
        Err(ProfileError::MissingLocation)
    }

    fn cache_key(&self) -> String {
        "empty".to_string()
    }
}

/// Factory producing a provider instance, registered by the host's module
/// system.
pub type ProviderFactory = Box<dyn Fn() -> Result<Box<dyn ProfileProvider>, ProfileError>>;

/// Registry of host-contributed provider factories.
///
/// Stands in for discovery through a plugin mechanism: the host registers
/// whatever factories its module system found, and the first one that
/// constructs successfully wins. Construction failures are logged and
/// treated as "no provider" rather than propagated.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: Vec<(String, ProviderFactory)>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named factory. Registration order decides precedence.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Result<Box<dyn ProfileProvider>, ProfileError> + 'static,
    {
        self.factories.push((name.into(), Box::new(factory)));
    }

    /// Number of registered factories.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Whether no factories are registered.
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Instantiate the first registered factory that constructs successfully.
    pub fn instantiate(&self) -> Option<Box<dyn ProfileProvider>> {
        for (name, factory) in &self.factories {
            match factory() {
                Ok(provider) => return Some(provider),
                Err(e) => {
                    log::error!(
                        "Could not create profile provider instance '{name}': {e}. \
                         No profiles will be processed from it."
                    );
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split_profile_list_separators() {
        assert_eq!(split_profile_list("a,b"), vec!["a", "b"]);
        assert_eq!(split_profile_list("a;b"), vec!["a", "b"]);
        assert_eq!(split_profile_list("a:b"), vec!["a", "b"]);
        assert_eq!(split_profile_list("a,,b,"), vec!["a", "b"]);
    }

    #[test]
    fn test_command_line_provider_basic() {
        let provider = CommandLineProvider::from_args(
            &args(&[
                "-profileList",
                "base,custom",
                "-profileLocation",
                "https://hub.example.com/profiles",
            ]),
            None,
        );
        assert_eq!(provider.requested_profiles(), vec!["base", "custom"]);
        assert_eq!(
            provider.profiles_location().unwrap().as_str(),
            "https://hub.example.com/profiles"
        );
    }

    #[test]
    fn test_command_line_provider_relative_path_resolved_against_install_dir() {
        let install = TempDir::new().unwrap();
        let provider = CommandLineProvider::from_args(
            &args(&["-profileList", "base", "-profileLocation", "profiles"]),
            Some(install.path()),
        );
        let url = provider.profiles_location().unwrap();
        assert_eq!(url.scheme(), "file");
        let path = url.to_file_path().unwrap();
        assert!(path.starts_with(install.path()));
        assert!(path.ends_with("profiles"));
    }

    #[test]
    fn test_command_line_provider_flag_without_value_ignored() {
        let provider = CommandLineProvider::from_args(&args(&["-profileList"]), None);
        assert!(provider.requested_profiles().is_empty());
        assert!(matches!(
            provider.profiles_location(),
            Err(ProfileError::MissingLocation)
        ));
    }

    #[test]
    fn test_command_line_provider_unrelated_args_skipped() {
        let provider = CommandLineProvider::from_args(
            &args(&["-data", "/tmp/ws", "-profileList", "base"]),
            None,
        );
        assert_eq!(provider.requested_profiles(), vec!["base"]);
    }

    #[test]
    fn test_workspace_provider_missing_prefs_is_empty() {
        let workspace = TempDir::new().unwrap();
        let provider = WorkspaceProvider::new(workspace.path());
        assert!(provider.requested_profiles().is_empty());
    }

    #[test]
    fn test_workspace_provider_reads_prefs() {
        let workspace = TempDir::new().unwrap();
        let prefs_dir = workspace.path().join(".preflight");
        fs::create_dir_all(&prefs_dir).unwrap();
        fs::write(
            prefs_dir.join("profiles.prefs"),
            "profileList=base;custom\nprofileLocation=profiles\n",
        )
        .unwrap();

        let provider = WorkspaceProvider::new(workspace.path());
        assert_eq!(provider.requested_profiles(), vec!["base", "custom"]);
        let url = provider.profiles_location().unwrap();
        assert_eq!(url.scheme(), "file");
        assert!(url.to_file_path().unwrap().starts_with(workspace.path()));
    }

    #[test]
    fn test_empty_provider() {
        let provider = EmptyProvider;
        assert!(provider.requested_profiles().is_empty());
        assert!(matches!(
            provider.profiles_location(),
            Err(ProfileError::MissingLocation)
        ));
    }

    #[test]
    fn test_registry_first_constructible_wins() {
        let mut registry = ProviderRegistry::new();
        registry.register("broken", || {
            Err(ProfileError::InvalidLocation {
                location: "n/a".to_string(),
                reason: "construction failed".to_string(),
            })
        });
        registry.register("working", || {
            Ok(Box::new(EmptyProvider) as Box<dyn ProfileProvider>)
        });

        let provider = registry.instantiate().expect("second factory must win");
        assert_eq!(provider.cache_key(), "empty");
    }

    #[test]
    fn test_registry_all_failing_yields_none() {
        let mut registry = ProviderRegistry::new();
        registry.register("broken", || Err(ProfileError::MissingLocation));
        assert!(registry.instantiate().is_none());
    }

    #[test]
    fn test_registry_empty_yields_none() {
        let registry = ProviderRegistry::new();
        assert!(registry.instantiate().is_none());
    }
}
