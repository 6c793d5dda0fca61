//! The profile manager: resolve, fetch, combine, and apply profiles.
//!
//! `ProfileManager` is an explicitly constructed context object — the owner
//! builds it once, early in startup, with the priority-ordered provider list
//! and a state directory, and calls [`ProfileManager::apply_profiles`]
//! exactly once. Provider selection is memoized at construction for the
//! lifetime of the manager.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use preflight_config::{Properties, ReplacerChain, process_properties};
use preflight_fetch::OriginHeaders;

use crate::delayed::DelayedLog;
use crate::error::ProfileError;
use crate::host::HostConfigStore;
use crate::provider::{EmptyProvider, ProfileProvider};
use crate::resolver::{self, Profile};

/// File name of the combined output inside the state directory.
pub const COMBINED_PREFERENCES_FILE: &str = "combined-preferences.epf";

/// Extension of recognized preference files inside profile directories.
pub const PREFERENCES_EXTENSION: &str = "epf";

/// Keys with this prefix are rewritten to the unprefixed form so they are
/// applied as default rather than instance-scoped configuration.
const INSTANCE_PREFIX: &str = "/instance/";

/// Manager for profiles that are applied during startup.
pub struct ProfileManager {
    /// Providers in increasing priority: each one's profiles override the
    /// previous ones'.
    providers: Vec<Box<dyn ProfileProvider>>,
    empty: EmptyProvider,
    /// Index of the highest-priority provider with a non-empty profile list,
    /// selected once at construction.
    active: Option<usize>,
    state_dir: PathBuf,
    download_successful: Option<bool>,
    applied: Vec<Profile>,
    logs: DelayedLog,
}

impl ProfileManager {
    /// Create a manager over `providers` (ordered low to high priority).
    ///
    /// The state directory holds the download caches and the combined
    /// preference output; it is created on demand.
    pub fn new(providers: Vec<Box<dyn ProfileProvider>>, state_dir: impl Into<PathBuf>) -> Self {
        let active = providers
            .iter()
            .rposition(|provider| !provider.requested_profiles().is_empty());
        Self {
            providers,
            empty: EmptyProvider,
            active,
            state_dir: state_dir.into(),
            download_successful: None,
            applied: Vec::new(),
            logs: DelayedLog::new(),
        }
    }

    /// The provider whose profiles win on conflict: the highest-priority one
    /// that requested any profiles, or the empty fallback provider.
    pub fn active_provider(&self) -> &dyn ProfileProvider {
        match self.active {
            Some(index) => self.providers[index].as_ref(),
            None => &self.empty,
        }
    }

    /// The state directory this manager caches and writes into.
    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// All requested profile names across providers, in priority order.
    pub fn requested_profiles(&self) -> Vec<String> {
        self.providers
            .iter()
            .flat_map(|provider| provider.requested_profiles())
            .collect()
    }

    /// Profiles actually applied by the last [`apply_profiles`] call.
    ///
    /// [`apply_profiles`]: ProfileManager::apply_profiles
    pub fn applied_profiles(&self) -> &[Profile] {
        &self.applied
    }

    /// Whether the last apply call's remote fetches succeeded: `Some(true)`
    /// if every attempted download worked, `Some(false)` if any failed, and
    /// `None` if no remote fetch was attempted.
    pub fn download_was_successful(&self) -> Option<bool> {
        self.download_successful
    }

    /// The local directory the active provider's profiles resolve to.
    ///
    /// Fails with `UnsupportedScheme` for locations that are neither local
    /// nor remote.
    pub fn local_profiles_location(&self) -> Result<Option<PathBuf>, ProfileError> {
        resolver::local_profiles_location(&self.state_dir, self.active_provider())
    }

    /// Apply the available profiles: resolve every provider's profile
    /// directories (downloading remote ones), merge their preference files,
    /// and register the combined result as the host's default-configuration
    /// source.
    ///
    /// With `overwrite` false the call is a no-op when the host already pins
    /// an external configuration override.
    ///
    /// Download and preference-file problems are logged and degrade to the
    /// last-known-good state; an unsupported location scheme aborts the call.
    /// Collected log messages are flushed once the sequence finishes.
    pub fn apply_profiles(
        &mut self,
        host: &mut dyn HostConfigStore,
        overwrite: bool,
    ) -> Result<(), ProfileError> {
        self.download_successful = None;
        let outcome = match self.resolve_all() {
            Ok(profiles) => {
                if let Err(e) = self.apply_preferences(&profiles, host, overwrite) {
                    self.logs
                        .error(format!("Could not apply preferences from profiles: {e}"));
                }
                Ok(())
            }
            Err(e) => Err(e),
        };
        self.logs.flush();
        outcome
    }

    /// Resolve all providers' requested profiles to local directories, in
    /// priority order (lowest first, so later entries override earlier ones
    /// in the combiner).
    fn resolve_all(&mut self) -> Result<Vec<Profile>, ProfileError> {
        let mut all = Vec::new();
        for index in 0..self.providers.len() {
            let requested = self.providers[index].requested_profiles();
            if requested.is_empty() {
                continue;
            }
            let Some(root) = self.fetch_root(index, &requested)? else {
                continue;
            };
            all.extend(resolver::filter_profiles(&root, &requested, index));
        }
        Ok(all)
    }

    /// Produce the local profile root for one provider, downloading remote
    /// locations into the provider's cache first.
    fn fetch_root(
        &mut self,
        index: usize,
        requested: &[String],
    ) -> Result<Option<PathBuf>, ProfileError> {
        let location = self.providers[index].profiles_location()?;
        if resolver::is_local(&location) {
            return Ok(Some(resolver::file_url_to_path(&location)?));
        }
        if !resolver::is_remote(&location) {
            return Err(ProfileError::UnsupportedScheme(
                location.scheme().to_string(),
            ));
        }

        let cache_root = resolver::cache_root(&self.state_dir, self.providers[index].as_ref());
        self.logs
            .info(format!("Downloading profiles from {location}"));
        match preflight_fetch::download_profiles(&location, requested, &cache_root) {
            Ok(_) => {
                // A failure earlier in this apply call keeps the flag false.
                self.download_successful = Some(self.download_successful.unwrap_or(true));
                Ok(Some(cache_root))
            }
            Err(e) => {
                self.download_successful = Some(false);
                let hint = if cache_root.is_dir() {
                    "Will use existing but potentially outdated profiles."
                } else {
                    "No profiles will be applied."
                };
                self.logs.error(format!(
                    "Could not download profiles from {location}: {e}. {hint}"
                ));
                if cache_root.is_dir() {
                    Ok(Some(cache_root))
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Merge the profiles' preference files and hand the result to the host.
    fn apply_preferences(
        &mut self,
        profiles: &[Profile],
        host: &mut dyn HostConfigStore,
        overwrite: bool,
    ) -> Result<(), ProfileError> {
        if !overwrite && host.is_overridden() {
            // Customizations are already explicitly provided by someone else.
            return Ok(());
        }
        self.applied.clear();

        let mut combined = Properties::new();
        for profile in profiles {
            self.applied.push(profile.clone());

            let mut props = Properties::new();
            for file in preference_files(&profile.local_path) {
                props.merge_from(Properties::load_from_path(&file)?);
            }
            replace_variables(
                self.providers[profile.provider_index].as_ref(),
                &mut props,
                profile,
            );
            combined.merge_from(props);

            let location = self.providers[profile.provider_index]
                .profiles_location()
                .map(|url| url.to_string())
                .unwrap_or_else(|_| "<unknown location>".to_string());
            self.logs.debug(format!(
                "Applied profile \"{}\" from {}",
                profile.name, location
            ));
        }

        strip_instance_prefix(&mut combined);

        fs::create_dir_all(&self.state_dir)?;
        let mut output_path = self.state_dir.join(COMBINED_PREFERENCES_FILE);
        if output_path.exists() && is_read_only(&output_path) {
            let fallback = std::env::temp_dir().join(format!(
                "combined-preferences-{}.epf",
                std::process::id()
            ));
            self.logs.warn(format!(
                "Could not write combined preferences file '{}', will use temporary file '{}' instead.",
                output_path.display(),
                fallback.display()
            ));
            output_path = fallback;
        }

        // Written through a byte stream so the host's Latin-1-assuming
        // reader loads it back unchanged.
        combined.store_to_path(&output_path)?;
        host.set_override(&output_path);
        Ok(())
    }
}

/// All preference files under a profile directory, sorted lexicographically
/// for a deterministic merge order.
fn preference_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext == PREFERENCES_EXTENSION)
        })
        .map(|entry| entry.into_path())
        .collect();
    files.sort();
    files
}

/// Run the variable replacement chain over every value, with the profile's
/// own directory as substitution context.
fn replace_variables(provider: &dyn ProfileProvider, props: &mut Properties, profile: &Profile) {
    // The origin-headers record sits beside the profile directories.
    let origin = profile
        .local_path
        .parent()
        .map(OriginHeaders::load)
        .unwrap_or_default();
    let sysprops = process_properties();
    let origin_lookup = |name: &str| origin.get(name).map(str::to_string);
    let custom_lookup = |name: &str| provider.resolve_variable(name);
    let chain = ReplacerChain::new(
        &sysprops,
        &profile.name,
        &profile.local_path,
        &origin_lookup,
        &custom_lookup,
    );

    let keys: Vec<String> = props.keys().cloned().collect();
    for key in keys {
        let Some(value) = props.get(&key).map(str::to_string) else {
            continue;
        };
        props.insert(key, chain.apply(&value));
    }
}

/// Rewrite `/instance/`-prefixed keys to their unprefixed form; instance
/// preferences would otherwise not be applied as defaults.
fn strip_instance_prefix(combined: &mut Properties) {
    let prefixed: Vec<String> = combined
        .keys()
        .filter(|key| key.starts_with(INSTANCE_PREFIX))
        .cloned()
        .collect();
    for key in prefixed {
        if let Some(value) = combined.remove(&key) {
            combined.insert(key[INSTANCE_PREFIX.len()..].to_string(), value);
        }
    }
}

fn is_read_only(path: &Path) -> bool {
    fs::metadata(path)
        .map(|meta| meta.permissions().readonly())
        .unwrap_or(false)
}
