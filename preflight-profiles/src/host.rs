//! Interface to the host application's default-configuration store.

use std::path::Path;

/// Check-and-set handle for the host's default-configuration source.
///
/// The host implements this; the profile pipeline only ever calls through the
/// trait. When a configuration override is already pinned externally (e.g. by
/// a command-line flag of the host itself), profile-based preferences must
/// not clobber it, so the combiner consults [`is_overridden`] before doing
/// any work.
///
/// [`is_overridden`]: HostConfigStore::is_overridden
pub trait HostConfigStore {
    /// Whether a default-configuration file is already explicitly pinned.
    fn is_overridden(&self) -> bool;

    /// Register `path` as the host's default-configuration source.
    fn set_override(&mut self, path: &Path);
}
