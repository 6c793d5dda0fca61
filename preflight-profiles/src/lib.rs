//! Provider interface, profile resolution, and the preference-apply pipeline
//! for the preflight profile manager.
//!
//! The pieces, leaves first:
//!
//! - `provider`: where profile names and locations come from
//! - `resolver`: scheme dispatch and traversal-safe name filtering
//! - `delayed`: log records buffered until the apply sequence finishes
//! - `host`: the host application's default-configuration store interface
//! - `manager`: the apply pipeline tying everything together

pub mod delayed;
pub mod error;
pub mod host;
pub mod manager;
pub mod provider;
pub mod resolver;

// Re-export main types for convenience
pub use delayed::DelayedLog;
pub use error::ProfileError;
pub use host::HostConfigStore;
pub use manager::{COMBINED_PREFERENCES_FILE, PREFERENCES_EXTENSION, ProfileManager};
pub use provider::{
    CommandLineProvider, EmptyProvider, ProfileProvider, ProviderFactory, ProviderRegistry,
    WORKSPACE_PREFS_FILE, WorkspaceProvider,
};
pub use resolver::{Profile, local_profiles_location};
