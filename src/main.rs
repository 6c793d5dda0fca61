use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use preflight::cli::Cli;
use preflight::host::PinnedConfigStore;
use preflight::logging;
use preflight_profiles::{
    CommandLineProvider, ProfileManager, ProfileProvider, ProviderRegistry, WorkspaceProvider,
};

fn main() -> Result<()> {
    // Parse CLI arguments first (before logging init for cleaner output)
    let cli = Cli::parse();
    logging::init();

    let state_dir = cli.state_dir.clone().unwrap_or_else(default_state_dir);
    let workspace = cli
        .workspace
        .clone()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    // Potential providers, increasing in priority (next overrides previous).
    // A real host would register discovered provider factories here; the
    // shim has none, so the registry contributes nothing.
    let registry = ProviderRegistry::new();
    let mut providers: Vec<Box<dyn ProfileProvider>> = Vec::new();
    if let Some(discovered) = registry.instantiate() {
        providers.push(discovered);
    }
    providers.push(Box::new(WorkspaceProvider::new(&workspace)));
    providers.push(Box::new(CommandLineProvider::from_args(
        &cli.app_args,
        cli.install_dir.as_deref(),
    )));

    let mut manager = ProfileManager::new(providers, state_dir);
    let mut host = PinnedConfigStore::new(cli.default_preferences.clone());
    manager.apply_profiles(&mut host, cli.overwrite)?;

    report(&manager, &host);
    Ok(())
}

fn report(manager: &ProfileManager, host: &PinnedConfigStore) {
    let applied = manager.applied_profiles();
    if applied.is_empty() {
        println!("No profiles applied.");
    } else {
        println!("Applied {} profile(s):", applied.len());
        for profile in applied {
            println!("  {} ({})", profile.name, profile.local_path.display());
        }
    }
    match manager.download_was_successful() {
        Some(true) => println!("Remote profile download: ok"),
        Some(false) => {
            println!("Remote profile download: failed (using last known good cache, if any)")
        }
        None => {}
    }
    if let Some(path) = host.path() {
        println!("Default preferences: {}", path.display());
    }
}

/// Platform state directory for the profile cache and combined output.
fn default_state_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(data_dir) = dirs::data_local_dir() {
            data_dir.join("preflight")
        } else {
            PathBuf::from("preflight-state")
        }
    }
    #[cfg(not(target_os = "windows"))]
    {
        if let Some(home_dir) = dirs::home_dir() {
            home_dir.join(".local").join("share").join("preflight")
        } else {
            PathBuf::from("preflight-state")
        }
    }
}
