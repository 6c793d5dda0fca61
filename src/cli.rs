//! Command-line interface for the preflight host shim.

use clap::Parser;
use std::path::PathBuf;

/// preflight — resolve, download, merge, and apply startup profiles
#[derive(Parser, Debug)]
#[command(name = "preflight")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding the profile cache and combined output
    /// (defaults to the platform state directory)
    #[arg(long, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    /// Workspace directory to read workspace profile preferences from
    /// (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Installation directory used to resolve relative -profileLocation values
    #[arg(long, value_name = "DIR")]
    pub install_dir: Option<PathBuf>,

    /// Pre-pinned default-preferences file; profile application is skipped
    /// when this is set (unless --overwrite is given)
    #[arg(long, value_name = "FILE")]
    pub default_preferences: Option<PathBuf>,

    /// Apply profiles even if a default-preferences file is already pinned
    #[arg(long)]
    pub overwrite: bool,

    /// Raw application arguments, scanned for
    /// `-profileList <names>` and `-profileLocation <uri-or-path>`
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "APP_ARGS")]
    pub app_args: Vec<String>,
}
