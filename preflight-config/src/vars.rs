//! Variable substitution chain applied to profile preference values.
//!
//! Every value runs through five lookup stages in fixed order — `env:`,
//! `sysprop:`, `profile:`, `origin:`, `custom:` — followed by an unescape
//! pass that rewrites `$${...}` to the literal `${...}`. A stage substitutes
//! `${prefix:name}` only when the name is known; unknown references are left
//! completely unchanged so they stay visible for diagnosis. Escaped tokens
//! (`$${...}`) are never touched by the lookup stages, which is what lets the
//! final unescape pass turn them back into literal text.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static ENV_PATTERN: LazyLock<Regex> = LazyLock::new(|| stage_pattern("env"));
static SYSPROP_PATTERN: LazyLock<Regex> = LazyLock::new(|| stage_pattern("sysprop"));
static PROFILE_PATTERN: LazyLock<Regex> = LazyLock::new(|| stage_pattern("profile"));
static ORIGIN_PATTERN: LazyLock<Regex> = LazyLock::new(|| stage_pattern("origin"));
static CUSTOM_PATTERN: LazyLock<Regex> = LazyLock::new(|| stage_pattern("custom"));

/// Matches an escaped variable, e.g. `$${custom:var}`. Group 1 is everything
/// after the leading dollar. Variable names must not contain `:` or `}`;
/// profile authors rely on this exact boundary, so it is not generalized.
static DOUBLE_DOLLAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(\$\{[^:}]+:[^}]+\})")
        .expect("escaped-variable regex is a compile-time constant and must be valid")
});

/// Build the pattern for one lookup stage. The first alternative swallows
/// `$$`-escaped tokens so they survive the stage untouched; the second
/// captures the variable name of a substitutable token.
fn stage_pattern(prefix: &str) -> Regex {
    Regex::new(&format!(
        r"(\$\$\{{{0}:[^}}]+\}})|\$\{{{0}:([^}}]+)\}}",
        prefix
    ))
    .expect("stage regex is built from a fixed prefix and must be valid")
}

/// Run one stage over a value, replacing known names and leaving everything
/// else (unknown names, escaped tokens) as-is.
fn replace_stage(
    pattern: &Regex,
    prefix: &str,
    value: &str,
    mut lookup: impl FnMut(&str) -> Option<String>,
) -> String {
    pattern
        .replace_all(value, |caps: &Captures<'_>| {
            if caps.get(1).is_some() {
                // Escaped token; the unescape pass deals with it later.
                return caps[0].to_string();
            }
            lookup(&caps[2]).unwrap_or_else(|| {
                log::debug!("No replacement for ${{{prefix}:{}}}, keeping it as-is", &caps[2]);
                caps[0].to_string()
            })
        })
        .into_owned()
}

/// Rewrite `$${name:value}` tokens to `${name:value}`. Must run after all
/// lookup stages so escaped tokens are never mistaken for substitutable ones.
pub fn unescape_literals(value: &str) -> String {
    DOUBLE_DOLLAR_PATTERN.replace_all(value, "$1").into_owned()
}

/// The substitution context for one profile.
///
/// Stages that depend on the caller (origin headers, provider-custom
/// variables) are injected as lookup closures so this crate stays independent
/// of where those values come from.
pub struct ReplacerChain<'a> {
    sysprops: &'a HashMap<String, String>,
    profile_name: &'a str,
    profile_location: &'a Path,
    origin: &'a dyn Fn(&str) -> Option<String>,
    custom: &'a dyn Fn(&str) -> Option<String>,
}

impl<'a> ReplacerChain<'a> {
    pub fn new(
        sysprops: &'a HashMap<String, String>,
        profile_name: &'a str,
        profile_location: &'a Path,
        origin: &'a dyn Fn(&str) -> Option<String>,
        custom: &'a dyn Fn(&str) -> Option<String>,
    ) -> Self {
        Self {
            sysprops,
            profile_name,
            profile_location,
            origin,
            custom,
        }
    }

    /// Apply all five stages in order, then the unescape pass.
    pub fn apply(&self, value: &str) -> String {
        let value = replace_stage(&ENV_PATTERN, "env", value, |name| std::env::var(name).ok());
        let value = replace_stage(&SYSPROP_PATTERN, "sysprop", &value, |name| {
            self.sysprops.get(name).cloned()
        });
        let value = replace_stage(&PROFILE_PATTERN, "profile", &value, |name| match name {
            "name" => Some(self.profile_name.to_string()),
            "location" => Some(self.profile_location.display().to_string()),
            _ => None,
        });
        let value = replace_stage(&ORIGIN_PATTERN, "origin", &value, |name| (self.origin)(name));
        let value = replace_stage(&CUSTOM_PATTERN, "custom", &value, |name| (self.custom)(name));
        unescape_literals(&value)
    }
}

/// Process-property table backing the `sysprop:` stage.
///
/// There is no JVM-style system-property space here, so a small set of
/// standard entries is derived from the process environment instead.
pub fn process_properties() -> HashMap<String, String> {
    let mut props = HashMap::new();
    if let Some(home) = dirs::home_dir() {
        props.insert("user.home".to_string(), home.display().to_string());
    }
    if let Ok(user) = std::env::var("USER").or_else(|_| std::env::var("USERNAME")) {
        props.insert("user.name".to_string(), user);
    }
    if let Ok(cwd) = std::env::current_dir() {
        props.insert("user.dir".to_string(), cwd.display().to_string());
    }
    props.insert("os.name".to_string(), std::env::consts::OS.to_string());
    props.insert("os.arch".to_string(), std::env::consts::ARCH.to_string());
    props.insert(
        "tmp.dir".to_string(),
        std::env::temp_dir().display().to_string(),
    );
    props
}
