mod types;

pub use types::*;

use crate::rules::RuleMatcher;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Locations searched, in order, when no config path is given.
pub const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "./transforge.toml",
    "~/.transforge.toml",
    "~/.config/transforge/config.toml",
];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    load_config_from_str(&content)
        .with_context(|| format!("Invalid config file: {:?}", path))
}

/// Parse, validate and prepare configuration from TOML text.
pub fn load_config_from_str(content: &str) -> Result<Config> {
    let mut config: Config = toml::from_str(content).context("Failed to parse config")?;

    validate_config(&config)?;

    prepare(&mut config)?;

    Ok(config)
}

/// Load config from the given path, or the first default location that exists.
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(&expand(path));
    }

    for path_str in DEFAULT_CONFIG_PATHS {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("Using config file {}", path.display());
            return load_config(path);
        }
    }

    anyhow::bail!(
        "No config file found (searched {}); pass one with -y",
        DEFAULT_CONFIG_PATHS.join(", ")
    )
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref())
}

fn prepare(config: &mut Config) -> Result<()> {
    if let Some(queue_file) = &config.config.default_queue_file {
        config.config.default_queue_file = Some(expand(queue_file));
    }

    config.matcher = RuleMatcher::compile(&config.rules, &config.profiles)?;

    Ok(())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.config.concurrent_jobs == 0 {
        anyhow::bail!("concurrent_jobs must be at least 1");
    }

    if config.config.queue_capacity == 0 {
        anyhow::bail!("queue_capacity must be at least 1");
    }

    for (name, profile) in &config.profiles {
        if name.eq_ignore_ascii_case(SKIP_PROFILE) {
            anyhow::bail!("'{}' is reserved and cannot be used as a profile name", name);
        }
        if profile.extension.trim_start_matches('.').is_empty() {
            anyhow::bail!("Profile '{}' has an empty extension", name);
        }
    }

    Ok(())
}
