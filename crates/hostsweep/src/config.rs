//! Configuration loading

use std::path::{Path, PathBuf};

use eyre::WrapErr;
use hostsweep_core::SweepConfig;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "HOSTSWEEP_CONFIG";

/// Parse and validate a TOML configuration
///
/// # Errors
/// Returns error if the TOML is malformed or a value is out of range
pub fn parse(content: &str) -> eyre::Result<SweepConfig> {
    let config: SweepConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from file
///
/// # Errors
/// Returns error if file cannot be read or parsed
pub fn load(path: &Path) -> eyre::Result<SweepConfig> {
    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    parse(&content).wrap_err_with(|| format!("invalid configuration in {}", path.display()))
}

/// Load from an explicit path, the default paths, or use defaults
///
/// Runs before logging is set up, so the file used (if any) is returned
/// alongside the configuration.
///
/// # Errors
/// Returns error if a config file exists but cannot be loaded
pub fn load_default(explicit: Option<&Path>) -> eyre::Result<(SweepConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        return Ok((load(path)?, Some(path.to_path_buf())));
    }

    // Check environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(path);
        return Ok((load(&path)?, Some(path)));
    }

    for path in default_paths() {
        if path.exists() {
            return Ok((load(&path)?, Some(path)));
        }
    }

    Ok((SweepConfig::default(), None))
}

/// Config file locations, most specific first
fn default_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        PathBuf::from("hostsweep.toml"),
        PathBuf::from("/etc/hostsweep/hostsweep.toml"),
    ];
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("hostsweep/hostsweep.toml"));
    }
    paths
}
