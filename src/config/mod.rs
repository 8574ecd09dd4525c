// Author: Dustin Pilgrim
// License: MIT

pub mod model;
pub mod parser;

use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use rune_cfg::RuneConfig;
use tracing::{debug, info, warn};

pub use model::TabtimeConfig;

/// Shipped configuration; also what a missing user file amounts to.
pub const INTERNAL_DEFAULT: &str = include_str!("../../assets/tabtime.rune");

pub fn resolve_default_config_path() -> PathBuf {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"))
        .join("tabtime")
        .join("tabtime.rune")
}

pub fn load_from_path(path: &Path) -> Result<TabtimeConfig> {
    let path_buf = path.to_path_buf();
    let config = RuneConfig::from_file(&path_buf)
        .wrap_err_with(|| format!("failed to load config from {}", path.display()))?;
    Ok(parser::parse_tabtime_config(&config))
}

fn load_internal_default() -> TabtimeConfig {
    match RuneConfig::from_str(INTERNAL_DEFAULT) {
        Ok(config) => parser::parse_tabtime_config(&config),
        Err(e) => {
            warn!(error = %e, "internal default config did not parse, using built-in values");
            TabtimeConfig::default()
        }
    }
}

/// Load `path` (or the default location). Never fails: a missing file
/// means defaults, an unreadable one is reported and also means defaults.
pub fn load(path: Option<&Path>) -> TabtimeConfig {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(resolve_default_config_path);

    if !path.exists() {
        debug!(path = %path.display(), "no config file, using defaults");
        return load_internal_default();
    }

    match load_from_path(&path) {
        Ok(cfg) => {
            info!(path = %path.display(), "config loaded");
            cfg
        }
        Err(e) => {
            warn!(error = ?e, "config unreadable, using defaults");
            load_internal_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let cfg = load(Some(&dir.path().join("nope.rune")));
        assert_eq!(cfg, TabtimeConfig::default());
    }

    #[test]
    fn user_file_overrides_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("tabtime.rune");
        std::fs::write(&path, "tabtime:\n  flush_period_seconds 5\nend\n").expect("write");

        let cfg = load(Some(&path));
        assert_eq!(cfg.flush_period_seconds, 5);
        assert_eq!(cfg.tick_interval_ms, 1000);
    }

    #[test]
    fn default_path_is_under_config_dir() {
        assert!(resolve_default_config_path().ends_with("tabtime/tabtime.rune"));
    }
}
