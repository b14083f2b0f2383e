pub mod config;
pub mod monitor;
pub mod run;

use std::path::Path;

use anyhow::Context;
use sw_core::config::Config;

/// Load and validate the configuration, from `path` when given.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => Config::load().context("failed to load config")?,
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_and_validates_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[general]\ndry_run = true\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert!(config.general.dry_run);
        assert_eq!(config.monitor.base_threshold_minutes, 15);
    }

    #[test]
    fn rejects_overlapping_sets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[classification]\nmanaged_categories = [\"keep\"]\nprotected_categories = [\"keep\"]\n",
        )
        .unwrap();

        let err = load_config(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("both managed and protected"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_config(Some(&dir.path().join("nope.toml"))).is_err());
    }
}
