//! Initialize the configuration directory: create ~/.callsync and a default config file.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Create the config directory and a default `config.json` if they do not exist.
/// The default file carries the full property map so operators can see what
/// is tunable without reading the source.
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if !config_path.exists() {
        let default_config = serde_json::to_string_pretty(&crate::config::Config::default())
            .context("serializing default config")?;
        std::fs::write(config_path, default_config)
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
        log::info!("created default config at {}", config_path.display());
    } else {
        log::debug!("config already exists at {}, skipping", config_path.display());
    }

    Ok(config_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_writes_parseable_default_config() {
        let dir = std::env::temp_dir().join(format!("callsync-init-test-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let config_path = dir.join("config.json");
        init_config_dir(&config_path).unwrap();
        let s = std::fs::read_to_string(&config_path).unwrap();
        let config: crate::config::Config = serde_json::from_str(&s).unwrap();
        assert_eq!(config.matcher.anchor, "WeDo");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
