use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::rules::DEFAULT_BATCH_SIZE;

/// Engine tunables, read from `config.toml` in the project config directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Sources with more rows than this run on the background worker.
    pub route_threshold: usize,
    pub batch_size: usize,
    /// Minimum percent advance between two worker progress messages.
    pub progress_step: u8,
    pub max_file_size: u64,
    pub max_rows: usize,
    pub preview_rows: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            route_threshold: 2000,
            batch_size: DEFAULT_BATCH_SIZE,
            progress_step: 2,
            max_file_size: 10 * 1024 * 1024,
            max_rows: 100_000,
            preview_rows: 200,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            bail!("batch_size must be at least 1");
        }
        if self.progress_step == 0 || self.progress_step > 100 {
            bail!("progress_step must be between 1 and 100");
        }
        Ok(())
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content).context("failed to parse engine config")?;
        config.validate()?;
        Ok(config)
    }
}

/// Missing file means defaults; a malformed one is an error.
pub fn load_config(path: &Path) -> Result<EngineConfig> {
    if !path.exists() {
        log::debug!("no config at {}, using defaults", path.display());
        return Ok(EngineConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    EngineConfig::from_toml(&content).with_context(|| format!("invalid config: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config = EngineConfig::from_toml("route_threshold = 50\nbatch_size = 10\n")
            .expect("partial config should parse");

        assert_eq!(config.route_threshold, 50);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.progress_step, 2);
        assert_eq!(config.max_rows, 100_000);
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let err = EngineConfig::from_toml("batch_size = 0").expect_err("zero batch should fail");
        assert!(err.to_string().contains("batch_size"), "{err}");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = std::env::temp_dir().join("rulexcel-config-does-not-exist.toml");
        let config = load_config(&path).expect("missing config should not fail");
        assert_eq!(config, EngineConfig::default());
    }
}
