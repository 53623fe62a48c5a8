//! Daemon configuration.
//!
//! Carried inside the `Initialize` request, and also loadable by the binary
//! from a JSON file (`--config <path>`, falling back to `LOAM_CONFIG_PATH`).
//! A broken config never prevents startup: it logs a warning and falls back
//! to defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

const DEFAULT_FLUSH_SECS: u64 = 30;

fn default_flush_secs() -> u64 {
    DEFAULT_FLUSH_SECS
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    #[serde(default = "default_flush_secs")]
    pub telemetry_flush_interval_secs: u64,
    /// Where the rolling log goes. Defaults to `loam-daemon.log` under the OS
    /// temp directory.
    pub log_file: Option<PathBuf>,
    pub verbose: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            telemetry_flush_interval_secs: DEFAULT_FLUSH_SECS,
            log_file: None,
            verbose: false,
        }
    }
}

impl DaemonConfig {
    pub fn telemetry_flush_interval(&self) -> Duration {
        Duration::from_secs(self.telemetry_flush_interval_secs.max(1))
    }

    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Resolve the config for this process: the explicit `--config` argument,
    /// then `LOAM_CONFIG_PATH`, then defaults.
    pub fn load(config_arg: Option<&Path>) -> Self {
        let path = config_arg
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("LOAM_CONFIG_PATH").map(PathBuf::from));
        let Some(path) = path else {
            return Self::default();
        };
        match Self::load_from_path(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!(
                    "loam-daemon: failed to load config from {}: {err}",
                    path.display()
                );
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: DaemonConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, DaemonConfig::default());

        let config: DaemonConfig =
            serde_json::from_str(r#"{"telemetry_flush_interval_secs": 5}"#).unwrap();
        assert_eq!(config.telemetry_flush_interval(), Duration::from_secs(5));
        assert!(!config.verbose);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let config = DaemonConfig {
            telemetry_flush_interval_secs: 0,
            ..DaemonConfig::default()
        };
        assert_eq!(config.telemetry_flush_interval(), Duration::from_secs(1));
    }
}
