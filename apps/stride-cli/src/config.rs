// config.rs — CLI configuration.
//
// StrideConfig determines where goal records and topic files live. The
// `for_root()` constructor generates the standard `.stride/` layout; an
// optional `.stride/config.toml` overrides the bus settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Configuration for the stride CLI.
#[derive(Debug, Clone)]
pub struct StrideConfig {
    /// Directory for the goal store (one JSON file per goal).
    pub goals_dir: PathBuf,

    /// Directory for bus topic files (one JSONL file per topic).
    pub events_dir: PathBuf,

    /// Partition count for the event bus.
    pub partitions: u32,

    /// Deadline for a single broker send.
    pub send_timeout: Duration,
}

/// Overridable settings in `.stride/config.toml`.
#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    partitions: Option<u32>,
    send_timeout_ms: Option<u64>,
}

impl StrideConfig {
    /// Config with the standard `.stride/` layout for a data root.
    pub fn for_root(root: impl AsRef<Path>) -> Self {
        let stride_dir = root.as_ref().join(".stride");
        Self {
            goals_dir: stride_dir.join("goals"),
            events_dir: stride_dir.join("events"),
            partitions: 8,
            send_timeout: Duration::from_secs(5),
        }
    }

    /// Load the config for a data root, applying `.stride/config.toml`
    /// overrides when the file exists.
    pub fn load(root: impl AsRef<Path>) -> anyhow::Result<Self> {
        let mut config = Self::for_root(&root);

        let file = root.as_ref().join(".stride").join("config.toml");
        if file.exists() {
            let raw = std::fs::read_to_string(&file)?;
            let overrides: FileConfig = toml::from_str(&raw)?;
            if let Some(partitions) = overrides.partitions {
                config.partitions = partitions;
            }
            if let Some(ms) = overrides.send_timeout_ms {
                config.send_timeout = Duration::from_millis(ms);
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_use_stride_layout() {
        let config = StrideConfig::for_root("/data");
        assert_eq!(config.goals_dir, PathBuf::from("/data/.stride/goals"));
        assert_eq!(config.events_dir, PathBuf::from("/data/.stride/events"));
        assert_eq!(config.partitions, 8);
    }

    #[test]
    fn missing_config_file_keeps_defaults() {
        let dir = tempdir().unwrap();
        let config = StrideConfig::load(dir.path()).unwrap();
        assert_eq!(config.partitions, 8);
        assert_eq!(config.send_timeout, Duration::from_secs(5));
    }

    #[test]
    fn config_file_overrides_bus_settings() {
        let dir = tempdir().unwrap();
        let stride_dir = dir.path().join(".stride");
        std::fs::create_dir_all(&stride_dir).unwrap();
        std::fs::write(
            stride_dir.join("config.toml"),
            "partitions = 16\nsend_timeout_ms = 250\n",
        )
        .unwrap();

        let config = StrideConfig::load(dir.path()).unwrap();
        assert_eq!(config.partitions, 16);
        assert_eq!(config.send_timeout, Duration::from_millis(250));
    }
}
