//! TaskLane configuration system.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TaskLaneError};
use crate::types::DEFAULT_LANE;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskLaneConfig {
    /// Lane used for jobs that do not name one.
    #[serde(default = "default_lane_name")]
    pub default_lane: String,
    /// Start every lane suspended; nothing runs until `resume()`.
    #[serde(default)]
    pub start_suspended: bool,
    /// Concurrency cap for lanes without an explicit entry.
    /// `None` means unbounded.
    #[serde(default = "default_max_concurrent")]
    pub default_max_concurrent: Option<usize>,
    /// Per-lane overrides.
    #[serde(default)]
    pub lanes: Vec<LaneConfig>,
    /// Directory for the default on-disk store.
    #[serde(default = "default_store_dir")]
    pub store_dir: PathBuf,
}

/// Per-lane configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaneConfig {
    pub name: String,
    /// `None` means unbounded; `Some(1)` is a serial lane.
    #[serde(default)]
    pub max_concurrent: Option<usize>,
}

fn default_lane_name() -> String {
    DEFAULT_LANE.to_string()
}

fn default_max_concurrent() -> Option<usize> {
    Some(4)
}

fn default_store_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".tasklane")
}

impl Default for TaskLaneConfig {
    fn default() -> Self {
        Self {
            default_lane: default_lane_name(),
            start_suspended: false,
            default_max_concurrent: default_max_concurrent(),
            lanes: Vec::new(),
            store_dir: default_store_dir(),
        }
    }
}

impl TaskLaneConfig {
    /// Load config from the default path (~/.tasklane/config.toml), or
    /// defaults when no file exists.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TaskLaneError::Config(format!("Failed to read config: {e}")))?;
        toml::from_str(&content)
            .map_err(|e| TaskLaneError::Config(format!("Failed to parse config: {e}")))
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        default_store_dir().join("config.toml")
    }

    /// Concurrency cap for a lane: explicit entry, else the default.
    pub fn max_concurrent_for(&self, lane: &str) -> Option<usize> {
        self.lanes
            .iter()
            .find(|l| l.name == lane)
            .map(|l| l.max_concurrent)
            .unwrap_or(self.default_max_concurrent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = TaskLaneConfig::default();
        assert_eq!(cfg.default_lane, DEFAULT_LANE);
        assert!(!cfg.start_suspended);
        assert_eq!(cfg.max_concurrent_for("anything"), Some(4));
    }

    #[test]
    fn test_lane_override() {
        let mut cfg = TaskLaneConfig::default();
        cfg.lanes.push(LaneConfig { name: "serial".into(), max_concurrent: Some(1) });
        cfg.lanes.push(LaneConfig { name: "wide".into(), max_concurrent: None });
        assert_eq!(cfg.max_concurrent_for("serial"), Some(1));
        assert_eq!(cfg.max_concurrent_for("wide"), None);
        assert_eq!(cfg.max_concurrent_for("other"), Some(4));
    }

    #[test]
    fn test_parse_toml() {
        let cfg: TaskLaneConfig = toml::from_str(
            r#"
            start_suspended = true
            default_max_concurrent = 2

            [[lanes]]
            name = "sync"
            max_concurrent = 1
            "#,
        )
        .unwrap();
        assert!(cfg.start_suspended);
        assert_eq!(cfg.max_concurrent_for("sync"), Some(1));
        assert_eq!(cfg.max_concurrent_for("other"), Some(2));
    }
}
