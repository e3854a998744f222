//! rollwatch.toml configuration parser.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Deadline used when none is configured (or zero is configured).
pub const DEFAULT_DEADLINE_SECS: u64 = 600;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_REPORT_INTERVAL_MS: u64 = 3_000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RollwatchConfig {
    #[serde(default)]
    pub namespaces: Vec<String>,
    #[serde(default)]
    pub status_check: StatusCheckConfig,
    #[serde(default)]
    pub kubectl: KubectlConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusCheckConfig {
    pub deadline_secs: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub report_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KubectlConfig {
    pub binary: Option<String>,
    pub context: Option<String>,
    pub kubeconfig: Option<PathBuf>,
}

impl RollwatchConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        content.parse()
    }
}

impl std::str::FromStr for RollwatchConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

impl StatusCheckConfig {
    /// Global rollout deadline. Unset or zero falls back to
    /// [`DEFAULT_DEADLINE_SECS`].
    pub fn deadline(&self) -> Duration {
        match self.deadline_secs {
            Some(secs) if secs > 0 => Duration::from_secs(secs),
            _ => Duration::from_secs(DEFAULT_DEADLINE_SECS),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(positive_or(self.poll_interval_ms, DEFAULT_POLL_INTERVAL_MS))
    }

    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(positive_or(self.report_interval_ms, DEFAULT_REPORT_INTERVAL_MS))
    }
}

impl KubectlConfig {
    pub fn binary(&self) -> &str {
        self.binary.as_deref().unwrap_or("kubectl")
    }
}

fn positive_or(value: Option<u64>, default: u64) -> u64 {
    value.filter(|v| *v > 0).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = StatusCheckConfig::default();
        assert_eq!(cfg.deadline(), Duration::from_secs(600));
        assert_eq!(cfg.poll_interval(), Duration::from_millis(100));
        assert_eq!(cfg.report_interval(), Duration::from_secs(3));
        assert_eq!(KubectlConfig::default().binary(), "kubectl");
    }

    #[test]
    fn zero_deadline_falls_back_to_default() {
        let cfg = StatusCheckConfig {
            deadline_secs: Some(0),
            ..Default::default()
        };
        assert_eq!(cfg.deadline(), Duration::from_secs(DEFAULT_DEADLINE_SECS));
    }

    #[test]
    fn parse_full() {
        let toml_str = r#"
namespaces = ["default", "staging"]

[status_check]
deadline_secs = 120
poll_interval_ms = 250

[kubectl]
context = "kind-dev"
"#;
        let config: RollwatchConfig = toml_str.parse().unwrap();
        assert_eq!(config.namespaces, vec!["default", "staging"]);
        assert_eq!(config.status_check.deadline(), Duration::from_secs(120));
        assert_eq!(config.status_check.poll_interval(), Duration::from_millis(250));
        assert_eq!(config.status_check.report_interval(), Duration::from_secs(3));
        assert_eq!(config.kubectl.context.as_deref(), Some("kind-dev"));
    }

    #[test]
    fn parse_empty() {
        let config: RollwatchConfig = "".parse().unwrap();
        assert_eq!(config, RollwatchConfig::default());
    }

    #[test]
    fn parse_rejects_bad_types() {
        let err = "[status_check]\ndeadline_secs = \"soon\"\n"
            .parse::<RollwatchConfig>()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn from_file_reads_and_reports_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rollwatch.toml");
        std::fs::write(&path, "namespaces = [\"apps\"]\n").unwrap();
        let config = RollwatchConfig::from_file(&path).unwrap();
        assert_eq!(config.namespaces, vec!["apps"]);

        let missing = dir.path().join("missing.toml");
        let err = RollwatchConfig::from_file(&missing).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
