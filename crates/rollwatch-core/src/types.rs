//! Shared types used across rollwatch crates.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of workload whose rollout can be observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkloadKind {
    Deployment,
}

impl WorkloadKind {
    /// Lower-case kind name as used in display identities and `kubectl`
    /// resource arguments.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadKind::Deployment => "deployment",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A workload as returned by a cluster listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workload {
    pub kind: WorkloadKind,
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Declared rollout deadline (`spec.progressDeadlineSeconds`). May be
    /// absent, zero, or negative on malformed objects.
    #[serde(default)]
    pub progress_deadline_secs: Option<i32>,
}

impl Workload {
    /// Build a deployment workload with no labels and no declared deadline.
    pub fn deployment(namespace: &str, name: &str) -> Self {
        Self {
            kind: WorkloadKind::Deployment,
            namespace: namespace.to_string(),
            name: name.to_string(),
            labels: BTreeMap::new(),
            progress_deadline_secs: None,
        }
    }

    pub fn with_label(mut self, key: &str, value: &str) -> Self {
        self.labels.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_progress_deadline(mut self, secs: i32) -> Self {
        self.progress_deadline_secs = Some(secs);
        self
    }
}

/// Live rollout condition of a single workload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RolloutCondition {
    /// Rollout still converging. Carries the cluster's progress message.
    Progressing(String),
    /// Rollout finished and the workload is healthy.
    Complete(String),
    /// The cluster declared the rollout failed (e.g. progress deadline
    /// exceeded).
    Failed(String),
}

impl RolloutCondition {
    pub fn details(&self) -> &str {
        match self {
            RolloutCondition::Progressing(d)
            | RolloutCondition::Complete(d)
            | RolloutCondition::Failed(d) => d,
        }
    }

    /// Whether no further condition changes are expected.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RolloutCondition::Progressing(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_renders_lowercase() {
        assert_eq!(WorkloadKind::Deployment.to_string(), "deployment");
    }

    #[test]
    fn workload_builder() {
        let w = Workload::deployment("test", "dep1")
            .with_label("app", "web")
            .with_progress_deadline(30);
        assert_eq!(w.namespace, "test");
        assert_eq!(w.labels.get("app").map(String::as_str), Some("web"));
        assert_eq!(w.progress_deadline_secs, Some(30));
    }

    #[test]
    fn only_progressing_is_non_terminal() {
        assert!(!RolloutCondition::Progressing("waiting".into()).is_terminal());
        assert!(RolloutCondition::Complete("done".into()).is_terminal());
        assert!(RolloutCondition::Failed("stuck".into()).is_terminal());
    }
}
