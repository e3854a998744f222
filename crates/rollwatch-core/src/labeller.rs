//! Run identity.
//!
//! Every invocation of a deploy carries a run id. The deploy side tags the
//! workloads it applies with [`RUN_ID_LABEL`]; the status check uses the
//! same key/value pair to find the workloads belonging to this run.

use std::collections::BTreeMap;

use uuid::Uuid;

/// Label key carrying the run id on owned workloads.
pub const RUN_ID_LABEL: &str = "rollwatch.dev/run-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labeller {
    run_id: String,
}

impl Labeller {
    /// Create a labeller for `run_id`, generating a fresh id when empty.
    pub fn new(run_id: &str) -> Self {
        let run_id = if run_id.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            run_id.to_string()
        };
        Self { run_id }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn label_key(&self) -> &'static str {
        RUN_ID_LABEL
    }

    /// Labels to attach to every workload created by this run.
    pub fn labels(&self) -> BTreeMap<String, String> {
        BTreeMap::from([(RUN_ID_LABEL.to_string(), self.run_id.clone())])
    }

    /// Equality selector (`key=value`) for cluster listings.
    pub fn selector(&self) -> String {
        format!("{RUN_ID_LABEL}={}", self.run_id)
    }

    /// True iff `labels` carries the run id key with exactly this run's id.
    pub fn owns(&self, labels: &BTreeMap<String, String>) -> bool {
        labels.get(RUN_ID_LABEL).is_some_and(|v| *v == self.run_id)
    }
}
