//! In-memory cluster for tests.
//!
//! Listing returns every stored workload as-is. Namespace and selector are
//! recorded but not applied, so callers' own ownership filtering is what
//! gets exercised. Rollout conditions are scripted per workload: each poll
//! consumes the next entry and the last entry repeats forever.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rollwatch_core::{RolloutCondition, Workload, WorkloadKind};

use crate::client::{ClientError, ClientFuture, ClusterClient};

/// One scripted poll result. `Err` text becomes [`ClientError::Api`].
pub type ScriptedCondition = Result<RolloutCondition, String>;

#[derive(Debug, Default)]
pub struct FakeCluster {
    inner: Mutex<FakeState>,
}

#[derive(Debug, Default)]
struct FakeState {
    workloads: Vec<Workload>,
    scripts: HashMap<(String, String), VecDeque<ScriptedCondition>>,
    polls: HashMap<(String, String), usize>,
    list_error: Option<String>,
    listings: Vec<(String, String)>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_workload(self, workload: Workload) -> Self {
        self.state().workloads.push(workload);
        self
    }

    /// Script the conditions returned for `namespace/name`, in order.
    pub fn with_conditions(
        self,
        namespace: &str,
        name: &str,
        conditions: Vec<ScriptedCondition>,
    ) -> Self {
        self.state()
            .scripts
            .insert(key(namespace, name), conditions.into());
        self
    }

    /// Make every listing call fail with `message`.
    pub fn with_list_error(self, message: &str) -> Self {
        self.state().list_error = Some(message.to_string());
        self
    }

    /// `(namespace, selector)` of every listing call so far.
    pub fn listings(&self) -> Vec<(String, String)> {
        self.state().listings.clone()
    }

    /// Number of rollout status calls made for `namespace/name`.
    pub fn poll_count(&self, namespace: &str, name: &str) -> usize {
        self.state()
            .polls
            .get(&key(namespace, name))
            .copied()
            .unwrap_or(0)
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_condition(&self, namespace: &str, name: &str) -> ScriptedCondition {
        let mut state = self.state();
        let k = key(namespace, name);
        *state.polls.entry(k.clone()).or_default() += 1;

        match state.scripts.get_mut(&k) {
            Some(script) if script.len() > 1 => script.pop_front().unwrap_or_else(progressing),
            Some(script) => script.front().cloned().unwrap_or_else(progressing),
            None => progressing(),
        }
    }
}

impl ClusterClient for FakeCluster {
    fn list_workloads<'a>(
        &'a self,
        namespace: &'a str,
        selector: &'a str,
    ) -> ClientFuture<'a, Vec<Workload>> {
        Box::pin(async move {
            let mut state = self.state();
            state
                .listings
                .push((namespace.to_string(), selector.to_string()));
            if let Some(message) = &state.list_error {
                return Err(ClientError::Api(message.clone()));
            }
            Ok(state.workloads.clone())
        })
    }

    fn rollout_status<'a>(
        &'a self,
        _kind: WorkloadKind,
        namespace: &'a str,
        name: &'a str,
    ) -> ClientFuture<'a, RolloutCondition> {
        Box::pin(async move { self.next_condition(namespace, name).map_err(ClientError::Api) })
    }
}

fn key(namespace: &str, name: &str) -> (String, String) {
    (namespace.to_string(), name.to_string())
}

fn progressing() -> ScriptedCondition {
    Ok(RolloutCondition::Progressing(String::new()))
}
