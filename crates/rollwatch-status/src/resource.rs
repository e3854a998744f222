//! Observable rollout state of a single workload.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rollwatch_core::WorkloadKind;

/// Why a resource is unhealthy. Carried on its [`Status`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusError {
    #[error("deployment rollout status could not be fetched within {deadline:?}")]
    DeadlineExceeded { deadline: Duration },

    #[error("status check cancelled")]
    Cancelled,

    /// The cluster reported the rollout as failed.
    #[error("{0}")]
    Rollout(String),

    /// A single poll attempt failed; retried on the next tick.
    #[error("{0}")]
    Poll(String),

    #[error("{0}")]
    Failed(String),
}

/// Latest observed status: free-form details plus an optional error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    pub details: String,
    pub error: Option<StatusError>,
}

impl Status {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Capability set shared by every observable workload kind.
///
/// A resource is written only by its own monitor and read by the reporter
/// and aggregator. Once [`Resource::mark_done`] has been called the status
/// is frozen.
pub trait Resource: Send + Sync + fmt::Debug {
    fn kind(&self) -> WorkloadKind;
    fn namespace(&self) -> &str;
    fn name(&self) -> &str;
    /// Effective deadline for this resource's rollout.
    fn deadline(&self) -> Duration;
    fn status(&self) -> Status;
    /// Replace the current status. Ignored once the resource is done.
    fn update_status(&self, details: &str, error: Option<StatusError>);
    fn mark_done(&self);
    fn is_done(&self) -> bool;

    /// `<namespace>:<kind>/<name>`
    fn display_id(&self) -> String {
        format!("{}:{}/{}", self.namespace(), self.kind(), self.name())
    }
}

impl fmt::Display for dyn Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_id())
    }
}

/// A `Deployment` workload.
#[derive(Debug)]
pub struct Deployment {
    name: String,
    namespace: String,
    deadline: Duration,
    status: Mutex<Status>,
    done: AtomicBool,
}

impl Deployment {
    pub fn new(name: &str, namespace: &str, deadline: Duration) -> Self {
        Self {
            name: name.to_string(),
            namespace: namespace.to_string(),
            deadline,
            status: Mutex::new(Status::default()),
            done: AtomicBool::new(false),
        }
    }
}

impl Resource for Deployment {
    fn kind(&self) -> WorkloadKind {
        WorkloadKind::Deployment
    }

    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn deadline(&self) -> Duration {
        self.deadline
    }

    fn status(&self) -> Status {
        self.status
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn update_status(&self, details: &str, error: Option<StatusError>) {
        let mut status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
        // Checked under the lock so a racing mark_done cannot be overwritten.
        if self.done.load(Ordering::Acquire) {
            return;
        }
        *status = Status {
            details: details.to_string(),
            error,
        };
    }

    fn mark_done(&self) {
        let _status = self.status.lock().unwrap_or_else(PoisonError::into_inner);
        self.done.store(true, Ordering::Release);
    }

    fn is_done(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }
}

/// Insertion-ordered arena of resources, indexed by display identity.
#[derive(Debug, Default, Clone)]
pub struct Resources {
    items: Vec<Arc<dyn Resource>>,
    index: HashMap<String, usize>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resource and return its position. A resource whose identity
    /// is already present is not added twice.
    pub fn push(&mut self, resource: Arc<dyn Resource>) -> usize {
        let id = resource.display_id();
        if let Some(&pos) = self.index.get(&id) {
            return pos;
        }
        let pos = self.items.len();
        self.items.push(resource);
        self.index.insert(id, pos);
        pos
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Resource>> {
        self.index.get(id).map(|&pos| &self.items[pos])
    }

    pub fn at(&self, pos: usize) -> Option<&Arc<dyn Resource>> {
        self.items.get(pos)
    }

    pub fn as_slice(&self) -> &[Arc<dyn Resource>] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<Arc<dyn Resource>> for Resources {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Resource>>>(iter: I) -> Self {
        let mut resources = Resources::new();
        for r in iter {
            resources.push(r);
        }
        resources
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dep(name: &str) -> Arc<dyn Resource> {
        Arc::new(Deployment::new(name, "test", Duration::from_secs(1)))
    }

    #[test]
    fn display_identity() {
        let d = Deployment::new("dep", "test", Duration::from_secs(5));
        assert_eq!(d.display_id(), "test:deployment/dep");
        let r: Arc<dyn Resource> = Arc::new(d);
        assert_eq!(r.to_string(), "test:deployment/dep");
    }

    #[test]
    fn update_overwrites_without_finishing() {
        let d = Deployment::new("dep", "test", Duration::from_secs(5));
        d.update_status("pending", Some(StatusError::Poll("refused".into())));
        d.update_status("running", None);
        assert_eq!(
            d.status(),
            Status {
                details: "running".into(),
                error: None
            }
        );
        assert!(!d.is_done());
    }

    #[test]
    fn done_is_idempotent_and_freezes_status() {
        let d = Deployment::new("dep", "test", Duration::from_secs(5));
        d.update_status("ready", None);
        d.mark_done();
        d.mark_done();
        assert!(d.is_done());

        d.update_status("late", Some(StatusError::Cancelled));
        assert_eq!(d.status().details, "ready");
        assert!(!d.status().is_error());
    }

    #[test]
    fn error_text() {
        let timeout = StatusError::DeadlineExceeded {
            deadline: Duration::from_secs(200),
        };
        assert_eq!(
            timeout.to_string(),
            "deployment rollout status could not be fetched within 200s"
        );
        assert_eq!(StatusError::Cancelled.to_string(), "status check cancelled");
        assert_eq!(StatusError::Rollout("stuck".into()).to_string(), "stuck");
    }

    #[test]
    fn arena_keeps_order_and_indexes_by_identity() {
        let resources: Resources = vec![dep("b"), dep("a"), dep("b")].into_iter().collect();
        assert_eq!(resources.len(), 2);
        let names: Vec<_> = resources.as_slice().iter().map(|r| r.name().to_string()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(resources.get("test:deployment/a").map(|r| r.name()), Some("a"));
        assert!(resources.get("test:deployment/c").is_none());
        assert_eq!(resources.at(1).map(|r| r.name()), Some("a"));
    }
}
