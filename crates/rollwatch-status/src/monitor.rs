//! Per-resource rollout monitor.
//!
//! A monitor polls one workload's rollout condition every poll interval
//! until the rollout completes, the cluster declares it failed, the
//! resource's deadline expires, or shutdown is requested. It always leaves
//! its resource done.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use rollwatch_core::RolloutCondition;
use rollwatch_kube::ClusterClient;

use crate::resource::{Resource, StatusError};

/// How a monitor finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorOutcome {
    Ready,
    /// The cluster reported the rollout as failed.
    Failed,
    TimedOut,
    Cancelled,
}

/// Watch `resource` until it reaches a terminal state.
///
/// The overall budget is the resource's deadline plus one poll interval, so
/// a final poll can still land after the deadline itself.
pub async fn poll_resource(
    client: Arc<dyn ClusterClient>,
    resource: Arc<dyn Resource>,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> MonitorOutcome {
    let deadline = tokio::time::sleep(resource.deadline().saturating_add(poll_interval));
    tokio::pin!(deadline);

    debug!(resource = %resource, deadline = ?resource.deadline(), "checking status");

    loop {
        tokio::select! {
            biased;
            _ = wait_for_signal(&mut shutdown) => {
                let err = StatusError::Cancelled;
                resource.update_status(&err.to_string(), Some(err));
                resource.mark_done();
                return MonitorOutcome::Cancelled;
            }
            _ = &mut deadline => {
                let err = StatusError::DeadlineExceeded { deadline: resource.deadline() };
                resource.update_status(&err.to_string(), Some(err));
                resource.mark_done();
                return MonitorOutcome::TimedOut;
            }
            outcome = poll_once(client.as_ref(), resource.as_ref(), poll_interval) => {
                if let Some(outcome) = outcome {
                    return outcome;
                }
            }
        }
    }
}

/// Sleep one interval, poll once, and record the result. Returns the
/// outcome if the resource became terminal.
async fn poll_once(
    client: &dyn ClusterClient,
    resource: &dyn Resource,
    interval: Duration,
) -> Option<MonitorOutcome> {
    tokio::time::sleep(interval).await;

    let condition = client
        .rollout_status(resource.kind(), resource.namespace(), resource.name())
        .await;

    if let Ok(condition) = &condition {
        debug!(
            resource = %resource.display_id(),
            details = condition.details(),
            terminal = condition.is_terminal(),
            "rollout condition"
        );
    }

    match condition {
        Ok(RolloutCondition::Complete(details)) => {
            resource.update_status(&details, None);
            resource.mark_done();
            Some(MonitorOutcome::Ready)
        }
        Ok(RolloutCondition::Progressing(details)) => {
            resource.update_status(&details, None);
            None
        }
        Ok(RolloutCondition::Failed(details)) => {
            resource.update_status(&details, Some(StatusError::Rollout(details.clone())));
            resource.mark_done();
            Some(MonitorOutcome::Failed)
        }
        Err(e) => {
            debug!(resource = %resource.display_id(), error = %e, "rollout status poll failed");
            let msg = e.to_string();
            resource.update_status(&msg, Some(StatusError::Poll(msg.clone())));
            None
        }
    }
}

/// Resolves once the channel holds `true`. A closed channel that never
/// signalled never resolves.
pub(crate) async fn wait_for_signal(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|signalled| *signalled).await.is_err() {
        std::future::pending::<()>().await;
    }
}
