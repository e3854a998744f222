//! Resource discovery and deadline resolution.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use rollwatch_core::config::DEFAULT_DEADLINE_SECS;
use rollwatch_core::{Labeller, Workload, WorkloadKind};
use rollwatch_kube::ClusterClient;

use crate::error::StatusCheckError;
use crate::resource::{Deployment, Resource};

/// Deadline actually enforced for one resource.
///
/// A declared deadline within `(0, global]` is honoured; an unset deadline
/// or one above the global bound resolves to `global`. A zero `global` means
/// unset and becomes [`DEFAULT_DEADLINE_SECS`], so the result is never zero.
pub fn effective_deadline(declared: Option<Duration>, global: Duration) -> Duration {
    let global = if global.is_zero() {
        Duration::from_secs(DEFAULT_DEADLINE_SECS)
    } else {
        global
    };
    match declared {
        Some(d) if !d.is_zero() && d <= global => d,
        _ => global,
    }
}

/// Declared progress deadline in seconds; non-positive means unset.
pub fn declared_deadline(secs: Option<i32>) -> Option<Duration> {
    secs.and_then(|s| u64::try_from(s).ok())
        .filter(|s| *s > 0)
        .map(Duration::from_secs)
}

/// Resources in `namespace` owned by the current run.
///
/// The run selector is passed to the cluster, and ownership plus namespace
/// are re-checked on every returned workload.
pub async fn discover(
    client: &dyn ClusterClient,
    namespace: &str,
    labeller: &Labeller,
    global_deadline: Duration,
) -> Result<Vec<Arc<dyn Resource>>, StatusCheckError> {
    let workloads = client
        .list_workloads(namespace, &labeller.selector())
        .await
        .map_err(|source| StatusCheckError::Discovery {
            namespace: namespace.to_string(),
            source,
        })?;

    let resources: Vec<Arc<dyn Resource>> = workloads
        .iter()
        .filter(|w| w.namespace == namespace && labeller.owns(&w.labels))
        .map(|w| to_resource(w, global_deadline))
        .collect();

    debug!(
        %namespace,
        listed = workloads.len(),
        owned = resources.len(),
        "discovered resources"
    );
    Ok(resources)
}

/// [`discover`] across several namespaces, concatenated in order. The first
/// listing failure aborts.
pub async fn discover_all(
    client: &dyn ClusterClient,
    namespaces: &[String],
    labeller: &Labeller,
    global_deadline: Duration,
) -> Result<Vec<Arc<dyn Resource>>, StatusCheckError> {
    let mut resources = Vec::new();
    for namespace in namespaces {
        resources.extend(discover(client, namespace, labeller, global_deadline).await?);
    }
    info!(
        run_id = %labeller.run_id(),
        count = resources.len(),
        "resources to check"
    );
    Ok(resources)
}

fn to_resource(workload: &Workload, global_deadline: Duration) -> Arc<dyn Resource> {
    let deadline = effective_deadline(
        declared_deadline(workload.progress_deadline_secs),
        global_deadline,
    );
    match workload.kind {
        WorkloadKind::Deployment => Arc::new(Deployment::new(
            &workload.name,
            &workload.namespace,
            deadline,
        )),
    }
}
