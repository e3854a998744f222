//! The cluster client contract.

use std::future::Future;
use std::pin::Pin;

use rollwatch_core::{RolloutCondition, Workload, WorkloadKind};

/// Future returned by [`ClusterClient`] operations.
pub type ClientFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ClientError>> + Send + 'a>>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("`{command}` failed ({status}): {stderr}")]
    Command {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("could not decode cluster response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Api(String),
}

/// Remote operations the status checker performs against a cluster.
///
/// Both calls are opaque and may fail; callers decide whether a failure is
/// fatal (listing) or transient (rollout status).
pub trait ClusterClient: Send + Sync {
    /// List workloads in `namespace` matching the equality `selector`.
    fn list_workloads<'a>(
        &'a self,
        namespace: &'a str,
        selector: &'a str,
    ) -> ClientFuture<'a, Vec<Workload>>;

    /// Fetch the current rollout condition of one workload.
    fn rollout_status<'a>(
        &'a self,
        kind: WorkloadKind,
        namespace: &'a str,
        name: &'a str,
    ) -> ClientFuture<'a, RolloutCondition>;
}
