use rollwatch_kube::ClientError;

use crate::resource::StatusError;

#[derive(Debug, thiserror::Error)]
pub enum StatusCheckError {
    /// Listing workloads failed. Raised before any monitor starts.
    #[error("could not fetch deployments in namespace {namespace}: {source}")]
    Discovery {
        namespace: String,
        source: ClientError,
    },

    /// One or more resources ended in error.
    #[error(transparent)]
    Unstable(#[from] UnstableResources),
}

/// A resource whose final status carried an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{resource} failed due to {error}")]
pub struct ResourceFailure {
    pub resource: String,
    pub error: StatusError,
}

/// Combined failure: one line per failed resource, in check order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", join_lines(.failures))]
pub struct UnstableResources {
    pub failures: Vec<ResourceFailure>,
}

fn join_lines(failures: &[ResourceFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
