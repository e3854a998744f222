//! rollwatch-kube — the cluster boundary of the status checker.
//!
//! The status engine only needs two remote operations: list the workloads
//! of a namespace, and fetch the current rollout condition of one workload.
//! [`ClusterClient`] captures exactly that.
//!
//! # Implementations
//!
//! - [`KubectlClient`] shells out to `kubectl`, which owns authentication
//!   and kubeconfig resolution.
//! - [`FakeCluster`] is an in-memory cluster with scripted rollout
//!   conditions, used by tests across the workspace.

pub mod client;
pub mod fake;
pub mod kubectl;

pub use client::{ClientError, ClientFuture, ClusterClient};
pub use fake::FakeCluster;
pub use kubectl::KubectlClient;
