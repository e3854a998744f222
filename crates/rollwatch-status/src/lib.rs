//! rollwatch-status — rollout status checking for a deploy run.
//!
//! Given the namespaces a run deployed into, the checker finds the workloads
//! carrying the run's id, watches each one's rollout concurrently under its
//! own deadline, streams progress lines, and reduces the final states into a
//! single verdict.
//!
//! # Architecture
//!
//! ```text
//! StatusChecker::check
//!   ├── discovery::discover_all  → Vec<Arc<dyn Resource>>  (fatal on error)
//!   ├── one monitor task per resource
//!   │   └── monitor::poll_resource (poll interval, deadline, shutdown)
//!   ├── reporter task
//!   │   └── report::print_status every report interval
//!   ├── report::print_summary as each monitor finishes
//!   └── aggregate::deploy_status after every monitor has joined
//! ```
//!
//! Each resource owns its lock; monitors write only their own resource and
//! the reporter only reads.

pub mod aggregate;
pub mod checker;
pub mod discovery;
pub mod error;
pub mod monitor;
pub mod report;
pub mod resource;

pub use aggregate::deploy_status;
pub use checker::{StatusCheckSettings, StatusChecker};
pub use error::{ResourceFailure, StatusCheckError, UnstableResources};
pub use resource::{Deployment, Resource, Resources, Status, StatusError};
