//! Reduce final resource states into the check's verdict.

use std::sync::Arc;

use crate::error::{ResourceFailure, StatusCheckError, UnstableResources};
use crate::resource::Resource;

/// Verdict over the final resource collection.
///
/// Only a status error counts as failure; details text such as "pending" or
/// "running" does not. Failures keep the input order.
pub fn deploy_status(resources: &[Arc<dyn Resource>]) -> Result<(), StatusCheckError> {
    let failures: Vec<ResourceFailure> = resources
        .iter()
        .filter_map(|r| {
            r.status().error.map(|error| ResourceFailure {
                resource: r.display_id(),
                error,
            })
        })
        .collect();

    if failures.is_empty() {
        return Ok(());
    }
    Err(UnstableResources { failures }.into())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::resource::{Deployment, StatusError};

    fn with_status(name: &str, details: &str, error: Option<&str>) -> Arc<dyn Resource> {
        let d = Deployment::new(name, "test", Duration::from_secs(1));
        d.update_status(details, error.map(|e| StatusError::Failed(e.to_string())));
        Arc::new(d)
    }

    #[test]
    fn one_error() {
        let deps = vec![
            with_status("dep1", "success", None),
            with_status("dep2", "error", Some("could not return within default timeout")),
        ];
        let err = deploy_status(&deps).unwrap_err();
        assert!(
            err.to_string()
                .contains("dep2 failed due to could not return within default timeout")
        );
        assert!(!err.to_string().contains("dep1"));
    }

    #[test]
    fn no_error_despite_non_final_details() {
        let deps = vec![
            with_status("dep1", "success", None),
            with_status("dep2", "running", None),
            with_status("dep3", "pending", None),
        ];
        assert!(deploy_status(&deps).is_ok());
    }

    #[test]
    fn multiple_errors_in_input_order() {
        let deps = vec![
            with_status("dep1", "success", None),
            with_status("dep2", "error", Some("could not return within default timeout")),
            with_status("dep3", "error", Some("ERROR")),
        ];
        let err = deploy_status(&deps).unwrap_err();
        let msg = err.to_string();
        assert_eq!(
            msg,
            "test:deployment/dep2 failed due to could not return within default timeout\n\
             test:deployment/dep3 failed due to ERROR"
        );

        match err {
            StatusCheckError::Unstable(unstable) => {
                let ids: Vec<_> = unstable.failures.iter().map(|f| f.resource.as_str()).collect();
                assert_eq!(ids, vec!["test:deployment/dep2", "test:deployment/dep3"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn empty_collection_succeeds() {
        assert!(deploy_status(&[]).is_ok());
    }
}
