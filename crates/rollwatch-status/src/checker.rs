//! Status check orchestrator.
//!
//! Discovers the run's resources, spawns one monitor per resource plus a
//! periodic reporter, prints a summary line as each monitor finishes and
//! returns the aggregate verdict once every monitor has joined.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use rollwatch_core::{Labeller, StatusCheckConfig};
use rollwatch_kube::ClusterClient;

use crate::aggregate::deploy_status;
use crate::discovery::discover_all;
use crate::error::StatusCheckError;
use crate::monitor::{poll_resource, wait_for_signal};
use crate::report::{print_status, print_summary};
use crate::resource::{Resource, Resources, StatusError};

/// Timing knobs for a status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCheckSettings {
    /// Delay between two rollout status polls of the same resource.
    pub poll_interval: Duration,
    /// Delay between two progress reports.
    pub report_interval: Duration,
}

impl Default for StatusCheckSettings {
    fn default() -> Self {
        Self::from(&StatusCheckConfig::default())
    }
}

impl From<&StatusCheckConfig> for StatusCheckSettings {
    fn from(config: &StatusCheckConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            report_interval: config.report_interval(),
        }
    }
}

/// Waits for the workloads of one deploy run to finish rolling out.
pub struct StatusChecker {
    client: Arc<dyn ClusterClient>,
    settings: StatusCheckSettings,
}

impl StatusChecker {
    pub fn new(client: Arc<dyn ClusterClient>, settings: StatusCheckSettings) -> Self {
        Self { client, settings }
    }

    /// Check every workload of this run in `namespace`.
    ///
    /// Progress and summary lines go to `out`. Sending `true` on `shutdown`
    /// cancels the check; every unfinished resource then fails as cancelled.
    pub async fn check<W>(
        &self,
        namespace: &str,
        labeller: &Labeller,
        deadline: Duration,
        out: Arc<Mutex<W>>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<(), StatusCheckError>
    where
        W: Write + Send + 'static,
    {
        self.check_namespaces(&[namespace.to_string()], labeller, deadline, out, shutdown)
            .await
    }

    /// [`StatusChecker::check`] over several namespaces at once.
    pub async fn check_namespaces<W>(
        &self,
        namespaces: &[String],
        labeller: &Labeller,
        deadline: Duration,
        out: Arc<Mutex<W>>,
        shutdown: watch::Receiver<bool>,
    ) -> Result<(), StatusCheckError>
    where
        W: Write + Send + 'static,
    {
        let resources: Resources = discover_all(self.client.as_ref(), namespaces, labeller, deadline)
            .await?
            .into_iter()
            .collect();
        if resources.is_empty() {
            info!(run_id = %labeller.run_id(), "no deployments to check");
            return Ok(());
        }

        let total = resources.len();
        info!(total, deadline = ?deadline, "waiting for deployments to stabilize");

        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<usize>();
        let mut monitors = Vec::with_capacity(total);
        for (pos, resource) in resources.as_slice().iter().enumerate() {
            let client = self.client.clone();
            let resource = resource.clone();
            let shutdown = shutdown.clone();
            let done_tx = done_tx.clone();
            let poll_interval = self.settings.poll_interval;

            monitors.push(tokio::spawn(async move {
                let outcome = poll_resource(client, resource, poll_interval, shutdown).await;
                let _ = done_tx.send(pos);
                outcome
            }));
        }
        // Only the monitors hold senders now, so the channel closes once
        // every monitor has exited.
        drop(done_tx);

        let (stop_tx, stop_rx) = watch::channel(false);
        let reporter = tokio::spawn(report_loop(
            resources.as_slice().to_vec(),
            out.clone(),
            self.settings.report_interval,
            shutdown,
            stop_rx,
        ));

        let mut completed = 0;
        while let Some(pos) = done_rx.recv().await {
            if let Some(resource) = resources.at(pos) {
                completed += 1;
                write_summary(&out, resource.as_ref(), total - completed, total);
            }
        }

        for (resource, monitor) in resources.as_slice().iter().zip(monitors) {
            match monitor.await {
                Ok(outcome) => debug!(resource = %resource, ?outcome, "monitor finished"),
                Err(e) => {
                    let err = StatusError::Failed(format!("status monitor aborted: {e}"));
                    resource.update_status(&err.to_string(), Some(err));
                    resource.mark_done();
                    completed += 1;
                    write_summary(&out, resource.as_ref(), total - completed, total);
                }
            }
        }

        let _ = stop_tx.send(true);
        if let Err(e) = reporter.await {
            warn!(error = %e, "status reporter aborted");
        }

        let verdict = deploy_status(resources.as_slice());
        match &verdict {
            Ok(()) => info!(total, "all deployments are stable"),
            Err(e) => warn!(error = %e, "deployments failed to stabilize"),
        }
        verdict
    }
}

/// Print progress every `interval` until everything is done, the check is
/// cancelled, or the orchestrator asks the reporter to stop.
async fn report_loop<W>(
    resources: Vec<Arc<dyn Resource>>,
    out: Arc<Mutex<W>>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut stop: watch::Receiver<bool>,
) where
    W: Write + Send + 'static,
{
    loop {
        tokio::select! {
            biased;
            _ = wait_for_signal(&mut stop) => break,
            _ = wait_for_signal(&mut shutdown) => break,
            _ = tokio::time::sleep(interval) => {
                if write_status(&resources, &out) {
                    break;
                }
            }
        }
    }
    debug!("status reporter stopped");
}

fn write_status<W: Write>(resources: &[Arc<dyn Resource>], out: &Mutex<W>) -> bool {
    let mut out = out.lock().unwrap_or_else(PoisonError::into_inner);
    let written = print_status(resources, &mut *out).and_then(|all_done| {
        out.flush()?;
        Ok(all_done)
    });
    match written {
        Ok(all_done) => all_done,
        Err(e) => {
            warn!(error = %e, "failed to write status");
            false
        }
    }
}

fn write_summary<W: Write>(out: &Mutex<W>, resource: &dyn Resource, pending: usize, total: usize) {
    let mut out = out.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(e) = print_summary(&mut *out, resource, pending, total).and_then(|()| out.flush()) {
        warn!(resource = %resource.display_id(), error = %e, "failed to write summary");
    }
}
