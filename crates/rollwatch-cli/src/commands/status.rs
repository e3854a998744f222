use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Context;
use tokio::sync::watch;
use tracing::{info, warn};

use rollwatch_core::{Labeller, RollwatchConfig};
use rollwatch_kube::KubectlClient;
use rollwatch_status::{StatusCheckSettings, StatusChecker};

const DEFAULT_CONFIG_FILE: &str = "rollwatch.toml";
const DEFAULT_NAMESPACE: &str = "default";

/// Flags of `rollwatch status`. Set flags win over the config file.
#[derive(Debug, Clone, Default)]
pub struct StatusArgs {
    pub namespaces: Vec<String>,
    pub run_id: String,
    pub deadline_secs: Option<u64>,
    pub config: Option<PathBuf>,
    pub kubectl: Option<String>,
    pub context: Option<String>,
    pub kubeconfig: Option<PathBuf>,
}

pub async fn status(args: StatusArgs) -> anyhow::Result<()> {
    let file = load_config(args.config.as_deref())?;
    let config = merge(&args, file);

    let client = Arc::new(KubectlClient::from_config(&config.kubectl));
    let checker = StatusChecker::new(client, StatusCheckSettings::from(&config.status_check));
    let labeller = Labeller::new(&args.run_id);
    let deadline = config.status_check.deadline();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling status check");
            let _ = shutdown_tx.send(true);
        }
    });

    info!(
        run_id = %labeller.run_id(),
        namespaces = ?config.namespaces,
        deadline = ?deadline,
        "starting status check"
    );

    let out = Arc::new(Mutex::new(io::stdout()));
    checker
        .check_namespaces(&config.namespaces, &labeller, deadline, out, shutdown_rx)
        .await
        .context("deployments failed to stabilize")
}

/// Read the config file named on the command line, or `rollwatch.toml` in the
/// working directory when it exists.
fn load_config(path: Option<&Path>) -> anyhow::Result<RollwatchConfig> {
    match path {
        Some(path) => RollwatchConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display())),
        None => {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            if default.exists() {
                RollwatchConfig::from_file(default)
                    .with_context(|| format!("loading {DEFAULT_CONFIG_FILE}"))
            } else {
                Ok(RollwatchConfig::default())
            }
        }
    }
}

/// Overlay command-line flags on the file config.
fn merge(args: &StatusArgs, mut config: RollwatchConfig) -> RollwatchConfig {
    if !args.namespaces.is_empty() {
        config.namespaces = args.namespaces.clone();
    }
    if config.namespaces.is_empty() {
        warn!("no namespace configured, checking {DEFAULT_NAMESPACE:?}");
        config.namespaces = vec![DEFAULT_NAMESPACE.to_string()];
    }
    if args.deadline_secs.is_some() {
        config.status_check.deadline_secs = args.deadline_secs;
    }
    if let Some(binary) = &args.kubectl {
        config.kubectl.binary = Some(binary.clone());
    }
    if let Some(context) = &args.context {
        config.kubectl.context = Some(context.clone());
    }
    if let Some(kubeconfig) = &args.kubeconfig {
        config.kubectl.kubeconfig = Some(kubeconfig.clone());
    }
    config
}
