//! `kubectl`-backed cluster client.
//!
//! Listing runs `kubectl get deployments -o json` and decodes the objects;
//! rollout status runs `kubectl rollout status --watch=false` and classifies
//! its output:
//!
//! | exit | output                              | result                |
//! |------|-------------------------------------|-----------------------|
//! | 0    | contains "successfully rolled out"  | `Complete`            |
//! | 0    | anything else                       | `Progressing`         |
//! | ≠0   | "exceeded its progress deadline"    | `Failed`              |
//! | ≠0   | anything else                       | `ClientError::Command`|

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Output;

use serde::Deserialize;
use tokio::process::Command;
use tracing::debug;

use rollwatch_core::{KubectlConfig, RolloutCondition, Workload, WorkloadKind};

use crate::client::{ClientError, ClientFuture, ClusterClient};

const ROLLED_OUT: &str = "successfully rolled out";
const PROGRESS_DEADLINE_EXCEEDED: &str = "exceeded its progress deadline";

#[derive(Debug, Clone)]
pub struct KubectlClient {
    binary: String,
    context: Option<String>,
    kubeconfig: Option<PathBuf>,
}

impl KubectlClient {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
            context: None,
            kubeconfig: None,
        }
    }

    pub fn from_config(config: &KubectlConfig) -> Self {
        Self {
            binary: config.binary().to_string(),
            context: config.context.clone(),
            kubeconfig: config.kubeconfig.clone(),
        }
    }

    /// Global flags placed before every subcommand.
    fn global_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(context) = &self.context {
            args.push("--context".to_string());
            args.push(context.clone());
        }
        if let Some(kubeconfig) = &self.kubeconfig {
            args.push("--kubeconfig".to_string());
            args.push(kubeconfig.display().to_string());
        }
        args
    }

    async fn run(&self, args: &[&str]) -> Result<(String, Output), ClientError> {
        let mut full_args = self.global_args();
        full_args.extend(args.iter().map(|a| a.to_string()));
        let rendered = format!("{} {}", self.binary, full_args.join(" "));

        debug!(command = %rendered, "running kubectl");

        // The child is killed if the poll future is dropped on deadline or
        // cancellation.
        let output = Command::new(&self.binary)
            .args(&full_args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| ClientError::Spawn {
                program: self.binary.clone(),
                source,
            })?;

        Ok((rendered, output))
    }
}

impl ClusterClient for KubectlClient {
    fn list_workloads<'a>(
        &'a self,
        namespace: &'a str,
        selector: &'a str,
    ) -> ClientFuture<'a, Vec<Workload>> {
        Box::pin(async move {
            let (command, output) = self
                .run(&[
                    "get",
                    "deployments",
                    "--namespace",
                    namespace,
                    "--selector",
                    selector,
                    "--output",
                    "json",
                ])
                .await?;

            if !output.status.success() {
                return Err(command_error(command, &output));
            }
            parse_deployment_list(&output.stdout)
        })
    }

    fn rollout_status<'a>(
        &'a self,
        kind: WorkloadKind,
        namespace: &'a str,
        name: &'a str,
    ) -> ClientFuture<'a, RolloutCondition> {
        Box::pin(async move {
            let target = format!("{kind}/{name}");
            let (command, output) = self
                .run(&[
                    "rollout",
                    "status",
                    target.as_str(),
                    "--namespace",
                    namespace,
                    "--watch=false",
                ])
                .await?;

            classify_rollout(command, &output)
        })
    }
}

fn command_error(command: String, output: &Output) -> ClientError {
    ClientError::Command {
        command,
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

/// Map a finished `kubectl rollout status` invocation to a condition.
fn classify_rollout(command: String, output: &Output) -> Result<RolloutCondition, ClientError> {
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if output.status.success() {
        return Ok(classify_message(stdout));
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.contains(PROGRESS_DEADLINE_EXCEEDED) {
        return Ok(RolloutCondition::Failed(stderr));
    }
    Err(command_error(command, output))
}

/// Classify the stdout of a successful `kubectl rollout status` run.
pub fn classify_message(stdout: String) -> RolloutCondition {
    if stdout.contains(ROLLED_OUT) {
        RolloutCondition::Complete(stdout)
    } else {
        RolloutCondition::Progressing(stdout)
    }
}

#[derive(Deserialize)]
struct DeploymentList {
    #[serde(default)]
    items: Vec<DeploymentObject>,
}

#[derive(Deserialize)]
struct DeploymentObject {
    metadata: ObjectMeta,
    #[serde(default)]
    spec: DeploymentSpec,
}

#[derive(Deserialize)]
struct ObjectMeta {
    name: String,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    labels: BTreeMap<String, String>,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeploymentSpec {
    progress_deadline_seconds: Option<i32>,
}

/// Decode the JSON of `kubectl get deployments -o json`.
pub fn parse_deployment_list(json: &[u8]) -> Result<Vec<Workload>, ClientError> {
    let list: DeploymentList = serde_json::from_slice(json)?;
    Ok(list
        .items
        .into_iter()
        .map(|d| Workload {
            kind: WorkloadKind::Deployment,
            namespace: d.metadata.namespace,
            name: d.metadata.name,
            labels: d.metadata.labels,
            progress_deadline_secs: d.spec.progress_deadline_seconds,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    fn output(code: i32, stdout: &str, stderr: &str) -> Output {
        use std::os::unix::process::ExitStatusExt;
        Output {
            status: std::process::ExitStatus::from_raw(code << 8),
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    #[test]
    fn parse_list_with_and_without_deadline() {
        let json = br#"{
            "apiVersion": "v1",
            "kind": "List",
            "items": [
                {
                    "metadata": {
                        "name": "dep1",
                        "namespace": "test",
                        "labels": {"rollwatch.dev/run-id": "1234", "random": "foo"}
                    },
                    "spec": {"progressDeadlineSeconds": 10, "replicas": 1}
                },
                {
                    "metadata": {"name": "dep2", "namespace": "test"},
                    "spec": {}
                }
            ]
        }"#;
        let workloads = parse_deployment_list(json).unwrap();
        assert_eq!(workloads.len(), 2);
        assert_eq!(workloads[0].name, "dep1");
        assert_eq!(workloads[0].progress_deadline_secs, Some(10));
        assert_eq!(workloads[0].labels.get("random").map(String::as_str), Some("foo"));
        assert_eq!(workloads[1].progress_deadline_secs, None);
        assert!(workloads[1].labels.is_empty());
    }

    #[test]
    fn parse_empty_list() {
        let workloads = parse_deployment_list(br#"{"items": []}"#).unwrap();
        assert!(workloads.is_empty());
        let workloads = parse_deployment_list(br#"{"kind": "List"}"#).unwrap();
        assert!(workloads.is_empty());
    }

    #[test]
    fn parse_garbage_is_decode_error() {
        let err = parse_deployment_list(b"error: the server doesn't have a resource type").unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn message_classification() {
        assert_eq!(
            classify_message("deployment \"web\" successfully rolled out".into()),
            RolloutCondition::Complete("deployment \"web\" successfully rolled out".into())
        );
        let waiting = "Waiting for deployment \"web\" rollout to finish: 0 of 1 updated replicas are available...";
        assert_eq!(
            classify_message(waiting.into()),
            RolloutCondition::Progressing(waiting.into())
        );
    }

    #[cfg(unix)]
    #[test]
    fn rollout_classification_by_exit_status() {
        let cmd = || "kubectl rollout status deployment/web".to_string();

        let done = classify_rollout(cmd(), &output(0, "deployment \"web\" successfully rolled out\n", ""));
        assert!(matches!(done, Ok(RolloutCondition::Complete(_))));

        let failed = classify_rollout(
            cmd(),
            &output(1, "", "error: deployment \"web\" exceeded its progress deadline\n"),
        );
        assert_eq!(
            failed.unwrap(),
            RolloutCondition::Failed("error: deployment \"web\" exceeded its progress deadline".into())
        );

        let err = classify_rollout(cmd(), &output(1, "", "Unable to connect to the server")).unwrap_err();
        match err {
            ClientError::Command { command, stderr, .. } => {
                assert_eq!(command, cmd());
                assert_eq!(stderr, "Unable to connect to the server");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn global_args_include_context_and_kubeconfig() {
        let client = KubectlClient::from_config(&KubectlConfig {
            binary: Some("/usr/local/bin/kubectl".into()),
            context: Some("kind-dev".into()),
            kubeconfig: Some(PathBuf::from("/tmp/kubeconfig")),
        });
        assert_eq!(client.binary, "/usr/local/bin/kubectl");
        assert_eq!(
            client.global_args(),
            vec!["--context", "kind-dev", "--kubeconfig", "/tmp/kubeconfig"]
        );
        assert!(KubectlClient::new("kubectl").global_args().is_empty());
    }

    #[tokio::test]
    async fn missing_binary_is_spawn_error() {
        let client = KubectlClient::new("/nonexistent/rollwatch-kubectl");
        let err = client.list_workloads("default", "a=b").await.unwrap_err();
        assert!(matches!(err, ClientError::Spawn { .. }));
    }
}
