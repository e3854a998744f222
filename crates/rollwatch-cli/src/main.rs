//! rollwatch — wait for the workloads of a deploy run to finish rolling out.
//!
//! # Usage
//!
//! ```text
//! rollwatch labels --run-id 1234
//! rollwatch status --run-id 1234 --namespace default --deadline-secs 300
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "rollwatch",
    about = "Rollout status checks for deploy runs",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log output format (logs go to stderr).
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Wait until every deployment labelled with the run id is rolled out.
    ///
    /// Exits non-zero if any deployment fails, times out, or the check is
    /// interrupted.
    Status {
        /// Namespace to check. Repeat for several namespaces.
        #[arg(short, long = "namespace")]
        namespaces: Vec<String>,
        /// Run id the deployments were labelled with.
        #[arg(long)]
        run_id: String,
        /// Global rollout deadline in seconds.
        #[arg(long)]
        deadline_secs: Option<u64>,
        /// Config file (default: ./rollwatch.toml when present).
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// kubectl binary to invoke.
        #[arg(long)]
        kubectl: Option<String>,
        /// kubeconfig context.
        #[arg(long)]
        context: Option<String>,
        /// kubeconfig file.
        #[arg(long)]
        kubeconfig: Option<PathBuf>,
    },
    /// Print the label selector for a run id.
    ///
    /// A fresh run id is generated when none is given.
    Labels {
        #[arg(long)]
        run_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Commands::Status {
            namespaces,
            run_id,
            deadline_secs,
            config,
            kubectl,
            context,
            kubeconfig,
        } => {
            commands::status::status(commands::status::StatusArgs {
                namespaces,
                run_id,
                deadline_secs,
                config,
                kubectl,
                context,
                kubeconfig,
            })
            .await
        }
        Commands::Labels { run_id } => commands::labels::labels(run_id.as_deref()),
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,rollwatch=info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_collects_repeated_namespaces() {
        let cli = Cli::parse_from([
            "rollwatch",
            "status",
            "--run-id",
            "abc",
            "-n",
            "api",
            "--namespace",
            "web",
            "--deadline-secs",
            "30",
        ]);
        match cli.command {
            Commands::Status {
                namespaces,
                run_id,
                deadline_secs,
                config,
                ..
            } => {
                assert_eq!(namespaces, vec!["api", "web"]);
                assert_eq!(run_id, "abc");
                assert_eq!(deadline_secs, Some(30));
                assert!(config.is_none());
            }
            Commands::Labels { .. } => panic!("expected status"),
        }
        assert_eq!(cli.log_format, LogFormat::Text);
    }

    #[test]
    fn status_requires_run_id() {
        assert!(Cli::try_parse_from(["rollwatch", "status"]).is_err());
    }

    #[test]
    fn log_format_is_global() {
        let cli = Cli::parse_from(["rollwatch", "labels", "--log-format", "json"]);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(matches!(cli.command, Commands::Labels { run_id: None }));
    }
}
