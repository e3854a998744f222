pub mod config;
pub mod labeller;
pub mod types;

pub use config::{ConfigError, KubectlConfig, RollwatchConfig, StatusCheckConfig};
pub use labeller::{Labeller, RUN_ID_LABEL};
pub use types::*;
