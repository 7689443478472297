//! Shared query settings and the tooling availability probe.

use crate::error::SlurmError;
use sqtop_parsers::run_command;
use std::time::Duration;
use tokio::process::Command;

/// Settings shared by every scheduler query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// User whose jobs and history are listed
    pub user: String,
    /// How far back accounting history reaches
    pub history_hours: u64,
    /// Upper bound on each command's runtime
    pub timeout: Duration,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            user: std::env::var("USER").unwrap_or_default(),
            history_hours: 24,
            timeout: Duration::from_secs(15),
        }
    }
}

/// Check that the scheduler tools can be run at all.
pub async fn check_available(options: &QueryOptions) -> Result<String, SlurmError> {
    let mut cmd = Command::new("squeue");
    cmd.arg("--version");
    let version = run_command(&mut cmd, "squeue", options.timeout).await?;
    Ok(version.trim().to_string())
}
