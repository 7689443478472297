//! Cancel a job via scancel. The only command that changes scheduler state.

use crate::error::{SlurmError, ValidationError};
use crate::query::QueryOptions;
use once_cell::sync::Lazy;
use regex::Regex;
use sqtop_parsers::run_command;
use tokio::process::Command;

static JOB_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+(_[0-9]+)?$").expect("valid job id regex"));

/// Accept a plain job id or a single array task (`4242`, `4242_7`).
pub fn validate_job_id(job_id: &str) -> Result<&str, ValidationError> {
    if JOB_ID_RE.is_match(job_id) {
        Ok(job_id)
    } else {
        Err(ValidationError::JobId(job_id.to_string()))
    }
}

/// Validate then cancel. Nothing is spawned for a rejected id.
pub async fn cancel_job(job_id: &str, options: &QueryOptions) -> Result<(), SlurmError> {
    let job_id = validate_job_id(job_id)?;

    let mut cmd = Command::new("scancel");
    cmd.arg(job_id);
    run_command(&mut cmd, "scancel", options.timeout).await?;

    tracing::info!("Cancelled job {}", job_id);
    Ok(())
}
