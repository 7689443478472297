//! Query job history via sacct.

use crate::error::SlurmError;
use crate::query::QueryOptions;
use crate::types::Job;
use serde::Serialize;
use sqtop_parsers::{leading_job_number, parse_delimited_rows, run_command_nonempty};
use tokio::process::Command;

/// sacct output format (--parsable2 uses | delimiter)
pub const HISTORY_FORMAT: &str = "JobID,JobName,State,Restarts,Elapsed,ExitCode,NodeList";
const HISTORY_FIELDS: usize = 7;

/// Parsed accounting history with its restart totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobHistory {
    /// Sorted by leading job number, newest first
    pub rows: Vec<Job>,
    pub total_jobs: u64,
    pub total_requeues: u64,
    pub max_requeues: u32,
}

/// Fetch the raw allocation-level history of the configured user.
pub async fn fetch_job_history(options: &QueryOptions) -> Result<String, SlurmError> {
    let starttime = format!("now-{}hours", options.history_hours);
    let mut cmd = Command::new("sacct");
    cmd.args([
        "-X",
        "-u",
        &options.user,
        "--parsable2",
        "--starttime",
        &starttime,
        "--format",
        HISTORY_FORMAT,
    ]);
    Ok(run_command_nonempty(&mut cmd, "sacct", options.timeout).await?)
}

/// Parse history rows, summing and maxing the restart column.
///
/// Rows whose restart count is not a number are dropped. The sort is
/// stable, so rows sharing a job number keep their input order.
pub fn parse_job_history(text: &str) -> JobHistory {
    let mut rows: Vec<Job> = parse_delimited_rows(text, '|', HISTORY_FIELDS)
        .into_iter()
        .filter_map(|fields| {
            let Ok(restarts) = fields[3].parse::<u32>() else {
                tracing::debug!("Dropping history row with bad restart count: {:?}", fields);
                return None;
            };
            Some(Job {
                job_id: fields[0].to_string(),
                name: fields[1].to_string(),
                state: fields[2].to_string(),
                time: fields[4].to_string(),
                nodes: String::new(),
                node_list: fields[6].to_string(),
                restarts,
                exit_code: fields[5].to_string(),
                is_active: false,
            })
        })
        .collect();

    rows.sort_by_key(|job| std::cmp::Reverse(leading_job_number(&job.job_id)));

    JobHistory {
        total_jobs: rows.len() as u64,
        total_requeues: rows.iter().map(|job| u64::from(job.restarts)).sum(),
        max_requeues: rows.iter().map(|job| job.restarts).max().unwrap_or(0),
        rows,
    }
}
