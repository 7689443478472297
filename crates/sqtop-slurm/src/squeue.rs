//! Query live jobs via squeue.

use crate::error::SlurmError;
use crate::query::QueryOptions;
use crate::types::{ClusterJob, Job};
use sqtop_parsers::{parse_delimited_rows, run_command_nonempty};
use tokio::process::Command;

/// User listing format:
/// %i - Job ID (with array suffix)
/// %j - Job name
/// %T - State (extended)
/// %M - Time used
/// %D - Node count
/// %R - Node list, or pending reason
pub const USER_JOBS_FORMAT: &str = "%i|%j|%T|%M|%D|%R";
const USER_JOBS_FIELDS: usize = 6;

/// Cluster listing format:
/// %i - Job ID
/// %u - User
/// %T - State
/// %D - Node count
/// %C - CPUs
/// %b - Generic resources per node
pub const CLUSTER_JOBS_FORMAT: &str = "%i|%u|%T|%D|%C|%b";
const CLUSTER_JOBS_FIELDS: usize = 6;

/// Fetch the raw live listing for the configured user.
pub async fn fetch_user_jobs(options: &QueryOptions) -> Result<String, SlurmError> {
    let mut cmd = Command::new("squeue");
    cmd.args(["-u", &options.user, "-o", USER_JOBS_FORMAT]);
    Ok(run_command_nonempty(&mut cmd, "squeue", options.timeout).await?)
}

/// Fetch the raw running and pending queue of every user.
pub async fn fetch_cluster_jobs(options: &QueryOptions) -> Result<String, SlurmError> {
    let mut cmd = Command::new("squeue");
    cmd.args(["-a", "-t", "RUNNING,PENDING", "-o", CLUSTER_JOBS_FORMAT]);
    Ok(run_command_nonempty(&mut cmd, "squeue", options.timeout).await?)
}

/// Parse the user listing. Every row is live, so every job is active.
pub fn parse_user_jobs(text: &str) -> Vec<Job> {
    parse_delimited_rows(text, '|', USER_JOBS_FIELDS)
        .into_iter()
        .filter(|fields| !fields[0].is_empty())
        .map(|fields| Job {
            job_id: fields[0].to_string(),
            name: fields[1].to_string(),
            state: fields[2].to_string(),
            time: fields[3].to_string(),
            nodes: fields[4].to_string(),
            // a pending reason may itself contain the separator
            node_list: fields[5..].join("|"),
            restarts: 0,
            exit_code: String::new(),
            is_active: true,
        })
        .collect()
}

/// Parse the cluster listing. Rows with non-numeric counts are dropped.
pub fn parse_cluster_jobs(text: &str) -> Vec<ClusterJob> {
    parse_delimited_rows(text, '|', CLUSTER_JOBS_FIELDS)
        .into_iter()
        .filter_map(|fields| {
            let nodes = fields[3].parse().ok();
            let cpus = fields[4].parse().ok();
            let (Some(nodes), Some(cpus)) = (nodes, cpus) else {
                tracing::debug!("Dropping cluster job with bad counts: {:?}", fields);
                return None;
            };
            Some(ClusterJob {
                job_id: fields[0].to_string(),
                user: fields[1].to_string(),
                state: fields[2].to_string(),
                nodes,
                cpus,
                gres: fields[5].to_string(),
            })
        })
        .collect()
}
