//! Slurm integration for sqtop.
//!
//! Each scheduler tool has a `fetch_*` function returning raw text and a
//! pure `parse_*` function turning it into records, so callers can decide
//! what to do when a fetch fails.

pub mod error;
pub mod query;
pub mod sacct;
pub mod scancel;
pub mod scontrol;
pub mod squeue;
pub mod sshare;
pub mod stats;
pub mod types;

pub use error::{SlurmError, ValidationError};
pub use query::{QueryOptions, check_available};
pub use sacct::{JobHistory, fetch_job_history, parse_job_history};
pub use scancel::{cancel_job, validate_job_id};
pub use scontrol::{fetch_nodes, parse_nodes};
pub use squeue::{fetch_cluster_jobs, fetch_user_jobs, parse_cluster_jobs, parse_user_jobs};
pub use sshare::{fetch_priorities, parse_priorities};
pub use stats::{aggregate_users, cluster_stats, queue_stats};
pub use types::{
    ClusterJob, ClusterNode, ClusterStats, GPU_FAMILY, Job, PriorityRow, QueueStats,
    StateCategory, UserStats,
};
