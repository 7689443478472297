//! Slurm record types.

use serde::Serialize;
use sqtop_parsers::{ResourceEntry, parse_gres, parse_tres};

/// Resource family counted in every GPU column.
pub const GPU_FAMILY: &str = "gpu";

/// Coarse job state derived from Slurm's raw state string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StateCategory {
    Running,
    Pending,
    Completed,
    Failed,
    Cancelled,
    TimedOut,
    Other,
}

/// Compact codes printed by `squeue -t` short formats.
const SHORT_CODES: &[(&str, StateCategory)] = &[
    ("R", StateCategory::Running),
    ("CG", StateCategory::Running),
    ("CF", StateCategory::Running),
    ("PD", StateCategory::Pending),
    ("RQ", StateCategory::Pending),
    ("CD", StateCategory::Completed),
    ("F", StateCategory::Failed),
    ("OOM", StateCategory::Failed),
    ("NF", StateCategory::Failed),
    ("BF", StateCategory::Failed),
    ("CA", StateCategory::Cancelled),
    ("TO", StateCategory::TimedOut),
    ("DL", StateCategory::TimedOut),
];

/// Keyword table; the first keyword contained in the state wins.
const KEYWORDS: &[(&str, StateCategory)] = &[
    ("COMPLETING", StateCategory::Running),
    ("RUNNING", StateCategory::Running),
    ("CONFIGURING", StateCategory::Running),
    ("PENDING", StateCategory::Pending),
    ("REQUEUE", StateCategory::Pending),
    ("COMPLETED", StateCategory::Completed),
    ("TIMEOUT", StateCategory::TimedOut),
    ("DEADLINE", StateCategory::TimedOut),
    ("CANCELLED", StateCategory::Cancelled),
    ("PREEMPTED", StateCategory::Cancelled),
    ("OUT_OF_MEMORY", StateCategory::Failed),
    ("NODE_FAIL", StateCategory::Failed),
    ("BOOT_FAIL", StateCategory::Failed),
    ("FAILED", StateCategory::Failed),
];

impl StateCategory {
    /// Classify a raw state such as `"RUNNING"`, `"CANCELLED by 1234"` or `"PD"`.
    pub fn from_state(raw: &str) -> Self {
        let upper = raw.trim().to_ascii_uppercase();

        if let Some((_, category)) = SHORT_CODES.iter().find(|(code, _)| *code == upper) {
            return *category;
        }

        KEYWORDS
            .iter()
            .find(|(keyword, _)| upper.contains(keyword))
            .map(|(_, category)| *category)
            .unwrap_or(StateCategory::Other)
    }

    /// Running or pending.
    pub fn is_active(self) -> bool {
        matches!(self, StateCategory::Running | StateCategory::Pending)
    }
}

/// One job row, either from the live listing or from accounting history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    /// May carry an array suffix (`4242_7`, `4242_[0-9]`)
    pub job_id: String,
    pub name: String,
    /// Raw Slurm state
    pub state: String,
    /// Elapsed time as printed by the tool
    pub time: String,
    /// Node count or range string
    pub nodes: String,
    /// Node list, or the pending reason in parentheses
    pub node_list: String,
    pub restarts: u32,
    pub exit_code: String,
    /// True for rows that came from the live listing
    pub is_active: bool,
}

impl Job {
    pub fn category(&self) -> StateCategory {
        StateCategory::from_state(&self.state)
    }
}

/// One job in the cluster-wide queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterJob {
    pub job_id: String,
    pub user: String,
    pub state: String,
    pub nodes: u32,
    pub cpus: u32,
    /// Per-node generic resource request, Gres form
    pub gres: String,
}

impl ClusterJob {
    pub fn category(&self) -> StateCategory {
        StateCategory::from_state(&self.state)
    }

    /// GPU request across all nodes of the job.
    pub fn gpu_entries(&self) -> Vec<ResourceEntry> {
        let nodes = u64::from(self.nodes.max(1));
        parse_gres(&self.gres, GPU_FAMILY)
            .into_iter()
            .map(|entry| ResourceEntry::new(entry.type_tag, entry.count.saturating_mul(nodes)))
            .collect()
    }
}

/// One compute node from `scontrol show node`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClusterNode {
    pub name: String,
    pub state: String,
    pub partitions: Vec<String>,
    pub cpus_total: u32,
    pub cpus_alloc: u32,
    pub mem_total_mb: u64,
    pub mem_alloc_mb: u64,
    pub cfg_tres: String,
    pub alloc_tres: String,
    pub gres: String,
    pub gres_used: String,
}

impl ClusterNode {
    /// Configured GPUs, from CfgTRES or else the Gres line.
    pub fn gpu_total_entries(&self) -> Vec<ResourceEntry> {
        let entries = parse_tres(&self.cfg_tres, GPU_FAMILY);
        if entries.is_empty() {
            parse_gres(&self.gres, GPU_FAMILY)
        } else {
            entries
        }
    }

    /// Allocated GPUs, from AllocTRES or else the GresUsed line.
    pub fn gpu_alloc_entries(&self) -> Vec<ResourceEntry> {
        let entries = parse_tres(&self.alloc_tres, GPU_FAMILY);
        if entries.is_empty() {
            parse_gres(&self.gres_used, GPU_FAMILY)
        } else {
            entries
        }
    }

    /// Base state without flags (`MIXED+DRAIN` -> `MIXED`).
    pub fn base_state(&self) -> &str {
        self.state
            .split(['+', '*', '~', '#', '!', '%', '$', '@', '^'])
            .next()
            .unwrap_or_default()
    }
}

/// One fair-share association from `sshare`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityRow {
    pub account: String,
    pub user: String,
    pub raw_shares: String,
    pub norm_shares: f64,
    pub raw_usage: u64,
    pub fairshare: f64,
    /// `"rank/total"` by descending fair-share
    pub rank: String,
}

/// Queue footprint of one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub user: String,
    pub running_jobs: u64,
    /// Pending tasks, with array jobs expanded
    pub pending_jobs: u64,
    pub cpus: u64,
    pub gpus: u64,
    pub gpu_types: String,
}

/// Node totals for the whole cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClusterStats {
    pub nodes_total: usize,
    /// Base node state -> count
    pub nodes_by_state: Vec<(String, usize)>,
    pub cpus_total: u64,
    pub cpus_alloc: u64,
    pub mem_total_mb: u64,
    pub mem_alloc_mb: u64,
    pub gpus_total: u64,
    pub gpus_alloc: u64,
    pub gpu_types: String,
}

/// Running and pending totals for the whole queue.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub running_jobs: u64,
    pub pending_jobs: u64,
    /// Pending tasks, with array jobs expanded
    pub pending_tasks: u64,
    pub pending_gpus: u64,
    pub pending_gpu_types: String,
}
