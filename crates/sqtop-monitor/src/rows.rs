//! Row adapters: how each record type becomes a `RenderRow`.

use crate::table::RenderRow;
use sqtop_parsers::{format_memory_mb, format_resources, total_count};
use sqtop_slurm::{ClusterNode, GPU_FAMILY, Job, PriorityRow, UserStats};

/// A record that can be shown as one table row.
pub trait TableRow {
    const COLUMNS: &'static [&'static str];

    /// Stable identity of the row across refreshes.
    fn key(&self) -> String;

    /// One display string per column.
    fn cells(&self) -> Vec<String>;

    fn render_row(&self) -> RenderRow {
        RenderRow::new(self.key(), self.cells())
    }
}

pub fn render_rows<T: TableRow>(items: &[T]) -> Vec<RenderRow> {
    items.iter().map(TableRow::render_row).collect()
}

impl TableRow for Job {
    const COLUMNS: &'static [&'static str] = &[
        "ID", "Name", "State", "Time", "Nodes", "NodeList", "Restarts", "Exit",
    ];

    fn key(&self) -> String {
        self.job_id.clone()
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.job_id.clone(),
            self.name.clone(),
            self.state.clone(),
            self.time.clone(),
            self.nodes.clone(),
            self.node_list.clone(),
            self.restarts.to_string(),
            self.exit_code.clone(),
        ]
    }
}

impl TableRow for ClusterNode {
    const COLUMNS: &'static [&'static str] = &[
        "Node",
        "State",
        "Partitions",
        "CPU Used",
        "CPU Total",
        "Mem Used",
        "Mem Total",
        "GPUs",
        "GPU Types",
    ];

    fn key(&self) -> String {
        self.name.clone()
    }

    fn cells(&self) -> Vec<String> {
        let total = self.gpu_total_entries();
        let alloc = self.gpu_alloc_entries();
        let gpus = match total_count(GPU_FAMILY, &total) {
            0 => "-".to_string(),
            n => format!("{}/{}", total_count(GPU_FAMILY, &alloc), n),
        };
        vec![
            self.name.clone(),
            self.state.clone(),
            self.partitions.join(","),
            self.cpus_alloc.to_string(),
            self.cpus_total.to_string(),
            format_memory_mb(self.mem_alloc_mb),
            format_memory_mb(self.mem_total_mb),
            gpus,
            format_resources(GPU_FAMILY, &total),
        ]
    }
}

impl TableRow for UserStats {
    const COLUMNS: &'static [&'static str] =
        &["User", "Running", "Pending", "CPUs", "GPUs", "GPU Types"];

    fn key(&self) -> String {
        self.user.clone()
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.user.clone(),
            self.running_jobs.to_string(),
            self.pending_jobs.to_string(),
            self.cpus.to_string(),
            self.gpus.to_string(),
            self.gpu_types.clone(),
        ]
    }
}

impl TableRow for PriorityRow {
    const COLUMNS: &'static [&'static str] = &[
        "Rank",
        "User",
        "Account",
        "FairShare",
        "NormShares",
        "RawUsage",
        "RawShares",
    ];

    // a user may hold several accounts
    fn key(&self) -> String {
        format!("{}/{}", self.account, self.user)
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.rank.clone(),
            self.user.clone(),
            self.account.clone(),
            format!("{:.6}", self.fairshare),
            format!("{:.6}", self.norm_shares),
            self.raw_usage.to_string(),
            self.raw_shares.clone(),
        ]
    }
}
