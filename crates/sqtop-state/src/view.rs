//! Cluster-wide data handed to the UI alongside the job cache.

use serde::Serialize;
use sqtop_slurm::{
    ClusterJob, ClusterNode, ClusterStats, PriorityRow, QueueStats, UserStats, aggregate_users,
    cluster_stats, queue_stats,
};

/// Everything on screen that is not the user's own job list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClusterView {
    pub nodes: Vec<ClusterNode>,
    pub users: Vec<UserStats>,
    pub cluster: ClusterStats,
    pub queue: QueueStats,
    pub priorities: Vec<PriorityRow>,
}

impl ClusterView {
    /// Aggregate raw records into a view.
    pub fn build(
        nodes: Vec<ClusterNode>,
        cluster_jobs: &[ClusterJob],
        priorities: Vec<PriorityRow>,
    ) -> Self {
        Self {
            cluster: cluster_stats(&nodes),
            users: aggregate_users(cluster_jobs),
            queue: queue_stats(cluster_jobs),
            nodes,
            priorities,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_view() {
        let nodes = vec![ClusterNode {
            name: "gpu01".to_string(),
            state: "MIXED".to_string(),
            cpus_total: 32,
            cpus_alloc: 8,
            cfg_tres: "cpu=32,gres/gpu=4,gres/gpu:a100=4".to_string(),
            ..Default::default()
        }];
        let jobs = vec![ClusterJob {
            job_id: "11".to_string(),
            user: "alice".to_string(),
            state: "RUNNING".to_string(),
            nodes: 1,
            cpus: 8,
            gres: "gres/gpu:a100:1".to_string(),
        }];

        let view = ClusterView::build(nodes, &jobs, vec![]);
        assert_eq!(view.nodes.len(), 1);
        assert_eq!(view.cluster.gpus_total, 4);
        assert_eq!(view.users.len(), 1);
        assert_eq!(view.users[0].gpus, 1);
        assert_eq!(view.queue.running_jobs, 1);
        assert!(view.priorities.is_empty());
    }
}
