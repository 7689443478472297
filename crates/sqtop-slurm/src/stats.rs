//! Aggregate nodes and the cluster queue into dashboard totals.
//!
//! GPU counts go through the shared resource grammar, so node, user and
//! queue totals all drop generic entries the same way.

use crate::types::{
    ClusterJob, ClusterNode, ClusterStats, GPU_FAMILY, QueueStats, StateCategory, UserStats,
};
use sqtop_parsers::{ResourceTally, parse_array_size};
use std::collections::BTreeMap;

/// Per-user running footprint and pending backlog, busiest users first.
pub fn aggregate_users(jobs: &[ClusterJob]) -> Vec<UserStats> {
    let mut by_user: BTreeMap<&str, (UserStats, ResourceTally)> = BTreeMap::new();

    for job in jobs {
        let (stats, gpus) = by_user.entry(job.user.as_str()).or_insert_with(|| {
            let stats = UserStats {
                user: job.user.clone(),
                ..Default::default()
            };
            (stats, ResourceTally::default())
        });

        match job.category() {
            StateCategory::Running => {
                stats.running_jobs += 1;
                stats.cpus += u64::from(job.cpus);
                gpus.add(GPU_FAMILY, &job.gpu_entries());
            }
            StateCategory::Pending => stats.pending_jobs += parse_array_size(&job.job_id),
            _ => {}
        }
    }

    let mut users: Vec<UserStats> = by_user
        .into_values()
        .map(|(mut stats, gpus)| {
            stats.gpus = gpus.total();
            stats.gpu_types = gpus.format();
            stats
        })
        .collect();

    users.sort_by(|a, b| {
        b.gpus
            .cmp(&a.gpus)
            .then_with(|| b.cpus.cmp(&a.cpus))
            .then_with(|| b.pending_jobs.cmp(&a.pending_jobs))
            .then_with(|| a.user.cmp(&b.user))
    });
    users
}

/// Capacity and allocation across all nodes.
pub fn cluster_stats(nodes: &[ClusterNode]) -> ClusterStats {
    let mut stats = ClusterStats {
        nodes_total: nodes.len(),
        ..Default::default()
    };
    let mut by_state: BTreeMap<String, usize> = BTreeMap::new();
    let mut total_gpus = ResourceTally::default();
    let mut alloc_gpus = ResourceTally::default();

    for node in nodes {
        *by_state.entry(node.base_state().to_string()).or_default() += 1;
        stats.cpus_total += u64::from(node.cpus_total);
        stats.cpus_alloc += u64::from(node.cpus_alloc);
        stats.mem_total_mb = stats.mem_total_mb.saturating_add(node.mem_total_mb);
        stats.mem_alloc_mb = stats.mem_alloc_mb.saturating_add(node.mem_alloc_mb);
        total_gpus.add(GPU_FAMILY, &node.gpu_total_entries());
        alloc_gpus.add(GPU_FAMILY, &node.gpu_alloc_entries());
    }

    stats.nodes_by_state = by_state.into_iter().collect();
    stats.gpus_total = total_gpus.total();
    stats.gpus_alloc = alloc_gpus.total();
    stats.gpu_types = total_gpus.format();
    stats
}

/// Running job count and the pending backlog with its GPU demand.
pub fn queue_stats(jobs: &[ClusterJob]) -> QueueStats {
    let mut stats = QueueStats::default();
    let mut pending_gpus = ResourceTally::default();

    for job in jobs {
        match job.category() {
            StateCategory::Running => stats.running_jobs += 1,
            StateCategory::Pending => {
                let tasks = parse_array_size(&job.job_id);
                stats.pending_jobs += 1;
                stats.pending_tasks += tasks;
                let entries: Vec<_> = job
                    .gpu_entries()
                    .into_iter()
                    .map(|mut entry| {
                        entry.count = entry.count.saturating_mul(tasks);
                        entry
                    })
                    .collect();
                pending_gpus.add(GPU_FAMILY, &entries);
            }
            _ => {}
        }
    }

    stats.pending_gpus = pending_gpus.total();
    stats.pending_gpu_types = pending_gpus.format();
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: &str, user: &str, state: &str, nodes: u32, cpus: u32, gres: &str) -> ClusterJob {
        ClusterJob {
            job_id: id.to_string(),
            user: user.to_string(),
            state: state.to_string(),
            nodes,
            cpus,
            gres: gres.to_string(),
        }
    }

    fn queue() -> Vec<ClusterJob> {
        vec![
            job("1", "alice", "RUNNING", 1, 16, "gres/gpu:a100:2"),
            job("2", "alice", "RUNNING", 2, 64, "gres/gpu:h100:4"),
            job("3", "alice", "PENDING", 1, 8, "gres/gpu:1"),
            job("4_[0-9]", "bob", "PENDING", 1, 4, "gres/gpu:a100:1"),
            job("5", "bob", "RUNNING", 1, 4, "N/A"),
            job("6", "carol", "RUNNING", 1, 128, "(null)"),
        ]
    }

    #[test]
    fn test_aggregate_users() {
        let users = aggregate_users(&queue());
        let names: Vec<&str> = users.iter().map(|u| u.user.as_str()).collect();
        assert_eq!(names, vec!["alice", "carol", "bob"]);

        let alice = &users[0];
        assert_eq!(alice.running_jobs, 2);
        assert_eq!(alice.pending_jobs, 1);
        assert_eq!(alice.cpus, 80);
        assert_eq!(alice.gpus, 10);
        assert_eq!(alice.gpu_types, "2x A100, 8x H100");

        let bob = &users[2];
        assert_eq!(bob.running_jobs, 1);
        assert_eq!(bob.pending_jobs, 10);
        assert_eq!(bob.gpus, 0);
    }

    #[test]
    fn test_queue_stats() {
        let stats = queue_stats(&queue());
        assert_eq!(stats.running_jobs, 4);
        assert_eq!(stats.pending_jobs, 2);
        assert_eq!(stats.pending_tasks, 11);
        assert_eq!(stats.pending_gpus, 11);
        assert_eq!(stats.pending_gpu_types, "10x A100, 1x GPU");
    }

    #[test]
    fn test_queue_stats_pending_gpus_saturate() {
        let huge = format!("gres/gpu:a100:{}", u64::MAX / 4);
        let jobs = vec![
            job("7_[0-99]", "mallory", "PENDING", 1, 1, &huge),
            job("8", "mallory", "PENDING", 1, 1, &huge),
        ];
        let stats = queue_stats(&jobs);
        assert_eq!(stats.pending_tasks, 101);
        assert_eq!(stats.pending_gpus, u64::MAX);
    }

    #[test]
    fn test_cluster_stats_drops_generic_gpu_entries() {
        let nodes = vec![
            ClusterNode {
                name: "gpu01".to_string(),
                state: "MIXED".to_string(),
                cpus_total: 64,
                cpus_alloc: 24,
                mem_total_mb: 1000,
                mem_alloc_mb: 500,
                cfg_tres: "cpu=64,gres/gpu=8,gres/gpu:h200=8".to_string(),
                alloc_tres: "cpu=24,gres/gpu=2,gres/gpu:h200=2".to_string(),
                ..Default::default()
            },
            ClusterNode {
                name: "cpu01".to_string(),
                state: "IDLE+DRAIN".to_string(),
                cpus_total: 48,
                mem_total_mb: 2000,
                cfg_tres: "cpu=48".to_string(),
                ..Default::default()
            },
            ClusterNode {
                name: "cpu02".to_string(),
                state: "IDLE".to_string(),
                cpus_total: 48,
                ..Default::default()
            },
        ];

        let stats = cluster_stats(&nodes);
        assert_eq!(stats.nodes_total, 3);
        assert_eq!(
            stats.nodes_by_state,
            vec![("IDLE".to_string(), 2), ("MIXED".to_string(), 1)]
        );
        assert_eq!(stats.cpus_total, 160);
        assert_eq!(stats.cpus_alloc, 24);
        assert_eq!(stats.mem_total_mb, 3000);
        assert_eq!(stats.gpus_total, 8);
        assert_eq!(stats.gpus_alloc, 2);
        assert_eq!(stats.gpu_types, "8x H200");
    }

    #[test]
    fn test_empty_inputs() {
        assert!(aggregate_users(&[]).is_empty());
        assert_eq!(queue_stats(&[]), QueueStats::default());
        assert_eq!(cluster_stats(&[]), ClusterStats::default());
    }
}
