//! Job cache merging the live listing with accounting history.
//!
//! The cache holds one immutable `CacheSnapshot` behind a mutex. A refresh
//! builds the next snapshot without the lock and then swaps the pointer, so
//! readers never see a half-built list and never wait on parsing.

use serde::Serialize;
use sqtop_slurm::{Job, StateCategory};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

/// One consistent view of every known job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheSnapshot {
    /// Active jobs first, then history not already listed as active
    pub jobs: Vec<Job>,
    pub total_jobs: u64,
    pub total_requeues: u64,
    pub max_requeues: u32,
    pub running_count: usize,
    pub pending_count: usize,
}

impl CacheSnapshot {
    /// Merge live and historical jobs. The first record seen for an id wins.
    pub fn build(
        running: Vec<Job>,
        history: Vec<Job>,
        total_jobs: u64,
        total_requeues: u64,
        max_requeues: u32,
    ) -> Self {
        let mut seen: HashSet<String> = HashSet::with_capacity(running.len() + history.len());
        let mut jobs = Vec::with_capacity(running.len() + history.len());
        let mut running_count = 0;
        let mut pending_count = 0;

        for job in running {
            if !seen.insert(job.job_id.clone()) {
                continue;
            }
            match job.category() {
                StateCategory::Running => running_count += 1,
                StateCategory::Pending => pending_count += 1,
                _ => {}
            }
            jobs.push(Job {
                is_active: true,
                ..job
            });
        }

        let mut dropped = 0usize;
        for job in history {
            if !seen.insert(job.job_id.clone()) {
                dropped += 1;
                continue;
            }
            jobs.push(Job {
                is_active: false,
                ..job
            });
        }
        if dropped > 0 {
            tracing::debug!("Dropped {} history rows already listed as active", dropped);
        }

        Self {
            jobs,
            total_jobs,
            total_requeues,
            max_requeues,
            running_count,
            pending_count,
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            total_jobs: self.total_jobs,
            total_requeues: self.total_requeues,
            max_requeues: self.max_requeues,
            running: self.running_count,
            pending: self.pending_count,
        }
    }
}

/// Point-in-time counters for the header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_jobs: u64,
    pub total_requeues: u64,
    pub max_requeues: u32,
    pub running: usize,
    pub pending: usize,
}

/// Thread-safe holder of the current `CacheSnapshot`.
#[derive(Debug, Default)]
pub struct JobCache {
    current: Mutex<Arc<CacheSnapshot>>,
}

impl JobCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a new snapshot and swap it in.
    pub fn refresh(
        &self,
        running: Vec<Job>,
        history: Vec<Job>,
        total_jobs: u64,
        total_requeues: u64,
        max_requeues: u32,
    ) {
        let next = Arc::new(CacheSnapshot::build(
            running,
            history,
            total_jobs,
            total_requeues,
            max_requeues,
        ));
        tracing::debug!(
            "Cache refreshed: {} jobs ({} running, {} pending)",
            next.jobs.len(),
            next.running_count,
            next.pending_count
        );
        *self.lock() = next;
    }

    /// Shared handle to the current snapshot.
    pub fn snapshot(&self) -> Arc<CacheSnapshot> {
        Arc::clone(&self.lock())
    }

    /// Owned copy of every job.
    pub fn jobs(&self) -> Vec<Job> {
        self.snapshot().jobs.clone()
    }

    pub fn job_by_id(&self, job_id: &str) -> Option<Job> {
        self.snapshot()
            .jobs
            .iter()
            .find(|job| job.job_id == job_id)
            .cloned()
    }

    pub fn active_jobs(&self) -> Vec<Job> {
        self.snapshot()
            .jobs
            .iter()
            .filter(|job| job.is_active)
            .cloned()
            .collect()
    }

    pub fn stats(&self) -> CacheStats {
        self.snapshot().stats()
    }

    // A panic elsewhere cannot leave the pointer half-written.
    fn lock(&self) -> MutexGuard<'_, Arc<CacheSnapshot>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Lazily constructed, shared `JobCache`.
///
/// Concurrent first calls to `get` construct exactly one cache.
#[derive(Debug, Default)]
pub struct CacheCell {
    cell: OnceLock<Arc<JobCache>>,
}

impl CacheCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Arc<JobCache> {
        Arc::clone(self.cell.get_or_init(|| Arc::new(JobCache::new())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn job(id: &str, state: &str, is_active: bool) -> Job {
        Job {
            job_id: id.to_string(),
            name: format!("job{}", id),
            state: state.to_string(),
            time: "0:10".to_string(),
            nodes: "1".to_string(),
            node_list: "node01".to_string(),
            restarts: 0,
            exit_code: String::new(),
            is_active,
        }
    }

    #[test]
    fn test_empty_cache() {
        let cache = JobCache::new();
        assert!(cache.jobs().is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
        assert!(cache.job_by_id("1").is_none());
    }

    #[test]
    fn test_live_and_history_merged() {
        let cache = JobCache::new();
        cache.refresh(
            vec![job("101", "RUNNING", true)],
            vec![job("100", "COMPLETED", false)],
            1,
            0,
            0,
        );

        let ids: Vec<String> = cache.jobs().into_iter().map(|j| j.job_id).collect();
        assert_eq!(ids, vec!["101", "100"]);

        let active = cache.active_jobs();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].job_id, "101");

        let stats = cache.stats();
        assert_eq!(stats.running, 1);
        assert_eq!(stats.pending, 0);
    }

    #[test]
    fn test_active_wins_over_history() {
        let cache = JobCache::new();
        cache.refresh(
            vec![job("7", "PENDING", true), job("8", "RUNNING", true)],
            vec![job("8", "COMPLETED", false), job("6", "FAILED", false)],
            2,
            1,
            1,
        );

        let jobs = cache.jobs();
        assert_eq!(jobs.len(), 3);
        let eights: Vec<&Job> = jobs.iter().filter(|j| j.job_id == "8").collect();
        assert_eq!(eights.len(), 1);
        assert_eq!(eights[0].state, "RUNNING");
        assert!(eights[0].is_active);

        let stats = cache.stats();
        assert_eq!(stats.running, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.total_jobs, 2);
        assert_eq!(stats.total_requeues, 1);
        assert_eq!(stats.max_requeues, 1);
    }

    #[test]
    fn test_job_by_id() {
        let cache = JobCache::new();
        cache.refresh(vec![job("1", "RUNNING", true)], vec![], 0, 0, 0);
        assert_eq!(
            cache.job_by_id("1").map(|j| j.state),
            Some("RUNNING".to_string())
        );
        assert!(cache.job_by_id("2").is_none());
    }

    #[test]
    fn test_jobs_is_a_copy() {
        let cache = JobCache::new();
        cache.refresh(vec![job("1", "RUNNING", true)], vec![], 0, 0, 0);

        let mut copy = cache.jobs();
        copy[0].state = "CANCELLED".to_string();
        copy.clear();

        assert_eq!(cache.jobs()[0].state, "RUNNING");
    }

    #[test]
    fn test_snapshot_survives_refresh() {
        let cache = JobCache::new();
        cache.refresh(vec![job("1", "RUNNING", true)], vec![], 0, 0, 0);
        let before = cache.snapshot();

        cache.refresh(vec![], vec![job("1", "COMPLETED", false)], 1, 0, 0);

        assert_eq!(before.jobs[0].state, "RUNNING");
        assert_eq!(before.running_count, 1);
        assert_eq!(cache.snapshot().jobs[0].state, "COMPLETED");
        assert_eq!(cache.stats().running, 0);
    }

    #[test]
    fn test_concurrent_readers_see_whole_snapshots() {
        let cache = Arc::new(JobCache::new());
        let writer = {
            let cache = Arc::clone(&cache);
            thread::spawn(move || {
                for i in 0..200 {
                    let running: Vec<Job> = (0..i % 5)
                        .map(|n| job(&n.to_string(), "RUNNING", true))
                        .collect();
                    cache.refresh(running, vec![], 0, 0, 0);
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let snapshot = cache.snapshot();
                        assert_eq!(snapshot.jobs.len(), snapshot.running_count);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }

    #[test]
    fn test_cache_cell_constructs_once() {
        let cell = Arc::new(CacheCell::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cell = Arc::clone(&cell);
                thread::spawn(move || cell.get())
            })
            .collect();

        let caches: Vec<Arc<JobCache>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for cache in &caches {
            assert!(Arc::ptr_eq(cache, &caches[0]));
        }
    }
}
