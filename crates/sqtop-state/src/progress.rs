//! Weighted progress of the initial load.

use serde::Serialize;

/// One step of the initial load, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum LoadStep {
    Availability,
    FetchNodes,
    ParseNodes,
    UserJobs,
    UserHistory,
    ClusterJobs,
    UserAggregation,
    ClusterAggregation,
    CacheBuild,
}

impl LoadStep {
    pub const ALL: [LoadStep; 9] = [
        LoadStep::Availability,
        LoadStep::FetchNodes,
        LoadStep::ParseNodes,
        LoadStep::UserJobs,
        LoadStep::UserHistory,
        LoadStep::ClusterJobs,
        LoadStep::UserAggregation,
        LoadStep::ClusterAggregation,
        LoadStep::CacheBuild,
    ];

    /// Share of the progress bar; all weights sum to 100.
    pub fn weight(self) -> u16 {
        match self {
            LoadStep::Availability => 5,
            LoadStep::FetchNodes => 15,
            LoadStep::ParseNodes => 5,
            LoadStep::UserJobs => 15,
            LoadStep::UserHistory => 20,
            LoadStep::ClusterJobs => 15,
            LoadStep::UserAggregation => 10,
            LoadStep::ClusterAggregation => 5,
            LoadStep::CacheBuild => 10,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LoadStep::Availability => "Checking scheduler tools",
            LoadStep::FetchNodes => "Fetching nodes",
            LoadStep::ParseNodes => "Parsing nodes",
            LoadStep::UserJobs => "Fetching your jobs",
            LoadStep::UserHistory => "Fetching job history",
            LoadStep::ClusterJobs => "Fetching cluster queue",
            LoadStep::UserAggregation => "Aggregating users",
            LoadStep::ClusterAggregation => "Aggregating cluster",
            LoadStep::CacheBuild => "Building job cache",
        }
    }
}

/// Outcome reported for a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StepStatus {
    Started,
    Succeeded,
    Failed(String),
}

/// Receiver of initial-load progress.
pub trait ProgressObserver: Send + Sync {
    fn report(&self, step: LoadStep, status: StepStatus);
}

/// Observer that drops every report.
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn report(&self, _step: LoadStep, _status: StepStatus) {}
}

/// Accumulated progress as shown on the loading screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadProgress {
    done_weight: u16,
    current: Option<LoadStep>,
    failures: Vec<(LoadStep, String)>,
}

impl LoadProgress {
    /// Finished steps count toward the bar whether they succeeded or not.
    pub fn apply(&mut self, step: LoadStep, status: &StepStatus) {
        match status {
            StepStatus::Started => self.current = Some(step),
            StepStatus::Succeeded => self.finish(step),
            StepStatus::Failed(reason) => {
                self.failures.push((step, reason.clone()));
                self.finish(step);
            }
        }
    }

    pub fn percent(&self) -> u16 {
        self.done_weight.min(100)
    }

    pub fn current_label(&self) -> &'static str {
        self.current.map(LoadStep::label).unwrap_or("Starting")
    }

    pub fn failures(&self) -> &[(LoadStep, String)] {
        &self.failures
    }

    fn finish(&mut self, step: LoadStep) {
        self.done_weight += step.weight();
        if self.current == Some(step) {
            self.current = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_100() {
        let total: u16 = LoadStep::ALL.iter().map(|s| s.weight()).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn test_progress_accumulates() {
        let mut progress = LoadProgress::default();
        assert_eq!(progress.percent(), 0);
        assert_eq!(progress.current_label(), "Starting");

        progress.apply(LoadStep::Availability, &StepStatus::Started);
        assert_eq!(progress.current_label(), "Checking scheduler tools");
        progress.apply(LoadStep::Availability, &StepStatus::Succeeded);
        assert_eq!(progress.percent(), 5);

        progress.apply(LoadStep::FetchNodes, &StepStatus::Started);
        progress.apply(
            LoadStep::FetchNodes,
            &StepStatus::Failed("timed out".to_string()),
        );
        assert_eq!(progress.percent(), 20);
        assert_eq!(
            progress.failures(),
            &[(LoadStep::FetchNodes, "timed out".to_string())]
        );
    }

    #[test]
    fn test_progress_complete() {
        let mut progress = LoadProgress::default();
        for step in LoadStep::ALL {
            progress.apply(step, &StepStatus::Started);
            progress.apply(step, &StepStatus::Succeeded);
        }
        assert_eq!(progress.percent(), 100);
        assert!(progress.failures().is_empty());
    }
}
