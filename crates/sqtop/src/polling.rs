//! Background refresh of the job cache and cluster view.
//!
//! The initial load runs the weighted steps once and reports each of them
//! to a `ProgressObserver`. After it finishes, a ticker triggers periodic
//! refreshes; the manual refresh key goes through the same in-flight flag,
//! so at most one refresh runs at a time. Every finished cycle is sent to
//! the UI as one `AppEvent` stamped with a new generation.

use sqtop_cli::Args;
use sqtop_monitor::{AppEvent, DashboardUpdate};
use sqtop_slurm::{
    ClusterJob, ClusterNode, JobHistory, PriorityRow, QueryOptions, SlurmError, aggregate_users,
    cluster_stats, parse_cluster_jobs, parse_job_history, parse_nodes, parse_priorities,
    parse_user_jobs, queue_stats,
};
use sqtop_state::{ClusterView, JobCache, LoadStep, ProgressObserver, StepStatus};
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Fatal outcome of the initial load.
#[derive(Error, Debug, Clone, PartialEq, Eq, miette::Diagnostic)]
pub enum LoadError {
    #[error("Slurm is not available: {0}")]
    #[diagnostic(
        code(sqtop::unavailable),
        help("sqtop needs squeue, sacct, scontrol and sshare on PATH")
    )]
    Unavailable(String),
}

/// Where raw scheduler output comes from.
pub trait SlurmSource: Send + Sync + 'static {
    fn check_available(&self) -> impl Future<Output = Result<String, SlurmError>> + Send;
    fn fetch_nodes(&self) -> impl Future<Output = Result<String, SlurmError>> + Send;
    fn fetch_user_jobs(&self) -> impl Future<Output = Result<String, SlurmError>> + Send;
    fn fetch_job_history(&self) -> impl Future<Output = Result<String, SlurmError>> + Send;
    fn fetch_cluster_jobs(&self) -> impl Future<Output = Result<String, SlurmError>> + Send;
    fn fetch_priorities(&self) -> impl Future<Output = Result<String, SlurmError>> + Send;
    fn cancel_job(&self, job_id: &str) -> impl Future<Output = Result<(), SlurmError>> + Send;
}

/// The real scheduler, reached through its command-line tools.
pub struct SlurmCli {
    options: QueryOptions,
}

impl SlurmCli {
    pub fn new(options: QueryOptions) -> Self {
        Self { options }
    }
}

impl SlurmSource for SlurmCli {
    async fn check_available(&self) -> Result<String, SlurmError> {
        sqtop_slurm::check_available(&self.options).await
    }

    async fn fetch_nodes(&self) -> Result<String, SlurmError> {
        sqtop_slurm::fetch_nodes(&self.options).await
    }

    async fn fetch_user_jobs(&self) -> Result<String, SlurmError> {
        sqtop_slurm::fetch_user_jobs(&self.options).await
    }

    async fn fetch_job_history(&self) -> Result<String, SlurmError> {
        sqtop_slurm::fetch_job_history(&self.options).await
    }

    async fn fetch_cluster_jobs(&self) -> Result<String, SlurmError> {
        sqtop_slurm::fetch_cluster_jobs(&self.options).await
    }

    async fn fetch_priorities(&self) -> Result<String, SlurmError> {
        sqtop_slurm::fetch_priorities(&self.options).await
    }

    async fn cancel_job(&self, job_id: &str) -> Result<(), SlurmError> {
        sqtop_slurm::cancel_job(job_id, &self.options).await
    }
}

/// Polling configuration.
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Time between periodic refreshes
    pub interval: Duration,
    /// Capacity of the worker-to-UI channel
    pub channel_capacity: usize,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            channel_capacity: 64,
        }
    }
}

impl From<&Args> for PollingConfig {
    fn from(args: &Args) -> Self {
        Self {
            interval: args.interval(),
            ..Self::default()
        }
    }
}

/// Last good value of every source, used when a later fetch fails.
#[derive(Debug, Default)]
struct LastGood {
    history: Option<JobHistory>,
    nodes: Vec<ClusterNode>,
    cluster_jobs: Vec<ClusterJob>,
    priorities: Vec<PriorityRow>,
}

/// Clears the in-flight flag when a refresh ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Forwards initial-load progress to the UI channel.
pub struct ChannelObserver {
    events: mpsc::Sender<AppEvent>,
}

impl ChannelObserver {
    pub fn new(events: mpsc::Sender<AppEvent>) -> Self {
        Self { events }
    }
}

impl ProgressObserver for ChannelObserver {
    fn report(&self, step: LoadStep, status: StepStatus) {
        if self
            .events
            .try_send(AppEvent::Progress(step, status))
            .is_err()
        {
            tracing::debug!("Dropping progress report for {:?}", step);
        }
    }
}

/// Refresh orchestrator shared by the ticker, the UI actions and the loader.
pub struct Poller<S: SlurmSource> {
    source: Arc<S>,
    cache: Arc<JobCache>,
    events: mpsc::Sender<AppEvent>,
    in_flight: AtomicBool,
    generation: AtomicU64,
    last_good: Mutex<LastGood>,
}

impl<S: SlurmSource> Poller<S> {
    pub fn new(source: S, cache: Arc<JobCache>, events: mpsc::Sender<AppEvent>) -> Self {
        Self {
            source: Arc::new(source),
            cache,
            events,
            in_flight: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            last_good: Mutex::new(LastGood::default()),
        }
    }

    fn try_acquire(&self) -> bool {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Run every load step once, reporting progress as it goes.
    ///
    /// Only an unavailable scheduler is fatal; any other failed step leaves
    /// its data empty and is listed in the update's warnings.
    pub async fn initial_load(
        &self,
        observer: &dyn ProgressObserver,
    ) -> Result<DashboardUpdate, LoadError> {
        let _guard = self.try_acquire().then(|| InFlight(&self.in_flight));
        let mut warnings = Vec::new();

        observer.report(LoadStep::Availability, StepStatus::Started);
        match self.source.check_available().await {
            Ok(version) => {
                tracing::info!("Detected {}", version.trim());
                observer.report(LoadStep::Availability, StepStatus::Succeeded);
            }
            Err(e) => {
                tracing::error!("Slurm unavailable: {}", e);
                observer.report(LoadStep::Availability, StepStatus::Failed(e.to_string()));
                return Err(LoadError::Unavailable(e.to_string()));
            }
        }

        let nodes_text = run_step(
            observer,
            LoadStep::FetchNodes,
            self.source.fetch_nodes(),
            &mut warnings,
        )
        .await;

        observer.report(LoadStep::ParseNodes, StepStatus::Started);
        let nodes = nodes_text.as_deref().map(parse_nodes).unwrap_or_default();
        observer.report(LoadStep::ParseNodes, StepStatus::Succeeded);

        let running = run_step(
            observer,
            LoadStep::UserJobs,
            self.source.fetch_user_jobs(),
            &mut warnings,
        )
        .await
        .map(|text| parse_user_jobs(&text))
        .unwrap_or_default();

        let history = run_step(
            observer,
            LoadStep::UserHistory,
            self.source.fetch_job_history(),
            &mut warnings,
        )
        .await
        .map(|text| parse_job_history(&text));

        let cluster_jobs = run_step(
            observer,
            LoadStep::ClusterJobs,
            self.source.fetch_cluster_jobs(),
            &mut warnings,
        )
        .await
        .map(|text| parse_cluster_jobs(&text))
        .unwrap_or_default();

        observer.report(LoadStep::UserAggregation, StepStatus::Started);
        let users = aggregate_users(&cluster_jobs);
        observer.report(LoadStep::UserAggregation, StepStatus::Succeeded);

        observer.report(LoadStep::ClusterAggregation, StepStatus::Started);
        let cluster = cluster_stats(&nodes);
        let queue = queue_stats(&cluster_jobs);
        let priorities = match self.source.fetch_priorities().await {
            Ok(text) => {
                observer.report(LoadStep::ClusterAggregation, StepStatus::Succeeded);
                parse_priorities(&text)
            }
            Err(e) => {
                tracing::warn!("sshare failed during initial load: {}", e);
                warnings.push(format!("priorities: {}", e));
                observer.report(
                    LoadStep::ClusterAggregation,
                    StepStatus::Failed(e.to_string()),
                );
                Vec::new()
            }
        };

        observer.report(LoadStep::CacheBuild, StepStatus::Started);
        let empty = JobHistory::default();
        let hist = history.as_ref().unwrap_or(&empty);
        self.cache.refresh(
            running,
            hist.rows.clone(),
            hist.total_jobs,
            hist.total_requeues,
            hist.max_requeues,
        );
        observer.report(LoadStep::CacheBuild, StepStatus::Succeeded);

        let view = ClusterView {
            nodes: nodes.clone(),
            users,
            cluster,
            queue,
            priorities: priorities.clone(),
        };

        *self.last_good.lock().await = LastGood {
            history,
            nodes,
            cluster_jobs,
            priorities,
        };

        let generation = self.next_generation();
        tracing::info!(
            "Initial load finished (generation {}, {} warnings)",
            generation,
            warnings.len()
        );

        Ok(DashboardUpdate {
            generation,
            view,
            warnings,
        })
    }

    /// One refresh cycle: fetch every source concurrently and apply the
    /// fallback policy.
    ///
    /// The job cache is only updated when the live listing succeeded and
    /// some history is known, either fresh or from an earlier cycle.
    pub async fn refresh(&self) -> DashboardUpdate {
        let (live, history, nodes, cluster_jobs, priorities) = tokio::join!(
            self.source.fetch_user_jobs(),
            self.source.fetch_job_history(),
            self.source.fetch_nodes(),
            self.source.fetch_cluster_jobs(),
            self.source.fetch_priorities(),
        );

        let mut warnings = Vec::new();
        let mut last = self.last_good.lock().await;

        match history {
            Ok(text) => last.history = Some(parse_job_history(&text)),
            Err(e) => {
                tracing::warn!("sacct failed, reusing previous history: {}", e);
                warnings.push(format!("history: {}", e));
            }
        }

        match (live, last.history.as_ref()) {
            (Ok(text), Some(hist)) => {
                self.cache.refresh(
                    parse_user_jobs(&text),
                    hist.rows.clone(),
                    hist.total_jobs,
                    hist.total_requeues,
                    hist.max_requeues,
                );
            }
            (Ok(_), None) => {
                tracing::warn!("No job history known yet, skipping cache update");
            }
            (Err(e), _) => {
                tracing::warn!("squeue failed, skipping cache update: {}", e);
                warnings.push(format!("jobs: {}", e));
            }
        }

        keep_last_good(nodes, parse_nodes, &mut last.nodes, "nodes", &mut warnings);
        keep_last_good(
            cluster_jobs,
            parse_cluster_jobs,
            &mut last.cluster_jobs,
            "cluster jobs",
            &mut warnings,
        );
        keep_last_good(
            priorities,
            parse_priorities,
            &mut last.priorities,
            "priorities",
            &mut warnings,
        );

        let view = ClusterView::build(
            last.nodes.clone(),
            &last.cluster_jobs,
            last.priorities.clone(),
        );
        drop(last);

        let generation = self.next_generation();
        tracing::debug!(
            "Refresh finished (generation {}, {} warnings)",
            generation,
            warnings.len()
        );

        DashboardUpdate {
            generation,
            view,
            warnings,
        }
    }

    /// Start a refresh in the background unless one is already running.
    ///
    /// Returns whether a refresh was started.
    pub fn trigger(self: &Arc<Self>) -> bool {
        if !self.try_acquire() {
            tracing::debug!("Refresh already in flight, skipping");
            return false;
        }
        // Ownership of the flag moves into the task.
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let _guard = InFlight(&this.in_flight);
            let update = this.refresh().await;
            if this.events.send(AppEvent::Update(update)).await.is_err() {
                tracing::debug!("UI closed, dropping refresh result");
            }
        });
        true
    }

    /// Periodic refresh timer. The first tick is skipped so the ticker
    /// does not race the load that started it.
    pub fn spawn_ticker(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if this.events.is_closed() {
                    break;
                }
                this.trigger();
            }
        })
    }

    /// Run the initial load in the background and start the ticker once it
    /// succeeds.
    pub fn spawn_initial_load(self: &Arc<Self>, config: PollingConfig) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let observer = ChannelObserver::new(this.events.clone());
            let event = match this.initial_load(&observer).await {
                Ok(update) => {
                    tracing::info!(
                        "Polling every {} seconds",
                        config.interval.as_secs()
                    );
                    this.spawn_ticker(config.interval);
                    AppEvent::Update(update)
                }
                Err(LoadError::Unavailable(reason)) => AppEvent::Unavailable(reason),
            };
            if this.events.send(event).await.is_err() {
                tracing::debug!("UI closed before initial load finished");
            }
        })
    }

    /// Cancel a job in the background, report the outcome and refresh.
    pub fn spawn_cancel(self: &Arc<Self>, job_id: String) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let result = this.source.cancel_job(&job_id).await;
            match &result {
                Ok(()) => tracing::info!("Cancelled job {}", job_id),
                Err(e) => tracing::warn!("Cancel of job {} failed: {}", job_id, e),
            }
            let ok = result.is_ok();
            let event = AppEvent::CancelFinished {
                job_id,
                result: result.map_err(|e| e.to_string()),
            };
            if this.events.send(event).await.is_err() {
                return;
            }
            if ok {
                this.trigger();
            }
        })
    }
}

/// Run one fetch step of the initial load, recording a failure as a warning.
async fn run_step(
    observer: &dyn ProgressObserver,
    step: LoadStep,
    fetch: impl Future<Output = Result<String, SlurmError>>,
    warnings: &mut Vec<String>,
) -> Option<String> {
    observer.report(step, StepStatus::Started);
    match fetch.await {
        Ok(text) => {
            observer.report(step, StepStatus::Succeeded);
            Some(text)
        }
        Err(e) => {
            tracing::warn!("{} failed: {}", step.label(), e);
            warnings.push(format!("{}: {}", step.label(), e));
            observer.report(step, StepStatus::Failed(e.to_string()));
            None
        }
    }
}

/// Replace `slot` with the freshly parsed value, or keep it on failure.
fn keep_last_good<T>(
    fetched: Result<String, SlurmError>,
    parse: fn(&str) -> Vec<T>,
    slot: &mut Vec<T>,
    name: &str,
    warnings: &mut Vec<String>,
) {
    match fetched {
        Ok(text) => *slot = parse(&text),
        Err(e) => {
            tracing::warn!("{} fetch failed, keeping previous data: {}", name, e);
            warnings.push(format!("{}: {}", name, e));
        }
    }
}
