//! Shared dashboard state for sqtop.
//!
//! `JobCache` is the one piece of state shared across threads; the
//! `ClusterView` is rebuilt whole on every refresh and moved to the UI.

pub mod cache;
pub mod progress;
pub mod view;

pub use cache::{CacheCell, CacheSnapshot, CacheStats, JobCache};
pub use progress::{LoadProgress, LoadStep, NoProgress, ProgressObserver, StepStatus};
pub use view::ClusterView;
