//! Error types for Slurm queries and the cancel command.

use sqtop_parsers::CommandError;
use thiserror::Error;

/// User-supplied input rejected before any process is spawned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid job id {0:?}: expected digits with an optional _N task suffix")]
    JobId(String),
}

/// Error type for Slurm operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlurmError {
    #[error(transparent)]
    Command(#[from] CommandError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}
