//! Error types for the workflow crate.

use reco_client::{BuildStatus, RecoError};
use thiserror::Error;

/// Errors that abort a workflow run
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// Any client failure: service, parse, I/O or transport
    #[error(transparent)]
    Client(#[from] RecoError),

    /// The build was still running when the poll budget ran out
    #[error("Build {build_id} still {last_status} after {attempts} status checks")]
    PollLimitReached {
        build_id: String,
        attempts: u32,
        last_status: BuildStatus,
    },
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, WorkflowError>;
