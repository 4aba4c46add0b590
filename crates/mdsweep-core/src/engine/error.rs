use thiserror::Error;

use super::config::ConfigError;
use crate::core::error::WorkspaceError;
use crate::core::io::traits::TrajectoryError;
use crate::core::statepoint::StatePointError;
use crate::flow::error::FlowError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Trajectory(#[from] TrajectoryError),

    #[error("Job metadata error: {0}")]
    Metadata(#[from] StatePointError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error("Simulation failed for job {job_id}: {message}")]
    Simulation { job_id: String, message: String },

    #[error("Simulation report for job {job_id} is invalid: {reason}")]
    InvalidReport { job_id: String, reason: String },

    #[error("Operation '{operation}' did not produce '{file}' for job {job_id}")]
    MissingOutput {
        operation: String,
        job_id: String,
        file: String,
    },

    #[error("Center window of {window} beads does not fit in a molecule of {length} beads")]
    InvalidWindow { window: usize, length: usize },

    #[error("Frame {frame} holds {found} particles, but {expected} are required")]
    ParticleCount {
        frame: usize,
        found: usize,
        expected: usize,
    },

    #[error("Job {job_id} is locked by another controller: {holder}")]
    JobLocked { job_id: String, holder: String },

    #[error("Unknown operation: '{0}'")]
    UnknownOperation(String),

    #[error("Submission failed: {0}")]
    Submission(String),
}
