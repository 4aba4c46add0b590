use super::config::ConfigError;
use super::error::EngineError;
use crate::core::document::ReferenceUnits;
use crate::core::error::WorkspaceError;
use crate::core::job::{Job, STATEPOINT_FILE};
use std::fs;
use std::path::Path;
use std::process::Command;
use tracing::{debug, info};

/// File the external engine writes its [`ReferenceUnits`] to, inside the job workspace.
pub const NVT_REPORT_FILE: &str = "nvt_report.json";

/// The molecular-dynamics backend.
///
/// An implementation runs the shrink and NVT stages for one job, writes the trajectory, log,
/// force-field, and snapshot files into the job workspace, and returns the reference units of
/// the simulation. It must overwrite partial output from an earlier failed attempt.
///
/// `trajectory.gsd` is consumed by the relabel workflow through
/// [`FrameStreamFile`](crate::core::io::stream::FrameStreamFile), so it must hold
/// newline-delimited JSON frames. A binary GSD trajectory is rejected with
/// `TrajectoryError::UnsupportedFormat` until a GSD codec is provided.
pub trait SimulationEngine: Send + Sync {
    fn run_nvt(&self, job: &Job) -> Result<ReferenceUnits, EngineError>;
}

/// Runs the simulation as a child process, e.g. `python -u nvt.py`.
///
/// The child runs inside the job workspace and receives:
///
/// - `MDSWEEP_JOB_ID`: the job id
/// - `MDSWEEP_JOB_DIR`: the absolute job workspace path
/// - `MDSWEEP_STATEPOINT`: the path of the job's `statepoint.json`
/// - `MDSWEEP_NVT_REPORT`: where to write the reference units as JSON
///
/// The script is responsible for writing `trajectory.gsd` as JSON frames, one per line, in the
/// layout of [`Frame`](crate::core::io::frame::Frame).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalEngine {
    program: String,
    args: Vec<String>,
}

impl ExternalEngine {
    /// Builds an engine from a whitespace-separated command line.
    pub fn new(command_line: &str) -> Result<Self, ConfigError> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or_else(|| ConfigError::InvalidValue {
            parameter: "engine.executable",
            reason: "command line is empty".to_string(),
        })?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    /// Builds an engine that invokes `script` with the interpreter command line `executable`.
    pub fn with_script(executable: &str, script: &Path) -> Result<Self, ConfigError> {
        let mut engine = Self::new(executable)?;
        engine.args.push(script.to_string_lossy().to_string());
        Ok(engine)
    }

    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl SimulationEngine for ExternalEngine {
    fn run_nvt(&self, job: &Job) -> Result<ReferenceUnits, EngineError> {
        let report_path = job.path_of(NVT_REPORT_FILE);
        if report_path.exists() {
            debug!("Removing stale report {:?}", &report_path);
            fs::remove_file(&report_path).map_err(|source| WorkspaceError::Io {
                path: report_path.to_string_lossy().to_string(),
                source,
            })?;
        }

        let job_dir = fs::canonicalize(job.path()).map_err(|source| WorkspaceError::Io {
            path: job.path().to_string_lossy().to_string(),
            source,
        })?;

        info!(job_id = %job.id(), "Launching `{}`", self.command_line());
        let status = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&job_dir)
            .env("MDSWEEP_JOB_ID", job.id().as_str())
            .env("MDSWEEP_JOB_DIR", &job_dir)
            .env("MDSWEEP_STATEPOINT", job_dir.join(STATEPOINT_FILE))
            .env("MDSWEEP_NVT_REPORT", job_dir.join(NVT_REPORT_FILE))
            .status()
            .map_err(|e| EngineError::Simulation {
                job_id: job.id().to_string(),
                message: format!("failed to launch `{}`: {}", self.command_line(), e),
            })?;

        if !status.success() {
            return Err(EngineError::Simulation {
                job_id: job.id().to_string(),
                message: format!("`{}` exited with {}", self.command_line(), status),
            });
        }

        let content = fs::read_to_string(&report_path).map_err(|_| EngineError::MissingOutput {
            operation: "nvt".to_string(),
            job_id: job.id().to_string(),
            file: NVT_REPORT_FILE.to_string(),
        })?;
        let units: ReferenceUnits =
            serde_json::from_str(&content).map_err(|source| WorkspaceError::Json {
                path: report_path.to_string_lossy().to_string(),
                source,
            })?;
        validate_units(job, &units)?;
        Ok(units)
    }
}

fn validate_units(job: &Job, units: &ReferenceUnits) -> Result<(), EngineError> {
    let values = [
        ("ref_mass", units.ref_mass),
        ("ref_energy", units.ref_energy),
        ("ref_length", units.ref_length),
        ("real_time_step", units.real_time_step),
    ];
    for (name, value) in values {
        if !(value.is_finite() && value > 0.0) {
            return Err(EngineError::InvalidReport {
                job_id: job.id().to_string(),
                reason: format!("{} must be a positive finite number, got {}", name, value),
            });
        }
    }
    Ok(())
}
