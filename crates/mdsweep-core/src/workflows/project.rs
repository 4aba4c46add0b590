use crate::core::document::JobDocument;
use crate::core::job::{
    FORCEFIELD_FILE, INIT_SNAPSHOT_FILE, Job, LOG_FILE, RESTART_SNAPSHOT_FILE, TRAJECTORY_FILE,
};
use crate::engine::error::EngineError;
use crate::engine::simulation::SimulationEngine;
use crate::flow::error::FlowError;
use crate::flow::graph::{FlowGraph, FlowGraphBuilder};
use crate::flow::operation::{Directives, Operation};
use std::sync::Arc;
use tracing::{info, instrument};

pub const NVT: &str = "nvt";
pub const SAMPLE: &str = "sample";

pub const NVT_DONE: &str = "nvt_done";
pub const SAMPLE_DONE: &str = "sample_done";

/// Files a successful `nvt` operation leaves in the job workspace.
pub const NVT_OUTPUTS: [&str; 5] = [
    TRAJECTORY_FILE,
    LOG_FILE,
    FORCEFIELD_FILE,
    INIT_SNAPSHOT_FILE,
    RESTART_SNAPSHOT_FILE,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDirectives {
    pub nvt: Directives,
    pub sample: Directives,
}

impl Default for ProjectDirectives {
    fn default() -> Self {
        Self {
            nvt: Directives {
                ngpu: 1,
                ..Directives::default()
            },
            sample: Directives::default(),
        }
    }
}

fn nvt_done(doc: &JobDocument) -> bool {
    doc.nvt_done
}

fn sample_done(doc: &JobDocument) -> bool {
    doc.sample_done
}

/// The two-stage MD project: `nvt` equilibrates a job, `sample` runs once it is equilibrated.
pub fn md_project(
    engine: Arc<dyn SimulationEngine>,
    directives: ProjectDirectives,
) -> Result<FlowGraph, FlowError> {
    let nvt = Operation::new(NVT, move |job| run_nvt(job, engine.as_ref()))
        .post(NVT_DONE)
        .with_directives(directives.nvt);
    let sampling = Operation::new(SAMPLE, sample)
        .pre(NVT_DONE)
        .post(SAMPLE_DONE)
        .with_directives(directives.sample);

    FlowGraphBuilder::new()
        .label(NVT_DONE, nvt_done)
        .label(SAMPLE_DONE, sample_done)
        .operation(nvt)
        .operation(sampling)
        .build()
}

/// Runs the NVT stage of `job` and records its results.
///
/// The document is only touched after the engine succeeded and every expected output file
/// exists; the thermostat coupling, the reference units and `nvt_done` are then written in a
/// single update. Any failure leaves the job eligible for a complete rerun.
#[instrument(skip_all, fields(job_id = %job.id()))]
pub fn run_nvt(job: &Job, engine: &dyn SimulationEngine) -> Result<(), EngineError> {
    let statepoint = job.statepoint();
    let dt = statepoint.get_f64("dt")?;
    let tau_kt_steps = statepoint.get_f64("tau_kT")?;

    let units = engine.run_nvt(job)?;

    for file in NVT_OUTPUTS {
        if !job.path_of(file).is_file() {
            return Err(EngineError::MissingOutput {
                operation: NVT.to_string(),
                job_id: job.id().to_string(),
                file: file.to_string(),
            });
        }
    }

    job.update_document(|doc| {
        doc.tau_kt = Some(dt * tau_kt_steps);
        doc.record_reference_units(&units);
        doc.nvt_done = true;
    })?;
    info!("NVT finished; reference length {} nm.", units.ref_length);
    Ok(())
}

/// Production sampling. Analysis is not implemented yet; the operation only marks the job as
/// sampled.
#[instrument(skip_all, fields(job_id = %job.id()))]
pub fn sample(job: &Job) -> Result<(), EngineError> {
    job.update_document(|doc| doc.sample_done = true)?;
    info!("Sampling recorded.");
    Ok(())
}
