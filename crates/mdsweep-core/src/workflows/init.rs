use crate::core::error::WorkspaceError;
use crate::core::grid::ParameterGrid;
use crate::core::project::Project;
use crate::engine::progress::{Progress, ProgressReporter};
use serde::Serialize;
use tracing::{debug, info, instrument};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InitSummary {
    pub created: usize,
    pub existing: usize,
}

impl InitSummary {
    pub fn total(&self) -> usize {
        self.created + self.existing
    }
}

/// Materializes one job per state point of `grid`.
///
/// Existing jobs are reused, and their documents only gain the completion flags they lack,
/// so rerunning initialization never resets progress.
#[instrument(skip_all, name = "init_workflow", fields(project = project.name()))]
pub fn run(
    project: &Project,
    grid: &ParameterGrid,
    reporter: &ProgressReporter,
) -> Result<InitSummary, WorkspaceError> {
    let statepoints = grid.expand();
    info!(
        "Initializing {} state points over {} parameters.",
        statepoints.len(),
        grid.len()
    );

    reporter.report(Progress::PhaseStart {
        name: "Initializing jobs",
    });
    reporter.report(Progress::TaskStart {
        total_steps: statepoints.len() as u64,
    });

    let mut summary = InitSummary::default();
    for statepoint in statepoints {
        let (job, created) = project.init_job(statepoint)?;
        if created {
            summary.created += 1;
        } else {
            summary.existing += 1;
        }
        if job.ensure_document()? {
            debug!(job_id = %job.id(), "Wrote completion flags");
        }
        reporter.report(Progress::TaskIncrement);
    }
    reporter.report(Progress::TaskFinish);

    let total = project.write_statepoint_summary()?;
    reporter.report(Progress::PhaseFinish);

    info!(
        "Initialization complete: {} created, {} existing, {} jobs in workspace.",
        summary.created, summary.existing, total
    );
    Ok(summary)
}
