use crate::core::job::Job;
use crate::core::project::Project;
use crate::engine::error::EngineError;
use crate::flow::graph::FlowGraph;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobStatus {
    pub id: String,
    pub statepoint: String,
    pub labels: Vec<&'static str>,
    pub eligible: Vec<&'static str>,
}

/// Snapshot of the whole workspace. Counts keep the declaration order of the graph.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusReport {
    pub project: String,
    pub jobs: Vec<JobStatus>,
    pub label_counts: IndexMap<&'static str, usize>,
    pub eligible_counts: IndexMap<&'static str, usize>,
}

impl StatusReport {
    pub fn total(&self) -> usize {
        self.jobs.len()
    }

    /// Jobs with no eligible operation left.
    pub fn completed(&self) -> usize {
        self.jobs.iter().filter(|job| job.eligible.is_empty()).count()
    }
}

fn job_status(job: &Job, graph: &FlowGraph) -> Result<JobStatus, EngineError> {
    let document = job.document()?;
    Ok(JobStatus {
        id: job.id().to_string(),
        statepoint: job.statepoint().summary(),
        labels: graph.labels_for(&document),
        eligible: graph
            .eligible_operations(&document)
            .into_iter()
            .map(|op| op.name())
            .collect(),
    })
}

/// Evaluates labels and eligibility of the selected jobs in parallel. Nothing is written.
#[instrument(skip_all, name = "status_workflow")]
pub fn run(
    project: &Project,
    graph: &FlowGraph,
    job_ids: &[String],
) -> Result<StatusReport, EngineError> {
    let jobs = project.select_jobs(job_ids)?;
    let rows = jobs
        .par_iter()
        .map(|job| job_status(job, graph))
        .collect::<Result<Vec<_>, _>>()?;

    let mut label_counts: IndexMap<&'static str, usize> =
        graph.labels().iter().map(|label| (label.name(), 0)).collect();
    let mut eligible_counts: IndexMap<&'static str, usize> =
        graph.operations().iter().map(|op| (op.name(), 0)).collect();
    for row in &rows {
        for &label in &row.labels {
            *label_counts.entry(label).or_default() += 1;
        }
        for &op in &row.eligible {
            *eligible_counts.entry(op).or_default() += 1;
        }
    }

    Ok(StatusReport {
        project: project.name().to_string(),
        jobs: rows,
        label_counts,
        eligible_counts,
    })
}
