use crate::core::job::Job;
use crate::core::project::Project;
use crate::engine::error::EngineError;
use crate::engine::lock::JobLock;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::flow::graph::FlowGraph;
use crate::flow::operation::Operation;
use serde::Serialize;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Job ids or unique id prefixes; empty selects every job.
    pub job_ids: Vec<String>,
    /// Operation names to consider; empty allows every operation.
    pub operations: Vec<String>,
    /// Stop after this many operations have been executed.
    pub max_operations: Option<usize>,
}

/// A failure confined to one job. `operation` is `None` when the job could not be
/// evaluated at all, for example because its document is unreadable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationFailure {
    pub job_id: String,
    pub operation: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub executed: usize,
    pub failures: Vec<OperationFailure>,
    pub skipped_locked: Vec<String>,
}

impl RunSummary {
    /// True only when every selected job was visited and nothing failed.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && self.skipped_locked.is_empty()
    }
}

enum JobOutcome {
    Finished,
    BudgetExhausted,
}

/// Executes eligible operations on the selected jobs until none remains eligible.
///
/// Jobs are visited in id order. Within a job the document is re-read before every dispatch,
/// and the first eligible operation in dependency order runs next. A failed operation is
/// recorded and ends the work on that job for this invocation; its flag stays unset, so the
/// next invocation retries it.
#[instrument(skip_all, name = "run_workflow")]
pub fn run(
    project: &Project,
    graph: &FlowGraph,
    options: &RunOptions,
    reporter: &ProgressReporter,
) -> Result<RunSummary, EngineError> {
    for name in &options.operations {
        if graph.operation(name).is_none() {
            return Err(EngineError::UnknownOperation(name.clone()));
        }
    }

    let jobs = project.select_jobs(&options.job_ids)?;
    info!("Running eligible operations on {} jobs.", jobs.len());

    reporter.report(Progress::PhaseStart {
        name: "Running operations",
    });
    reporter.report(Progress::TaskStart {
        total_steps: jobs.len() as u64,
    });

    let mut summary = RunSummary::default();
    for job in &jobs {
        let _lock = match JobLock::acquire(job) {
            Ok(lock) => lock,
            Err(EngineError::JobLocked { job_id, holder }) => {
                warn!(%job_id, "Skipping job locked by {}", holder);
                summary.skipped_locked.push(job_id);
                reporter.report(Progress::TaskIncrement);
                continue;
            }
            Err(e) => {
                record_job_error(&mut summary, job, e);
                reporter.report(Progress::TaskIncrement);
                continue;
            }
        };

        let outcome = run_job(job, graph, options, reporter, &mut summary)
            .unwrap_or_else(|e| {
                record_job_error(&mut summary, job, e);
                JobOutcome::Finished
            });
        reporter.report(Progress::TaskIncrement);
        if let JobOutcome::BudgetExhausted = outcome {
            info!(
                "Reached the limit of {} operations.",
                options.max_operations.unwrap_or_default()
            );
            break;
        }
    }

    reporter.report(Progress::TaskFinish);
    reporter.report(Progress::PhaseFinish);
    info!(
        "Executed {} operations with {} failures.",
        summary.executed,
        summary.failures.len()
    );
    Ok(summary)
}

fn record_job_error(summary: &mut RunSummary, job: &Job, e: EngineError) {
    let job_id = job.id().to_string();
    error!(%job_id, "Job could not be processed: {}", e);
    summary.failures.push(OperationFailure {
        job_id,
        operation: None,
        message: e.to_string(),
    });
}

fn run_job(
    job: &Job,
    graph: &FlowGraph,
    options: &RunOptions,
    reporter: &ProgressReporter,
    summary: &mut RunSummary,
) -> Result<JobOutcome, EngineError> {
    let allowed = |op: &Operation| {
        options.operations.is_empty() || options.operations.iter().any(|n| n == op.name())
    };

    loop {
        if options
            .max_operations
            .is_some_and(|max| summary.executed >= max)
        {
            return Ok(JobOutcome::BudgetExhausted);
        }

        let document = job.document()?;
        let Some(operation) = graph
            .eligible_operations(&document)
            .into_iter()
            .find(|&op| allowed(op))
        else {
            return Ok(JobOutcome::Finished);
        };

        let job_id = job.id().to_string();
        reporter.report(Progress::OperationStart {
            job_id: job_id.clone(),
            operation: operation.name().to_string(),
        });
        info!(job_id = %job.id().short(), "Executing '{}'", operation.name());

        let result = operation.execute(job);
        reporter.report(Progress::OperationFinish {
            job_id: job_id.clone(),
            operation: operation.name().to_string(),
            success: result.is_ok(),
        });

        match result {
            Ok(()) => {
                summary.executed += 1;
                let after = job.document()?;
                let holding = graph.labels_for(&after);
                let completed = operation
                    .post_labels()
                    .iter()
                    .all(|label| holding.contains(label));
                if !completed {
                    warn!(%job_id, "'{}' returned without completing", operation.name());
                    summary.failures.push(OperationFailure {
                        job_id,
                        operation: Some(operation.name().to_string()),
                        message: "post-conditions still unmet after success".to_string(),
                    });
                    return Ok(JobOutcome::Finished);
                }
            }
            Err(e) => {
                error!(%job_id, "'{}' failed: {}", operation.name(), e);
                summary.failures.push(OperationFailure {
                    job_id,
                    operation: Some(operation.name().to_string()),
                    message: e.to_string(),
                });
                return Ok(JobOutcome::Finished);
            }
        }
    }
}
