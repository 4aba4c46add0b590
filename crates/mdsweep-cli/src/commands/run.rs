use crate::cli::RunArgs;
use crate::config::models::AppConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use mdsweep::engine::progress::ProgressReporter;
use mdsweep::workflows;
use mdsweep::workflows::run::RunOptions;
use tracing::{info, warn};

pub async fn run(args: RunArgs, config: &AppConfig) -> Result<()> {
    let (project, graph) = super::open_project(config)?;

    let options = RunOptions {
        job_ids: args.jobs,
        operations: args.operations,
        max_operations: args.max_operations,
    };

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Invoking the run workflow...");
    let summary =
        tokio::task::block_in_place(|| workflows::run::run(&project, &graph, &options, &reporter))?;

    println!("Executed {} operation(s).", summary.executed);
    for job_id in &summary.skipped_locked {
        warn!("Job {} was skipped: locked by another controller.", job_id);
        println!("  Skipped locked job {}", job_id);
    }
    for failure in &summary.failures {
        match &failure.operation {
            Some(operation) => println!(
                "  ✗ {} on job {}: {}",
                operation, failure.job_id, failure.message
            ),
            None => println!("  ✗ job {}: {}", failure.job_id, failure.message),
        }
    }

    if summary.is_success() {
        Ok(())
    } else {
        Err(CliError::Other(anyhow::anyhow!(
            "{} failure(s), {} job(s) skipped while locked",
            summary.failures.len(),
            summary.skipped_locked.len()
        )))
    }
}
