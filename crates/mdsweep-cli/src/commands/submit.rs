use crate::cli::SubmitArgs;
use crate::config::builder::build_environments;
use crate::config::models::AppConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use mdsweep::engine::progress::ProgressReporter;
use mdsweep::flow::environment::detect_hostname;
use mdsweep::workflows;
use mdsweep::workflows::submit::SubmitOptions;
use std::path::PathBuf;
use tracing::{info, warn};

pub async fn run(args: SubmitArgs, config: &AppConfig) -> Result<()> {
    let (project, graph) = super::open_project(config)?;

    let registry = build_environments(config)?;
    let host = args.host.or_else(detect_hostname);
    let environment = registry.resolve(args.environment.as_deref(), host.as_deref())?;
    info!(
        "Using environment '{}' (host: {})",
        environment.name(),
        host.as_deref().unwrap_or("unknown")
    );

    let binary = std::env::current_exe().unwrap_or_else(|e| {
        warn!("Cannot locate the running executable ({}); scripts will call 'mdsweep'.", e);
        PathBuf::from("mdsweep")
    });
    let options = SubmitOptions {
        job_ids: args.jobs,
        operations: args.operations,
        pretend: args.pretend,
        force: args.force,
        partition: args.partition,
        binary,
    };

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let summary = tokio::task::block_in_place(|| {
        workflows::submit::run(&project, &graph, &environment, &options, &reporter)
    })?;

    for pending in &summary.already_submitted {
        println!(
            "Skipped {} for job {}: already submitted (see {}, or pass --force)",
            pending.operation,
            pending.job_id,
            pending.record.display()
        );
    }
    if summary.submissions.is_empty() {
        println!("No eligible operations to submit.");
        return Ok(());
    }
    for submission in &summary.submissions {
        let verb = if submission.submitted { "Submitted" } else { "Rendered" };
        println!(
            "{} {} for job {}: {}",
            verb,
            submission.operation,
            submission.job_id,
            submission.script.display()
        );
        if let Some(output) = &submission.scheduler_output {
            println!("  {}", output.trim());
        }
    }
    Ok(())
}
