use crate::cli::RelabelArgs;
use crate::config::builder::build_relabel_config;
use crate::config::models::AppConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use mdsweep::core::io::stream::FrameStreamFile;
use mdsweep::core::project::Project;
use mdsweep::engine::progress::ProgressReporter;
use mdsweep::workflows::relabel::relabel_center_beads;
use tracing::info;

pub async fn run(args: RelabelArgs, config: &AppConfig) -> Result<()> {
    let project = Project::open(&config.project_root)?;
    let job = project.find_job(&args.job)?;
    let relabel_config = build_relabel_config(config, &args)?;

    info!(
        "Relabeling job {} with {} bead(s) on each side of the center as '{}'",
        job.id(),
        relabel_config.beads_from_center,
        relabel_config.new_type
    );

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let summary = tokio::task::block_in_place(|| {
        relabel_center_beads::<FrameStreamFile>(&job, &relabel_config, &reporter)
    })?;

    println!(
        "Wrote {} frame(s) with {} relabeled window(s) per frame to {}",
        summary.frames_written,
        summary.windows.len(),
        summary.output.display()
    );
    Ok(())
}
