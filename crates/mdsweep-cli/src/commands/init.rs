use crate::cli::InitArgs;
use crate::config::models::AppConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use mdsweep::core::project::Project;
use mdsweep::engine::progress::ProgressReporter;
use mdsweep::workflows;
use std::fs;
use tracing::info;

pub async fn run(args: InitArgs, config: &AppConfig) -> Result<()> {
    let name = args.name.unwrap_or_else(|| config.project_name.clone());
    fs::create_dir_all(&config.project_root)?;

    info!("Initializing project '{}' at {:?}", name, &config.project_root);
    let project = Project::init(&config.project_root, &name)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let summary = tokio::task::block_in_place(|| {
        workflows::init::run(&project, &config.parameters, &reporter)
    })?;

    println!(
        "Project '{}': {} job(s) in the workspace ({} new, {} already present).",
        project.name(),
        summary.total(),
        summary.created,
        summary.existing
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::builder::build_config;
    use tempfile::tempdir;

    #[tokio::test(flavor = "multi_thread")]
    async fn init_creates_the_reference_sweep_and_is_rerunnable() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("pps");
        let config = build_config(&root, &["parameters.lengths=[20, 30]".to_string()]).unwrap();

        run(InitArgs::default(), &config).await.unwrap();
        let project = Project::open(&root).unwrap();
        assert_eq!(project.name(), "pps");
        assert_eq!(project.jobs().unwrap().len(), 2);

        run(InitArgs::default(), &config).await.unwrap();
        assert_eq!(project.jobs().unwrap().len(), 2);

        let (_, graph) = crate::commands::open_project(&config).unwrap();
        assert_eq!(graph.operations().len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn explicit_name_must_match_existing_project() {
        let dir = tempdir().unwrap();
        let config = build_config(dir.path(), &[]).unwrap();
        let named = |name: &str| InitArgs {
            name: Some(name.to_string()),
        };

        run(named("first"), &config).await.unwrap();
        assert!(run(named("second"), &config).await.is_err());
    }
}
