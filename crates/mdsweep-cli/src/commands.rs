pub mod init;
pub mod relabel;
pub mod run;
pub mod status;
pub mod submit;

use crate::config::builder::build_engine;
use crate::config::models::AppConfig;
use crate::error::Result;
use mdsweep::core::project::Project;
use mdsweep::flow::graph::FlowGraph;
use mdsweep::workflows::project::{ProjectDirectives, md_project};
use std::sync::Arc;
use tracing::debug;

/// Opens the existing project and builds its operation graph around the configured engine.
pub(crate) fn open_project(config: &AppConfig) -> Result<(Project, FlowGraph)> {
    let project = Project::open(&config.project_root)?;
    let engine = build_engine(config)?;
    debug!("Simulation engine: {}", engine.command_line());
    let graph = md_project(Arc::new(engine), ProjectDirectives::default())?;
    Ok((project, graph))
}
