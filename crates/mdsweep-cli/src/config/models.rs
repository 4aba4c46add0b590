use super::file::FileEnvironmentConfig;
use indexmap::IndexMap;
use mdsweep::core::grid::ParameterGrid;
use std::path::PathBuf;

/// Project settings after every configuration layer has been merged.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub project_root: PathBuf,
    pub project_name: String,
    pub parameters: ParameterGrid,
    pub engine_executable: String,
    pub nvt_script: PathBuf,
    pub environments: IndexMap<String, FileEnvironmentConfig>,
    pub beads_from_center: usize,
    pub new_type: String,
}
