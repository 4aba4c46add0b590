use mdsweep::core::grid::ParameterGrid;

pub struct DefaultsConfig {
    pub project_name: String,
    pub engine_executable: String,
    pub nvt_script: String,
    pub beads_from_center: usize,
    pub new_type: String,
    pub parameters: ParameterGrid,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            project_name: "mdsweep".to_string(),
            engine_executable: "python -u".to_string(),
            nvt_script: "src/nvt.py".to_string(),
            beads_from_center: 2,
            new_type: "B".to_string(),
            parameters: ParameterGrid::reference_sweep(),
        }
    }
}
