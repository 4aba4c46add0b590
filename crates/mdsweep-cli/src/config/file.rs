use crate::error::{CliError, Result};
use indexmap::IndexMap;
use mdsweep::core::grid::ParameterGrid;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

pub const CONFIG_FILE: &str = "mdsweep.toml";

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileEngineConfig {
    pub executable: Option<String>,
    pub nvt_script: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileEnvironmentConfig {
    pub hostname_pattern: Option<String>,
    pub template: Option<String>,
    pub partition: Option<String>,
    pub scheduler_command: Option<String>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileRelabelConfig {
    pub beads_from_center: Option<usize>,
    pub new_type: Option<String>,
}

/// Contents of `mdsweep.toml`. Every section is optional.
#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct FileConfig {
    pub name: Option<String>,
    pub parameters: Option<ParameterGrid>,
    pub engine: Option<FileEngineConfig>,
    #[serde(default)]
    pub environments: IndexMap<String, FileEnvironmentConfig>,
    pub relabel: Option<FileRelabelConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Loads `<root>/mdsweep.toml`, or the empty configuration when the file does not exist.
    pub fn load(root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if path.is_file() {
            Self::from_file(&path)
        } else {
            debug!("No {} in {:?}; using defaults.", CONFIG_FILE, root);
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn parses_a_complete_file_in_declaration_order() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            r#"
name = "pps-sweep"

[parameters]
lengths = [20, 30, 50]
chains = [50]
pppm_resolution = [[16, 16, 16]]
n_steps = [5e7]

[engine]
executable = "python -u"
nvt-script = "src/nvt.py"

[environments.fry]
partition = "gpu"

[environments.summit]
hostname-pattern = "login[0-9]+"
template = "summit.sh"
partition = "batch"
scheduler-command = "bsub"

[relabel]
beads-from-center = 3
new-type = "C"
"#,
        )
        .unwrap();

        let config = FileConfig::load(dir.path()).unwrap();
        assert_eq!(config.name.as_deref(), Some("pps-sweep"));

        let grid = config.parameters.unwrap();
        let names: Vec<_> = grid.names().collect();
        assert_eq!(names, vec!["lengths", "chains", "pppm_resolution", "n_steps"]);
        assert_eq!(grid.combinations(), 3);

        assert_eq!(
            config.engine.unwrap().nvt_script.as_deref(),
            Some("src/nvt.py")
        );
        assert_eq!(config.environments.len(), 2);
        assert_eq!(
            config.environments["summit"].scheduler_command.as_deref(),
            Some("bsub")
        );
        assert_eq!(config.relabel.unwrap().beads_from_center, Some(3));
    }

    #[test]
    fn missing_file_is_the_empty_config() {
        let dir = tempdir().unwrap();
        let config = FileConfig::load(dir.path()).unwrap();
        assert!(config.name.is_none());
        assert!(config.parameters.is_none());
        assert!(config.environments.is_empty());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "[relabel]\nbeads-from-centre = 3\n",
        )
        .unwrap();
        assert!(matches!(
            FileConfig::load(dir.path()),
            Err(CliError::FileParsing { .. })
        ));
    }
}
