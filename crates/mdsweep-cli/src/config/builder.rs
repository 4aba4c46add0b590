use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use super::models::AppConfig;
use crate::cli::RelabelArgs;
use crate::error::{CliError, Result};
use mdsweep::core::grid::ParameterGrid;
use mdsweep::engine::config::{RelabelConfig, RelabelConfigBuilder};
use mdsweep::engine::simulation::ExternalEngine;
use mdsweep::flow::environment::{EnvironmentProfile, EnvironmentRegistry};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Merges the built-in defaults, `<root>/mdsweep.toml` and the `--set` overrides.
pub fn build_config(project_root: &Path, set_values: &[String]) -> Result<AppConfig> {
    let defaults = DefaultsConfig::default();
    let file_config = FileConfig::load(project_root)?;
    let mut file_config = apply_set_values(file_config, set_values)?;

    let project_name = file_config
        .name
        .take()
        .or_else(|| {
            project_root
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
        })
        .unwrap_or(defaults.project_name);

    let engine_file = file_config.engine.take().unwrap_or_default();
    let relabel_file = file_config.relabel.take().unwrap_or_default();

    Ok(AppConfig {
        project_root: project_root.to_path_buf(),
        project_name,
        parameters: file_config.parameters.unwrap_or(defaults.parameters),
        engine_executable: engine_file
            .executable
            .unwrap_or(defaults.engine_executable),
        nvt_script: engine_file
            .nvt_script
            .unwrap_or(defaults.nvt_script)
            .into(),
        environments: file_config.environments,
        beads_from_center: relabel_file
            .beads_from_center
            .unwrap_or(defaults.beads_from_center),
        new_type: relabel_file.new_type.unwrap_or(defaults.new_type),
    })
}

fn parse_value<T: std::str::FromStr>(key: &str, value_str: &str, kind: &str) -> Result<T> {
    value_str.parse().map_err(|_| {
        CliError::Config(format!("Invalid {} value for {}: {}", kind, key, value_str))
    })
}

/// Parses the value of `parameters.<name>=...` as JSON. A scalar becomes a single candidate.
fn parse_parameter_values(key: &str, value_str: &str) -> Result<Vec<Value>> {
    let value: Value = serde_json::from_str(value_str)
        .map_err(|e| CliError::Config(format!("Invalid JSON value for {}: {}", key, e)))?;
    match value {
        Value::Array(values) if values.is_empty() => Err(CliError::Config(format!(
            "Parameter {} needs at least one value",
            key
        ))),
        Value::Array(values) => Ok(values),
        scalar => Ok(vec![scalar]),
    }
}

pub fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    if set_values.is_empty() {
        return Ok(config);
    }
    for kv_pair in set_values {
        let parts: Vec<_> = kv_pair.splitn(2, '=').collect();
        if parts.len() != 2 {
            return Err(CliError::Config(format!(
                "Invalid --set format: '{}'. Expected KEY=VALUE.",
                kv_pair
            )));
        }
        let key = parts[0];
        let value_str = parts[1];
        debug!("Applying override {} = {}", key, value_str);

        match key {
            "name" => config.name = Some(value_str.to_string()),
            "engine.executable" => {
                config.engine.get_or_insert_with(Default::default).executable =
                    Some(value_str.to_string());
            }
            "engine.nvt-script" => {
                config.engine.get_or_insert_with(Default::default).nvt_script =
                    Some(value_str.to_string());
            }
            "relabel.beads-from-center" => {
                config
                    .relabel
                    .get_or_insert_with(Default::default)
                    .beads_from_center = Some(parse_value(key, value_str, "integer")?);
            }
            "relabel.new-type" => {
                config.relabel.get_or_insert_with(Default::default).new_type =
                    Some(value_str.to_string());
            }
            _ => {
                if let Some(name) = key.strip_prefix("parameters.") {
                    let values = parse_parameter_values(key, value_str)?;
                    config
                        .parameters
                        .get_or_insert_with(ParameterGrid::reference_sweep)
                        .insert(name, values);
                } else if let Some((env, field)) = key
                    .strip_prefix("environments.")
                    .and_then(|rest| rest.split_once('.'))
                {
                    let entry = config.environments.entry(env.to_string()).or_default();
                    let value = Some(value_str.to_string());
                    match field {
                        "hostname-pattern" => entry.hostname_pattern = value,
                        "template" => entry.template = value,
                        "partition" => entry.partition = value,
                        "scheduler-command" => entry.scheduler_command = value,
                        _ => {
                            return Err(CliError::Config(format!(
                                "Unknown configuration key for --set: {}",
                                key
                            )));
                        }
                    }
                } else {
                    return Err(CliError::Config(format!(
                        "Unknown configuration key for --set: {}",
                        key
                    )));
                }
            }
        }
    }
    Ok(config)
}

/// The engine that runs `<executable> <nvt-script>`. A relative script is resolved against
/// the project root, since the engine runs inside each job workspace.
pub fn build_engine(config: &AppConfig) -> Result<ExternalEngine> {
    let script = if config.nvt_script.is_absolute() {
        config.nvt_script.clone()
    } else {
        config.project_root.join(&config.nvt_script)
    };
    ExternalEngine::with_script(&config.engine_executable, &script)
        .map_err(|e| CliError::Config(e.to_string()))
}

/// The built-in profiles with the `[environments]` table layered on top. A table entry named
/// after a built-in profile overrides only the fields it sets; any other entry declares a new
/// cluster that matches host names starting with its `hostname-pattern` (or its own name).
pub fn build_environments(config: &AppConfig) -> Result<EnvironmentRegistry> {
    let mut registry = EnvironmentRegistry::builtin()?;
    for (name, overrides) in &config.environments {
        let existing = registry.get(name).cloned();
        let mut profile = match (existing, overrides.hostname_pattern.as_deref()) {
            (Some(profile), None) => profile,
            (existing, pattern) => {
                let template = existing
                    .as_ref()
                    .and_then(|p| p.template())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("{}.sh", name));
                let partition = existing
                    .as_ref()
                    .and_then(|p| p.partition())
                    .unwrap_or_default()
                    .to_string();
                EnvironmentProfile::cluster(name, pattern.unwrap_or(name), &template, &partition)?
            }
        };
        if let Some(template) = &overrides.template {
            profile = profile.with_template(template);
        }
        if let Some(partition) = &overrides.partition {
            profile = profile.with_partition(partition);
        }
        if let Some(command) = &overrides.scheduler_command {
            profile = profile.with_scheduler_command(command);
        }
        debug!("Registering environment '{}'", name);
        registry.insert(profile);
    }
    Ok(registry)
}

/// Command-line flags win over the merged configuration.
pub fn build_relabel_config(config: &AppConfig, args: &RelabelArgs) -> Result<RelabelConfig> {
    let mut builder = RelabelConfigBuilder::new()
        .beads_from_center(args.beads_from_center.unwrap_or(config.beads_from_center))
        .new_type(args.new_type.clone().unwrap_or_else(|| config.new_type.clone()))
        .start(args.start.unwrap_or(0))
        .stop(args.stop);
    if let Some(stride) = args.stride {
        builder = builder.stride(stride);
    }
    builder.build().map_err(|e| CliError::Config(e.to_string()))
}
