use crate::config::GenerationConfig;
use anyhow::Result;
use std::fs;
use std::path::Path;
use tracing::{error, info};

/// Environment variable that overrides `project_name` from the YAML file.
pub const PROJECT_ENV: &str = "ADO_SKIN_PROJECT";

/// Loads a YAML generation config. `ADO_SKIN_PROJECT`, when set and non-empty,
/// replaces the project name from the file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<GenerationConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: GenerationConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if let Ok(project) = std::env::var(PROJECT_ENV) {
        if !project.trim().is_empty() {
            info!(project = %project, "Project name overridden from environment");
            config.project_name = project;
        }
    }

    config.trace_loaded();
    Ok(config)
}
