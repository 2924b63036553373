use crate::{
    error::{Error, Result},
    plugin::{DuplicatePluginPolicy, PluginCatalog},
    target::TargetType,
};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAMES: [&str; 2] = [".scriptstage.json", "scriptstage.json"];

fn default_compile_cache_capacity() -> usize {
    64
}

/// File names recognized as each kind of script when walking a directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct ScriptNames {
    pub project: Vec<String>,
    pub settings: Vec<String>,
    pub init: Vec<String>,
}

impl Default for ScriptNames {
    fn default() -> Self {
        Self {
            project: vec!["build.script".to_string()],
            settings: vec!["settings.script".to_string()],
            init: vec!["init.script".to_string()],
        }
    }
}

impl ScriptNames {
    /// Target type for a script file name, if it is a recognized one
    pub fn target_type_for(&self, file_name: &str) -> Option<TargetType> {
        let matches = |names: &[String]| names.iter().any(|name| name == file_name);
        if matches(&self.project) {
            Some(TargetType::Project)
        } else if matches(&self.settings) {
            Some(TargetType::Settings)
        } else if matches(&self.init) {
            Some(TargetType::Build)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StageConfig {
    #[serde(default)]
    pub duplicate_plugin_requests: DuplicatePluginPolicy,
    #[serde(default = "default_compile_cache_capacity")]
    pub compile_cache_capacity: usize,
    #[serde(default)]
    pub script_names: ScriptNames,
    /// Plugins available to `plugins {}` blocks
    #[serde(default, skip_serializing_if = "PluginCatalog::is_empty")]
    pub plugins: PluginCatalog,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            duplicate_plugin_requests: DuplicatePluginPolicy::default(),
            compile_cache_capacity: default_compile_cache_capacity(),
            script_names: ScriptNames::default(),
            plugins: PluginCatalog::new(),
        }
    }
}

impl StageConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Walk up from `start_path` looking for a config file
    pub fn find_config_file(start_path: &Path) -> Option<PathBuf> {
        let mut current = start_path;

        loop {
            for name in CONFIG_FILE_NAMES {
                let config_path = current.join(name);
                if config_path.exists() {
                    return Some(config_path);
                }
            }

            current = current.parent()?;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.compile_cache_capacity == 0 {
            return Err(Error::ConfigError(
                "compile_cache_capacity must be greater than zero".to_string(),
            ));
        }

        for (id, entry) in &self.plugins {
            if let Some(default) = &entry.default_version {
                if !entry.versions.contains_key(default) {
                    return Err(Error::ConfigError(format!(
                        "plugin '{id}' has default version '{default}' but no such version is listed"
                    )));
                }
            }
            if entry.versions.contains_key("") {
                return Err(Error::ConfigError(format!(
                    "plugin '{id}' lists an empty version"
                )));
            }
        }

        Ok(())
    }

    pub fn compile_cache_capacity(&self) -> Result<NonZeroUsize> {
        NonZeroUsize::new(self.compile_cache_capacity).ok_or_else(|| {
            Error::ConfigError("compile_cache_capacity must be greater than zero".to_string())
        })
    }
}
