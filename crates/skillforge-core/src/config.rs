//! Project configuration file handling.
//!
//! The whole durable state of a project lives in one JSON document,
//! `.skillforge.json`, at the project root: the tool version that last
//! wrote it, one record per configured agent, and one record per installed
//! extension. Everything else on disk (skill trees, settings files,
//! extension storage) is derived from it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Project configuration file name.
pub const CONFIG_FILE: &str = ".skillforge.json";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// One configured agent and what is installed for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInstallation {
    /// Agent identifier (e.g. "claude").
    pub id: String,

    /// Skills directory, relative to the project root.
    pub skills_dir: String,

    /// Installed skill names. Base skills carry a bare name; skills
    /// contributed by extensions carry their path-like qualifier.
    #[serde(default)]
    pub installed_skills: Vec<String>,

    /// Companion-server opt-in flags, keyed by server key.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub servers: BTreeMap<String, bool>,
}

/// One installed extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionRecord {
    /// Extension name (manifest identity).
    pub name: String,

    /// The source string it was installed from.
    pub source: String,

    /// Installed version.
    pub version: String,

    /// Base-skill names this extension currently replaces. A base skill
    /// appears in at most one record's list across the whole config.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replaced_skills: Vec<String>,
}

/// Root project configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Tool version that last wrote this file.
    pub version: String,

    /// Configured agents, in installation order.
    #[serde(default)]
    pub agents: Vec<AgentInstallation>,

    /// Installed extensions.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extensions: Vec<ExtensionRecord>,
}

impl ProjectConfig {
    /// Path of the configuration file inside a project.
    pub fn path(project_dir: &Path) -> PathBuf {
        project_dir.join(CONFIG_FILE)
    }

    /// Whether a project configuration exists.
    pub fn exists(project_dir: &Path) -> bool {
        Self::path(project_dir).is_file()
    }

    /// Loads the configuration, returning `None` when the project has none.
    pub fn load(project_dir: &Path) -> Result<Option<Self>> {
        let path = Self::path(project_dir);
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Writes the configuration back to the project root.
    pub fn save(&self, project_dir: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(Self::path(project_dir), content + "\n")?;
        Ok(())
    }

    /// Finds an extension record by name.
    pub fn extension(&self, name: &str) -> Option<&ExtensionRecord> {
        self.extensions.iter().find(|e| e.name == name)
    }
}

/// Version of the running tool, used to stamp configurations.
pub fn current_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_config() -> ProjectConfig {
        ProjectConfig {
            version: "0.3.0".to_string(),
            agents: vec![AgentInstallation {
                id: "claude".to_string(),
                skills_dir: ".claude/skills".to_string(),
                installed_skills: vec!["writer".to_string(), "skills/extra".to_string()],
                servers: BTreeMap::new(),
            }],
            extensions: vec![ExtensionRecord {
                name: "acme".to_string(),
                source: "./acme".to_string(),
                version: "1.0.0".to_string(),
                replaced_skills: vec!["writer".to_string()],
            }],
        }
    }

    #[test]
    fn test_load_missing_config() {
        let temp = TempDir::new().unwrap();
        assert!(ProjectConfig::load(temp.path()).unwrap().is_none());
        assert!(!ProjectConfig::exists(temp.path()));
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let temp = TempDir::new().unwrap();
        sample_config().save(temp.path()).unwrap();

        let loaded = ProjectConfig::load(temp.path()).unwrap().unwrap();
        assert_eq!(loaded.version, "0.3.0");
        assert_eq!(loaded.agents.len(), 1);
        assert_eq!(loaded.extensions[0].replaced_skills, vec!["writer"]);
    }

    #[test]
    fn test_empty_replaced_skills_omitted() {
        let mut config = sample_config();
        config.extensions[0].replaced_skills.clear();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("replaced_skills"));
    }

    #[test]
    fn test_extension_lookup() {
        let config = sample_config();
        assert!(config.extension("acme").is_some());
        assert!(config.extension("other").is_none());
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE), "{not json").unwrap();
        assert!(matches!(
            ProjectConfig::load(temp.path()),
            Err(ConfigError::JsonParse(_))
        ));
    }
}
