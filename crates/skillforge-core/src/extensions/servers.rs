//! Companion-server registration in agent settings files.
//!
//! Two settings shapes exist in the wild: the standard one keeps a
//! `mcpServers` map of full server configs; the command-array one keeps an
//! `mcp` map whose entries carry a merged command array and an environment
//! map. Merging is non-destructive — everything else in the settings file
//! is preserved.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::warn;

use super::manifest::ExtensionManifest;
use crate::agents::{AgentProfile, SettingsShape};

/// Settings errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

/// Result type for settings operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// A server config template as shipped by an extension or the share dir.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerTemplate {
    /// Executable to launch.
    pub command: String,

    /// Arguments for the executable.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Environment variables for the server process.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

/// Where an agent's settings file lives, when it has one.
pub fn settings_path(project_dir: &Path, profile: &AgentProfile) -> Option<PathBuf> {
    profile.settings_file.as_ref().map(|f| project_dir.join(f))
}

/// Loads a settings file as a JSON object, empty when absent or malformed
/// at the top level.
pub fn load_settings(path: &Path) -> Result<Map<String, Value>> {
    if !path.is_file() {
        return Ok(Map::new());
    }
    let content = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

/// Writes a settings object back, creating parent directories.
pub fn write_settings(path: &Path, settings: &Map<String, Value>) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(&Value::Object(settings.clone()))?;
    std::fs::write(path, content + "\n")?;
    Ok(())
}

fn nested_map<'a>(settings: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    if !settings.get(key).is_some_and(Value::is_object) {
        settings.insert(key.to_string(), Value::Object(Map::new()));
    }
    settings
        .get_mut(key)
        .and_then(Value::as_object_mut)
        .expect("just inserted an object")
}

/// Merges one server entry into a settings object, by shape.
pub fn merge_server(
    settings: &mut Map<String, Value>,
    shape: SettingsShape,
    key: &str,
    template: &ServerTemplate,
) {
    match shape {
        SettingsShape::Standard => {
            let value = serde_json::to_value(template).unwrap_or(Value::Null);
            nested_map(settings, "mcpServers").insert(key.to_string(), value);
        }
        SettingsShape::CommandArray => {
            let mut command = vec![template.command.clone()];
            command.extend(template.args.iter().cloned());
            let mut entry = json!({ "type": "local", "command": command });
            if !template.env.is_empty() {
                entry["environment"] = serde_json::to_value(&template.env).unwrap_or(Value::Null);
            }
            nested_map(settings, "mcp").insert(key.to_string(), entry);
        }
    }
}

/// Removes server entries by key from a settings object, by shape.
pub fn remove_server_keys(
    settings: &mut Map<String, Value>,
    shape: SettingsShape,
    keys: &[String],
) -> bool {
    let section = match shape {
        SettingsShape::Standard => "mcpServers",
        SettingsShape::CommandArray => "mcp",
    };
    let Some(map) = settings.get_mut(section).and_then(Value::as_object_mut) else {
        return false;
    };
    let mut changed = false;
    for key in keys {
        changed |= map.remove(key).is_some();
    }
    changed
}

/// Applies an extension's companion servers to every capable agent.
///
/// Agents without server support are silently skipped. Returns the keys
/// that were configured on at least one agent.
pub fn apply_extension_servers(
    project_dir: &Path,
    profiles: &[AgentProfile],
    extension_dir: &Path,
    manifest: &ExtensionManifest,
) -> Vec<String> {
    let mut configured = Vec::new();

    for server in &manifest.servers {
        let template_path = extension_dir.join(&server.template);
        let template: ServerTemplate = match std::fs::read_to_string(&template_path)
            .map_err(ServerError::from)
            .and_then(|c| serde_json::from_str(&c).map_err(ServerError::from))
        {
            Ok(t) => t,
            Err(e) => {
                warn!(
                    extension = %manifest.name,
                    server = %server.key,
                    "could not read server template: {e}"
                );
                continue;
            }
        };

        let mut any = false;
        for profile in profiles {
            if !profile.supports_servers {
                continue;
            }
            let Some(path) = settings_path(project_dir, profile) else {
                continue;
            };
            let result = load_settings(&path).and_then(|mut settings| {
                merge_server(&mut settings, profile.settings_shape, &server.key, &template);
                write_settings(&path, &settings)
            });
            match result {
                Ok(()) => any = true,
                Err(e) => {
                    warn!(
                        agent = %profile.id,
                        server = %server.key,
                        "could not configure server: {e}"
                    );
                }
            }
        }

        if any {
            configured.push(server.key.clone());
        }
    }

    configured
}

/// Removes an extension's companion servers from every capable agent.
pub fn remove_extension_servers(
    project_dir: &Path,
    profiles: &[AgentProfile],
    keys: &[String],
) -> Result<()> {
    for profile in profiles {
        if !profile.supports_servers {
            continue;
        }
        let Some(path) = settings_path(project_dir, profile) else {
            continue;
        };
        if !path.is_file() {
            continue;
        }
        let mut settings = load_settings(&path)?;
        if remove_server_keys(&mut settings, profile.settings_shape, keys) {
            write_settings(&path, &settings)?;
        }
    }
    Ok(())
}
