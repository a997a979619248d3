//! Built-in companion-server catalog.
//!
//! The share directory bundles config templates for a small set of
//! commonly wanted tool servers. Project setup opts agents into them by
//! key; extension-declared servers go through [`crate::extensions::servers`]
//! instead, with the same settings merge underneath.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::agents::AgentProfile;
use crate::catalog::{share_dir, CatalogError};
use crate::extensions::servers::{
    load_settings, merge_server, settings_path, write_settings, Result, ServerTemplate,
};

/// One built-in companion server.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinServer {
    /// Key the server registers under.
    pub key: &'static str,

    /// Template file under the share dir's `mcp/templates/`.
    pub template_file: &'static str,

    /// Setup note shown after configuration.
    pub instruction: &'static str,
}

/// Servers selectable at project setup.
pub const BUILTIN_SERVERS: &[BuiltinServer] = &[
    BuiltinServer {
        key: "github",
        template_file: "github.json",
        instruction: "GitHub server: set GITHUB_TOKEN to a personal access token",
    },
    BuiltinServer {
        key: "filesystem",
        template_file: "filesystem.json",
        instruction: "Filesystem server: no additional configuration needed",
    },
    BuiltinServer {
        key: "postgres",
        template_file: "postgres.json",
        instruction: "Postgres server: set DATABASE_URL to a PostgreSQL connection string",
    },
    BuiltinServer {
        key: "chrome-devtools",
        template_file: "chrome-devtools.json",
        instruction: "Chrome DevTools server: lets the agent drive a live Chrome browser",
    },
];

/// Directory holding the bundled server templates.
pub fn templates_dir() -> std::result::Result<PathBuf, CatalogError> {
    Ok(share_dir()?.join("mcp").join("templates"))
}

/// Configures the selected built-in servers for one agent.
///
/// Agents without server support get nothing and no error. Unreadable
/// templates are logged and skipped. Returns the keys configured.
pub fn configure_builtin_servers(
    project_dir: &Path,
    profile: &AgentProfile,
    selections: &BTreeMap<String, bool>,
    templates_dir: &Path,
) -> Result<Vec<String>> {
    if !profile.supports_servers {
        return Ok(Vec::new());
    }
    let Some(path) = settings_path(project_dir, profile) else {
        return Ok(Vec::new());
    };

    let mut settings = load_settings(&path)?;
    let mut configured = Vec::new();

    for server in BUILTIN_SERVERS {
        if !selections.get(server.key).copied().unwrap_or(false) {
            continue;
        }
        let template_path = templates_dir.join(server.template_file);
        let template: ServerTemplate = match std::fs::read_to_string(&template_path)
            .map_err(crate::extensions::servers::ServerError::from)
            .and_then(|c| serde_json::from_str(&c).map_err(Into::into))
        {
            Ok(t) => t,
            Err(e) => {
                warn!(server = %server.key, "could not read builtin server template: {e}");
                continue;
            }
        };
        merge_server(&mut settings, profile.settings_shape, server.key, &template);
        configured.push(server.key.to_string());
    }

    if !configured.is_empty() {
        write_settings(&path, &settings)?;
    }
    Ok(configured)
}

/// Setup notes for the given configured keys, in catalog order.
pub fn instructions_for(keys: &[String]) -> Vec<&'static str> {
    BUILTIN_SERVERS
        .iter()
        .filter(|s| keys.iter().any(|k| k == s.key))
        .map(|s| s.instruction)
        .collect()
}
