//! Agent integration profiles.
//!
//! Each supported coding agent gets a static profile describing where its
//! skills and settings live inside a project and what its settings file
//! looks like. Unknown agent identities fall back to a generically shaped
//! profile so the rest of the system never has to special-case them.

/// Shape of an agent's settings file.
///
/// `Standard` keeps companion servers in a top-level `mcpServers` map.
/// `CommandArray` uses an `mcp` map whose entries hold a command array and
/// an environment map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsShape {
    Standard,
    CommandArray,
}

/// Integration profile for one coding agent.
#[derive(Debug, Clone)]
pub struct AgentProfile {
    /// Agent identifier (e.g. "claude", "codex").
    pub id: String,

    /// Human-readable name for summaries.
    pub display_name: String,

    /// Directory holding the agent's project-level configuration.
    pub config_dir: String,

    /// Default directory for installed skills.
    pub skills_dir: String,

    /// Settings file for companion-server registration, when the agent has one.
    pub settings_file: Option<String>,

    /// Whether the agent can host companion tool servers.
    pub supports_servers: bool,

    /// How the settings file is laid out.
    pub settings_shape: SettingsShape,
}

impl AgentProfile {
    fn known(
        id: &str,
        display_name: &str,
        config_dir: &str,
        skills_dir: &str,
        settings_file: Option<&str>,
        supports_servers: bool,
        settings_shape: SettingsShape,
    ) -> Self {
        Self {
            id: id.to_string(),
            display_name: display_name.to_string(),
            config_dir: config_dir.to_string(),
            skills_dir: skills_dir.to_string(),
            settings_file: settings_file.map(str::to_string),
            supports_servers,
            settings_shape,
        }
    }
}

/// Identifiers of the agents with first-class profiles.
pub const KNOWN_AGENTS: &[&str] =
    &["claude", "codex", "qwen", "opencode", "kilocode", "antigravity"];

/// Looks up the profile for an agent identity.
///
/// Unknown identities get a default-shaped profile rooted at `.<id>/` with
/// no settings file and no companion-server support.
pub fn profile(agent_id: &str) -> AgentProfile {
    match agent_id {
        "claude" => AgentProfile::known(
            "claude",
            "Claude Code",
            ".claude",
            ".claude/skills",
            Some(".mcp.json"),
            true,
            SettingsShape::Standard,
        ),
        "codex" => AgentProfile::known(
            "codex",
            "Codex CLI",
            ".codex",
            ".codex/skills",
            None,
            false,
            SettingsShape::Standard,
        ),
        "qwen" => AgentProfile::known(
            "qwen",
            "Qwen Code",
            ".qwen",
            ".qwen/skills",
            Some(".qwen/settings.json"),
            true,
            SettingsShape::Standard,
        ),
        "opencode" => AgentProfile::known(
            "opencode",
            "OpenCode",
            ".opencode",
            ".opencode/skills",
            Some("opencode.json"),
            true,
            SettingsShape::CommandArray,
        ),
        "kilocode" => AgentProfile::known(
            "kilocode",
            "Kilo Code",
            ".kilocode",
            ".kilocode/rules",
            Some(".kilocode/mcp.json"),
            true,
            SettingsShape::Standard,
        ),
        "antigravity" => AgentProfile::known(
            "antigravity",
            "Antigravity",
            ".antigravity",
            ".antigravity/skills",
            None,
            false,
            SettingsShape::Standard,
        ),
        other => AgentProfile {
            id: other.to_string(),
            display_name: other.to_string(),
            config_dir: format!(".{other}"),
            skills_dir: format!(".{other}/skills"),
            settings_file: None,
            supports_servers: false,
            settings_shape: SettingsShape::Standard,
        },
    }
}
