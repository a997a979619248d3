//! Extension manifest format and validation.
//!
//! An extension package declares itself through an `extension.json` at its
//! root. Validation fails closed: a missing manifest, a missing name or
//! version, or any name/replacement value failing the safety pattern
//! rejects the whole package before a single project file is touched.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Manifest file name inside an extension package.
pub const MANIFEST_FILE: &str = "extension.json";

/// Extension manifest errors.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Manifest file not found.
    #[error("no {MANIFEST_FILE} found in {0}")]
    NotFound(PathBuf),

    /// Missing required field.
    #[error("manifest is missing required field: {0}")]
    MissingField(&'static str),

    /// Name or path failed the safety pattern.
    #[error(
        "unsafe name: \"{0}\". Names must be alphanumeric (with -, _, @, /) and cannot \
         contain \"..\" or absolute paths"
    )]
    UnsafeName(String),
}

/// Result type for manifest operations.
pub type Result<T> = std::result::Result<T, ManifestError>;

/// Identifier/path safety pattern for extension names and skill targets.
static SAFE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_@][\w.@/-]*$").expect("valid pattern"));

/// Rejects names that could escape the directories they are joined into.
pub fn validate_safe_name(name: &str) -> Result<()> {
    if !SAFE_NAME.is_match(name) || name.contains("..") || Path::new(name).is_absolute() {
        return Err(ManifestError::UnsafeName(name.to_string()));
    }
    Ok(())
}

/// A command contributed by an extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandDef {
    pub name: String,
    pub description: String,
    pub module: String,
}

/// An agent definition contributed by an extension.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentDef {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub config_dir: Option<String>,
    #[serde(default)]
    pub skills_dir: Option<String>,
}

/// Position of an injected fragment within its target file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectPosition {
    Append,
    Prepend,
}

/// A text injection into an agent's config surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Injection {
    /// Target file, relative to the agent's config dir.
    pub target: String,

    /// Whether the fragment goes at the end or the start of the target.
    pub position: InjectPosition,

    /// Fragment file, relative to the extension root.
    pub file: String,
}

/// A companion-server declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerDef {
    /// Key the server registers under in agent settings.
    pub key: String,

    /// Config template file, relative to the extension root.
    pub template: String,

    /// Post-install note for the user (tokens to set, etc.).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
}

/// Extension manifest structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionManifest {
    /// Extension name; the identity key for storage and records.
    pub name: String,

    /// Extension version.
    pub version: String,

    /// Extension description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Commands the extension provides.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandDef>,

    /// Agent definitions the extension provides.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub agents: Vec<AgentDef>,

    /// Text injections into agent config surfaces.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub injections: Vec<Injection>,

    /// Skill directories, relative to the extension root.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,

    /// Extension skill path → base skill name it supersedes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub replaces: BTreeMap<String, String>,

    /// Companion-server declarations.
    #[serde(default, rename = "mcpServers", skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<ServerDef>,
}

impl ExtensionManifest {
    /// Loads and validates the manifest of a package directory.
    pub fn load(extension_dir: &Path) -> Result<Self> {
        let path = extension_dir.join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(ManifestError::NotFound(extension_dir.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let manifest: ExtensionManifest = serde_json::from_str(&content)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Validates required fields and every joined name/path.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(ManifestError::MissingField("name"));
        }
        if self.version.is_empty() {
            return Err(ManifestError::MissingField("version"));
        }

        validate_safe_name(&self.name)?;
        for (skill_path, base_name) in &self.replaces {
            validate_safe_name(skill_path)?;
            validate_safe_name(base_name)?;
        }
        for skill_path in &self.skills {
            validate_safe_name(skill_path)?;
        }

        Ok(())
    }

    /// Skill paths not used as a replacement source.
    pub fn custom_skills(&self) -> Vec<String> {
        self.skills
            .iter()
            .filter(|s| !self.replaces.contains_key(*s))
            .cloned()
            .collect()
    }
}
