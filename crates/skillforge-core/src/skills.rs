//! Skill installation and removal for individual agents.
//!
//! All placement goes through the agent's transformer: directory-layout
//! agents get the skill directory copied with a rewritten `SKILL.md`, flat
//! agents get a single rendered file under their config dir. Batch
//! operations are best-effort; a failing skill is logged and skipped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::agents;
use crate::catalog::{CatalogError, SkillCatalog};
use crate::config::AgentInstallation;
use crate::transform::TransformerRegistry;

/// Skill file name inside a skill directory.
pub const SKILL_FILE: &str = "SKILL.md";

/// Skill installation errors.
#[derive(Debug, Error)]
pub enum SkillError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catalog error.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// The skill directory has no skill body.
    #[error("{SKILL_FILE} not found in {0}")]
    MissingSkillFile(PathBuf),
}

/// Result type for skill operations.
pub type Result<T> = std::result::Result<T, SkillError>;

/// Recursively copies a directory.
pub(crate) fn copy_dir_all(source: &Path, dest: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dest)?;

    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        let path = entry.path();
        let dest_path = dest.join(entry.file_name());

        if path.is_dir() {
            copy_dir_all(&path, &dest_path)?;
        } else {
            std::fs::copy(&path, &dest_path)?;
        }
    }

    Ok(())
}

/// Installs one skill directory for one agent, through its transformer.
pub fn install_skill(
    project_dir: &Path,
    agent: &AgentInstallation,
    registry: &TransformerRegistry,
    source_dir: &Path,
    skill_name: &str,
) -> Result<()> {
    let skill_path = source_dir.join(SKILL_FILE);
    let content = std::fs::read_to_string(&skill_path)
        .map_err(|_| SkillError::MissingSkillFile(source_dir.to_path_buf()))?;

    let profile = agents::profile(&agent.id);
    let outcome = registry.get(&agent.id).transform(skill_name, &content);

    if outcome.flat {
        let target = project_dir
            .join(&profile.config_dir)
            .join(&outcome.target_dir)
            .join(&outcome.target_name);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(target, outcome.content)?;
    } else {
        let target_dir = project_dir.join(&agent.skills_dir).join(&outcome.target_dir);
        copy_dir_all(source_dir, &target_dir)?;
        if outcome.content != content {
            std::fs::write(target_dir.join(SKILL_FILE), outcome.content)?;
        }
    }

    Ok(())
}

/// Installs base skills from the catalog for one agent, best-effort.
///
/// Returns the names that installed; failures are logged and skipped.
pub fn install_base_skills(
    project_dir: &Path,
    agent: &AgentInstallation,
    catalog: &dyn SkillCatalog,
    registry: &TransformerRegistry,
    names: &[String],
) -> Vec<String> {
    let mut installed = Vec::new();
    for name in names {
        let source = catalog.skill_dir(name);
        match install_skill(project_dir, agent, registry, &source, name) {
            Ok(()) => installed.push(name.clone()),
            Err(e) => warn!(agent = %agent.id, skill = %name, "could not install skill: {e}"),
        }
    }
    installed
}

/// Installs extension-provided skills for one agent, best-effort.
///
/// `overrides` maps an extension skill path to the name it installs under
/// (used for replacements); without an override the path's last component
/// is the name. Returns the names that installed.
pub fn install_extension_skills(
    project_dir: &Path,
    agent: &AgentInstallation,
    registry: &TransformerRegistry,
    extension_dir: &Path,
    skill_paths: &[String],
    overrides: Option<&BTreeMap<String, String>>,
) -> Vec<String> {
    let mut installed = Vec::new();
    for skill_path in skill_paths {
        let name = overrides
            .and_then(|o| o.get(skill_path))
            .cloned()
            .unwrap_or_else(|| skill_base_name(skill_path));
        let source = extension_dir.join(skill_path);
        match install_skill(project_dir, agent, registry, &source, &name) {
            Ok(()) => installed.push(name),
            Err(e) => {
                warn!(agent = %agent.id, skill = %name, "could not install extension skill: {e}");
            }
        }
    }
    installed
}

/// Removes skills by installed name for one agent.
///
/// A skill that is not on disk is silently treated as removed.
pub fn remove_skills(
    project_dir: &Path,
    agent: &AgentInstallation,
    registry: &TransformerRegistry,
    names: &[String],
) -> Vec<String> {
    let profile = agents::profile(&agent.id);
    let mut removed = Vec::new();

    for name in names {
        let outcome = registry.get(&agent.id).transform(name, "");
        let target = if outcome.flat {
            project_dir
                .join(&profile.config_dir)
                .join(&outcome.target_dir)
                .join(&outcome.target_name)
        } else {
            project_dir.join(&agent.skills_dir).join(&outcome.target_dir)
        };

        let result = if target.is_dir() {
            std::fs::remove_dir_all(&target)
        } else if target.is_file() {
            std::fs::remove_file(&target)
        } else {
            Ok(())
        };

        match result {
            Ok(()) => removed.push(name.clone()),
            Err(e) => warn!(agent = %agent.id, skill = %name, "could not remove skill: {e}"),
        }
    }

    removed
}

/// The last path component of an extension skill path.
pub fn skill_base_name(skill_path: &str) -> String {
    skill_path.rsplit('/').next().unwrap_or(skill_path).to_string()
}

/// Splits installed skill names into base skills (bare names) and
/// custom/extension skills (path-like qualifiers).
pub fn partition_skills(skills: &[String]) -> (Vec<String>, Vec<String>) {
    let (custom, base): (Vec<String>, Vec<String>) =
        skills.iter().cloned().partition(|s| s.contains('/'));
    (base, custom)
}

/// Result of a base-skill sync for one agent.
#[derive(Debug, Default)]
pub struct SyncOutcome {
    /// The agent's new `installed_skills` list.
    pub installed: Vec<String>,

    /// Base skills newly installed by this sync.
    pub added: Vec<String>,

    /// Base skills removed because the catalog no longer has them.
    pub removed: Vec<String>,
}

/// Re-synchronizes one agent's base skills against the catalog.
///
/// Skills in `exclude` are never written (they are actively replaced by an
/// extension) but stay recorded when previously installed. Custom entries
/// pass through untouched.
pub fn sync_base_skills(
    project_dir: &Path,
    agent: &AgentInstallation,
    catalog: &dyn SkillCatalog,
    registry: &TransformerRegistry,
    exclude: &[String],
) -> Result<SyncOutcome> {
    let available = catalog.available()?;
    let (previous_base, custom) = partition_skills(&agent.installed_skills);

    let stale: Vec<String> =
        previous_base.iter().filter(|s| !available.contains(s)).cloned().collect();
    let removed = remove_skills(project_dir, agent, registry, &stale);

    let to_install: Vec<String> =
        available.iter().filter(|s| !exclude.contains(s)).cloned().collect();
    let installed_base =
        install_base_skills(project_dir, agent, catalog, registry, &to_install);

    let added = installed_base
        .iter()
        .filter(|s| !previous_base.contains(s))
        .cloned()
        .collect();

    // Replaced skills keep their slot in the record even though the sync
    // skipped writing them.
    let retained: Vec<String> = previous_base
        .iter()
        .filter(|s| exclude.contains(s) && available.contains(s))
        .cloned()
        .collect();

    let mut installed = installed_base;
    installed.extend(retained);
    installed.extend(custom);

    Ok(SyncOutcome { installed, added, removed })
}
