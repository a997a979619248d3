//! Text injections into agent config surfaces.
//!
//! Injected fragments are wrapped in marker comments carrying the owning
//! extension's name. That makes application idempotent (an existing block
//! is replaced, not duplicated) and lets removal fall back to a marker
//! scan when the extension's manifest is no longer loadable.

use std::path::Path;

use thiserror::Error;
use tracing::warn;
use walkdir::WalkDir;

use super::manifest::{ExtensionManifest, InjectPosition};
use crate::agents::AgentProfile;

/// Injection errors.
#[derive(Debug, Error)]
pub enum InjectionError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for injection operations.
pub type Result<T> = std::result::Result<T, InjectionError>;

fn begin_marker(extension: &str) -> String {
    format!("<!-- skillforge:ext:{extension} begin -->")
}

fn end_marker(extension: &str) -> String {
    format!("<!-- skillforge:ext:{extension} end -->")
}

/// Removes every marker block owned by `extension` from `content`.
fn strip_blocks(content: &str, extension: &str) -> String {
    let begin = begin_marker(extension);
    let end = end_marker(extension);

    let mut result = String::with_capacity(content.len());
    let mut inside = false;
    for line in content.lines() {
        if line.trim() == begin {
            inside = true;
            continue;
        }
        if line.trim() == end {
            inside = false;
            continue;
        }
        if !inside {
            result.push_str(line);
            result.push('\n');
        }
    }

    // Collapse the blank line a stripped block leaves behind.
    while result.ends_with("\n\n") {
        result.pop();
    }
    result
}

/// Applies one extension's injections to one agent's config surface.
///
/// Each fragment replaces any block the same extension already owns in its
/// target, so re-application converges. Per-injection failures are logged
/// and skipped; the count of applied injections is returned.
pub fn apply_extension_injections(
    project_dir: &Path,
    profile: &AgentProfile,
    extension_dir: &Path,
    manifest: &ExtensionManifest,
) -> usize {
    let mut applied = 0;

    for injection in &manifest.injections {
        let fragment = match std::fs::read_to_string(extension_dir.join(&injection.file)) {
            Ok(f) => f,
            Err(e) => {
                warn!(
                    extension = %manifest.name,
                    file = %injection.file,
                    "could not read injection fragment: {e}"
                );
                continue;
            }
        };

        let target = project_dir.join(&profile.config_dir).join(&injection.target);
        let existing = std::fs::read_to_string(&target).unwrap_or_default();
        let stripped = strip_blocks(&existing, &manifest.name);

        let block = format!(
            "{}\n{}\n{}\n",
            begin_marker(&manifest.name),
            fragment.trim_end(),
            end_marker(&manifest.name)
        );

        let updated = match injection.position {
            InjectPosition::Prepend if stripped.is_empty() => block,
            InjectPosition::Prepend => format!("{block}\n{stripped}"),
            InjectPosition::Append if stripped.is_empty() => block,
            InjectPosition::Append => format!("{stripped}\n{block}"),
        };

        let write = target
            .parent()
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|()| std::fs::write(&target, updated));
        match write {
            Ok(()) => applied += 1,
            Err(e) => {
                warn!(
                    extension = %manifest.name,
                    target = %injection.target,
                    "could not apply injection: {e}"
                );
            }
        }
    }

    applied
}

/// Strips one extension's injections from one agent.
///
/// With a manifest, only the declared targets are rewritten. Without one
/// (the extension's storage may already be gone) every file under the
/// agent's config dir is scanned for the extension's markers.
pub fn strip_extension_injections(
    project_dir: &Path,
    profile: &AgentProfile,
    extension_name: &str,
    manifest: Option<&ExtensionManifest>,
) -> Result<()> {
    if let Some(manifest) = manifest {
        for injection in &manifest.injections {
            let target = project_dir.join(&profile.config_dir).join(&injection.target);
            strip_file(&target, extension_name)?;
        }
        return Ok(());
    }

    let config_dir = project_dir.join(&profile.config_dir);
    if !config_dir.is_dir() {
        return Ok(());
    }
    for entry in WalkDir::new(config_dir).into_iter().filter_map(std::result::Result::ok) {
        if entry.file_type().is_file() {
            strip_file(entry.path(), extension_name)?;
        }
    }
    Ok(())
}

fn strip_file(path: &Path, extension_name: &str) -> Result<()> {
    let Ok(content) = std::fs::read_to_string(path) else {
        return Ok(());
    };
    if !content.contains(&begin_marker(extension_name)) {
        return Ok(());
    }
    std::fs::write(path, strip_blocks(&content, extension_name))?;
    Ok(())
}
