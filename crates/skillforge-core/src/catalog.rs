//! Base-skill catalog access.
//!
//! The catalog of built-in skills ships outside the project, in a share
//! directory. The lifecycle manager only ever sees it through the
//! [`SkillCatalog`] trait so tests (and alternative layouts) can swap the
//! backing store.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Catalog errors.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Share directory could not be determined.
    #[error("no share directory available; set SKILLFORGE_SHARE_DIR")]
    NoShareDir,
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Read-only repository of base skills.
pub trait SkillCatalog {
    /// Names of all available base skills, sorted.
    fn available(&self) -> Result<Vec<String>>;

    /// Directory holding the named skill's sources.
    fn skill_dir(&self, name: &str) -> PathBuf;
}

/// Resolves the share directory holding bundled skills and templates.
///
/// `SKILLFORGE_SHARE_DIR` overrides the platform data directory.
pub fn share_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("SKILLFORGE_SHARE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_dir().map(|d| d.join("skillforge")).ok_or(CatalogError::NoShareDir)
}

/// Filesystem-backed catalog scanning `<root>/skills/`.
///
/// Directory entries whose name starts with `_` are infrastructure
/// (shared fragments, templates) and are not offered as skills.
pub struct FsSkillCatalog {
    skills_root: PathBuf,
}

impl FsSkillCatalog {
    /// Creates a catalog rooted at the default share directory.
    pub fn new() -> Result<Self> {
        Ok(Self::with_root(share_dir()?.join("skills")))
    }

    /// Creates a catalog rooted at an explicit skills directory.
    pub fn with_root(skills_root: impl Into<PathBuf>) -> Self {
        Self { skills_root: skills_root.into() }
    }

    /// The skills root this catalog scans.
    pub fn root(&self) -> &Path {
        &self.skills_root
    }
}

impl SkillCatalog for FsSkillCatalog {
    fn available(&self) -> Result<Vec<String>> {
        if !self.skills_root.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.skills_root)? {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('_') {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }

    fn skill_dir(&self, name: &str) -> PathBuf {
        self.skills_root.join(name)
    }
}
