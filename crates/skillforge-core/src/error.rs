//! Error types for skillforge core.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::extensions::ExtensionError;
use crate::extensions::InstallError;
use crate::skills::SkillError;

/// Core error type for skillforge operations.
#[derive(Debug, Error)]
pub enum SkillforgeError {
    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Catalog errors
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Skill installation errors
    #[error("skill error: {0}")]
    Skill(#[from] SkillError),

    /// Extension subsystem errors
    #[error("extension error: {0}")]
    Extension(#[from] ExtensionError),
}

impl From<InstallError> for SkillforgeError {
    fn from(e: InstallError) -> Self {
        Self::Extension(ExtensionError::Install(e))
    }
}

/// Result type alias for skillforge operations.
pub type Result<T> = std::result::Result<T, SkillforgeError>;
