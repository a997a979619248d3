//! Skillforge core - skill and extension provisioning for coding agents.
//!
//! This crate provides the machinery behind the `skillforge` CLI:
//! - project configuration and per-agent installation records
//! - base-skill catalog access and per-agent skill installation
//! - the extension lifecycle (resolve, install, update, remove)
//!
//! # Example
//!
//! ```rust,no_run
//! use skillforge_core::config::ProjectConfig;
//! use skillforge_core::extensions::ExtensionManager;
//!
//! # fn main() -> skillforge_core::Result<()> {
//! let project_dir = std::env::current_dir()?;
//! let mut config = ProjectConfig::load(&project_dir)?.expect("project is initialized");
//! let manager = ExtensionManager::new(&project_dir)?;
//! let report = manager.install(&mut config, "./my-extension")?;
//! println!("installed {} v{}", report.name, report.version);
//! # Ok(())
//! # }
//! ```

pub mod agents;
pub mod catalog;
pub mod config;
pub mod error;
pub mod extensions;
pub mod mcp;
pub mod skills;
pub mod transform;

pub use agents::{profile, AgentProfile, SettingsShape, KNOWN_AGENTS};
pub use catalog::{share_dir, CatalogError, FsSkillCatalog, SkillCatalog};
pub use config::{
    current_version, AgentInstallation, ConfigError, ExtensionRecord, ProjectConfig,
    CONFIG_FILE,
};
pub use error::{Result, SkillforgeError};
pub use extensions::{
    ExtensionError, ExtensionManager, ExtensionManifest, InstallError, InstallReport,
    RemoveReport, ReplacementOutcome, UpdateReport,
};
pub use transform::{SkillTransformer, TransformOutcome, TransformerRegistry};
