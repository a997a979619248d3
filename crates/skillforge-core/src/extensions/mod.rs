//! Extension system for skillforge.
//!
//! Extensions are externally sourced packages of skills, skill
//! replacements, config injections, and companion-server definitions. This
//! module resolves them from a source string, stages and validates them,
//! activates their contents across every configured agent, and keeps
//! multiple agents and multiple installed extensions mutually consistent
//! through updates and removal.

pub mod injections;
pub mod install;
pub mod manifest;
pub mod reconcile;
pub mod resolver;
pub mod servers;

pub use injections::{
    apply_extension_injections, strip_extension_injections, InjectionError,
};
pub use install::{
    collect_replaced_skills, ExtensionManager, InstallError, InstallReport, RemoveReport,
    ReplacementOutcome, STATE_DIR,
};
pub use manifest::{
    validate_safe_name, ExtensionManifest, InjectPosition, Injection, ManifestError,
    ServerDef, MANIFEST_FILE,
};
pub use reconcile::{AgentSync, DropReason, DroppedReplacement, UpdateReport};
pub use resolver::{
    classify_source, resolve, CommandFetcher, PackageFetcher, ResolveError,
    ResolvedExtension, SourceKind,
};
pub use servers::{
    apply_extension_servers, remove_extension_servers, ServerError, ServerTemplate,
};

/// Unified error type for extension operations.
#[derive(Debug, thiserror::Error)]
pub enum ExtensionError {
    /// Manifest error.
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Resolution error.
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// Lifecycle error.
    #[error("install error: {0}")]
    Install(#[from] InstallError),

    /// Injection error.
    #[error("injection error: {0}")]
    Injection(#[from] InjectionError),

    /// Settings error.
    #[error("settings error: {0}")]
    Server(#[from] ServerError),
}

/// Result type for extension operations.
pub type Result<T> = std::result::Result<T, ExtensionError>;
