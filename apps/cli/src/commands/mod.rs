//! Command implementations for the skillforge CLI.

pub mod extension;
pub mod init;
pub mod types;
pub mod update;

pub use types::ExtensionCommand;
