//! Command type definitions shared between main.rs and tests.

use clap::Subcommand;

#[derive(Subcommand, Debug, Clone)]
pub enum ExtensionCommand {
    /// Install an extension from a path, git URL, or registry package name
    Add {
        /// Extension source (./path, git URL, or package name)
        source: String,
    },

    /// Remove an installed extension
    Remove {
        /// Extension name
        name: String,
    },

    /// List installed extensions
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
