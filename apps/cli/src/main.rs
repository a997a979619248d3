//! Skillforge CLI - skill and extension provisioning for coding agents.
//!
//! Provisions skill content and settings for multiple third-party coding
//! agents inside a project, and manages the lifecycle of extension
//! packages that customize them.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{extension, init, update, ExtensionCommand};

/// Skillforge - multi-agent skill provisioning
#[derive(Parser, Debug)]
#[command(
    name = "skillforge",
    author,
    version,
    about = "Skillforge - provision skills and settings for coding agents",
    long_about = "Skillforge installs a shared skill catalog into every configured coding \
                  agent's own layout, and manages extension packages that add, inject, or \
                  replace skills across all of them."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Set up skills and settings for selected agents in this project
    ///
    /// Installs base skills for each selected agent and writes the project
    /// configuration. Re-running reconfigures the agent set and reinstalls
    /// base skills; installed extensions are preserved.
    Init {
        /// Agents to configure (comma-separated ids)
        #[arg(long, value_delimiter = ',', default_value = "claude")]
        agents: Vec<String>,

        /// Base skills to install (comma-separated; default: all)
        #[arg(long, value_delimiter = ',')]
        skills: Option<Vec<String>>,

        /// Built-in companion servers to configure (comma-separated keys)
        #[arg(long, value_delimiter = ',')]
        servers: Option<Vec<String>>,
    },

    /// Re-synchronize skills against the current catalog
    ///
    /// Installs new base skills, removes ones no longer shipped, and
    /// re-validates every extension's skill replacements.
    Update,

    /// Manage extensions
    #[command(subcommand)]
    Extension(ExtensionCommand),
}

fn main() {
    let args = Args::parse();

    let level = args.log_level.parse::<Level>().unwrap_or(Level::WARN);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let result = match args.command {
        Command::Init { agents, skills, servers } => init::execute(&agents, skills, servers),
        Command::Update => update::execute(),
        Command::Extension(command) => extension::execute(command),
    };

    if let Err(e) = result {
        eprintln!("{}", colored::Colorize::red(format!("Error: {e:#}").as_str()));
        std::process::exit(1);
    }
}
