//! Extension command implementation.

use anyhow::{bail, Context};
use colored::Colorize;
use skillforge_core::config::ProjectConfig;
use skillforge_core::extensions::{
    ExtensionManager, ExtensionManifest, ReplacementOutcome,
};
use tabled::{settings::Style, Table, Tabled};

use super::ExtensionCommand;

/// Execute the extension command.
pub fn execute(command: ExtensionCommand) -> anyhow::Result<()> {
    match command {
        ExtensionCommand::Add { source } => add_extension(&source),
        ExtensionCommand::Remove { name } => remove_extension(&name),
        ExtensionCommand::List { json } => list_extensions(json),
    }
}

fn load_project() -> anyhow::Result<(std::path::PathBuf, ProjectConfig)> {
    let project_dir = std::env::current_dir()?;
    let Some(config) = ProjectConfig::load(&project_dir)? else {
        bail!(
            "no {} found. Run \"skillforge init\" to set up this project first",
            skillforge_core::CONFIG_FILE
        );
    };
    Ok((project_dir, config))
}

fn add_extension(source: &str) -> anyhow::Result<()> {
    let (project_dir, mut config) = load_project()?;

    println!("{}", format!("Installing extension from: {source}").bright_black());

    let manager = ExtensionManager::new(&project_dir)?;
    let report = manager
        .install(&mut config, source)
        .with_context(|| format!("installing extension from \"{source}\""))?;

    println!(
        "{}",
        format!("✓ Extension \"{}\" v{} installed", report.name, report.version).green()
    );

    for outcome in &report.replacements {
        match outcome {
            ReplacementOutcome::Replaced { base, source } => {
                println!(
                    "{}",
                    format!("✓ Replaced skill \"{base}\" with \"{source}\"").green()
                );
            }
            ReplacementOutcome::RolledBack { base, succeeded, agents } => {
                println!(
                    "{}",
                    format!(
                        "⚠ Replacement \"{base}\" only installed on {succeeded}/{agents} \
                         agents — rolled back, base skill restored"
                    )
                    .yellow()
                );
            }
            ReplacementOutcome::Failed { base } => {
                println!(
                    "{}",
                    format!("⚠ Failed to replace skill \"{base}\" — base skill preserved")
                        .yellow()
                );
            }
        }
    }

    for (agent, skills) in &report.custom_installed {
        println!(
            "{}",
            format!("✓ Skills installed for {agent}: {}", skills.join(", ")).green()
        );
    }

    if report.injections_applied > 0 {
        println!(
            "{}",
            format!("✓ Applied {} injection(s)", report.injections_applied).green()
        );
    }

    if !report.servers_configured.is_empty() {
        println!(
            "{}",
            format!("✓ Companion servers configured: {}", report.servers_configured.join(", "))
                .green()
        );
        for instruction in &report.server_instructions {
            println!("{}", format!("    {instruction}").bright_black());
        }
    }

    if let Ok(manifest) = ExtensionManifest::load(&manager.extension_dir(&report.name)) {
        print_provided(&manifest);
    }

    Ok(())
}

fn print_provided(manifest: &ExtensionManifest) {
    if !manifest.commands.is_empty() {
        let names: Vec<&str> = manifest.commands.iter().map(|c| c.name.as_str()).collect();
        println!("{}", format!("  Commands provided: {}", names.join(", ")).bright_black());
    }
    if !manifest.agents.is_empty() {
        let names: Vec<&str> =
            manifest.agents.iter().map(|a| a.display_name.as_str()).collect();
        println!("{}", format!("  Agents provided: {}", names.join(", ")).bright_black());
    }
    if !manifest.skills.is_empty() {
        println!(
            "{}",
            format!("  Skills provided: {}", manifest.skills.join(", ")).bright_black()
        );
    }
}

fn remove_extension(name: &str) -> anyhow::Result<()> {
    let (project_dir, mut config) = load_project()?;

    let manager = ExtensionManager::new(&project_dir)?;
    let report = manager
        .remove(&mut config, name)
        .with_context(|| format!("removing extension \"{name}\""))?;

    for (agent, skills) in &report.replacements_removed {
        println!(
            "{}",
            format!("✓ Replacement skills removed for {agent}: {}", skills.join(", "))
                .green()
        );
    }
    for (agent, skills) in &report.custom_removed {
        println!(
            "{}",
            format!("✓ Skills removed for {agent}: {}", skills.join(", ")).green()
        );
    }
    if !report.restored.is_empty() {
        println!(
            "{}",
            format!("✓ Restored base skills: {}", report.restored.join(", ")).green()
        );
    }

    println!("{}", format!("✓ Extension \"{name}\" removed").green());
    Ok(())
}

#[derive(Tabled)]
struct ExtensionRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Provides")]
    provides: String,
}

fn list_extensions(json: bool) -> anyhow::Result<()> {
    let (project_dir, config) = load_project()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config.extensions)?);
        return Ok(());
    }

    if config.extensions.is_empty() {
        println!("{}", "No extensions installed.".bright_black());
        return Ok(());
    }

    let manager = ExtensionManager::new(&project_dir)?;
    let rows: Vec<ExtensionRow> = config
        .extensions
        .iter()
        .map(|ext| {
            let provides = ExtensionManifest::load(&manager.extension_dir(&ext.name))
                .map(|m| describe_features(&m))
                .unwrap_or_else(|_| "(manifest unavailable)".to_string());
            ExtensionRow {
                name: ext.name.clone(),
                version: ext.version.clone(),
                source: ext.source.clone(),
                provides,
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

fn describe_features(manifest: &ExtensionManifest) -> String {
    let mut features = Vec::new();
    if !manifest.commands.is_empty() {
        features.push(format!("{} command(s)", manifest.commands.len()));
    }
    if !manifest.agents.is_empty() {
        features.push(format!("{} agent(s)", manifest.agents.len()));
    }
    if !manifest.injections.is_empty() {
        features.push(format!("{} injection(s)", manifest.injections.len()));
    }
    if !manifest.skills.is_empty() {
        features.push(format!("{} skill(s)", manifest.skills.len()));
    }
    if !manifest.replaces.is_empty() {
        features.push(format!("{} replacement(s)", manifest.replaces.len()));
    }
    if !manifest.servers.is_empty() {
        features.push(format!("{} server(s)", manifest.servers.len()));
    }
    if features.is_empty() {
        "-".to_string()
    } else {
        features.join(", ")
    }
}
