//! Update command implementation.

use anyhow::bail;
use colored::Colorize;
use skillforge_core::config::ProjectConfig;
use skillforge_core::extensions::{DropReason, ExtensionManager};

/// Execute the update command.
pub fn execute() -> anyhow::Result<()> {
    let project_dir = std::env::current_dir()?;
    let Some(mut config) = ProjectConfig::load(&project_dir)? else {
        bail!(
            "no {} found. Run \"skillforge init\" to set up this project first",
            skillforge_core::CONFIG_FILE
        );
    };

    println!("{}", format!("Config version: {}", config.version).bright_black());
    println!(
        "{}",
        format!("Tool version: {}\n", skillforge_core::current_version()).bright_black()
    );
    println!("{}", "Updating skills...".bright_black());

    let manager = ExtensionManager::new(&project_dir)?;
    let report = manager.reconcile(&mut config)?;

    if !report.skipped_replaced.is_empty() {
        println!(
            "{}",
            format!("Skipping replaced skills: {}", report.skipped_replaced.join(", "))
                .bright_black()
        );
    }

    for sync in &report.agents {
        if !sync.added.is_empty() {
            println!(
                "{}",
                format!("[{}] New skills: {}", sync.agent, sync.added.join(", ")).cyan()
            );
        }
        if !sync.removed.is_empty() {
            println!(
                "{}",
                format!("[{}] Removed skills: {}", sync.agent, sync.removed.join(", "))
                    .yellow()
            );
        }
    }

    for dropped in &report.dropped {
        let why = match dropped.reason {
            DropReason::ManifestMissing => "manifest missing",
            DropReason::NoLongerDeclared => "no longer declared",
            DropReason::InstallShortfall => "failed to install on every agent",
        };
        println!(
            "{}",
            format!(
                "⚠ Extension \"{}\" replacement \"{}\" dropped ({why})",
                dropped.extension, dropped.base
            )
            .yellow()
        );
    }

    if !report.restored.is_empty() {
        println!(
            "{}",
            format!("✓ Restored base skills: {}", report.restored.join(", ")).green()
        );
    }
    if report.injections_applied > 0 {
        println!(
            "{}",
            format!("✓ Re-applied {} extension injection(s)", report.injections_applied)
                .green()
        );
    }

    println!("{}", "✓ Skills updated successfully".green());
    println!("{}", "✓ Configuration updated".green());

    for sync in &report.agents {
        let agent = config.agents.iter().find(|a| a.id == sync.agent);
        let Some(agent) = agent else { continue };
        let (base, custom) = skillforge_core::skills::partition_skills(&agent.installed_skills);

        println!("{}", format!("\n[{}] Base skills:", sync.agent).bold());
        for skill in &base {
            let marker = if sync.added.contains(skill) { " (new)".green().to_string() } else { String::new() };
            println!("{}{marker}", format!("  - {skill}").bright_black());
        }
        if !custom.is_empty() {
            println!("{}", format!("[{}] Custom skills (preserved):", sync.agent).bold());
            for skill in &custom {
                println!("{}", format!("  - {skill}").bright_black());
            }
        }
    }

    Ok(())
}
