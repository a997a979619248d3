//! Init command implementation.
//!
//! Non-interactive project setup: configures the selected agents, installs
//! base skills for each, applies companion-server opt-ins, and writes the
//! project configuration. Installed extensions survive a re-init and get
//! their injections re-applied on top of the fresh skill trees.

use std::collections::BTreeMap;

use anyhow::Context;
use colored::Colorize;
use skillforge_core::catalog::{FsSkillCatalog, SkillCatalog};
use skillforge_core::config::{current_version, AgentInstallation, ProjectConfig};
use skillforge_core::extensions::{
    apply_extension_injections, ExtensionManager, ExtensionManifest,
};
use skillforge_core::transform::TransformerRegistry;
use skillforge_core::{agents, mcp, skills};

/// Execute the init command.
pub fn execute(
    agent_ids: &[String],
    selected_skills: Option<Vec<String>>,
    selected_servers: Option<Vec<String>>,
) -> anyhow::Result<()> {
    let project_dir = std::env::current_dir()?;

    let existing = ProjectConfig::load(&project_dir)?;
    if existing.is_some() {
        println!(
            "{}",
            format!(
                "Warning: {} already exists; reconfiguring agents and reinstalling base skills",
                skillforge_core::CONFIG_FILE
            )
            .yellow()
        );
    }

    let catalog = FsSkillCatalog::new().context("locating the skill catalog")?;
    let registry = TransformerRegistry::builtin();

    let available = catalog.available()?;
    let skill_selection = selected_skills.unwrap_or_else(|| available.clone());

    let server_selection: BTreeMap<String, bool> = selected_servers
        .unwrap_or_default()
        .into_iter()
        .map(|key| (key, true))
        .collect();

    // Deselected agents lose their skill trees.
    if let Some(existing) = &existing {
        for old in &existing.agents {
            if !agent_ids.contains(&old.id) {
                let tree = project_dir.join(&old.skills_dir);
                if tree.exists() {
                    std::fs::remove_dir_all(&tree)
                        .with_context(|| format!("removing skills for {}", old.id))?;
                }
                println!("{}", format!("  Removed: {}", old.id).yellow());
            }
        }
    }

    println!("{}", "Installing skills...".bright_black());

    let templates_dir = mcp::templates_dir()?;
    let mut installed_agents = Vec::new();
    let mut server_summary: Vec<(String, Vec<String>)> = Vec::new();

    for id in agent_ids {
        let profile = agents::profile(id);
        let installation = AgentInstallation {
            id: profile.id.clone(),
            skills_dir: profile.skills_dir.clone(),
            installed_skills: Vec::new(),
            servers: server_selection.clone(),
        };

        let installed = skills::install_base_skills(
            &project_dir,
            &installation,
            &catalog,
            &registry,
            &skill_selection,
        );

        let configured = mcp::configure_builtin_servers(
            &project_dir,
            &profile,
            &server_selection,
            &templates_dir,
        )?;
        if !configured.is_empty() {
            server_summary.push((profile.id.clone(), configured));
        }

        installed_agents.push(AgentInstallation {
            installed_skills: installed,
            ..installation
        });
    }

    let extensions = existing.map(|c| c.extensions).unwrap_or_default();
    let config = ProjectConfig {
        version: current_version().to_string(),
        agents: installed_agents,
        extensions,
    };
    config.save(&project_dir)?;

    // Extensions were installed before this re-init: their injections go
    // back on top of the fresh config surfaces.
    if !config.extensions.is_empty() {
        let manager = ExtensionManager::new(&project_dir)?;
        let mut reapplied = 0;
        for ext in &config.extensions {
            let extension_dir = manager.extension_dir(&ext.name);
            if let Ok(manifest) = ExtensionManifest::load(&extension_dir) {
                for agent in &config.agents {
                    let profile = agents::profile(&agent.id);
                    reapplied += apply_extension_injections(
                        &project_dir,
                        &profile,
                        &extension_dir,
                        &manifest,
                    );
                }
            }
        }
        if reapplied > 0 {
            println!(
                "{}",
                format!("✓ Re-applied {reapplied} extension injection(s)").green()
            );
        }
    }

    println!("{}", format!("✓ Configuration saved to {}", skillforge_core::CONFIG_FILE).green());
    println!("{}", "\n✅ Setup complete!\n".green().bold());

    for agent in &config.agents {
        let profile = agents::profile(&agent.id);
        println!("{}", format!("{}:", profile.display_name).bold());
        println!(
            "{}",
            format!("  Skills directory: {}", project_dir.join(&agent.skills_dir).display())
                .bright_black()
        );
        println!(
            "{}",
            format!("  Installed skills: {}", agent.installed_skills.len()).bright_black()
        );

        if let Some((_, configured)) =
            server_summary.iter().find(|(id, _)| id == &agent.id)
        {
            println!(
                "{}",
                format!("  Companion servers configured: {}", configured.join(", ")).green()
            );
            for instruction in mcp::instructions_for(configured) {
                println!("{}", format!("    {instruction}").bright_black());
            }
        }
        println!();
    }

    println!("{}", "Next steps:".bold());
    for (index, agent) in config.agents.iter().enumerate() {
        let profile = agents::profile(&agent.id);
        println!("{}", format!("  {}. {}", index + 1, profile.display_name).bright_black());
        for line in registry.get(&agent.id).welcome_message() {
            println!("{}", format!("     {line}").bright_black());
        }
    }

    let hints: Vec<String> = config
        .agents
        .iter()
        .filter_map(|a| registry.get(&a.id).invocation_hint())
        .collect();
    let hint_suffix =
        if hints.is_empty() { String::new() } else { format!(" ({})", hints.join("; ")) };
    println!(
        "{}",
        format!(
            "  {}. Use /forge-plan and /forge-commit for the daily workflow{hint_suffix}",
            config.agents.len() + 1
        )
        .bright_black()
    );

    Ok(())
}
