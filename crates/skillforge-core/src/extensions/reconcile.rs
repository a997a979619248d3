//! Catalog update reconciliation.
//!
//! An update cycle re-synchronizes every agent against the current base
//! catalog and re-validates every extension's replacement claims. A sync
//! never overwrites an actively replaced skill; a replacement that can no
//! longer be justified (manifest gone, entry undeclared, or an agent
//! shortfall) is demoted and its base skill restored unless another
//! extension still owns it.

use tracing::warn;

use super::install::{collect_replaced_skills, ExtensionManager, Result};
use super::injections::apply_extension_injections;
use super::manifest::ExtensionManifest;
use crate::agents;
use crate::config::{current_version, ProjectConfig};
use crate::skills;

/// Why a previously active replacement was demoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// The extension's manifest could no longer be loaded.
    ManifestMissing,

    /// The manifest no longer declares this replacement.
    NoLongerDeclared,

    /// Reinstall did not succeed on every agent.
    InstallShortfall,
}

/// One demoted replacement.
#[derive(Debug, Clone)]
pub struct DroppedReplacement {
    pub extension: String,
    pub base: String,
    pub reason: DropReason,
}

/// Per-agent outcome of the base-skill sync.
#[derive(Debug, Clone)]
pub struct AgentSync {
    pub agent: String,
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

/// What an update cycle did, for reporting.
#[derive(Debug, Default)]
pub struct UpdateReport {
    /// Base skills excluded from the sync because an extension replaces them.
    pub skipped_replaced: Vec<String>,

    /// Sync results per agent, in configured order.
    pub agents: Vec<AgentSync>,

    /// Replacements demoted this cycle.
    pub dropped: Vec<DroppedReplacement>,

    /// Base skills restored after demotion.
    pub restored: Vec<String>,

    /// Injections re-applied across agents.
    pub injections_applied: usize,
}

impl ExtensionManager {
    /// Runs one update reconciliation cycle and persists the result.
    pub fn reconcile(&self, config: &mut ProjectConfig) -> Result<UpdateReport> {
        let replaced_all = collect_replaced_skills(&config.extensions, None);
        let mut report =
            UpdateReport { skipped_replaced: replaced_all.clone(), ..Default::default() };

        // Base-skill sync per agent, never touching active replacements.
        for agent in &mut config.agents {
            let outcome = skills::sync_base_skills(
                self.project_dir(),
                agent,
                self.catalog(),
                self.transformers(),
                &replaced_all,
            )?;
            agent.installed_skills = outcome.installed;
            report.agents.push(AgentSync {
                agent: agent.id.clone(),
                added: outcome.added,
                removed: outcome.removed,
            });
        }

        // Re-validate every extension's replacement claims.
        let mut failed: Vec<String> = Vec::new();
        let agent_count = config.agents.len();
        let agent_list = config.agents.clone();

        for ext in &mut config.extensions {
            if ext.replaced_skills.is_empty() {
                continue;
            }
            let extension_dir = self.extension_dir(&ext.name);

            let manifest = match ExtensionManifest::load(&extension_dir) {
                Ok(m) if !m.replaces.is_empty() => m,
                _ => {
                    // Everything this record claims is now unjustified.
                    warn!(
                        extension = %ext.name,
                        "manifest missing; restoring its replaced base skills"
                    );
                    for base in ext.replaced_skills.drain(..) {
                        report.dropped.push(DroppedReplacement {
                            extension: ext.name.clone(),
                            base: base.clone(),
                            reason: DropReason::ManifestMissing,
                        });
                        failed.push(base);
                    }
                    continue;
                }
            };

            // Claims the manifest no longer declares fail individually.
            let declared: Vec<String> = manifest.replaces.values().cloned().collect();
            for base in &ext.replaced_skills {
                if !declared.contains(base) {
                    warn!(extension = %ext.name, skill = %base, "no longer replaced");
                    report.dropped.push(DroppedReplacement {
                        extension: ext.name.clone(),
                        base: base.clone(),
                        reason: DropReason::NoLongerDeclared,
                    });
                    failed.push(base.clone());
                }
            }
            ext.replaced_skills.retain(|s| declared.contains(s));

            // Reinstall the still-declared claims and re-check all-agent
            // success exactly like a fresh install.
            let replace_paths: Vec<String> = manifest
                .replaces
                .iter()
                .filter(|(_, base)| ext.replaced_skills.contains(base))
                .map(|(path, _)| path.clone())
                .collect();
            if replace_paths.is_empty() {
                continue;
            }

            let mut successes: std::collections::BTreeMap<String, usize> =
                std::collections::BTreeMap::new();
            for agent in &agent_list {
                let installed = skills::install_extension_skills(
                    self.project_dir(),
                    agent,
                    self.transformers(),
                    &extension_dir,
                    &replace_paths,
                    Some(&manifest.replaces),
                );
                for name in installed {
                    *successes.entry(name).or_insert(0) += 1;
                }
            }

            for (path, base) in &manifest.replaces {
                if !replace_paths.contains(path) {
                    continue;
                }
                let count = successes.get(base).copied().unwrap_or(0);
                if count < agent_count {
                    warn!(
                        extension = %ext.name,
                        skill = %base,
                        "replacement failed to reinstall; restoring base skill"
                    );
                    report.dropped.push(DroppedReplacement {
                        extension: ext.name.clone(),
                        base: base.clone(),
                        reason: DropReason::InstallShortfall,
                    });
                    failed.push(base.clone());
                    ext.replaced_skills.retain(|s| s != base);
                }
            }
        }

        // Restore demoted skills nobody else still claims.
        if !failed.is_empty() {
            failed.sort();
            failed.dedup();
            let still_claimed = collect_replaced_skills(&config.extensions, None);
            report.restored = self.restore_base_skills(config, &failed, &still_claimed)?;
        }

        // Re-apply every remaining extension's injections.
        let profiles: Vec<_> =
            config.agents.iter().map(|a| agents::profile(&a.id)).collect();
        for ext in &config.extensions {
            let extension_dir = self.extension_dir(&ext.name);
            if let Ok(manifest) = ExtensionManifest::load(&extension_dir) {
                for profile in &profiles {
                    report.injections_applied += apply_extension_injections(
                        self.project_dir(),
                        profile,
                        &extension_dir,
                        &manifest,
                    );
                }
            }
        }

        config.version = current_version().to_string();
        config.save(self.project_dir())?;

        Ok(report)
    }
}
