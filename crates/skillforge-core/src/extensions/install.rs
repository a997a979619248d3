//! Extension lifecycle management.
//!
//! Installs, upgrades, and removes extensions while keeping every
//! configured agent and every other installed extension consistent. The
//! pipeline is strictly sequential: resolve → conflict guard → commit →
//! teardown of the prior version → replacement activation → custom skills
//! → persist → injections → companion servers. Fatal steps come first and
//! touch nothing; later steps are best-effort or compensated.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use super::injections::{
    apply_extension_injections, strip_extension_injections, InjectionError,
};
use super::manifest::{validate_safe_name, ExtensionManifest, ManifestError};
use super::resolver::{resolve, CommandFetcher, PackageFetcher, ResolveError};
use super::servers::{apply_extension_servers, remove_extension_servers, ServerError};
use crate::agents::{self, AgentProfile};
use crate::catalog::{CatalogError, FsSkillCatalog, SkillCatalog};
use crate::config::{ConfigError, ExtensionRecord, ProjectConfig};
use crate::skills;
use crate::transform::TransformerRegistry;

/// Directory under the project state dir holding extension storage.
const EXTENSIONS_DIR: &str = "extensions";

/// Hidden project state directory.
pub const STATE_DIR: &str = ".skillforge";

/// Extension lifecycle errors.
#[derive(Debug, Error)]
pub enum InstallError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest error.
    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Resolution error.
    #[error("{0}")]
    Resolve(#[from] ResolveError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Catalog error.
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Skill installation error.
    #[error("skill error: {0}")]
    Skill(#[from] crate::skills::SkillError),

    /// Injection error.
    #[error("injection error: {0}")]
    Injection(#[from] InjectionError),

    /// Agent settings error.
    #[error("settings error: {0}")]
    Server(#[from] ServerError),

    /// Another extension already owns a replaced base skill.
    #[error(
        "conflict: skill \"{skill}\" is already replaced by extension \"{owner}\". \
         Remove it first"
    )]
    Conflict { skill: String, owner: String },

    /// The named extension is not installed.
    #[error("extension \"{0}\" is not installed")]
    NotInstalled(String),

    /// A storage path resolved outside the extensions root.
    #[error("extension path escapes the extensions directory: \"{0}\"")]
    PathEscape(String),
}

/// Result type for lifecycle operations.
pub type Result<T> = std::result::Result<T, InstallError>;

/// Outcome of one replacement activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplacementOutcome {
    /// Active on every agent; recorded in the extension record.
    Replaced { base: String, source: String },

    /// Succeeded on some agents only; rolled back and base restored.
    RolledBack { base: String, succeeded: usize, agents: usize },

    /// Succeeded nowhere; base skill untouched.
    Failed { base: String },
}

/// What an install actually did, for reporting.
#[derive(Debug, Default)]
pub struct InstallReport {
    pub name: String,
    pub version: String,
    pub upgraded: bool,
    pub replacements: Vec<ReplacementOutcome>,
    /// (agent id, installed custom skill names)
    pub custom_installed: Vec<(String, Vec<String>)>,
    pub injections_applied: usize,
    pub servers_configured: Vec<String>,
    pub server_instructions: Vec<String>,
}

/// What a removal actually did, for reporting.
#[derive(Debug, Default)]
pub struct RemoveReport {
    pub name: String,
    /// (agent id, removed replacement skill names)
    pub replacements_removed: Vec<(String, Vec<String>)>,
    /// (agent id, removed custom skill names)
    pub custom_removed: Vec<(String, Vec<String>)>,
    pub restored: Vec<String>,
}

/// Manages extension lifecycle for one project.
pub struct ExtensionManager {
    project_dir: PathBuf,
    catalog: Box<dyn SkillCatalog>,
    transformers: TransformerRegistry,
    fetcher: Box<dyn PackageFetcher>,
}

impl ExtensionManager {
    /// Creates a manager with the default catalog, transformer table, and
    /// process-spawning fetcher.
    pub fn new(project_dir: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            project_dir: project_dir.into(),
            catalog: Box::new(FsSkillCatalog::new()?),
            transformers: TransformerRegistry::builtin(),
            fetcher: Box::new(CommandFetcher),
        })
    }

    /// Creates a manager with explicit collaborators.
    pub fn with_parts(
        project_dir: impl Into<PathBuf>,
        catalog: Box<dyn SkillCatalog>,
        transformers: TransformerRegistry,
        fetcher: Box<dyn PackageFetcher>,
    ) -> Self {
        Self { project_dir: project_dir.into(), catalog, transformers, fetcher }
    }

    /// The project's extension storage directory.
    pub fn extensions_dir(&self) -> PathBuf {
        self.project_dir.join(STATE_DIR).join(EXTENSIONS_DIR)
    }

    /// Storage directory for one extension.
    pub fn extension_dir(&self, name: &str) -> PathBuf {
        self.extensions_dir().join(name)
    }

    pub(crate) fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub(crate) fn catalog(&self) -> &dyn SkillCatalog {
        self.catalog.as_ref()
    }

    pub(crate) fn transformers(&self) -> &TransformerRegistry {
        &self.transformers
    }

    fn profiles(config: &ProjectConfig) -> Vec<AgentProfile> {
        config.agents.iter().map(|a| agents::profile(&a.id)).collect()
    }

    /// Installs (or re-installs) an extension from a source string.
    ///
    /// Persists the updated configuration at the pipeline's persistence
    /// point; the caller's `config` reflects the final state either way.
    pub fn install(&self, config: &mut ProjectConfig, source: &str) -> Result<InstallReport> {
        // Phase 1: resolve — stage and validate without touching the project.
        // The staging area lives until this function returns.
        let resolved = resolve(source, self.fetcher.as_ref())?;
        let manifest = resolved.manifest().clone();

        let existing = config.extensions.iter().position(|e| e.name == manifest.name);
        let old_record = existing.map(|i| config.extensions[i].clone());
        // The old install dir is still intact here; capture its manifest
        // before commit overwrites it.
        let old_manifest =
            existing.and_then(|_| ExtensionManifest::load(&self.extension_dir(&manifest.name)).ok());

        // Conflict guard: every claimed base skill must be unowned (or
        // owned by the extension being re-installed). Nothing has been
        // written yet, so a conflict aborts with zero mutations.
        for base_name in manifest.replaces.values() {
            for other in &config.extensions {
                if other.name == manifest.name {
                    continue;
                }
                if other.replaced_skills.iter().any(|s| s == base_name) {
                    return Err(InstallError::Conflict {
                        skill: base_name.clone(),
                        owner: other.name.clone(),
                    });
                }
            }
        }

        // Phase 2: commit the staged tree into project storage.
        self.commit(&resolved.manifest().name, resolved.root())?;

        // Tear down the prior version using the captured state — the
        // directory now holds the new contents.
        if let Some(old_record) = &old_record {
            self.teardown_previous(config, old_record, old_manifest.as_ref())?;
        }

        let mut report = InstallReport {
            name: manifest.name.clone(),
            version: manifest.version.clone(),
            upgraded: existing.is_some(),
            ..Default::default()
        };

        let extension_dir = self.extension_dir(&manifest.name);

        // Activate replacements, all-or-nothing per base skill.
        let replaced = self.activate_replacements(config, &extension_dir, &manifest, &mut report)?;

        // Custom skills are plain additions: best-effort, never aborting.
        self.install_custom_skills(config, &extension_dir, &manifest, &mut report);

        // Persist: the record only ever claims what actually materialized.
        let record = ExtensionRecord {
            name: manifest.name.clone(),
            source: source.to_string(),
            version: manifest.version.clone(),
            replaced_skills: replaced,
        };
        match existing {
            Some(i) => config.extensions[i] = record,
            None => config.extensions.push(record),
        }
        config.save(&self.project_dir)?;

        // Additive, best-effort tail: injections and companion servers.
        let profiles = Self::profiles(config);
        for profile in &profiles {
            report.injections_applied +=
                apply_extension_injections(&self.project_dir, profile, &extension_dir, &manifest);
        }

        report.servers_configured =
            apply_extension_servers(&self.project_dir, &profiles, &extension_dir, &manifest);
        report.server_instructions = manifest
            .servers
            .iter()
            .filter(|s| report.servers_configured.contains(&s.key))
            .filter_map(|s| s.instruction.clone())
            .collect();

        Ok(report)
        // `resolved` drops here, releasing any staging area.
    }

    /// Copies a resolved package into per-extension storage.
    ///
    /// The name is re-validated immediately before the copy; fetch staging
    /// metadata (`.git`) is excluded.
    fn commit(&self, name: &str, source_root: &Path) -> Result<()> {
        validate_safe_name(name)?;
        let target = self.extension_dir(name);
        if target.exists() {
            std::fs::remove_dir_all(&target)?;
        }
        copy_tree_excluding_vcs(source_root, &target)?;
        debug!(extension = %name, "committed extension storage");
        Ok(())
    }

    /// Strips the old version's footprint after its storage was overwritten.
    fn teardown_previous(
        &self,
        config: &mut ProjectConfig,
        old_record: &ExtensionRecord,
        old_manifest: Option<&ExtensionManifest>,
    ) -> Result<()> {
        let profiles = Self::profiles(config);
        for profile in &profiles {
            strip_extension_injections(
                &self.project_dir,
                profile,
                &old_record.name,
                old_manifest,
            )?;
        }

        if !old_record.replaced_skills.is_empty() {
            for agent in &config.agents {
                skills::remove_skills(
                    &self.project_dir,
                    agent,
                    &self.transformers,
                    &old_record.replaced_skills,
                );
            }
            self.restore_base_skills(config, &old_record.replaced_skills, &[])?;
        }

        if let Some(old_manifest) = old_manifest {
            self.remove_custom_skills(config, old_manifest);
        }

        Ok(())
    }

    /// Installs every replacement pair independently across all agents.
    ///
    /// Returns the base-skill names that activated on every agent.
    fn activate_replacements(
        &self,
        config: &mut ProjectConfig,
        extension_dir: &Path,
        manifest: &ExtensionManifest,
        report: &mut InstallReport,
    ) -> Result<Vec<String>> {
        if manifest.replaces.is_empty() {
            return Ok(Vec::new());
        }

        let replace_paths: Vec<String> = manifest.replaces.keys().cloned().collect();
        let agent_count = config.agents.len();

        // Per-base-skill success counts, accumulated agent by agent.
        let mut successes: BTreeMap<String, usize> = BTreeMap::new();
        for agent in &config.agents {
            let installed = skills::install_extension_skills(
                &self.project_dir,
                agent,
                &self.transformers,
                extension_dir,
                &replace_paths,
                Some(&manifest.replaces),
            );
            for name in installed {
                *successes.entry(name).or_insert(0) += 1;
            }
        }

        let mut replaced = Vec::new();
        for (skill_path, base_name) in &manifest.replaces {
            let count = successes.get(base_name).copied().unwrap_or(0);
            if count == agent_count {
                replaced.push(base_name.clone());
                report.replacements.push(ReplacementOutcome::Replaced {
                    base: base_name.clone(),
                    source: skills::skill_base_name(skill_path),
                });
            } else if count > 0 {
                // Partial success: compensate by removing the replacement
                // where it landed and reinstalling the base everywhere.
                for agent in &config.agents {
                    skills::remove_skills(
                        &self.project_dir,
                        agent,
                        &self.transformers,
                        std::slice::from_ref(base_name),
                    );
                }
                self.restore_base_skills(config, std::slice::from_ref(base_name), &[])?;
                warn!(
                    skill = %base_name,
                    succeeded = count,
                    agents = agent_count,
                    "replacement rolled back"
                );
                report.replacements.push(ReplacementOutcome::RolledBack {
                    base: base_name.clone(),
                    succeeded: count,
                    agents: agent_count,
                });
            } else {
                report
                    .replacements
                    .push(ReplacementOutcome::Failed { base: base_name.clone() });
            }
        }

        Ok(replaced)
    }

    /// Installs the manifest's non-replacement skills on every agent and
    /// records their path qualifiers.
    fn install_custom_skills(
        &self,
        config: &mut ProjectConfig,
        extension_dir: &Path,
        manifest: &ExtensionManifest,
        report: &mut InstallReport,
    ) {
        let custom = manifest.custom_skills();
        if custom.is_empty() {
            return;
        }

        for agent in &mut config.agents {
            let installed = skills::install_extension_skills(
                &self.project_dir,
                agent,
                &self.transformers,
                extension_dir,
                &custom,
                None,
            );
            for path in &custom {
                let name = skills::skill_base_name(path);
                if installed.contains(&name) && !agent.installed_skills.contains(path) {
                    agent.installed_skills.push(path.clone());
                }
            }
            if !installed.is_empty() {
                report.custom_installed.push((agent.id.clone(), installed));
            }
        }
    }

    /// Removes the manifest's non-replacement skills from every agent and
    /// drops their path qualifiers.
    fn remove_custom_skills(
        &self,
        config: &mut ProjectConfig,
        manifest: &ExtensionManifest,
    ) -> Vec<(String, Vec<String>)> {
        let custom = manifest.custom_skills();
        if custom.is_empty() {
            return Vec::new();
        }
        let names: Vec<String> = custom.iter().map(|p| skills::skill_base_name(p)).collect();

        let mut removed_by_agent = Vec::new();
        for agent in &mut config.agents {
            let removed =
                skills::remove_skills(&self.project_dir, agent, &self.transformers, &names);
            agent.installed_skills.retain(|s| !custom.contains(s));
            if !removed.is_empty() {
                removed_by_agent.push((agent.id.clone(), removed));
            }
        }
        removed_by_agent
    }

    /// Reinstalls base skills that exist in the catalog and are not in the
    /// still-claimed set, on every agent. Returns what was restored.
    pub(crate) fn restore_base_skills(
        &self,
        config: &ProjectConfig,
        names: &[String],
        still_claimed: &[String],
    ) -> Result<Vec<String>> {
        let available = self.catalog.available()?;
        let to_restore: Vec<String> = names
            .iter()
            .filter(|n| available.contains(n) && !still_claimed.contains(n))
            .cloned()
            .collect();

        if !to_restore.is_empty() {
            for agent in &config.agents {
                skills::install_base_skills(
                    &self.project_dir,
                    agent,
                    self.catalog.as_ref(),
                    &self.transformers,
                    &to_restore,
                );
            }
        }
        Ok(to_restore)
    }

    /// Removes an installed extension: the inverse pipeline.
    pub fn remove(&self, config: &mut ProjectConfig, name: &str) -> Result<RemoveReport> {
        let index = config
            .extensions
            .iter()
            .position(|e| e.name == name)
            .ok_or_else(|| InstallError::NotInstalled(name.to_string()))?;
        let record = config.extensions[index].clone();

        // The manifest may already be unloadable; every later step copes.
        let extension_dir = self.extension_dir(name);
        let manifest = ExtensionManifest::load(&extension_dir).ok();

        let mut report = RemoveReport { name: name.to_string(), ..Default::default() };
        let profiles = Self::profiles(config);

        for profile in &profiles {
            strip_extension_injections(&self.project_dir, profile, name, manifest.as_ref())?;
        }

        if !record.replaced_skills.is_empty() {
            for agent in &config.agents {
                let removed = skills::remove_skills(
                    &self.project_dir,
                    agent,
                    &self.transformers,
                    &record.replaced_skills,
                );
                if !removed.is_empty() {
                    report.replacements_removed.push((agent.id.clone(), removed));
                }
            }
        }

        if let Some(manifest) = &manifest {
            report.custom_removed = self.remove_custom_skills(config, manifest);
        }

        if !record.replaced_skills.is_empty() {
            let still_claimed = collect_replaced_skills(&config.extensions, Some(name));
            report.restored =
                self.restore_base_skills(config, &record.replaced_skills, &still_claimed)?;
        }

        if let Some(manifest) = &manifest {
            if !manifest.servers.is_empty() {
                let keys: Vec<String> =
                    manifest.servers.iter().map(|s| s.key.clone()).collect();
                remove_extension_servers(&self.project_dir, &profiles, &keys)?;
            }
        }

        self.remove_extension_files(name)?;

        config.extensions.remove(index);
        config.save(&self.project_dir)?;

        Ok(report)
    }

    /// Deletes an extension's storage directory, re-validating that the
    /// resolved path stays inside the extensions root.
    fn remove_extension_files(&self, name: &str) -> Result<()> {
        validate_safe_name(name)?;
        let extensions_dir = self.extensions_dir();
        let target = extensions_dir.join(name);

        let canonical_root = match std::fs::canonicalize(&extensions_dir) {
            Ok(root) => root,
            // No extensions dir means nothing to delete.
            Err(_) => return Ok(()),
        };
        if let Ok(canonical_target) = std::fs::canonicalize(&target) {
            if !canonical_target.starts_with(&canonical_root) || canonical_target == canonical_root
            {
                return Err(InstallError::PathEscape(name.to_string()));
            }
            std::fs::remove_dir_all(canonical_target)?;
        }
        Ok(())
    }
}

/// Collects every base skill actively replaced by any record, optionally
/// excluding one extension by name.
pub fn collect_replaced_skills(
    extensions: &[ExtensionRecord],
    exclude_name: Option<&str>,
) -> Vec<String> {
    let mut result = Vec::new();
    for ext in extensions {
        if exclude_name == Some(ext.name.as_str()) {
            continue;
        }
        for skill in &ext.replaced_skills {
            if !result.contains(skill) {
                result.push(skill.clone());
            }
        }
    }
    result
}

/// Recursively copies a tree, skipping version-control metadata directories.
fn copy_tree_excluding_vcs(source: &Path, dest: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dest)?;

    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_name() == ".git" {
            continue;
        }
        let dest_path = dest.join(entry.file_name());

        if path.is_dir() {
            copy_tree_excluding_vcs(&path, &dest_path)?;
        } else {
            std::fs::copy(&path, &dest_path)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentInstallation;
    use crate::extensions::manifest::MANIFEST_FILE;
    use crate::skills::SKILL_FILE;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    use crate::extensions::resolver::Result as ResolveResult;

    /// Fetcher for tests that only exercise local sources.
    struct NullFetcher;

    impl PackageFetcher for NullFetcher {
        fn clone_repo(&self, url: &str, _dest: &Path) -> ResolveResult<()> {
            Err(ResolveError::Fetch {
                src: url.to_string(),
                message: "no network in tests".to_string(),
            })
        }

        fn fetch_package(&self, package: &str, _dest: &Path) -> ResolveResult<PathBuf> {
            Err(ResolveError::Fetch {
                src: package.to_string(),
                message: "no network in tests".to_string(),
            })
        }
    }

    struct Fixture {
        project: TempDir,
        share: TempDir,
        packages: TempDir,
    }

    impl Fixture {
        fn manager(&self) -> ExtensionManager {
            ExtensionManager::with_parts(
                self.project.path(),
                Box::new(FsSkillCatalog::with_root(self.share.path())),
                TransformerRegistry::builtin(),
                Box::new(NullFetcher),
            )
        }
    }

    fn write_skill(dir: &Path, body: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(SKILL_FILE), body).unwrap();
    }

    fn agent(id: &str) -> AgentInstallation {
        AgentInstallation {
            id: id.to_string(),
            skills_dir: agents::profile(id).skills_dir,
            installed_skills: vec!["writer".to_string()],
            servers: BTreeMap::new(),
        }
    }

    /// Two-agent project with a base skill "writer" in the catalog.
    fn fixture() -> (Fixture, ProjectConfig) {
        let fx = Fixture {
            project: TempDir::new().unwrap(),
            share: TempDir::new().unwrap(),
            packages: TempDir::new().unwrap(),
        };
        write_skill(&fx.share.path().join("writer"), "---\nname: writer\n---\nbase body\n");

        let config = ProjectConfig {
            version: "0.3.0".to_string(),
            agents: vec![agent("claude"), agent("codex")],
            extensions: Vec::new(),
        };
        // Materialize base skills on both agents.
        let manager = fx.manager();
        for a in &config.agents {
            skills::install_base_skills(
                fx.project.path(),
                a,
                manager.catalog(),
                manager.transformers(),
                &["writer".to_string()],
            );
        }
        (fx, config)
    }

    /// Writes a package directory and returns its `./`-prefixed source string.
    fn write_package(fx: &Fixture, name: &str, manifest_json: &str) -> String {
        let dir = fx.packages.path().join(name);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(MANIFEST_FILE), manifest_json).unwrap();
        dir.to_str().unwrap().to_string()
    }

    fn replacing_package(fx: &Fixture, name: &str) -> String {
        let source = write_package(
            fx,
            name,
            &format!(
                r#"{{"name": "{name}", "version": "1.0.0",
                     "skills": ["skills/better-writer"],
                     "replaces": {{"skills/better-writer": "writer"}}}}"#
            ),
        );
        write_skill(
            &fx.packages.path().join(name).join("skills/better-writer"),
            "---\nname: better-writer\n---\nreplacement body\n",
        );
        source
    }

    fn skill_body(fx: &Fixture, agent_skills_dir: &str, skill: &str) -> String {
        std::fs::read_to_string(
            fx.project.path().join(agent_skills_dir).join(skill).join(SKILL_FILE),
        )
        .unwrap()
    }

    #[test]
    fn test_install_replacement_on_all_agents() {
        let (fx, mut config) = fixture();
        let source = replacing_package(&fx, "acme");

        let report = fx.manager().install(&mut config, &source).unwrap();

        assert_eq!(config.extensions.len(), 1);
        assert_eq!(config.extensions[0].replaced_skills, vec!["writer"]);
        assert!(matches!(
            report.replacements[0],
            ReplacementOutcome::Replaced { .. }
        ));
        assert!(skill_body(&fx, ".claude/skills", "writer").contains("replacement body"));
        assert!(skill_body(&fx, ".codex/skills", "writer").contains("replacement body"));
        // Config was persisted.
        let reloaded = ProjectConfig::load(fx.project.path()).unwrap().unwrap();
        assert_eq!(reloaded.extensions[0].name, "acme");
    }

    #[test]
    fn test_conflict_guard_blocks_second_owner() {
        let (fx, mut config) = fixture();
        let first = replacing_package(&fx, "acme");
        fx.manager().install(&mut config, &first).unwrap();

        let second = replacing_package(&fx, "rival");
        let before = skill_body(&fx, ".claude/skills", "writer");

        let err = fx.manager().install(&mut config, &second).unwrap_err();
        assert!(matches!(err, InstallError::Conflict { ref skill, ref owner }
            if skill == "writer" && owner == "acme"));

        // Nothing changed: no rival record, no rival storage, same bytes.
        assert_eq!(config.extensions.len(), 1);
        assert!(!fx.manager().extension_dir("rival").exists());
        assert_eq!(skill_body(&fx, ".claude/skills", "writer"), before);
    }

    #[test]
    fn test_partial_replacement_rolls_back() {
        let (fx, mut config) = fixture();
        let source = replacing_package(&fx, "acme");

        // Sabotage agent 2: its skills dir path is occupied by a file, so
        // the copy fails for codex but succeeds for claude.
        std::fs::remove_dir_all(fx.project.path().join(".codex/skills")).unwrap();
        std::fs::write(fx.project.path().join(".codex/skills"), "not a dir").unwrap();

        let report = fx.manager().install(&mut config, &source).unwrap();

        assert!(matches!(
            report.replacements[0],
            ReplacementOutcome::RolledBack { succeeded: 1, agents: 2, .. }
        ));
        // Record claims nothing; base skill is back on the agent that
        // briefly held the replacement.
        assert!(config.extensions[0].replaced_skills.is_empty());
        assert!(skill_body(&fx, ".claude/skills", "writer").contains("base body"));
    }

    #[test]
    fn test_zero_success_leaves_base_untouched() {
        let (fx, mut config) = fixture();
        let source = write_package(
            &fx,
            "acme",
            r#"{"name": "acme", "version": "1.0.0",
                "replaces": {"skills/missing": "writer"}}"#,
        );
        let before = skill_body(&fx, ".claude/skills", "writer");

        let report = fx.manager().install(&mut config, &source).unwrap();
        assert!(matches!(report.replacements[0], ReplacementOutcome::Failed { .. }));
        assert!(config.extensions[0].replaced_skills.is_empty());
        assert_eq!(skill_body(&fx, ".claude/skills", "writer"), before);
    }

    #[test]
    fn test_reinstall_supersedes_not_duplicates() {
        let (fx, mut config) = fixture();
        let source = replacing_package(&fx, "acme");

        fx.manager().install(&mut config, &source).unwrap();
        fx.manager().install(&mut config, &source).unwrap();

        assert_eq!(config.extensions.len(), 1);
        assert_eq!(config.extensions[0].replaced_skills, vec!["writer"]);
        assert!(skill_body(&fx, ".claude/skills", "writer").contains("replacement body"));
    }

    #[test]
    fn test_custom_skills_recorded_with_qualifier() {
        let (fx, mut config) = fixture();
        let source = write_package(
            &fx,
            "acme",
            r#"{"name": "acme", "version": "1.0.0", "skills": ["skills/helper"]}"#,
        );
        write_skill(
            &fx.packages.path().join("acme").join("skills/helper"),
            "---\nname: helper\n---\nhelper body\n",
        );

        fx.manager().install(&mut config, &source).unwrap();

        for a in &config.agents {
            assert!(a.installed_skills.contains(&"skills/helper".to_string()));
        }
        assert!(fx
            .project
            .path()
            .join(".claude/skills/helper")
            .join(SKILL_FILE)
            .is_file());
        assert!(config.extensions[0].replaced_skills.is_empty());
    }

    #[test]
    fn test_remove_restores_base_skill() {
        let (fx, mut config) = fixture();
        let source = replacing_package(&fx, "acme");
        fx.manager().install(&mut config, &source).unwrap();

        let report = fx.manager().remove(&mut config, "acme").unwrap();

        assert_eq!(report.restored, vec!["writer"]);
        assert!(config.extensions.is_empty());
        assert!(!fx.manager().extension_dir("acme").exists());
        assert!(skill_body(&fx, ".claude/skills", "writer").contains("base body"));
        assert!(skill_body(&fx, ".codex/skills", "writer").contains("base body"));
    }

    #[test]
    fn test_remove_keeps_skill_claimed_by_other_extension() {
        let (fx, mut config) = fixture();
        write_skill(&fx.share.path().join("reviewer"), "---\nname: reviewer\n---\nbase\n");

        let acme = replacing_package(&fx, "acme");
        fx.manager().install(&mut config, &acme).unwrap();

        // A second extension replacing a different skill.
        let other = write_package(
            &fx,
            "other",
            r#"{"name": "other", "version": "1.0.0",
                "skills": ["skills/better-reviewer"],
                "replaces": {"skills/better-reviewer": "reviewer"}}"#,
        );
        write_skill(
            &fx.packages.path().join("other").join("skills/better-reviewer"),
            "---\nname: better-reviewer\n---\nother replacement\n",
        );
        fx.manager().install(&mut config, &other).unwrap();

        fx.manager().remove(&mut config, "acme").unwrap();

        // "reviewer" is still owned by "other" and was not restored.
        assert!(skill_body(&fx, ".claude/skills", "reviewer").contains("other replacement"));
        assert_eq!(config.extensions.len(), 1);
        assert_eq!(config.extensions[0].replaced_skills, vec!["reviewer"]);
    }

    #[test]
    fn test_remove_not_installed() {
        let (fx, mut config) = fixture();
        let err = fx.manager().remove(&mut config, "ghost").unwrap_err();
        assert!(matches!(err, InstallError::NotInstalled(_)));
    }

    #[test]
    fn test_unsafe_source_manifest_rejected_before_any_write() {
        let (fx, mut config) = fixture();
        let source = write_package(
            &fx,
            "evil",
            r#"{"name": "../../etc", "version": "1.0.0"}"#,
        );

        let err = fx.manager().install(&mut config, &source).unwrap_err();
        assert!(matches!(
            err,
            InstallError::Resolve(ResolveError::Manifest(ManifestError::UnsafeName(_)))
        ));
        assert!(!fx.project.path().join(STATE_DIR).exists());
        assert!(config.extensions.is_empty());
    }

    #[test]
    fn test_collect_replaced_skills_excludes_named() {
        let records = vec![
            ExtensionRecord {
                name: "a".to_string(),
                source: "./a".to_string(),
                version: "1".to_string(),
                replaced_skills: vec!["writer".to_string()],
            },
            ExtensionRecord {
                name: "b".to_string(),
                source: "./b".to_string(),
                version: "1".to_string(),
                replaced_skills: vec!["reviewer".to_string(), "writer".to_string()],
            },
        ];

        let all = collect_replaced_skills(&records, None);
        assert_eq!(all, vec!["writer", "reviewer"]);

        let without_a = collect_replaced_skills(&records, Some("a"));
        assert_eq!(without_a, vec!["reviewer", "writer"]);
    }

    #[test]
    fn test_commit_excludes_vcs_metadata() {
        let (fx, mut config) = fixture();
        let source = write_package(&fx, "acme", r#"{"name": "acme", "version": "1.0.0"}"#);
        let git_dir = fx.packages.path().join("acme").join(".git");
        std::fs::create_dir_all(&git_dir).unwrap();
        std::fs::write(git_dir.join("HEAD"), "ref\n").unwrap();

        fx.manager().install(&mut config, &source).unwrap();

        let stored = fx.manager().extension_dir("acme");
        assert!(stored.join(MANIFEST_FILE).is_file());
        assert!(!stored.join(".git").exists());
    }

    #[test]
    fn test_upgrade_strips_old_custom_skills_and_injections() {
        let (fx, mut config) = fixture();

        // v1 ships a custom skill and an injection.
        let v1_dir = fx.packages.path().join("acme");
        std::fs::create_dir_all(v1_dir.join("fragments")).unwrap();
        std::fs::write(v1_dir.join("fragments/note.md"), "v1 note\n").unwrap();
        let v1 = write_package(
            &fx,
            "acme",
            r#"{"name": "acme", "version": "1.0.0",
                "skills": ["skills/helper"],
                "injections": [
                    {"target": "CONTEXT.md", "position": "append", "file": "fragments/note.md"}
                ]}"#,
        );
        write_skill(&v1_dir.join("skills/helper"), "---\nname: helper\n---\nv1\n");
        fx.manager().install(&mut config, &v1).unwrap();
        assert!(fx.project.path().join(".claude/skills/helper").exists());

        // v2 drops both.
        let v2 = write_package(
            &fx,
            "acme-v2",
            r#"{"name": "acme", "version": "2.0.0"}"#,
        );
        let report = fx.manager().install(&mut config, &v2).unwrap();

        assert!(report.upgraded);
        assert_eq!(config.extensions.len(), 1);
        assert_eq!(config.extensions[0].version, "2.0.0");
        assert!(!fx.project.path().join(".claude/skills/helper").exists());
        let context = std::fs::read_to_string(fx.project.path().join(".claude/CONTEXT.md"))
            .unwrap_or_default();
        assert!(!context.contains("v1 note"));
        for a in &config.agents {
            assert!(!a.installed_skills.contains(&"skills/helper".to_string()));
        }
    }
}
