//! Per-agent skill content rewriting.
//!
//! Every agent consumes skill text in its own conventions: some keep the
//! `SKILL.md` directory layout, some flatten skills into a rules file, and
//! invocation syntax differs per tool. A [`SkillTransformer`] captures those
//! conventions behind one capability interface; the [`TransformerRegistry`]
//! is an explicit, constructed lookup table from agent identity to variant,
//! with a default variant for unknown identities.

mod antigravity;
mod codex;
mod default;
mod kilocode;
mod qwen;

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

pub use antigravity::AntigravityTransformer;
pub use codex::CodexTransformer;
pub use default::DefaultTransformer;
pub use kilocode::KilocodeTransformer;
pub use qwen::QwenTransformer;

/// Where and how one transformed skill lands on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutcome {
    /// Directory (under the agent's skills dir, or under its config dir
    /// when `flat`) to place the skill in.
    pub target_dir: String,

    /// File name for the skill body.
    pub target_name: String,

    /// Rewritten skill content.
    pub content: String,

    /// Flat layout: a single file under the agent's config dir instead of
    /// a copied skill directory.
    pub flat: bool,
}

/// Rewrites skill content and placement for one agent's conventions.
pub trait SkillTransformer {
    /// Transforms one skill body for this agent.
    fn transform(&self, skill_name: &str, content: &str) -> TransformOutcome;

    /// Onboarding lines shown after setup.
    fn welcome_message(&self) -> Vec<String>;

    /// How workflow skills are invoked in this agent, when it differs from
    /// the default slash syntax.
    fn invocation_hint(&self) -> Option<String> {
        None
    }
}

/// Explicit agent-identity → transformer table.
pub struct TransformerRegistry {
    table: HashMap<String, Box<dyn SkillTransformer>>,
    fallback: Box<dyn SkillTransformer>,
}

impl TransformerRegistry {
    /// Builds an empty registry with the default fallback variant.
    pub fn new() -> Self {
        Self { table: HashMap::new(), fallback: Box::new(DefaultTransformer) }
    }

    /// Builds the registry of built-in variants.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register("codex", Box::new(CodexTransformer));
        registry.register("qwen", Box::new(QwenTransformer));
        registry.register("kilocode", Box::new(KilocodeTransformer));
        registry.register("antigravity", Box::new(AntigravityTransformer));
        registry
    }

    /// Registers (or overrides) the variant for one agent identity.
    pub fn register(&mut self, agent_id: &str, transformer: Box<dyn SkillTransformer>) {
        self.table.insert(agent_id.to_string(), transformer);
    }

    /// The transformer for an agent, falling back to the default variant.
    pub fn get(&self, agent_id: &str) -> &dyn SkillTransformer {
        match self.table.get(agent_id) {
            Some(transformer) => transformer.as_ref(),
            None => self.fallback.as_ref(),
        }
    }
}

impl Default for TransformerRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

static FRONTMATTER_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^name:\s*(.+)$").expect("valid pattern"));

static FRONTMATTER_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A---\n(.*?)\n---").expect("valid pattern"));

static FRONTMATTER_DESCRIPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^description:\s*(.+)$").expect("valid pattern"));

/// Invocation tokens of the workflow skills (`/forge`, `/forge-commit`, …).
static INVOCATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|[^A-Za-z0-9_-])/(forge(?:-[a-z0-9-]+)?)").expect("valid pattern")
});

/// Replaces characters some agents reject in skill names.
pub fn sanitize_name(name: &str) -> String {
    name.replace('.', "-")
}

/// Extracts the `name:` value from skill frontmatter.
pub fn extract_frontmatter_name(content: &str) -> Option<String> {
    FRONTMATTER_NAME.captures(content).map(|c| c[1].trim().to_string())
}

/// Rewrites the `name:` value in skill frontmatter.
pub fn replace_frontmatter_name(content: &str, new_name: &str) -> String {
    FRONTMATTER_NAME.replace(content, format!("name: {new_name}")).into_owned()
}

/// Reduces frontmatter to its description line, for agents that reject
/// unknown frontmatter keys.
pub fn simplify_frontmatter(content: &str) -> String {
    let Some(block) = FRONTMATTER_BLOCK.captures(content) else {
        return content.to_string();
    };
    let Some(desc) = FRONTMATTER_DESCRIPTION.captures(&block[1]) else {
        return content.to_string();
    };
    let replacement = format!("---\ndescription: {}\n---", desc[1].trim());
    FRONTMATTER_BLOCK.replace(content, replacement.as_str()).into_owned()
}

/// Rewrites workflow-skill invocation tokens through `map`, preserving the
/// character in front of each token.
pub fn rewrite_invocations(content: &str, map: impl Fn(&str) -> String) -> String {
    INVOCATION
        .replace_all(content, |caps: &regex::Captures<'_>| {
            format!("{}{}", &caps[1], map(&caps[2]))
        })
        .into_owned()
}
