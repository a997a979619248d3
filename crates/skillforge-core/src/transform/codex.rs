//! Codex CLI skill transformer.

use super::{rewrite_invocations, SkillTransformer, TransformOutcome};

/// Codex invokes prompts with a `$` sigil instead of a slash.
pub struct CodexTransformer;

impl SkillTransformer for CodexTransformer {
    fn transform(&self, skill_name: &str, content: &str) -> TransformOutcome {
        TransformOutcome {
            target_dir: skill_name.to_string(),
            target_name: "SKILL.md".to_string(),
            content: rewrite_invocations(content, |inv| format!("${inv}")),
            flat: false,
        }
    }

    fn welcome_message(&self) -> Vec<String> {
        vec![
            "1. Open Codex CLI in this directory".to_string(),
            "2. Run $forge to analyze the project and generate stack-specific skills"
                .to_string(),
        ]
    }

    fn invocation_hint(&self) -> Option<String> {
        Some("Codex uses $forge instead of /forge".to_string())
    }
}
