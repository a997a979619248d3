//! Antigravity skill transformer.

use super::{replace_frontmatter_name, sanitize_name, SkillTransformer, TransformOutcome};

/// Antigravity keeps the directory layout but rejects dots in skill names.
pub struct AntigravityTransformer;

impl SkillTransformer for AntigravityTransformer {
    fn transform(&self, skill_name: &str, content: &str) -> TransformOutcome {
        let name = sanitize_name(skill_name);
        let content = if name == skill_name {
            content.to_string()
        } else {
            replace_frontmatter_name(content, &name)
        };
        TransformOutcome {
            target_dir: name,
            target_name: "SKILL.md".to_string(),
            content,
            flat: false,
        }
    }

    fn welcome_message(&self) -> Vec<String> {
        vec![
            "1. Open Antigravity in this directory".to_string(),
            "2. Run /forge to analyze the project and generate stack-specific skills"
                .to_string(),
        ]
    }
}
