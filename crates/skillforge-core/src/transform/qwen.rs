//! Qwen Code skill transformer.

use super::{rewrite_invocations, SkillTransformer, TransformOutcome};

/// Qwen routes skill invocations through its `/skills` command.
pub struct QwenTransformer;

impl SkillTransformer for QwenTransformer {
    fn transform(&self, skill_name: &str, content: &str) -> TransformOutcome {
        TransformOutcome {
            target_dir: skill_name.to_string(),
            target_name: "SKILL.md".to_string(),
            content: rewrite_invocations(content, |inv| format!("/skills {inv}")),
            flat: false,
        }
    }

    fn welcome_message(&self) -> Vec<String> {
        vec![
            "1. Open Qwen Code in this directory".to_string(),
            "2. Companion servers are configured in .qwen/settings.json (if selected)"
                .to_string(),
            "3. Run /skills forge to analyze the project and generate stack-specific skills"
                .to_string(),
        ]
    }

    fn invocation_hint(&self) -> Option<String> {
        Some("Qwen uses /skills forge instead of /forge".to_string())
    }
}
