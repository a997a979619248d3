//! Default skill transformer.

use super::{SkillTransformer, TransformOutcome};

/// Directory layout, content unchanged. Used for agents that consume the
/// canonical `SKILL.md` convention directly.
pub struct DefaultTransformer;

impl SkillTransformer for DefaultTransformer {
    fn transform(&self, skill_name: &str, content: &str) -> TransformOutcome {
        TransformOutcome {
            target_dir: skill_name.to_string(),
            target_name: "SKILL.md".to_string(),
            content: content.to_string(),
            flat: false,
        }
    }

    fn welcome_message(&self) -> Vec<String> {
        vec![
            "1. Open the agent in this directory".to_string(),
            "2. Run /forge to analyze the project and generate stack-specific skills"
                .to_string(),
        ]
    }
}
