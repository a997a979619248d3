//! Kilo Code skill transformer.

use super::{sanitize_name, simplify_frontmatter, SkillTransformer, TransformOutcome};

/// Kilo Code consumes flat markdown rules files under its config dir and
/// rejects unknown frontmatter keys.
pub struct KilocodeTransformer;

impl SkillTransformer for KilocodeTransformer {
    fn transform(&self, skill_name: &str, content: &str) -> TransformOutcome {
        let name = sanitize_name(skill_name);
        TransformOutcome {
            target_dir: "rules".to_string(),
            target_name: format!("{name}.md"),
            content: simplify_frontmatter(content),
            flat: true,
        }
    }

    fn welcome_message(&self) -> Vec<String> {
        vec![
            "1. Open Kilo Code in this directory".to_string(),
            "2. Rules are loaded from .kilocode/rules automatically".to_string(),
        ]
    }
}
