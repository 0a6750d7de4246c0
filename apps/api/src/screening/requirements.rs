//! Requirement Structurer: decomposes a raw job description into a `RequirementSet`.

use serde_json::Value;
use tracing::{info, warn};

use crate::llm_client::{parse_structured, TextGenerator};
use crate::screening::models::RequirementSet;
use crate::screening::prompts::REQUIREMENTS_PROMPT_TEMPLATE;

/// Only this many leading characters of a job description are sent for structuring.
pub const MAX_JD_CHARS: usize = 3000;

/// Structures `job_text` into every requirement category.
///
/// Never fails: a generation error or unparsable output yields `RequirementSet::empty()`,
/// so downstream matching still runs and scores every category at zero.
pub async fn structure(job_text: &str, generator: &dyn TextGenerator) -> RequirementSet {
    let prompt =
        REQUIREMENTS_PROMPT_TEMPLATE.replace("{jd_text}", truncate_chars(job_text, MAX_JD_CHARS));

    let raw = match generator.structure(&prompt).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Requirement structuring failed, using empty requirements: {e}");
            return RequirementSet::empty();
        }
    };

    match parse_structured::<Value>(&raw) {
        Ok(value) => {
            let requirements = RequirementSet::from_generated(&value);
            info!(
                "Structured job description: {} of {} categories specified",
                requirements.specified().count(),
                requirements.iter().count()
            );
            requirements
        }
        Err(e) => {
            warn!("Requirement structuring returned unparsable output: {e}");
            RequirementSet::empty()
        }
    }
}

/// Returns the longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screening::models::{RequirementCategory, RequirementValue};
    use crate::screening::test_support::{Reply, StubGenerator};

    #[tokio::test]
    async fn test_structure_parses_fenced_json() {
        let generator = StubGenerator::new().with_requirements(Reply::text(
            "```json\n{\"hard_skills\": [\"python\", \"aws\"], \"education\": \"BSc\"}\n```",
        ));
        let set = structure("Backend engineer wanted", &generator).await;
        assert_eq!(
            set.get(RequirementCategory::HardSkills),
            &RequirementValue::List(vec!["python".to_string(), "aws".to_string()])
        );
        assert_eq!(set.get(RequirementCategory::Education).render(), "BSc");
        assert!(set.get(RequirementCategory::Industry).is_empty());
    }

    #[tokio::test]
    async fn test_structure_generation_failure_yields_empty_set() {
        let generator = StubGenerator::new().with_requirements(Reply::Fail);
        let set = structure("Backend engineer wanted", &generator).await;
        assert_eq!(set, RequirementSet::empty());
    }

    #[tokio::test]
    async fn test_structure_non_json_yields_empty_set() {
        let generator =
            StubGenerator::new().with_requirements(Reply::text("I could not parse that JD."));
        let set = structure("Backend engineer wanted", &generator).await;
        assert!(set.is_blank());
    }

    #[tokio::test]
    async fn test_structure_truncates_job_text() {
        let generator = StubGenerator::new();
        let long_jd = format!("{}TAIL_MARKER", "x".repeat(MAX_JD_CHARS));
        structure(&long_jd, &generator).await;
        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(!prompts[0].contains("TAIL_MARKER"));
    }

    #[test]
    fn test_truncate_chars_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 100), "short");
        assert_eq!(truncate_chars("", 3), "");
    }
}
