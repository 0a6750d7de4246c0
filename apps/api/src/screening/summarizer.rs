//! Narrative Summarizer: candidate name extraction and the one-sentence justification.
//!
//! Both are presentation helpers: generation failures fall back to fixed strings
//! instead of failing the scoring run.

use tracing::warn;

use crate::llm_client::TextGenerator;
use crate::screening::models::{ConsolidatedResult, RequirementSet};
use crate::screening::prompts::{CANDIDATE_NAME_PROMPT_TEMPLATE, SUMMARY_PROMPT_TEMPLATE};
use crate::screening::requirements::truncate_chars;

pub const UNKNOWN_CANDIDATE: &str = "Unknown Candidate";
pub const SUMMARY_FALLBACK: &str = "An error occurred while generating the summary.";

/// Only the head of a resume is needed to find the candidate's name.
const MAX_NAME_CONTEXT_CHARS: usize = 2000;
/// Evidence snippets quoted in the summary prompt are cut to this length.
const EVIDENCE_SNIPPET_CHARS: usize = 160;

pub async fn extract_candidate_name(resume_text: &str, generator: &dyn TextGenerator) -> String {
    let prompt = CANDIDATE_NAME_PROMPT_TEMPLATE.replace(
        "{resume_text}",
        truncate_chars(resume_text, MAX_NAME_CONTEXT_CHARS),
    );

    match generator.narrate(&prompt).await {
        Ok(raw) => {
            let name = raw.trim().trim_matches(|c: char| c == '"' || c == '\'').trim();
            if name.is_empty() {
                UNKNOWN_CANDIDATE.to_string()
            } else {
                name.to_string()
            }
        }
        Err(e) => {
            warn!("Candidate name extraction failed: {e}");
            UNKNOWN_CANDIDATE.to_string()
        }
    }
}

/// Produces one sentence justifying `result`.
pub async fn summarize(
    result: &ConsolidatedResult,
    requirements: &RequirementSet,
    generator: &dyn TextGenerator,
) -> String {
    let prompt = SUMMARY_PROMPT_TEMPLATE
        .replace(
            "{consolidated_score}",
            &format!("{:.4}", result.consolidated_score),
        )
        .replace("{breakdown}", &build_breakdown(result, requirements));

    match generator.narrate(&prompt).await {
        Ok(summary) if !summary.trim().is_empty() => summary.trim().to_string(),
        Ok(_) => {
            warn!("Summary generation returned empty text for {}", result.resume_id);
            SUMMARY_FALLBACK.to_string()
        }
        Err(e) => {
            warn!("Summary generation failed for {}: {e}", result.resume_id);
            SUMMARY_FALLBACK.to_string()
        }
    }
}

/// One line per category: its score and best evidence, or that the job does not ask for it.
fn build_breakdown(result: &ConsolidatedResult, requirements: &RequirementSet) -> String {
    requirements
        .iter()
        .map(|(category, value)| {
            if value.is_empty() {
                return format!("- {category}: not required by the job description");
            }
            let score = result
                .category_scores
                .get(&category)
                .map(|s| s.score)
                .unwrap_or(0.0);
            let evidence = result
                .category_scores
                .get(&category)
                .and_then(|s| s.matches.first())
                .map(|m| {
                    format!(
                        " (best evidence from {}: \"{}\")",
                        m.category,
                        truncate_chars(&m.text, EVIDENCE_SNIPPET_CHARS)
                    )
                })
                .unwrap_or_default();
            format!(
                "- {category}: {score:.4} for requirement \"{}\"{evidence}",
                value.render()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
