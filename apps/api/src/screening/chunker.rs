//! Resume Chunker: segments resume text into categorized fragments and embeds each one.
//!
//! Flow: generation capability → section map → degenerate-skills repair →
//!       one chunk per non-blank fragment → one embedding per chunk.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::embedding_client::Embedder;
use crate::errors::AppError;
use crate::llm_client::{parse_structured, TextGenerator};
use crate::screening::models::{ResumeChunk, ResumeSection};
use crate::screening::prompts::SEGMENT_PROMPT_TEMPLATE;

/// A skills section split into more fragments than this, all single characters, is
/// the known degenerate generation output and gets stitched back together.
pub const DEGENERATE_FRAGMENT_THRESHOLD: usize = 10;

pub type SectionMap = BTreeMap<ResumeSection, Vec<String>>;

/// Segments and embeds one resume.
///
/// Unparsable segmentation yields `Ok(vec![])`; callers decide whether an empty chunk
/// set is acceptable. Embedding failures propagate as `AppError::Embedding`.
pub async fn chunk(
    resume_id: &str,
    resume_text: &str,
    generator: &dyn TextGenerator,
    embedder: &dyn Embedder,
) -> Result<Vec<ResumeChunk>, AppError> {
    let mut sections = segment(resume_text, generator).await;

    if let Some(skills) = sections.remove(&ResumeSection::Skills) {
        sections.insert(ResumeSection::Skills, repair_degenerate_fragments(skills));
    }

    let mut chunks = Vec::new();
    let mut dimension: Option<usize> = None;

    for (section, fragments) in &sections {
        let texts = fragments.iter().map(|f| f.trim()).filter(|f| !f.is_empty());
        for (n, text) in texts.enumerate() {
            let embedding = embedder.embed(text).await.map_err(|e| {
                AppError::Embedding(format!("Failed to embed {section} chunk of {resume_id}: {e}"))
            })?;

            if embedding.iter().any(|v| !v.is_finite()) {
                return Err(AppError::Embedding(format!(
                    "Non-finite embedding value for {section} chunk of {resume_id}"
                )));
            }

            match dimension {
                None => dimension = Some(embedding.len()),
                Some(expected) if expected != embedding.len() => {
                    return Err(AppError::Embedding(format!(
                        "Inconsistent embedding dimension for {resume_id}: expected {expected}, got {}",
                        embedding.len()
                    )));
                }
                Some(_) => {}
            }

            chunks.push(ResumeChunk {
                id: format!("{resume_id}_{section}_{n}"),
                category: *section,
                text: text.to_string(),
                embedding,
            });
        }
    }

    info!("Chunked resume {resume_id} into {} chunks", chunks.len());
    Ok(chunks)
}

/// Asks the generation capability for a section map. Any failure yields an empty map.
async fn segment(resume_text: &str, generator: &dyn TextGenerator) -> SectionMap {
    let prompt = SEGMENT_PROMPT_TEMPLATE.replace("{resume_text}", resume_text);

    let raw = match generator.structure(&prompt).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Resume segmentation failed: {e}");
            return SectionMap::new();
        }
    };

    match parse_structured::<Value>(&raw) {
        Ok(value) => sections_from_generated(&value),
        Err(e) => {
            warn!("Resume segmentation returned unparsable output: {e}");
            SectionMap::new()
        }
    }
}

/// Reads a generated `{section: [text, ...]}` object, dropping unknown sections.
/// Fragments are kept verbatim (untrimmed) so that degenerate repair preserves spacing.
pub fn sections_from_generated(raw: &Value) -> SectionMap {
    let mut sections = SectionMap::new();
    let Some(object) = raw.as_object() else {
        warn!("Resume segmentation output is not a JSON object");
        return sections;
    };

    for (key, value) in object {
        let Some(section) = ResumeSection::from_key(key) else {
            debug!("Dropping unknown resume section '{key}'");
            continue;
        };
        let fragments = match value {
            Value::Array(items) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            Value::String(text) => vec![text.clone()],
            _ => {
                debug!("Malformed content for resume section '{section}'");
                continue;
            }
        };
        sections.insert(section, fragments);
    }
    sections
}

/// Concatenates fragments back into one when the list is the degenerate
/// one-character-per-element output. Other lists are returned unchanged.
pub fn repair_degenerate_fragments(fragments: Vec<String>) -> Vec<String> {
    let degenerate = fragments.len() > DEGENERATE_FRAGMENT_THRESHOLD
        && fragments.iter().all(|f| f.chars().count() <= 1);
    if !degenerate {
        return fragments;
    }
    debug!(
        "Repairing degenerate skills output of {} single-character fragments",
        fragments.len()
    );
    vec![fragments.concat()]
}
