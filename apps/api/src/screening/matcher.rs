//! Category Matcher: scores each requirement category against the resume's chunks.
//!
//! Algorithm per category:
//! 1. Empty requirement → score 0.0, no matches, no embedding call
//! 2. Embed one synthesized query: "Required <category words>: <value>"
//! 3. Cosine similarity against every chunk, whatever the chunk's own section
//! 4. Keep the top `TOP_K` by similarity (stable: ties keep chunk order)
//! 5. score = mean of kept similarities, clamped to [0, 1], rounded to 4 places

use tracing::debug;

use crate::embedding_client::Embedder;
use crate::errors::AppError;
use crate::screening::models::{
    round4, CategoryScore, CategoryScores, ChunkMatch, RequirementCategory, RequirementSet,
    RequirementValue, ResumeChunk,
};

/// Number of supporting chunks averaged into each category score.
pub const TOP_K: usize = 5;

/// Scores every category of `requirements` against `chunks`.
///
/// Embedding failures propagate; a default embedding is never substituted.
pub async fn match_categories(
    requirements: &RequirementSet,
    chunks: &[ResumeChunk],
    embedder: &dyn Embedder,
) -> Result<CategoryScores, AppError> {
    let mut scores = CategoryScores::new();

    for (category, value) in requirements.iter() {
        if value.is_empty() {
            scores.insert(category, CategoryScore::zero(category));
            continue;
        }

        let query = build_query(category, value);
        let query_embedding = embedder.embed(&query).await.map_err(|e| {
            AppError::Embedding(format!("Failed to embed {category} requirement query: {e}"))
        })?;

        let matches = top_matches(&query_embedding, chunks, TOP_K);
        let score = mean_similarity(&matches);
        debug!(
            "Category {category}: score={score} from {} matches",
            matches.len()
        );

        scores.insert(
            category,
            CategoryScore {
                category,
                score,
                matches,
            },
        );
    }

    Ok(scores)
}

/// "Required hard skills: python, aws"
pub fn build_query(category: RequirementCategory, value: &RequirementValue) -> String {
    format!("Required {}: {}", category.words(), value.render())
}

/// Ranks every chunk against `query` and keeps the best `k`, most similar first.
pub fn top_matches(query: &[f32], chunks: &[ResumeChunk], k: usize) -> Vec<ChunkMatch> {
    let mut ranked: Vec<ChunkMatch> = chunks
        .iter()
        .map(|chunk| ChunkMatch {
            chunk_id: chunk.id.clone(),
            category: chunk.category,
            similarity: cosine_similarity(query, &chunk.embedding),
            text: chunk.text.clone(),
        })
        .collect();

    // sort_by is stable, so equal similarities keep their original chunk order.
    ranked.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    ranked.truncate(k);
    ranked
}

/// Mean similarity of `matches`, clamped to [0, 1] and rounded; 0.0 for no matches.
pub fn mean_similarity(matches: &[ChunkMatch]) -> f64 {
    if matches.is_empty() {
        return 0.0;
    }
    let total: f64 = matches.iter().map(|m| m.similarity).sum();
    round4((total / matches.len() as f64).clamp(0.0, 1.0))
}

/// Cosine similarity accumulated in f64. Zero-norm or mismatched-length inputs yield 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denominator = norm_a.sqrt() * norm_b.sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        return 0.0;
    }
    dot / denominator
}
