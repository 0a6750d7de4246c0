// Screening Engine
// Implements: JD structuring, resume chunking, category matching, consolidation, narrative.
// All generation goes through TextGenerator and all vectors through Embedder; no direct
// provider calls here.

pub mod chunker;
pub mod consolidator;
pub mod handlers;
pub mod matcher;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod requirements;
pub mod summarizer;

#[cfg(test)]
pub mod test_support;
