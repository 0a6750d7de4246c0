//! Category-aware resume screening: structures a job description into requirement
//! categories, matches resume chunks against each one by embedding similarity, and
//! consolidates the per-category scores into one weighted result.

pub mod config;
pub mod embedding_client;
pub mod errors;
pub mod llm_client;
pub mod routes;
pub mod screening;
pub mod state;
pub mod vector_index;
