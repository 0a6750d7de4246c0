use std::sync::Arc;

use crate::config::Config;
use crate::screening::pipeline::ScreeningPipeline;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Generation, embedding and vector index capabilities, chosen at startup.
    pub pipeline: Arc<ScreeningPipeline>,
    pub config: Config,
}
