use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use screener::config::Config;
use screener::embedding_client::EmbeddingClient;
use screener::llm_client::{self, LlmClient};
use screener::routes::build_router;
use screener::screening::pipeline::ScreeningPipeline;
use screener::state::AppState;
use screener::vector_index::{InMemoryVectorIndex, PgVectorIndex, VectorIndex};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Screener API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone())?;
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Initialize embedding client
    let embedder = EmbeddingClient::new(config.embedding_settings())?;
    info!("Embedding client initialized (model: {})", embedder.model());

    // Initialize vector index (pgvector when DATABASE_URL is set, in-memory otherwise)
    let index: Arc<dyn VectorIndex> = match &config.database_url {
        Some(database_url) => Arc::new(PgVectorIndex::connect(database_url, 10).await?),
        None => {
            info!("DATABASE_URL not set; chunk vectors are kept in memory");
            Arc::new(InMemoryVectorIndex::new())
        }
    };

    let pipeline = ScreeningPipeline::new(Arc::new(llm), Arc::new(embedder), index);

    // Build app state
    let state = AppState {
        pipeline: Arc::new(pipeline),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict CORS origins once a frontend domain exists

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
