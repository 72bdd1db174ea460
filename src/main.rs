//! Review aggregation service — binary entrypoint.
//! Boots the Axum HTTP server with the Reddit fetcher, the OpenAI-backed
//! classifier/summarizer, and the file-backed result cache.

use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use review_radar::api::{create_router, AppState};
use review_radar::cache::ResultCache;
use review_radar::collab::openai::OpenAiClient;
use review_radar::collab::reddit::RedditSource;
use review_radar::collab::{Classifier, CommentSource, Summarizer};
use review_radar::config::AppConfig;
use review_radar::orchestrator::FetchOrchestrator;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("review_radar=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when the file is absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::from_env();
    if cfg.llm.api_key.is_empty() {
        tracing::warn!("OPENAI_API_KEY is not set; LLM-backed results will be degraded");
    }

    let llm = Arc::new(OpenAiClient::new(&cfg.llm));
    let source: Arc<dyn CommentSource> = Arc::new(RedditSource::new());
    let classifier: Arc<dyn Classifier> = llm.clone();
    let summarizer: Arc<dyn Summarizer> = llm;
    let cache = Arc::new(ResultCache::open(&cfg.cache_path));

    let orchestrator = Arc::new(FetchOrchestrator::new(
        source,
        classifier,
        summarizer,
        cache,
        cfg.weights,
        cfg.fetch_limit,
    ));

    let router = create_router(AppState { orchestrator });

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!(addr = %cfg.bind_addr, "review-radar listening");
    axum::serve(listener, router).await?;
    Ok(())
}
