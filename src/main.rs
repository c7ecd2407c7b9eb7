use std::sync::Arc;

use tokio::{net::TcpListener, signal};

use shelfmatch_api::{
    config::Config,
    db::{cache::create_redis_client, create_pool, Cache, CacheStore, MemoryStore, PgCatalog, RedisStore},
    middleware::StaticTokens,
    routes::{create_router, AppState},
    services::{LlmRanker, OpenAiCompletions, RecommendationService},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shelfmatch_api=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    let catalog = Arc::new(PgCatalog::new(pool));

    let (store, cache_writer) = match config.redis_url.as_deref() {
        Some(redis_url) => {
            let (store, handle) = RedisStore::new(create_redis_client(redis_url)?);
            (Arc::new(store) as Arc<dyn CacheStore>, Some(handle))
        }
        None => (
            Arc::new(MemoryStore::new(config.cache_capacity)) as Arc<dyn CacheStore>,
            None,
        ),
    };
    tracing::info!(store = store.name(), "Cache store ready");

    let backend = Arc::new(OpenAiCompletions::new(
        config.openai_api_key.clone(),
        config.openai_api_url.clone(),
        config.llm_model_name.clone(),
    ));
    let ranker = LlmRanker::new(backend, config.llm_timeout());

    let tokens = StaticTokens::new(config.token_entries());
    if tokens.is_empty() {
        tracing::warn!("API_TOKENS is empty, every API request will be rejected");
    }

    let state = Arc::new(AppState::new(
        RecommendationService::new(catalog, ranker, Cache::new(store)),
        Arc::new(tokens),
    ));
    let app = create_router(state, &config.cors_origin_list());

    let listener = TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %config.bind_addr(), model = %config.llm_model_name, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = cache_writer {
        handle.shutdown().await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
