use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use nyayasathi::auth::jwt::JwtService;
use nyayasathi::config::AppConfig;
use nyayasathi::db;
use nyayasathi::providers::{GoogleTranslateProvider, GroqTranscriber};
use nyayasathi::routes;
use nyayasathi::state::AppState;
use nyayasathi::storage::S3AudioStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    nyayasathi::init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "api",
        database_url = %config.redacted_database_url(),
        pool_size = config.database_max_pool_size,
        server_host = %config.server_host,
        server_port = config.server_port,
        s3_bucket = %config.s3_bucket,
        transcription_configured = config.groq_api_key.is_some(),
        transcription_model = %config.transcription_model,
        translation_endpoint = %config.translation_endpoint,
        duplicate_window_hours = config.duplicate_window_hours,
        duplicate_threshold = config.duplicate_similarity_threshold,
        "loaded configuration"
    );

    let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
    {
        let mut conn = pool.get().context("failed to get database connection")?;
        db::run_migrations(&mut conn)?;
    }

    let storage = Arc::new(S3AudioStore::connect(&config).await?);
    let jwt = JwtService::from_config(&config)?;
    let translation = Arc::new(GoogleTranslateProvider::new(&config.translation())?);
    let transcriber = Arc::new(GroqTranscriber::new(config.transcription())?);
    if !transcriber.is_configured() {
        tracing::warn!("GROQ_API_KEY is not set; audio complaints will be rejected");
    }

    let listen_addr: SocketAddr =
        format!("{}:{}", config.server_host, config.server_port).parse()?;
    let state = AppState::new(pool, config, storage, jwt, translation, transcriber);
    let router = routes::create_router(state);

    let listener = TcpListener::bind(listen_addr).await?;
    tracing::info!("listening on {}", listen_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("received shutdown signal");
}
