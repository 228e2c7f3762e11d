use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use ticket_relay::{
    application::submit_ticket::use_case::SubmitTicketUseCase,
    config::Config,
    infrastructure::{
        relay::TelegramRelay,
        security::{
            InMemoryRateLimitStore, RateLimitStore, RateLimiter, RedisRateLimitStore, UploadPolicy,
        },
        storage::scratch_storage::ScratchStorage,
    },
    presentation::http::{routes::create_router, state::AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Uses RUST_LOG if set, otherwise sensible defaults
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("info,ticket_relay=debug"))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = Config::from_env()?;

    let scratch = Arc::new(ScratchStorage::init(&config.upload_dir).await?);

    let store: Arc<dyn RateLimitStore> = match &config.redis_url {
        Some(url) => {
            tracing::info!("Rate limit counters stored in Redis");
            Arc::new(RedisRateLimitStore::connect(redis::Client::open(url.as_str())?).await?)
        }
        None => Arc::new(InMemoryRateLimitStore::default()),
    };
    let rate_limiter = Arc::new(RateLimiter::new(
        store,
        config.rate_limit_max_requests,
        Duration::from_secs(config.rate_limit_window_seconds),
    ));

    let relay = Arc::new(TelegramRelay::new(
        &config.telegram_api_base,
        &config.bot_token,
        config.chat_id.clone(),
        Duration::from_secs(config.relay_timeout_seconds),
    )?);

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState {
        config: Arc::new(config),
        scratch,
        upload_policy: UploadPolicy::default(),
        rate_limiter,
        submit_ticket: Arc::new(SubmitTicketUseCase::new(relay)),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Ticket relay listening on {}", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("SIGTERM received, initiating graceful shutdown");
        }
    }
}
