//! guest-merge server entry point.

use anyhow::Context;
use guest_merge::api::{AppState, CookieSettings, create_router};
use guest_merge::infrastructure::{
    AppConfig, InMemorySessionDirectory, InMemoryStore, LogFormat, MergeBackend, NoteRepository,
    PostgresPoolConfig, PostgresStore, SessionDirectory,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    init_tracing(config.as_ref().map_or(LogFormat::Pretty, |config| config.log_format));
    let config = config.context("Failed to load configuration")?;

    tracing::info!("Starting guest-merge...");
    let cookies = CookieSettings::from_config(&config);

    match &config.database_url {
        Some(database_url) => {
            let pool_config = PostgresPoolConfig::with_url(database_url)
                .with_max_connections(config.database_max_connections);
            let store = PostgresStore::connect(&pool_config)
                .await
                .context("Failed to connect to PostgreSQL")?;
            if config.run_migrations {
                store.migrate().await.context("Failed to run migrations")?;
                tracing::info!("Migrations applied");
            }
            tracing::info!("Infrastructure initialized (PostgreSQL mode)");

            let state = AppState::new(store.clone(), store.clone(), cookies);
            serve(state, &config).await?;
            store.close().await;
        }
        None => {
            tracing::info!("Infrastructure initialized (in-memory mode)");
            let state = AppState::new(
                InMemoryStore::new(),
                InMemorySessionDirectory::new(),
                cookies,
            );
            serve(state, &config).await?;
        }
    }

    tracing::info!("guest-merge stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,guest_merge=debug,tower_http=debug".into());
    let (json, pretty) = match format {
        LogFormat::Json => (Some(tracing_subscriber::fmt::layer().json()), None),
        LogFormat::Pretty => (None, Some(tracing_subscriber::fmt::layer())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(pretty)
        .init();
}

async fn serve<Store, Sessions>(
    state: AppState<Store, Sessions>,
    config: &AppConfig,
) -> anyhow::Result<()>
where
    Store: MergeBackend + NoteRepository,
    Sessions: SessionDirectory,
{
    let bind_address = config.bind_address();
    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {bind_address}"))?;

    tracing::info!("guest-merge started on http://{bind_address}");
    tracing::info!("Available endpoints:");
    tracing::info!("  GET  /health                - Health check");
    tracing::info!("  GET  /identity              - Current owner identity");
    tracing::info!("  POST /notes                 - Create note");
    tracing::info!("  GET  /notes                 - List notes");
    tracing::info!("  POST /notes/{{id}}/archive    - Archive note");
    tracing::info!("  POST /merge                 - Merge guest data into the signed-in user");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received");
}
