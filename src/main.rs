//! MoneyFlow - personal finance backend API
//!
//! Serves the transaction, notification and tips endpoints consumed by the
//! MoneyFlow frontend. Users and tokens live in the external identity provider.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use moneyflow::config::LogFormat;
use moneyflow::identity::SupabaseAuthClient;
use moneyflow::repository::{PgNotificationRepository, PgTransactionRepository};
use moneyflow::tips::{GeminiClient, TextGenerator, TipsService};
use moneyflow::{create_router, db, error, AppState, Config, CorsPolicy};

/// Initialize tracing/logging
fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "moneyflow=debug,tower_http=debug".into());

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(config.log_format);

    error::expose_internal_details(!config.is_production());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let cors = CorsPolicy::from_config(&config)?;

    tracing::info!(environment = %config.environment, "Starting MoneyFlow server");
    tracing::info!("Connecting to database...");

    let pool = db::connect(&config.database_url, config.database_max_connections).await?;

    if !db::check_schema(&pool).await? {
        tracing::error!("Database schema is not complete. Please run migrations.");
        return Err(anyhow::anyhow!("Database schema incomplete"));
    }

    tracing::info!("Database connected successfully");

    let identity = Arc::new(SupabaseAuthClient::new(
        config.supabase_url.clone(),
        &config.supabase_service_key,
    )?);

    let generator = config.gemini_api_key.clone().map(|key| {
        Arc::new(GeminiClient::new(
            config.gemini_base_url.clone(),
            config.gemini_model.clone(),
            key,
        )) as Arc<dyn TextGenerator>
    });
    if generator.is_none() {
        tracing::warn!("GEMINI_API_KEY not set, tips will use the fallback rules");
    }

    let state = AppState::new(
        identity,
        Arc::new(PgTransactionRepository::new(pool.clone())),
        Arc::new(PgNotificationRepository::new(pool.clone())),
        TipsService::new(generator),
        config.environment.clone(),
    );

    let app = create_router(state, cors);

    tracing::info!("Listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutting down...");
    pool.close().await;
    tracing::info!("Database connections closed. Goodbye!");

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}
