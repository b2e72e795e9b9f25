/// TaskHub Web - Main application entry point.
///
/// Serves the JSON API and the notification WebSocket over plain HTTP and
/// runs the sweep jobs in the background.
use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taskhub_web::{
    AppState,
    config::{Config, LogFormat, StoreBackend},
    db::create_pool,
    jobs::start_background_jobs,
    routes::create_app,
    store::{MemoryStore, PgStore},
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from TOML files
    let config = Config::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    init_tracing(&config);

    tracing::info!(
        environment = %config.environment.as_str(),
        backend = ?config.database.backend,
        "Starting TaskHub Web"
    );

    let addr: SocketAddr = config
        .server
        .bind_address()
        .parse()
        .map_err(|e| format!("Invalid address: {}", e))?;

    let state = match config.database.backend {
        StoreBackend::Postgres => {
            let pool = create_pool(&config.database).map_err(|e| {
                eprintln!("Failed to create database pool: {}", e);
                e
            })?;
            AppState::new(config, Arc::new(PgStore::new(pool)))?
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store; data is lost on exit");
            AppState::new(config, Arc::new(MemoryStore::new()))?
        }
    };

    let jobs = start_background_jobs(
        state.store.clone(),
        state.dispatcher.clone(),
        &state.config.jobs,
    );

    let channels = state.channels.clone();
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        eprintln!("Failed to bind to {}: {}", addr, e);
        e
    })?;
    tracing::info!(address = %addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(channels))
        .await?;

    for job in jobs {
        job.abort();
    }
    tracing::info!("TaskHub Web stopped");
    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("taskhub_web={},tower_http=info", config.logging.level).into()
    });

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}

/// Resolves on Ctrl-C or SIGTERM, then closes every live connection so the
/// server can drain.
async fn shutdown_signal(channels: taskhub_web::services::ChannelLayer) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!(
        connections = channels.total_connections(),
        "Shutdown requested, closing live connections"
    );
    channels.shutdown();
}
