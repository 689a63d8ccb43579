use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;

use push_relay_service::config::Settings;
use push_relay_service::push::create_push_sender;
use push_relay_service::server::{create_app, AppState};
use push_relay_service::store::{create_record_store, PostgresRecordStore};
use push_relay_service::telemetry::init_telemetry;
use push_relay_service::triggers::RedisSubscriber;
use push_relay_service::{postgres, redis};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;

    // Initialize tracing; the guard flushes spans on exit
    let _telemetry = init_telemetry(&settings.otel, &settings.log)?;
    tracing::info!(
        store = %settings.store.backend,
        push = %settings.push.backend,
        collection = %settings.relay.collection,
        "Configuration loaded"
    );

    let redis_conn = if settings.store.backend == "redis" {
        Some(
            redis::connect(&settings.redis)
                .await
                .context("Failed to connect to Redis")?,
        )
    } else {
        None
    };

    let postgres_pool = if settings.store.backend == "postgres" {
        let pool = postgres::connect(&settings.database).await?;
        PostgresRecordStore::new(pool.clone())
            .ensure_schema()
            .await
            .context("Failed to create queue_entries schema")?;
        Some(pool)
    } else {
        None
    };

    let store = create_record_store(&settings.store, redis_conn, postgres_pool);
    let sender = create_push_sender(&settings.push)?;

    // Create application state
    let state = AppState::new(settings.clone(), store, sender);
    tracing::info!("Application state initialized");

    // Create Redis subscriber (idle unless redis.enabled)
    let redis_subscriber = Arc::new(RedisSubscriber::new(
        settings.redis.clone(),
        state.relay.clone(),
    ));
    let shutdown_signal = redis_subscriber.shutdown_signal();

    let redis_subscriber_clone = redis_subscriber.clone();
    let redis_handle = tokio::spawn(async move {
        if let Err(e) = redis_subscriber_clone.start().await {
            tracing::error!(error = %e, "Redis subscriber failed");
        }
    });

    let relay = state.relay.clone();

    // Create Axum app
    let app = create_app(state);

    // Start server
    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal_handler(shutdown_signal))
        .await?;

    tracing::info!("Waiting for background tasks to finish...");
    let _ = redis_handle.await;

    // Let running invocations reach their terminal write
    relay
        .drain(Duration::from_secs(settings.relay.drain_timeout_seconds))
        .await;

    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal_handler(shutdown_tx: tokio::sync::broadcast::Sender<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }

    // Stop the Redis subscriber
    let _ = shutdown_tx.send(());
}
