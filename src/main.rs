use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use file_pipeline::{
    api, aws,
    config::{Config, IdentityBackend, QueueBackend, StorageBackend},
    identity::{CognitoIdentity, IdentityProvider, LocalIdentity},
    object_store as obj,
    queue::{LocalQueue, Queue, SqsQueue},
    storage::Database,
    worker::Worker,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let env_filter =
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    match log_format.to_lowercase().as_str() {
        "gcp" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_stackdriver::layer())
                .init();
        }
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_span_list(false),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    info!(version = env!("CARGO_PKG_VERSION"), "file-pipeline starting");

    let config = Config::load()?;
    info!(environment = ?config.environment, "Loaded configuration");

    let db = Database::open_with_retry(&config.node.data_dir, config.database.connect_attempts)
        .await
        .context("Could not open metadata database")?;
    info!("Database opened at: {}", config.node.data_dir);

    // AWS clients are only configured when some backend needs them
    let needs_aws = config.storage.backend == StorageBackend::S3
        || config.queue.backend == QueueBackend::Sqs
        || config.identity.provider == IdentityBackend::Cognito;
    let sdk_config = if needs_aws {
        Some(aws::load_sdk_config(&config).await)
    } else {
        None
    };

    let queue: Arc<dyn Queue> = match (config.queue.backend, &sdk_config) {
        (QueueBackend::Sqs, Some(sdk_config)) => {
            let queue_url = config
                .queue
                .queue_url
                .as_deref()
                .context("SQS_QUEUE_URL is required when QUEUE_BACKEND=sqs")?;
            info!("Using SQS queue: {}", queue_url);
            Arc::new(SqsQueue::new(
                sdk_config,
                queue_url,
                config.worker.wait_time_seconds,
            ))
        }
        _ => {
            info!("Using local queue backed by the metadata database");
            Arc::new(LocalQueue::new(db.clone()))
        }
    };

    let store: Arc<dyn obj::ObjectStore> = match (config.storage.backend, &sdk_config) {
        (StorageBackend::S3, Some(sdk_config)) => {
            info!("Using S3 storage backend, bucket: {}", config.storage.bucket);
            // Emulators serve buckets by path, not by virtual host
            let force_path_style = config.aws_endpoint().is_some();
            Arc::new(obj::S3Store::new(
                sdk_config,
                &config.storage.bucket,
                force_path_style,
            ))
        }
        _ => {
            let store = obj::LocalStore::new(
                &config.storage.local_storage_path,
                &config.storage.bucket,
            )?;
            info!(
                "Using local storage backend at: {}",
                config.storage.local_storage_path
            );
            Arc::new(store)
        }
    };

    let object_store: Arc<dyn obj::ObjectStore> = if config.storage.emulate_notifications {
        info!("Publishing object-created notifications on every upload");
        Arc::new(obj::NotifyingStore::new(store, Arc::clone(&queue)))
    } else {
        store
    };

    let identity: Arc<dyn IdentityProvider> = match (config.identity.provider, &sdk_config) {
        (IdentityBackend::Cognito, Some(sdk_config)) => {
            let client_id = config
                .identity
                .cognito_client_id
                .as_deref()
                .context("COGNITO_CLIENT_ID is required when AUTH_PROVIDER=cognito")?;
            Arc::new(CognitoIdentity::new(sdk_config, client_id))
        }
        _ => {
            info!("Using local identity provider");
            Arc::new(LocalIdentity::new(
                db.clone(),
                config.identity.password_hash_iterations,
            ))
        }
    };

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        identity,
        object_store,
        queue,
    });

    let worker_handle = if config.worker.enabled {
        Some(Worker::from_state(&state).start())
    } else {
        info!("Worker disabled");
        None
    };

    // Build and start the HTTP server
    let app = api::create_router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(&config.node.bind_address).await?;
    info!("Listening on: {}", config.node.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down background tasks");
    if let Some(handle) = worker_handle {
        handle.abort();
    }

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, draining connections");
}
