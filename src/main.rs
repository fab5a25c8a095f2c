use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use textmining_api::{
    api,
    config::{Config, QueueBackend},
    europepmc::{DocumentRegistry, EuropePmcClient},
    queue::{OutboxPublisher, QueuePublisher, RabbitMqPublisher},
    storage::{models::UserRecord, Database},
    AppState,
};

#[tokio::main(flavor = "current_thread")]
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

    info!(version = env!("CARGO_PKG_VERSION"), "textmining-api starting");

    // Load configuration
    let config = Config::load()?;

    // Initialize database
    let db = Database::open(&config.node.data_dir)?;
    info!(
        transactional = config.storage.transactional,
        "Database opened at: {}", config.node.data_dir
    );

    for (username, password_hash) in &config.bootstrap_users {
        db.put_user(&UserRecord {
            username: username.clone(),
            password_hash: password_hash.clone(),
        })?;
        info!(user = %username, "Bootstrapped user");
    }

    // Initialize queue backend
    let publisher: Arc<dyn QueuePublisher> = match config.queue.backend {
        QueueBackend::Outbox => {
            info!(
                queue = %config.queue.submissions_queue,
                "Using local outbox queue backend"
            );
            Arc::new(OutboxPublisher::new(db.clone()))
        }
        QueueBackend::RabbitMq => {
            let api_url = config
                .queue
                .rabbitmq_api_url
                .as_deref()
                .expect("RABBITMQ_API_URL validated in config");
            let publisher = RabbitMqPublisher::new(
                api_url,
                &config.queue.rabbitmq_vhost,
                &config.queue.rabbitmq_username,
                &config.queue.rabbitmq_password,
                Duration::from_millis(config.queue.timeout_ms),
            )?;
            info!(
                queue = %config.queue.submissions_queue,
                exchange = %config.queue.exchange,
                "Using RabbitMQ queue backend at: {}", api_url
            );
            Arc::new(publisher)
        }
    };

    // Europe PMC lookup is optional
    let registry: Option<Arc<dyn DocumentRegistry>> = if config.europepmc.verify_ft_id {
        Some(Arc::new(EuropePmcClient::new(&config.europepmc)?))
    } else {
        None
    };

    // Create shared state
    let state = Arc::new(AppState::new(config.clone(), db, publisher, registry));

    // Build and start the HTTP server
    let app = api::create_router(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(&config.node.bind_address).await?;
    info!("Listening on: {}", config.node.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining connections");
}
