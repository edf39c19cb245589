//! Task list HTTP server.
//!
//! # Usage
//!
//! ```bash
//! TASKS_PORT=3000 TASKS_USERNAME=user TASKS_PASSWORD=pass cargo run --bin tasks
//! ```
//!
//! # Example Requests
//!
//! ```bash
//! curl http://localhost:3000/v1/task/
//! curl -u user:pass http://localhost:3000/v1/task/basic
//! curl -X POST http://localhost:3000/v1/task/ \
//!   -H "Content-Type: application/json" \
//!   -d '{"task": "Water the plants"}'
//! ```

use tasks::{ServerConfig, TaskStore, build_api};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tasks=info,rest_toolkit_web=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();
    info!(
        api_version = %config.api_version,
        allowed_agent = ?config.allowed_agent,
        "Configuration loaded"
    );

    let store = TaskStore::seeded(["Do the laundry", "Do the dishes"]);
    let api = build_api(&config, &store)?;
    for (method, path) in api.routes() {
        info!(%method, %path, "route");
    }

    let app = api.into_router().layer(TraceLayer::new_for_http());

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
