use axum::routing::{get, put};
use axum::Router;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::handlers::{self, AppState};

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/tasks", get(handlers::list_tasks).post(handlers::create_task))
        .route("/tasks/reorder", put(handlers::reorder_tasks))
        .route(
            "/tasks/{id}",
            put(handlers::update_task).delete(handlers::delete_task),
        )
        .route("/dashboard/stats", get(handlers::dashboard_stats))
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind the listener and start serving. Returns a handle to shut it down.
pub async fn start(config: &ServerConfig, state: AppState) -> Result<ServerHandle, std::io::Error> {
    let router = build_router(state);
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(addr = %local_addr, "taskboard server started");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        let shutdown = async {
            let _ = shutdown_rx.await;
        };
        if let Err(e) = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
        {
            tracing::error!(error = %e, "server terminated with error");
        }
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        shutdown_tx,
        server,
    })
}

/// Handle returned by `start()`.
pub struct ServerHandle {
    pub port: u16,
    shutdown_tx: oneshot::Sender<()>,
    server: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Stop accepting connections and wait for in-flight requests to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.server.await {
            tracing::error!(error = %e, "server task panicked");
        }
    }
}
