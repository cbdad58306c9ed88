use crate::config::{StoreBackend, StoreConfig, UserServiceConfig};
use crate::handlers;
use crate::services::{DocumentStore, KeyGenerator, MemoryStore, MongoStore, StoreHandle};
use axum::{
    body::Body,
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use backoff::{future::retry, ExponentialBackoff};
use service_core::error::AppError;
use service_core::middleware::tracing::{make_request_span, request_id_middleware};
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: UserServiceConfig,
    pub store: StoreHandle,
    pub keys: Arc<KeyGenerator>,
}

impl AppState {
    pub fn new(config: UserServiceConfig, store: StoreHandle) -> Self {
        Self {
            config,
            store,
            keys: Arc::new(KeyGenerator::new()),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/users", post(handlers::create_user))
        .route(
            "/users/:id",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span::<Body>))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
    state: AppState,
}

impl Application {
    /// Binds the listener. Unless `connect_in_background` is set, the store is
    /// connected and pinged first, so no request can observe an empty handle.
    pub async fn build(config: UserServiceConfig) -> Result<Self, AppError> {
        let store = StoreHandle::new();

        if config.store.connect_in_background {
            tracing::info!("Deferring document store connection to background task");
            tokio::spawn(connect_in_background(config.store.clone(), store.clone()));
        } else {
            store.install(connect_store(&config.store).await?);
        }

        let state = AppState::new(config.clone(), store);
        let app = build_router(state.clone());

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Server is listening at {}", port);

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
            state,
        })
    }

    pub fn store(&self) -> &StoreHandle {
        &self.state.store
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}

/// Opens the configured backend and verifies it answers a ping.
pub async fn connect_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, AppError> {
    let store: Arc<dyn DocumentStore> = match config.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory document store; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Mongodb => Arc::new(MongoStore::connect(config).await?),
    };

    store.ping().await.map_err(|e| {
        tracing::error!("Document store is not reachable: {}", e);
        AppError::DatabaseError(anyhow::Error::new(e))
    })?;

    tracing::info!(backend = ?config.backend, "Connected to document store");
    Ok(store)
}

async fn connect_in_background(config: StoreConfig, handle: StoreHandle) {
    let policy = ExponentialBackoff {
        max_elapsed_time: None,
        ..Default::default()
    };

    let result = retry(policy, || async {
        connect_store(&config).await.map_err(|e| {
            tracing::warn!(error = %e, "Document store connection attempt failed, retrying");
            backoff::Error::transient(e)
        })
    })
    .await;

    match result {
        Ok(store) => {
            handle.install(store);
            tracing::info!("Document store ready, accepting user requests");
        }
        Err(e) => tracing::error!("Giving up on document store connection: {}", e),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
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

    tracing::info!("Shutdown signal received");
}
