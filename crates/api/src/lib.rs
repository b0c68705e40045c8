//! Weather Sensor API Server
//!
//! Login, CSV upload and search endpoints over the in-memory sensor store.

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use data_validator::{CsvIngestor, Validator};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use query_engine::QueryEngine;
use serde::Serialize;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;
use storage::{RecordStore, Repository};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_governor::GovernorLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

pub mod error;
pub mod rate_limit;
pub mod routes;
pub mod session;
pub mod settings;

pub use error::ApiError;
pub use settings::ApiConfig;

use rate_limit::create_governor_config;
use session::{require_session, SessionStore};

/// Longest accepted session lifetime (ten years)
const MAX_SESSION_TTL_SECONDS: u64 = 10 * 365 * 24 * 3600;

/// Application state shared across handlers
pub struct AppState {
    /// Record store
    pub store: Arc<dyn RecordStore>,
    /// Query engine over `store`
    pub engine: QueryEngine<dyn RecordStore>,
    /// CSV upload parser
    pub ingestor: CsvIngestor,
    /// Logged-in sessions
    pub sessions: SessionStore,
    pub config: ApiConfig,
    /// Prometheus exporter, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Create application state with an in-memory repository
    pub fn new(config: ApiConfig) -> Self {
        let store = Arc::new(Repository::new());
        Self::with_store(config, store)
    }

    /// Create application state over an injected store
    pub fn with_store(config: ApiConfig, store: Arc<dyn RecordStore>) -> Self {
        let ttl = config.auth.session_ttl_seconds.min(MAX_SESSION_TTL_SECONDS);
        Self {
            engine: QueryEngine::new(Arc::clone(&store)),
            store,
            ingestor: CsvIngestor::new(Validator::new(config.ingest.clone())),
            sessions: SessionStore::new(
                chrono::Duration::seconds(ttl as i64),
                config.auth.max_sessions,
            ),
            config,
            metrics: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub record_count: usize,
    pub active_sessions: usize,
}

/// Create the application router
pub fn create_router(state: SharedState) -> Router {
    let protected = Router::new()
        .route("/api/sensors/upload", post(routes::sensors::upload))
        .route("/api/sensors/search", post(routes::sensors::search))
        .route("/api/logout", post(routes::auth::logout))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    let mut login = Router::new().route("/api/login", post(routes::auth::login));
    if state.config.rate_limit.enabled {
        if let Some(config) = create_governor_config(&state.config.rate_limit) {
            info!(
                "Login rate limit: 1 request per {}s (burst: {})",
                state.config.rate_limit.per_second, state.config.rate_limit.burst_size
            );
            login = login.layer(GovernorLayer { config });
        }
    }

    Router::new()
        .merge(protected)
        .merge(login)
        .route("/api/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        record_count: state.store.count(),
        active_sessions: state.sessions.len(),
    })
}

/// Prometheus scrape endpoint
async fn metrics_handler(State(state): State<SharedState>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}

/// Initialize logging
pub fn init_logging(config: &settings::LoggingConfig) -> anyhow::Result<()> {
    let level = Level::from_str(&config.level)
        .map_err(|e| anyhow::anyhow!("invalid log level `{}`: {}", config.level, e))?;

    let builder = FmtSubscriber::builder().with_max_level(level).with_target(true);
    if config.json {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}

/// Serve the router on an already bound listener until it fails
pub async fn serve(listener: TcpListener, state: SharedState) -> std::io::Result<()> {
    let app = create_router(state);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await
}

/// Run the server until Ctrl-C
pub async fn run_server(config: ApiConfig) -> anyhow::Result<()> {
    let mut state = AppState::new(config);
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => state = state.with_metrics(handle),
        Err(e) => warn!("Prometheus recorder not installed: {}", e),
    }

    let addr = state.config.server.addr();
    let app = create_router(Arc::new(state));

    info!("Starting API server on {}", addr);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
