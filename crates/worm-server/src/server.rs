//! `WormServer` — Axum HTTP + WebSocket server.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::{State, WebSocketUpgrade};
use axum::response::{IntoResponse, Json};
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use worm_settings::ServerSettings;

use crate::health::{self, HealthResponse};
use crate::rpc::context::RpcContext;
use crate::rpc::registry::MethodRegistry;
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::session::{Heartbeat, run_ws_session};

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// RPC method registry.
    pub registry: Arc<MethodRegistry>,
    /// Handler dependency context.
    pub ctx: Arc<RpcContext>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// When the server started.
    pub start_time: Instant,
    /// Prometheus render handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
    /// Live WebSocket connection count.
    pub active_connections: Arc<AtomicUsize>,
    /// Heartbeat timings for new sessions.
    pub heartbeat: Heartbeat,
}

/// The main wormgate server.
pub struct WormServer {
    settings: ServerSettings,
    registry: Arc<MethodRegistry>,
    ctx: Arc<RpcContext>,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
    metrics: Option<PrometheusHandle>,
    active_connections: Arc<AtomicUsize>,
}

impl WormServer {
    /// Create a new server.
    pub fn new(settings: ServerSettings, registry: MethodRegistry, ctx: RpcContext) -> Self {
        Self {
            settings,
            registry: Arc::new(registry),
            ctx: Arc::new(ctx),
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
            metrics: None,
            active_connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Attach a Prometheus handle for the `/metrics` endpoint.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            registry: self.registry.clone(),
            ctx: self.ctx.clone(),
            shutdown: self.shutdown.clone(),
            start_time: self.start_time,
            metrics: self.metrics.clone(),
            active_connections: self.active_connections.clone(),
            heartbeat: Heartbeat {
                ping_interval: Duration::from_millis(self.settings.heartbeat_interval_ms),
                pong_timeout: Duration::from_millis(self.settings.heartbeat_timeout_ms),
            },
        };

        Router::new()
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .route("/ws", get(ws_handler))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Bind and start serving in a background task.
    ///
    /// Returns the bound address (useful with port 0) and the serve task
    /// handle. The task exits once the shutdown token fires.
    pub async fn listen(
        &self,
    ) -> std::io::Result<(std::net::SocketAddr, tokio::task::JoinHandle<()>)> {
        let addr = format!("{}:{}", self.settings.host, self.settings.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "server listening");

        let app = self.router();
        let token = self.shutdown.token();
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(token.cancelled_owned())
                .await
            {
                tracing::error!(error = %e, "server error");
            }
        });
        Ok((local_addr, handle))
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the method registry.
    pub fn registry(&self) -> &Arc<MethodRegistry> {
        &self.registry
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let connections = state.active_connections.load(Ordering::Relaxed);
    let resp = health::health_check(state.start_time, connections, &state.ctx.deployment.network);
    Json(resp)
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> String {
    state.metrics.as_ref().map(crate::metrics::render).unwrap_or_default()
}

/// GET /ws — upgrade to a WebSocket session.
async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        let client_id = format!("conn_{}", uuid::Uuid::now_v7());
        run_ws_session(
            socket,
            client_id,
            state.registry,
            state.ctx,
            state.heartbeat,
            state.active_connections,
        )
    })
}
