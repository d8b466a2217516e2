//! RPC dependency-injection context.

use std::sync::Arc;
use std::time::{Duration, Instant};

use worm_snapshot::Deployment;

/// Shared context passed to every RPC handler.
pub struct RpcContext {
    /// The mode-selected capability bundle.
    pub deployment: Arc<Deployment>,
    /// Periodic push interval for account watches.
    pub refresh_interval: Duration,
    /// When the server started (for uptime calculation).
    pub server_start_time: Instant,
}

impl RpcContext {
    /// Build a context over `deployment`.
    pub fn new(deployment: Arc<Deployment>, refresh_interval: Duration) -> Self {
        Self {
            deployment,
            refresh_interval,
            server_start_time: Instant::now(),
        }
    }
}
