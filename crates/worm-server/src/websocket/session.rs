//! WebSocket session lifecycle — handles a single connected client from
//! upgrade through disconnect.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use metrics::{counter, gauge, histogram};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use crate::rpc::context::RpcContext;
use crate::rpc::registry::MethodRegistry;
use crate::rpc::types::RpcEvent;

use super::connection::ClientConnection;
use super::handler::{HandleResult, handle_message};
use super::subscription::{Subscription, push_event};

/// Heartbeat timings for a session.
#[derive(Clone, Copy, Debug)]
pub struct Heartbeat {
    /// Interval between server-initiated Ping frames.
    pub ping_interval: Duration,
    /// How long to wait for a Pong before considering the client dead.
    pub pong_timeout: Duration,
}

impl Default for Heartbeat {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
            pong_timeout: Duration::from_secs(60),
        }
    }
}

/// Extract the watched address from a successful `account.watch` result.
fn watch_address(result: &HandleResult) -> Option<String> {
    if result.method != "account.watch" || !result.response.success {
        return None;
    }
    result
        .response
        .result
        .as_ref()
        .and_then(|r| r.get("address"))
        .and_then(|v| v.as_str())
        .map(str::to_owned)
}

/// Run a WebSocket session for a connected client.
///
/// 1. Sends a `connection.established` event with the client ID
/// 2. Dispatches incoming text frames as RPC requests
/// 3. Binds `account.watch` to a connection-scoped subscription task and
///    routes `account.refresh` to it
/// 4. Sends periodic Ping frames and disconnects unresponsive clients
/// 5. Cleans up on disconnect, aborting the subscription with it
#[instrument(skip_all, fields(client_id = %client_id))]
pub async fn run_ws_session(
    ws: WebSocket,
    client_id: String,
    registry: Arc<MethodRegistry>,
    ctx: Arc<RpcContext>,
    heartbeat: Heartbeat,
    active_connections: Arc<AtomicUsize>,
) {
    let (mut ws_tx, mut ws_rx) = ws.split();

    let (send_tx, mut send_rx) = mpsc::channel::<String>(1024);
    let connection = Arc::new(ClientConnection::new(client_id.clone(), send_tx.clone()));

    info!(client_id, "client connected");
    counter!("ws_connections_total").increment(1);
    gauge!("ws_connections_active").increment(1.0);
    let _ = active_connections.fetch_add(1, Ordering::Relaxed);

    let connected = RpcEvent::new(
        "connection.established",
        Some(json!({ "clientId": client_id })),
    );
    if let Some(text) = connected.to_json() {
        let _ = ws_tx.send(Message::Text(text.into())).await;
    }

    // Spawn outbound forwarder with periodic Ping frames.
    let outbound_conn = connection.clone();
    let outbound = tokio::spawn(async move {
        let mut ping_interval = tokio::time::interval(heartbeat.ping_interval);
        // Skip the immediate first tick
        let _ = ping_interval.tick().await;

        loop {
            tokio::select! {
                msg = send_rx.recv() => {
                    match msg {
                        Some(text) => {
                            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
                _ = ping_interval.tick() => {
                    if !outbound_conn.check_alive()
                        && outbound_conn.last_pong_elapsed() > heartbeat.pong_timeout
                    {
                        warn!(
                            "client unresponsive for {:?}, disconnecting",
                            heartbeat.pong_timeout
                        );
                        break;
                    }
                    if ws_tx.send(Message::Ping(vec![].into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // The active account watch, if any. Session-local so the push task
    // can never outlive this connection.
    let mut subscription: Option<Subscription> = None;

    while let Some(Ok(msg)) = ws_rx.next().await {
        let text = match msg {
            Message::Text(ref t) => Some(t.to_string()),
            Message::Binary(ref data) => {
                if let Ok(s) = std::str::from_utf8(data) {
                    Some(s.to_string())
                } else {
                    info!(client_id, len = data.len(), "received non-UTF8 binary frame");
                    None
                }
            }
            Message::Close(_) => {
                info!(client_id, "client sent close frame");
                break;
            }
            Message::Ping(_) | Message::Pong(_) => {
                connection.mark_alive();
                None
            }
        };

        let Some(text) = text else { continue };

        let result = handle_message(&text, &registry, &ctx).await;

        if !connection.send(result.response_json.clone()) {
            info!(client_id, "failed to enqueue response (channel full or closed)");
        }

        if let Some(address) = watch_address(&result) {
            // A new watch replaces any previous one; dropping the old
            // subscription aborts its push task.
            debug!(client_id, address, "binding account watch");
            subscription = Some(Subscription::spawn(
                address,
                ctx.deployment.source.clone(),
                send_tx.clone(),
                ctx.refresh_interval,
            ));
        } else if result.method == "account.refresh" && result.response.success {
            match &subscription {
                Some(sub) => {
                    debug!(client_id, address = sub.address(), "on-demand refresh");
                    sub.refresh().await;
                }
                None => push_event(
                    &send_tx,
                    &RpcEvent::new("error", Some(json!({ "message": "no active watch" }))),
                ),
            }
        }
    }

    info!(
        client_id,
        dropped = connection.drop_count(),
        "client disconnected"
    );
    counter!("ws_disconnections_total").increment(1);
    gauge!("ws_connections_active").decrement(1.0);
    let _ = active_connections.fetch_sub(1, Ordering::Relaxed);
    histogram!("ws_connection_duration_seconds").record(connection.age().as_secs_f64());
    outbound.abort();
    drop(subscription);
}
