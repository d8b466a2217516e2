//! System handlers.

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::rpc::context::RpcContext;
use crate::rpc::errors::RpcError;
use crate::rpc::registry::MethodHandler;

/// Liveness probe over the RPC channel.
pub struct PingHandler;

#[async_trait]
impl MethodHandler for PingHandler {
    async fn handle(&self, _params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        Ok(json!({
            "status": "ok",
            "network": ctx.deployment.network,
            "uptimeSecs": ctx.server_start_time.elapsed().as_secs(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::handlers::test_helpers::make_test_context;

    #[tokio::test]
    async fn ping_reports_status_and_network() {
        let ctx = make_test_context();
        let result = PingHandler.handle(None, &ctx).await.unwrap();
        assert_eq!(result["status"], "ok");
        assert_eq!(result["network"], "sepolia");
        assert!(result["uptimeSecs"].is_number());
    }
}
