//! Account handlers: info, watch, refresh.
//!
//! `account.watch` and `account.refresh` only validate here; the
//! session loop owns the subscription task and acts on their results.

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::instrument;

use crate::rpc::context::RpcContext;
use crate::rpc::errors::RpcError;
use crate::rpc::registry::MethodHandler;
use crate::rpc::validation::{require_string_param, validate_address};

/// One-shot snapshot for an address.
pub struct GetAccountInfoHandler;

#[async_trait]
impl MethodHandler for GetAccountInfoHandler {
    #[instrument(skip(self, ctx), fields(method = "account.info"))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let address = require_string_param(params.as_ref(), "address")?;
        validate_address(&address)?;

        let snapshot = ctx.deployment.source.snapshot(&address).await?;
        serde_json::to_value(snapshot).map_err(|e| RpcError::Internal {
            message: e.to_string(),
        })
    }
}

/// Bind the connection's periodic account watch.
pub struct WatchAccountHandler;

#[async_trait]
impl MethodHandler for WatchAccountHandler {
    #[instrument(skip(self, _ctx), fields(method = "account.watch"))]
    async fn handle(&self, params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        let address = require_string_param(params.as_ref(), "address")?;
        validate_address(&address)?;
        Ok(json!({ "address": address }))
    }
}

/// Request one immediate push on the connection's watch.
pub struct RefreshAccountHandler;

#[async_trait]
impl MethodHandler for RefreshAccountHandler {
    #[instrument(skip(self, _ctx), fields(method = "account.refresh"))]
    async fn handle(&self, _params: Option<Value>, _ctx: &RpcContext) -> Result<Value, RpcError> {
        Ok(json!({ "requested": true }))
    }
}
