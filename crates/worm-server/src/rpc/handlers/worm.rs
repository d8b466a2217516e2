//! Value-moving handlers: participate, claim, and the tool-only coin
//! operations (burn, spend, recover).

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::instrument;

use worm_snapshot::CoinOps;

use crate::rpc::context::RpcContext;
use crate::rpc::errors::RpcError;
use crate::rpc::registry::MethodHandler;
use crate::rpc::validation::{
    optional_string_param, require_amount_param, require_count_param, require_string_param,
    require_u64_param,
};

fn coin_ops<'a>(ctx: &'a RpcContext, method: &str) -> Result<&'a Arc<dyn CoinOps>, RpcError> {
    ctx.deployment
        .coins
        .as_ref()
        .ok_or_else(|| RpcError::unsupported(method))
}

/// Commit to upcoming epochs, raising the allowance first if needed.
pub struct ParticipateHandler;

#[async_trait]
impl MethodHandler for ParticipateHandler {
    #[instrument(skip(self, ctx), fields(method = "worm.participate"))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let amount_per_epoch = require_amount_param(params.as_ref(), "amountPerEpoch")?;
        let num_epochs = require_count_param(params.as_ref(), "numEpochs")?;

        let output = ctx
            .deployment
            .participation
            .participate(amount_per_epoch, num_epochs)
            .await?;
        Ok(json!({ "output": output }))
    }
}

/// Claim rewards over a completed epoch range.
pub struct ClaimHandler;

#[async_trait]
impl MethodHandler for ClaimHandler {
    #[instrument(skip(self, ctx), fields(method = "worm.claim"))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let start_epoch = require_u64_param(params.as_ref(), "startEpoch")?;
        let num_epochs = require_count_param(params.as_ref(), "numEpochs")?;

        let output = ctx
            .deployment
            .participation
            .claim(start_epoch, num_epochs)
            .await?;
        Ok(json!({ "output": output }))
    }
}

/// Burn into a new coin (tool deployments only).
pub struct BurnHandler;

#[async_trait]
impl MethodHandler for BurnHandler {
    #[instrument(skip(self, ctx), fields(method = "worm.burn"))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let amount = require_string_param(params.as_ref(), "amount")?;
        let spend = require_string_param(params.as_ref(), "spend")?;
        let fee = require_string_param(params.as_ref(), "fee")?;

        let ops = coin_ops(ctx, "worm.burn")?;
        let output = ops.burn(&amount, &spend, &fee).await?;
        Ok(json!({ "output": output }))
    }
}

/// Spend from a coin (tool deployments only).
pub struct SpendHandler;

#[async_trait]
impl MethodHandler for SpendHandler {
    #[instrument(skip(self, ctx), fields(method = "worm.spend"))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let coin_id = require_string_param(params.as_ref(), "coinId")?;
        let amount = require_string_param(params.as_ref(), "amount")?;
        let fee = require_string_param(params.as_ref(), "fee")?;
        let receiver = optional_string_param(params.as_ref(), "receiver");

        let ops = coin_ops(ctx, "worm.spend")?;
        let output = ops
            .spend(&coin_id, &amount, &fee, receiver.as_deref())
            .await?;
        Ok(json!({ "output": output }))
    }
}

/// Recover a failed burn (tool deployments only).
pub struct RecoverHandler;

#[async_trait]
impl MethodHandler for RecoverHandler {
    #[instrument(skip(self, ctx), fields(method = "worm.recover"))]
    async fn handle(&self, params: Option<Value>, ctx: &RpcContext) -> Result<Value, RpcError> {
        let method = require_string_param(params.as_ref(), "method")?;
        let id_or_key = require_string_param(params.as_ref(), "idOrKey")?;
        let spend = optional_string_param(params.as_ref(), "spend");
        let fee = optional_string_param(params.as_ref(), "fee");

        let ops = coin_ops(ctx, "worm.recover")?;
        let output = ops
            .recover(&method, &id_or_key, spend.as_deref(), fee.as_deref())
            .await?;
        Ok(json!({ "output": output }))
    }
}
