//! RPC method handlers and registration.

pub mod account;
pub mod system;
pub mod worm;

use crate::rpc::registry::MethodRegistry;

/// Register the full method surface.
pub fn register_all(registry: &mut MethodRegistry) {
    registry.register("account.info", account::GetAccountInfoHandler);
    registry.register("account.watch", account::WatchAccountHandler);
    registry.register("account.refresh", account::RefreshAccountHandler);
    registry.register("worm.participate", worm::ParticipateHandler);
    registry.register("worm.claim", worm::ClaimHandler);
    registry.register("worm.burn", worm::BurnHandler);
    registry.register("worm.spend", worm::SpendHandler);
    registry.register("worm.recover", worm::RecoverHandler);
    registry.register("system.ping", system::PingHandler);
}
