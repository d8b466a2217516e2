//! # worm-server
//!
//! The wormgate network surface: an Axum HTTP + WebSocket server that
//! dispatches RPC requests through a method registry and pushes account
//! updates to watching clients.
//!
//! - **rpc** — wire types, error codes, registry dispatch, and the
//!   method handlers
//! - **websocket** — per-connection session loop, liveness, and the
//!   connection-scoped subscription task
//! - **server / health / metrics / shutdown** — router assembly,
//!   `/health`, Prometheus `/metrics`, graceful shutdown

#![deny(unsafe_code)]

pub mod health;
pub mod metrics;
pub mod rpc;
pub mod server;
pub mod shutdown;
pub mod websocket;

pub use server::{AppState, WormServer};
pub use shutdown::ShutdownCoordinator;
