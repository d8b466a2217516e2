//! WebSocket transport: per-client connection state, message dispatch,
//! the connection-scoped account subscription, and the session loop.

pub mod connection;
pub mod handler;
pub mod session;
pub mod subscription;

pub use connection::ClientConnection;
pub use session::run_ws_session;
pub use subscription::Subscription;
