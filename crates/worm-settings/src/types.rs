//! Settings schema: deployment mode, server, ledger, and tool sections.

use serde::{Deserialize, Serialize};

/// Which snapshot source and write path the server wires up at boot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    /// Read and write through the remote ledger RPC endpoint.
    #[default]
    Ledger,
    /// Shell out to the external command-line tool.
    Tool,
}

/// Top-level settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WormgateSettings {
    /// Settings schema version.
    pub version: u32,
    /// Deployment mode.
    pub mode: DeploymentMode,
    /// Server section.
    pub server: ServerSettings,
    /// Ledger section.
    pub ledger: LedgerSettings,
    /// Tool section.
    pub tool: ToolSettings,
}

/// Server network and runtime settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// HTTP/WebSocket port.
    pub port: u16,
    /// WebSocket ping interval in milliseconds.
    pub heartbeat_interval_ms: u64,
    /// Disconnect a client that has not answered a ping for this long.
    pub heartbeat_timeout_ms: u64,
    /// Periodic account-update push interval in milliseconds.
    pub refresh_interval_ms: u64,
    /// Per-request RPC handler timeout in milliseconds.
    pub handler_timeout_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            heartbeat_interval_ms: 30_000,
            heartbeat_timeout_ms: 60_000,
            refresh_interval_ms: 30_000,
            handler_timeout_ms: 60_000,
        }
    }
}

/// Remote ledger settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LedgerSettings {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,
    /// Network name reported in snapshots.
    pub network: String,
    /// Account the gateway submits transactions for.
    pub account: String,
    /// Per-request timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// How many completed epochs behind the head are scanned.
    pub epoch_window: u64,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            network: "sepolia".to_string(),
            account: String::new(),
            request_timeout_ms: 30_000,
            epoch_window: 5,
        }
    }
}

/// External tool settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolSettings {
    /// Directory containing the tool's scripts, also the working directory.
    pub scripts_dir: String,
    /// Per-invocation timeout in milliseconds.
    pub timeout_ms: u64,
    /// Network name reported in snapshots.
    pub network: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            scripts_dir: "scripts".to_string(),
            timeout_ms: 300_000,
            network: "local".to_string(),
        }
    }
}
