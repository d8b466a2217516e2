//! Settings loading with deep merge and environment variable overrides.
//!
//! Loading flow:
//! 1. Start with compiled [`WormgateSettings::default()`]
//! 2. If `~/.wormgate/settings.json` exists, deep-merge user values over defaults
//! 3. Apply environment variable overrides (highest priority)
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::{DeploymentMode, WormgateSettings};

/// Resolve the path to the settings file (`~/.wormgate/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".wormgate").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<WormgateSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<WormgateSettings> {
    let defaults = serde_json::to_value(WormgateSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: WormgateSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Recursive deep merge of two JSON values.
///
/// - Objects are merged recursively (source overrides target per-key)
/// - Arrays and primitives are replaced entirely by source
/// - Null values in source are skipped (preserving target)
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply environment variable overrides to loaded settings.
///
/// Each env var has strict parsing rules:
/// - Integers must be valid and within the specified range
/// - Invalid values are silently ignored (fall back to file/default)
pub fn apply_env_overrides(settings: &mut WormgateSettings) {
    if let Some(v) = read_env_string("WORMGATE_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read_env_u16("WORMGATE_PORT", 1, 65535) {
        settings.server.port = v;
    }
    if let Some(v) = read_env_u64("WORMGATE_HEARTBEAT_INTERVAL", 1000, 600_000) {
        settings.server.heartbeat_interval_ms = v;
    }
    if let Some(v) = read_env_u64("WORMGATE_REFRESH_INTERVAL", 1000, 3_600_000) {
        settings.server.refresh_interval_ms = v;
    }
    if let Some(v) = read_env_string("WORMGATE_MODE") {
        if let Some(mode) = parse_mode(&v) {
            settings.mode = mode;
        } else {
            tracing::warn!(value = %v, "invalid WORMGATE_MODE, ignoring");
        }
    }
    if let Some(v) = read_env_string("WORMGATE_RPC_URL") {
        settings.ledger.rpc_url = v;
    }
    if let Some(v) = read_env_string("WORMGATE_NETWORK") {
        settings.ledger.network = v;
    }
    if let Some(v) = read_env_string("WORMGATE_ACCOUNT") {
        settings.ledger.account = v;
    }
    if let Some(v) = read_env_u64("WORMGATE_EPOCH_WINDOW", 1, 1000) {
        settings.ledger.epoch_window = v;
    }
    if let Some(v) = read_env_string("WORMGATE_SCRIPTS_DIR") {
        settings.tool.scripts_dir = v;
    }
    if let Some(v) = read_env_u64("WORMGATE_TOOL_TIMEOUT_MS", 1000, 3_600_000) {
        settings.tool.timeout_ms = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a deployment mode name (case-insensitive).
pub fn parse_mode(val: &str) -> Option<DeploymentMode> {
    match val.to_lowercase().as_str() {
        "ledger" => Some(DeploymentMode::Ledger),
        "tool" => Some(DeploymentMode::Tool),
        _ => None,
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Env var readers (thin wrappers) ─────────────────────────────────────────

fn read_env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_u16(name: &str, min: u16, max: u16) -> Option<u16> {
    let val = std::env::var(name).ok()?;
    let result = parse_u16_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u16 env var, ignoring");
    }
    result
}

fn read_env_u64(name: &str, min: u64, max: u64) -> Option<u64> {
    let val = std::env::var(name).ok()?;
    let result = parse_u64_range(&val, min, max);
    if result.is_none() {
        tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
    }
    result
}
