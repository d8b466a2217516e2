//! Input validation helpers for RPC parameters.
//!
//! Everything here runs before any ledger or tool I/O; a rejected
//! request has no side effects.

use serde_json::Value;

use worm_core::Amount;

use crate::rpc::errors::RpcError;

/// Maximum general string parameter length (8 KB).
pub const MAX_PARAM_LENGTH: usize = 8_192;

/// Extract a required parameter by key.
pub fn require_param<'a>(params: Option<&'a Value>, key: &str) -> Result<&'a Value, RpcError> {
    params
        .and_then(|p| p.get(key))
        .ok_or_else(|| RpcError::InvalidParams {
            message: format!("Missing required parameter: {key}"),
        })
}

/// Extract a required string parameter.
pub fn require_string_param(params: Option<&Value>, key: &str) -> Result<String, RpcError> {
    let value = require_param(params, key)?
        .as_str()
        .ok_or_else(|| RpcError::InvalidParams {
            message: format!("Parameter '{key}' must be a string"),
        })?;
    if value.is_empty() {
        return Err(RpcError::InvalidParams {
            message: format!("Parameter '{key}' must not be empty"),
        });
    }
    if value.len() > MAX_PARAM_LENGTH {
        return Err(RpcError::InvalidParams {
            message: format!(
                "Parameter '{key}' exceeds maximum length ({} > {MAX_PARAM_LENGTH})",
                value.len()
            ),
        });
    }
    Ok(value.to_owned())
}

/// Extract an optional string parameter.
pub fn optional_string_param(params: Option<&Value>, key: &str) -> Option<String> {
    params
        .and_then(|p| p.get(key))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Extract a required unsigned integer parameter.
pub fn require_u64_param(params: Option<&Value>, key: &str) -> Result<u64, RpcError> {
    require_param(params, key)?
        .as_u64()
        .ok_or_else(|| RpcError::InvalidParams {
            message: format!("Parameter '{key}' must be a non-negative integer"),
        })
}

/// Extract a required positive epoch count.
pub fn require_count_param(params: Option<&Value>, key: &str) -> Result<u64, RpcError> {
    let n = require_u64_param(params, key)?;
    if n == 0 {
        return Err(RpcError::InvalidParams {
            message: format!("Parameter '{key}' must be at least 1"),
        });
    }
    Ok(n)
}

/// Extract a required decimal amount parameter.
pub fn require_amount_param(params: Option<&Value>, key: &str) -> Result<Amount, RpcError> {
    let raw = require_string_param(params, key)?;
    raw.parse().map_err(|e| RpcError::InvalidParams {
        message: format!("Parameter '{key}': {e}"),
    })
}

/// Validate an account address: `0x` followed by 40 hex digits.
pub fn validate_address(address: &str) -> Result<(), RpcError> {
    let hex = address
        .strip_prefix("0x")
        .ok_or_else(|| RpcError::InvalidParams {
            message: "Parameter 'address' must start with 0x".into(),
        })?;
    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(RpcError::InvalidParams {
            message: "Parameter 'address' must be 40 hex digits".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const GOOD_ADDR: &str = "0x1111111111111111111111111111111111111111";

    #[test]
    fn require_param_present_and_missing() {
        let params = Some(json!({"name": "alice"}));
        assert_eq!(require_param(params.as_ref(), "name").unwrap(), "alice");
        let err = require_param(params.as_ref(), "other").unwrap_err();
        assert_eq!(err.code(), "INVALID_PARAMS");
        assert!(require_param(None, "name").is_err());
    }

    #[test]
    fn string_param_rejects_wrong_type_and_empty() {
        let params = Some(json!({"a": 1, "b": ""}));
        assert!(require_string_param(params.as_ref(), "a").is_err());
        assert!(require_string_param(params.as_ref(), "b").is_err());
    }

    #[test]
    fn string_param_rejects_oversized() {
        let params = Some(json!({"s": "x".repeat(MAX_PARAM_LENGTH + 1)}));
        let err = require_string_param(params.as_ref(), "s").unwrap_err();
        assert!(err.to_string().contains("maximum length"));
    }

    #[test]
    fn count_param_rejects_zero_and_negatives() {
        let params = Some(json!({"n": 0, "m": -3, "ok": 2}));
        assert!(require_count_param(params.as_ref(), "n").is_err());
        assert!(require_count_param(params.as_ref(), "m").is_err());
        assert_eq!(require_count_param(params.as_ref(), "ok").unwrap(), 2);
    }

    #[test]
    fn amount_param_parses_decimal_strings() {
        let params = Some(json!({"amount": "1.5", "bad": "1e9"}));
        let amount = require_amount_param(params.as_ref(), "amount").unwrap();
        assert_eq!(amount.to_string(), "1.5");
        let err = require_amount_param(params.as_ref(), "bad").unwrap_err();
        assert_eq!(err.code(), "INVALID_PARAMS");
    }

    #[test]
    fn address_validation() {
        assert!(validate_address(GOOD_ADDR).is_ok());
        assert!(validate_address("1111111111111111111111111111111111111111").is_err());
        assert!(validate_address("0x1234").is_err());
        assert!(validate_address("0xzz11111111111111111111111111111111111111").is_err());
    }

    #[test]
    fn optional_string_param_behavior() {
        let params = Some(json!({"receiver": "0xdest", "empty": ""}));
        assert_eq!(
            optional_string_param(params.as_ref(), "receiver").as_deref(),
            Some("0xdest")
        );
        assert!(optional_string_param(params.as_ref(), "empty").is_none());
        assert!(optional_string_param(params.as_ref(), "missing").is_none());
    }
}
