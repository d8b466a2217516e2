//! RPC error codes and error type.

use serde_json::json;

use worm_snapshot::{OpsError, SnapshotError};

use crate::rpc::types::RpcErrorBody;

// ── Error code constants ────────────────────────────────────────────

/// Invalid or missing parameters.
pub const INVALID_PARAMS: &str = "INVALID_PARAMS";
/// Unexpected internal error.
pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
/// Method not found in the registry.
pub const METHOD_NOT_FOUND: &str = "METHOD_NOT_FOUND";
/// Operation not available in this deployment mode.
pub const UNSUPPORTED_OPERATION: &str = "UNSUPPORTED_OPERATION";
/// A load-bearing ledger read failed.
pub const LEDGER_READ_ERROR: &str = "LEDGER_READ_ERROR";
/// A ledger write failed.
pub const LEDGER_WRITE_ERROR: &str = "LEDGER_WRITE_ERROR";
/// Allowance too small and could not be raised.
pub const INSUFFICIENT_ALLOWANCE: &str = "INSUFFICIENT_ALLOWANCE";
/// External tool invocation failed.
pub const EXEC_ERROR: &str = "EXEC_ERROR";

/// RPC error type returned by handlers.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// Required parameter missing or wrong type.
    #[error("{message}")]
    InvalidParams {
        /// Description of what is wrong.
        message: String,
    },

    /// Internal server error.
    #[error("{message}")]
    Internal {
        /// Description.
        message: String,
    },

    /// Domain-specific error with arbitrary code.
    #[error("{message}")]
    Custom {
        /// Machine-readable code.
        code: String,
        /// Human-readable message.
        message: String,
        /// Optional structured details.
        details: Option<serde_json::Value>,
    },
}

impl RpcError {
    /// The machine-readable error code.
    pub fn code(&self) -> &str {
        match self {
            Self::InvalidParams { .. } => INVALID_PARAMS,
            Self::Internal { .. } => INTERNAL_ERROR,
            Self::Custom { code, .. } => code,
        }
    }

    /// Convert into the wire-format error body.
    pub fn to_error_body(&self) -> RpcErrorBody {
        let details = match self {
            Self::Custom { details, .. } => details.clone(),
            _ => None,
        };
        RpcErrorBody {
            code: self.code().to_owned(),
            message: self.to_string(),
            details,
        }
    }

    /// The canonical error for tool-only operations in the ledger deployment.
    pub fn unsupported(method: &str) -> Self {
        Self::Custom {
            code: UNSUPPORTED_OPERATION.to_owned(),
            message: format!("'{method}' is unsupported in this deployment mode"),
            details: None,
        }
    }
}

impl From<SnapshotError> for RpcError {
    fn from(err: SnapshotError) -> Self {
        match err {
            SnapshotError::Ledger(e) => Self::Custom {
                code: LEDGER_READ_ERROR.to_owned(),
                message: e.to_string(),
                details: None,
            },
            SnapshotError::Exec(e) => Self::Custom {
                code: EXEC_ERROR.to_owned(),
                message: e.message.clone(),
                details: Some(json!({ "stderr": e.stderr })),
            },
        }
    }
}

impl From<OpsError> for RpcError {
    fn from(err: OpsError) -> Self {
        match err {
            OpsError::InsufficientAllowance { needed, current } => Self::Custom {
                code: INSUFFICIENT_ALLOWANCE.to_owned(),
                message: format!("insufficient allowance: needed {needed}, current {current}"),
                details: Some(json!({ "needed": needed, "current": current })),
            },
            OpsError::Ledger(e) => Self::Custom {
                code: LEDGER_WRITE_ERROR.to_owned(),
                message: e.to_string(),
                details: None,
            },
            OpsError::Exec(e) => Self::Custom {
                code: EXEC_ERROR.to_owned(),
                message: e.message.clone(),
                details: Some(json!({ "stderr": e.stderr })),
            },
            OpsError::Amount(e) => Self::InvalidParams {
                message: e.to_string(),
            },
        }
    }
}
