//! JSON-RPC message definitions
//!
//! Requests and responses exchanged with registry nodes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FractalError, Result};

pub const JSONRPC_VERSION: &str = "2.0";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const NOT_FOUND: i64 = -32001;
pub const NODE_UNAVAILABLE: i64 = -32002;

/// Frame kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameKind {
    Request = 0x01,
    Response = 0x02,
}

impl FrameKind {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(FrameKind::Request),
            0x02 => Some(FrameKind::Response),
            _ => None,
        }
    }
}

/// Parameters of every registry method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryParams {
    pub key: String,

    /// Encoded record, only present for `set`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub val: Option<String>,
}

/// A JSON-RPC 2.0 request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: RegistryParams,
    pub id: u64,
}

impl RpcRequest {
    pub fn new(id: u64, method: impl Into<String>, key: impl Into<String>, val: Option<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params: RegistryParams {
                key: key.into(),
                val,
            },
            id,
        }
    }
}

/// Error object carried by a failed response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// A JSON-RPC 2.0 response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,

    /// Absent when the request could not be parsed
    #[serde(default)]
    pub id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// Create a successful response
    pub fn success(id: Option<u64>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<u64>, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Turn an error response into `FractalError::Remote`
    pub fn into_result(self) -> Result<Self> {
        match self.error {
            Some(RpcError { code, message }) => Err(FractalError::Remote { code, message }),
            None => Ok(self),
        }
    }

    /// The `result.val` string of a `get` response
    pub fn result_val(&self) -> Result<&str> {
        let result = self
            .result
            .as_ref()
            .and_then(Value::as_object)
            .ok_or_else(|| FractalError::Protocol("response has no result object".to_string()))?;

        result
            .get("val")
            .and_then(Value::as_str)
            .ok_or_else(|| FractalError::Protocol("result has no 'val' string".to_string()))
    }
}
