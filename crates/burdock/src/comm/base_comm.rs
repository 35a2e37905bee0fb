/*
 * base_comm.rs
 *
 * Copyright (C) 2026 Posit Software, PBC. All rights reserved.
 *
 */

use serde::Deserialize;
use serde::Serialize;
use serde_json::json;
use serde_json::Value;
use serde_repr::Deserialize_repr;
use serde_repr::Serialize_repr;

/// JSON-RPC 2.0 error codes
#[derive(Debug, Clone, Copy, Serialize_repr, Deserialize_repr, PartialEq)]
#[repr(i64)]
pub enum JsonRpcErrorCode {
    ParseError = -32700,
    InvalidRequest = -32600,
    MethodNotFound = -32601,
    InvalidParams = -32602,
    InternalError = -32603,
    ServerErrorStart = -32099,
    ServerErrorEnd = -32000,
}

/// The `error` member of a failed reply. Kernels are free to use codes
/// outside of [`JsonRpcErrorCode`], so the code is kept as a plain integer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,

    #[serde(default)]
    pub data: Value,
}

/// Outcome of an RPC as carried in the `data` field of the reply `comm_msg`.
#[derive(Debug, Clone, PartialEq)]
pub enum JsonRpcReply {
    Result(Value),
    Error(JsonRpcError),
}

impl JsonRpcReply {
    /// Splits a reply envelope into its result or error. Returns `None` when
    /// the value is neither `{"result": ..}` nor a well-formed
    /// `{"error": {"code": .., "message": ..}}`.
    pub fn parse(data: &Value) -> Option<Self> {
        if let Some(error) = data.get("error") {
            return serde_json::from_value(error.clone())
                .ok()
                .map(JsonRpcReply::Error);
        }
        data.get("result").cloned().map(JsonRpcReply::Result)
    }
}

/**
 * Create a JSON-RPC 2.0 error response
 *
 * - `code` - The error code
 * - `message` - The error message
 *
 * Returns a JSON object representing the error.
 */
pub fn json_rpc_error(code: JsonRpcErrorCode, message: String) -> Value {
    json! ({
        "error": {
            "code": code,
            "message": message,
            "data": null,
        }
    })
}

/// Create a JSON-RPC 2.0 success response wrapping `result`.
pub fn json_rpc_result(result: Value) -> Value {
    json!({ "result": result })
}
