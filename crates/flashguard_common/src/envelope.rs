//! Uniform response envelope: `{ ok, message, payload }`.

use crate::error::FlashGuardError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse<T> {
    pub ok: bool,
    pub message: String,
    pub payload: T,
}

impl<T> ToolResponse<T> {
    pub fn new(ok: bool, payload: T, message: impl Into<String>) -> Self {
        Self {
            ok,
            message: message.into(),
            payload,
        }
    }

    pub fn success(payload: T, message: impl Into<String>) -> Self {
        Self::new(true, payload, message)
    }
}

impl<T: Serialize> ToolResponse<T> {
    /// Erase the payload type for name-based routing
    pub fn into_value(self) -> ToolResponse<Value> {
        match serde_json::to_value(&self.payload) {
            Ok(payload) => ToolResponse {
                ok: self.ok,
                message: self.message,
                payload,
            },
            Err(e) => ToolResponse::<Value>::failure(&FlashGuardError::Json(e)),
        }
    }

    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            ToolResponse::<Value>::failure(&FlashGuardError::Json(e)).to_json_string_unchecked()
        })
    }
}

impl ToolResponse<Value> {
    /// Error envelope; payload carries the stable error kind and code
    pub fn failure(err: &FlashGuardError) -> Self {
        Self {
            ok: false,
            message: err.to_string(),
            payload: json!({
                "error": err.kind(),
                "error_code": err.code(),
            }),
        }
    }

    fn to_json_string_unchecked(&self) -> String {
        // Value payloads always serialize
        serde_json::to_string(self).unwrap_or_default()
    }
}
