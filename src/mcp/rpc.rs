//! JSON-RPC envelope formatting utilities
//!
//! Provides standardized mapping of internal AppErrors to valid JSON-RPC
//! payloads. The correlation id is echoed verbatim, null included.

use serde_json::{json, Value};

use crate::errors::AppError;

pub fn is_json_rpc_error(value: &Value) -> bool {
    value.get("error").is_some()
}

pub fn json_rpc_result(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

pub fn json_rpc_error(id: Value, code: i64, message: &str) -> Value {
    json_rpc_error_with_data(id, code, message, None)
}

pub fn json_rpc_error_with_data(id: Value, code: i64, message: &str, data: Option<Value>) -> Value {
    let mut error = json!({
        "code": code,
        "message": message
    });
    if let (Some(data), Some(object)) = (data, error.as_object_mut()) {
        object.insert("data".to_string(), data);
    }

    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": error
    })
}

pub fn app_error_to_json_rpc(id: Value, err: AppError) -> Value {
    match err {
        AppError::BadRequest { code, message } => json_rpc_error_with_data(
            id,
            -32602,
            "Invalid params",
            Some(json!({
                "code": code,
                "message": message
            })),
        ),
        AppError::NotFound { code, message } => json_rpc_error_with_data(
            id,
            -32602,
            &message,
            Some(json!({
                "code": code
            })),
        ),
        AppError::Internal { .. } => json_rpc_error(id, -32603, "Internal error"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_echoes_null_id() {
        let response = json_rpc_result(Value::Null, json!({"ok": true}));
        assert!(response["id"].is_null());
        assert_eq!(response["jsonrpc"], "2.0");
        assert_eq!(response["result"]["ok"], true);
    }

    #[test]
    fn error_carries_code_and_message() {
        let response = json_rpc_error(json!(7), -32601, "Method not found");
        assert_eq!(response["id"], 7);
        assert_eq!(response["error"]["code"], -32601);
        assert_eq!(response["error"]["message"], "Method not found");
        assert!(response["error"].get("data").is_none());
    }

    #[test]
    fn bad_request_maps_to_invalid_params() {
        let response = app_error_to_json_rpc(
            json!("req-1"),
            AppError::bad_request("invalid_status", "status must be one of the lexicon"),
        );
        assert_eq!(response["id"], "req-1");
        assert_eq!(response["error"]["code"], -32602);
        assert_eq!(response["error"]["data"]["code"], "invalid_status");
    }

    #[test]
    fn not_found_keeps_descriptive_message() {
        let response = app_error_to_json_rpc(
            Value::Null,
            AppError::not_found("resource_not_found", "facility 0123 not found"),
        );
        assert_eq!(response["error"]["code"], -32602);
        assert_eq!(response["error"]["message"], "facility 0123 not found");
    }

    #[test]
    fn internal_maps_to_internal_error() {
        let response = app_error_to_json_rpc(Value::Null, AppError::internal("lock poisoned"));
        assert_eq!(response["error"]["code"], -32603);
        assert_eq!(response["error"]["message"], "Internal error");
    }
}
