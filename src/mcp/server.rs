//! The central protocol engine
//!
//! Validates inbound envelopes, routes every method name somewhere (the
//! known table or Method Not Found), and keeps the two failure channels
//! apart: protocol errors become JSON error objects, domain errors ride
//! inside structurally successful results.

use serde_json::{json, Value};
use tracing::info;

use crate::domain::resources;
use crate::mcp::rpc::{app_error_to_json_rpc, is_json_rpc_error, json_rpc_error, json_rpc_result};
use crate::mcp::tools::ToolContext;
use crate::mcp::types::{
    CallToolParams, GetPromptParams, ReadResourceParams, JSONRPC_VERSION, MCP_PROTOCOL_VERSION,
};
use crate::AppState;

pub async fn handle_json_rpc_value(state: &AppState, payload: Value) -> Value {
    let Some(envelope) = payload.as_object() else {
        return json_rpc_error(Value::Null, -32600, "Invalid Request");
    };

    // The correlation id is echoed verbatim; absent means null. Structured
    // ids are not correlation ids.
    let id = envelope.get("id").cloned().unwrap_or(Value::Null);
    if id.is_array() || id.is_object() {
        return json_rpc_error(Value::Null, -32600, "Invalid Request");
    }

    if envelope.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return json_rpc_error(id, -32600, "Invalid Request");
    }
    let Some(method) = envelope.get("method").and_then(Value::as_str) else {
        return json_rpc_error(id, -32600, "Invalid Request");
    };
    if method.trim().is_empty() {
        return json_rpc_error(id, -32600, "Invalid Request");
    }

    let params = envelope.get("params").cloned();
    handle_json_rpc_request(state, id, method, params).await
}

pub async fn handle_json_rpc_request(
    state: &AppState,
    id: Value,
    method: &str,
    params: Option<Value>,
) -> Value {
    let response = match method {
        "initialize" => json_rpc_result(id, initialize_result()),
        "tools/list" => json_rpc_result(id, json!({ "tools": state.tools.list() })),
        "tools/call" => handle_tools_call(state, id, params).await,
        "prompts/list" => json_rpc_result(id, json!({ "prompts": state.prompts.list() })),
        "prompts/get" => handle_prompts_get(state, id, params),
        "resources/list" => handle_resources_list(state, id).await,
        "resources/read" => handle_resources_read(state, id, params).await,
        _ => json_rpc_error(id, -32601, "Method not found"),
    };

    info!(
        method = %method,
        outcome = if is_json_rpc_error(&response) {
            "failure"
        } else {
            "success"
        },
        "rpc dispatched"
    );

    response
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": MCP_PROTOCOL_VERSION,
        "serverInfo": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        },
        "capabilities": {
            "tools": { "listChanged": false },
            "prompts": { "listChanged": false },
            "resources": { "subscribe": false, "listChanged": false },
            "sampling": {}
        }
    })
}

async fn handle_tools_call(state: &AppState, id: Value, params: Option<Value>) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, -32602, "Invalid params");
    };
    let call: CallToolParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, -32602, "Invalid params"),
    };

    let ctx = ToolContext {
        store: state.store.clone(),
        sampling: state.sampling.clone(),
    };
    let result = state.tools.call(ctx, &call.name, call.arguments).await;
    json_rpc_result(
        id,
        serde_json::to_value(result).expect("tool result serialization"),
    )
}

fn handle_prompts_get(state: &AppState, id: Value, params: Option<Value>) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, -32602, "Invalid params");
    };
    let get: GetPromptParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, -32602, "Invalid params"),
    };

    match state
        .prompts
        .generate(&get.name, get.arguments.unwrap_or_default())
    {
        Ok(result) => json_rpc_result(
            id,
            serde_json::to_value(result).expect("prompt result serialization"),
        ),
        Err(err) => app_error_to_json_rpc(id, err),
    }
}

async fn handle_resources_list(state: &AppState, id: Value) -> Value {
    match resources::list_resources(&state.store).await {
        Ok(resources) => json_rpc_result(id, json!({ "resources": resources })),
        Err(err) => app_error_to_json_rpc(id, err),
    }
}

async fn handle_resources_read(state: &AppState, id: Value, params: Option<Value>) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, -32602, "Invalid params");
    };
    let read: ReadResourceParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, -32602, "Invalid params"),
    };

    match resources::read_resource(&state.store, &read.uri).await {
        Ok(result) => json_rpc_result(
            id,
            serde_json::to_value(result).expect("resource result serialization"),
        ),
        Err(err) => app_error_to_json_rpc(id, err),
    }
}
