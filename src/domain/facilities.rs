//! Facility tools exposed via the Model Context Protocol

use serde::Deserialize;
use serde_json::json;

use crate::domain::parse_args;
use crate::domain::utils::{
    is_terminal_status, normalize_entity_id, normalize_facility_kind, normalize_required_text,
};
use crate::errors::AppError;
use crate::mcp::tools::{handler, ToolContext, ToolDef};
use crate::mcp::types::{CallToolResult, Tool};
use crate::store::NewFacility;

#[derive(Debug, Deserialize)]
struct RegisterFacilityParams {
    name: String,
    kind: String,
    region: String,
    #[serde(default)]
    capacity_teu: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ListFacilitiesParams {
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    region: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DecommissionFacilityParams {
    facility_id: String,
}

pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef {
            tool: Tool {
                name: "register_facility".to_string(),
                description: "Register a facility (warehouse, port, or plant) in the network"
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "required": ["name", "kind", "region"],
                    "properties": {
                        "name": { "type": "string", "description": "Display name" },
                        "kind": { "type": "string", "description": "One of: warehouse, port, plant" },
                        "region": { "type": "string", "description": "Region code, e.g. eu-north" },
                        "capacity_teu": { "type": "integer", "description": "Capacity in TEU" }
                    }
                }),
            },
            handler: handler(register_facility),
        },
        ToolDef {
            tool: Tool {
                name: "list_facilities".to_string(),
                description: "List facilities, optionally filtered by kind or region".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "kind": { "type": "string", "description": "Filter by facility kind" },
                        "region": { "type": "string", "description": "Filter by region code" }
                    }
                }),
            },
            handler: handler(list_facilities),
        },
        ToolDef {
            tool: Tool {
                name: "decommission_facility".to_string(),
                description: "Remove a facility that has no shipments underway".to_string(),
                input_schema: json!({
                    "type": "object",
                    "required": ["facility_id"],
                    "properties": {
                        "facility_id": { "type": "string", "description": "24-hex facility id" }
                    }
                }),
            },
            handler: handler(decommission_facility),
        },
    ]
}

async fn register_facility(
    ctx: ToolContext,
    args: serde_json::Value,
) -> Result<CallToolResult, AppError> {
    let params: RegisterFacilityParams = match parse_args(args) {
        Ok(params) => params,
        Err(reply) => return Ok(reply),
    };

    let name = match normalize_required_text(&params.name, "invalid_name") {
        Ok(name) => name,
        Err(err) => return Ok(CallToolResult::error(err.to_string())),
    };
    let kind = match normalize_facility_kind(&params.kind) {
        Ok(kind) => kind,
        Err(err) => return Ok(CallToolResult::error(err.to_string())),
    };
    let region = match normalize_required_text(&params.region, "invalid_region") {
        Ok(region) => region,
        Err(err) => return Ok(CallToolResult::error(err.to_string())),
    };

    let facility = ctx
        .store
        .create_facility(NewFacility {
            name,
            kind,
            region,
            capacity_teu: params.capacity_teu.unwrap_or(0),
        })
        .await?;

    Ok(CallToolResult::json(&json!({ "facility": facility })))
}

async fn list_facilities(
    ctx: ToolContext,
    args: serde_json::Value,
) -> Result<CallToolResult, AppError> {
    let params: ListFacilitiesParams = match parse_args(args) {
        Ok(params) => params,
        Err(reply) => return Ok(reply),
    };

    let mut facilities = ctx.store.list_facilities().await?;
    let total = facilities.len();

    if let Some(kind) = params.kind.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        facilities.retain(|facility| facility.kind.eq_ignore_ascii_case(kind));
    }
    if let Some(region) = params
        .region
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
    {
        facilities.retain(|facility| facility.region.eq_ignore_ascii_case(region));
    }

    Ok(CallToolResult::json(&json!({
        "facilities": facilities,
        "returned": facilities.len(),
        "total": total
    })))
}

async fn decommission_facility(
    ctx: ToolContext,
    args: serde_json::Value,
) -> Result<CallToolResult, AppError> {
    let params: DecommissionFacilityParams = match parse_args(args) {
        Ok(params) => params,
        Err(reply) => return Ok(reply),
    };

    let facility_id = match normalize_entity_id(&params.facility_id, "invalid_facility_id") {
        Ok(id) => id,
        Err(err) => return Ok(CallToolResult::error(err.to_string())),
    };

    let shipments = ctx.store.list_shipments().await?;
    let underway = shipments
        .iter()
        .filter(|shipment| {
            !is_terminal_status(&shipment.status)
                && (shipment.origin_id == facility_id || shipment.destination_id == facility_id)
        })
        .count();
    if underway > 0 {
        return Ok(CallToolResult::error(format!(
            "facility {facility_id} still has {underway} shipment(s) underway"
        )));
    }

    if !ctx.store.delete_facility(&facility_id).await? {
        return Ok(CallToolResult::error(format!(
            "facility {facility_id} not found"
        )));
    }

    Ok(CallToolResult::text(format!(
        "Decommissioned facility {facility_id}"
    )))
}
