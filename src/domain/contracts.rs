//! Carrier contract tools exposed via the Model Context Protocol

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::domain::parse_args;
use crate::domain::utils::{format_utc, normalize_entity_id, normalize_required_text, parse_utc};
use crate::errors::AppError;
use crate::mcp::tools::{handler, ToolContext, ToolDef};
use crate::mcp::types::{CallToolResult, Tool};
use crate::store::{Contract, NewContract};

#[derive(Debug, Deserialize)]
struct CreateContractParams {
    carrier: String,
    facility_id: String,
    annual_value_usd: f64,
    expires_utc: String,
}

#[derive(Debug, Deserialize)]
struct ReviewContractParams {
    contract_id: String,
}

#[derive(Debug, Deserialize)]
struct RecommendCarrierParams {
    shipment_id: String,
}

pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef {
            tool: Tool {
                name: "create_contract".to_string(),
                description: "Create a carrier contract anchored to a facility".to_string(),
                input_schema: json!({
                    "type": "object",
                    "required": ["carrier", "facility_id", "annual_value_usd", "expires_utc"],
                    "properties": {
                        "carrier": { "type": "string", "description": "Carrier name" },
                        "facility_id": { "type": "string", "description": "24-hex facility id" },
                        "annual_value_usd": { "type": "number", "description": "Contracted annual value" },
                        "expires_utc": { "type": "string",
                                         "description": "Expiry, RFC3339 UTC ending with Z" }
                    }
                }),
            },
            handler: handler(create_contract),
        },
        ToolDef {
            tool: Tool {
                name: "review_contract".to_string(),
                description: "Narrative review of a contract's renewal posture".to_string(),
                input_schema: json!({
                    "type": "object",
                    "required": ["contract_id"],
                    "properties": {
                        "contract_id": { "type": "string", "description": "24-hex contract id" }
                    }
                }),
            },
            handler: handler(review_contract),
        },
        ToolDef {
            tool: Tool {
                name: "recommend_carrier".to_string(),
                description: "Pick the best carrier for a shipment from active contracts"
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "required": ["shipment_id"],
                    "properties": {
                        "shipment_id": { "type": "string", "description": "24-hex shipment id" }
                    }
                }),
            },
            handler: handler(recommend_carrier),
        },
    ]
}

async fn create_contract(
    ctx: ToolContext,
    args: serde_json::Value,
) -> Result<CallToolResult, AppError> {
    let params: CreateContractParams = match parse_args(args) {
        Ok(params) => params,
        Err(reply) => return Ok(reply),
    };

    let carrier = match normalize_required_text(&params.carrier, "invalid_carrier") {
        Ok(carrier) => carrier,
        Err(err) => return Ok(CallToolResult::error(err.to_string())),
    };
    let facility_id = match normalize_entity_id(&params.facility_id, "invalid_facility_id") {
        Ok(id) => id,
        Err(err) => return Ok(CallToolResult::error(err.to_string())),
    };
    let expires_utc = match parse_utc(&params.expires_utc) {
        Ok(ts) => ts,
        Err(err) => return Ok(CallToolResult::error(err.to_string())),
    };
    if params.annual_value_usd < 0.0 {
        return Ok(CallToolResult::error(
            "annual_value_usd must not be negative",
        ));
    }

    if ctx.store.get_facility(&facility_id).await?.is_none() {
        return Ok(CallToolResult::error(format!(
            "unknown facility {facility_id}"
        )));
    }

    let contract = ctx
        .store
        .create_contract(NewContract {
            carrier,
            facility_id,
            annual_value_usd: params.annual_value_usd,
            expires_utc,
        })
        .await?;

    Ok(CallToolResult::json(&json!({ "contract": contract })))
}

async fn review_contract(
    ctx: ToolContext,
    args: serde_json::Value,
) -> Result<CallToolResult, AppError> {
    let params: ReviewContractParams = match parse_args(args) {
        Ok(params) => params,
        Err(reply) => return Ok(reply),
    };

    let contract_id = match normalize_entity_id(&params.contract_id, "invalid_contract_id") {
        Ok(id) => id,
        Err(err) => return Ok(CallToolResult::error(err.to_string())),
    };
    let Some(contract) = ctx.store.get_contract(&contract_id).await? else {
        return Ok(CallToolResult::error(format!(
            "contract {contract_id} not found"
        )));
    };

    let shipments = ctx.store.list_shipments().await?;
    let carrier_shipments: Vec<_> = shipments
        .iter()
        .filter(|shipment| shipment.carrier == contract.carrier)
        .collect();
    let delayed = carrier_shipments
        .iter()
        .filter(|shipment| shipment.status == "delayed")
        .count();

    let context = json!({
        "contract": contract,
        "carrier_shipments_on_record": carrier_shipments.len(),
        "carrier_shipments_delayed": delayed,
    });

    let review = match ctx
        .sampling
        .analyze(
            "Review this freight contract's renewal posture: obligations, \
             exposure, and whether the carrier's record argues for renewal.",
            &context,
        )
        .await
    {
        Ok(text) => text,
        Err(err) => {
            debug!(contract_id = %contract_id, error = %err, "sampling failed, using summary");
            fallback_review(&contract, carrier_shipments.len(), delayed)
        }
    };

    Ok(CallToolResult::text(review))
}

async fn recommend_carrier(
    ctx: ToolContext,
    args: serde_json::Value,
) -> Result<CallToolResult, AppError> {
    let params: RecommendCarrierParams = match parse_args(args) {
        Ok(params) => params,
        Err(reply) => return Ok(reply),
    };

    let shipment_id = match normalize_entity_id(&params.shipment_id, "invalid_shipment_id") {
        Ok(id) => id,
        Err(err) => return Ok(CallToolResult::error(err.to_string())),
    };

    let (shipment, contracts) = tokio::join!(
        ctx.store.get_shipment(&shipment_id),
        ctx.store.list_contracts()
    );
    let Some(shipment) = shipment? else {
        return Ok(CallToolResult::error(format!(
            "shipment {shipment_id} not found"
        )));
    };

    let mut candidates: Vec<String> = Vec::new();
    for contract in contracts? {
        if contract.status == "active" && !candidates.contains(&contract.carrier) {
            candidates.push(contract.carrier);
        }
    }
    if candidates.is_empty() {
        return Ok(CallToolResult::error(
            "no active contracts to recommend a carrier from",
        ));
    }

    let question = format!(
        "Shipment {} runs {} -> {} with declared value ${:.0}. \
         Which contracted carrier should take it?",
        shipment.reference, shipment.origin_id, shipment.destination_id,
        shipment.declared_value_usd
    );
    let (carrier, method) = match ctx.sampling.choose(&question, &candidates).await {
        Ok(carrier) => (carrier, "model"),
        Err(err) => {
            debug!(shipment_id = %shipment_id, error = %err, "sampling failed, using first candidate");
            (candidates[0].clone(), "fallback")
        }
    };

    Ok(CallToolResult::json(&json!({
        "shipment_id": shipment_id,
        "recommended_carrier": carrier,
        "candidates": candidates,
        "method": method
    })))
}

fn fallback_review(contract: &Contract, on_record: usize, delayed: usize) -> String {
    format!(
        "Contract {} with {}: status {}, annual value ${:.0}, expires {}. \
         {on_record} shipment(s) on record with this carrier, {delayed} delayed. \
         Generated without model assistance.",
        contract.id,
        contract.carrier,
        contract.status,
        contract.annual_value_usd,
        format_utc(contract.expires_utc)
    )
}
