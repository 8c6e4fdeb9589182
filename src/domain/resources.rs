//! Resource providers: static network feeds plus per-entity resources
//!
//! Static URIs are fixed and computed live from the store at read time,
//! never cached. Dynamic descriptors are derived from whatever entities
//! exist when `resources/list` runs; there is no snapshot isolation between
//! a listing and a later read.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};

use crate::domain::utils::{format_utc, is_terminal_status, RECENT_SHIPMENTS_LIMIT};
use crate::errors::AppError;
use crate::mcp::types::{ReadResourceResult, Resource, ResourceContents};
use crate::store::{is_entity_id, FreightStore};

pub const NETWORK_OVERVIEW_URI: &str = "resource://network/overview";
pub const RECENT_SHIPMENTS_URI: &str = "resource://shipments/recent";

const JSON_MIME: &str = "application/json";

pub async fn list_resources(store: &Arc<dyn FreightStore>) -> Result<Vec<Resource>, AppError> {
    let (facilities, shipments) = tokio::join!(store.list_facilities(), store.list_shipments());
    let facilities = facilities?;
    let shipments = shipments?;

    let mut resources = vec![
        Resource {
            uri: NETWORK_OVERVIEW_URI.to_string(),
            name: "Network Overview".to_string(),
            description: "Counts and aggregates across the whole freight network".to_string(),
            mime_type: JSON_MIME.to_string(),
        },
        Resource {
            uri: RECENT_SHIPMENTS_URI.to_string(),
            name: "Recent Shipments".to_string(),
            description: format!("The {RECENT_SHIPMENTS_LIMIT} most recently booked shipments"),
            mime_type: JSON_MIME.to_string(),
        },
    ];

    resources.extend(facilities.iter().map(|facility| Resource {
        uri: format!("facility://{}", facility.id),
        name: facility.name.clone(),
        description: format!("{} facility in {}", facility.kind, facility.region),
        mime_type: JSON_MIME.to_string(),
    }));
    resources.extend(shipments.iter().map(|shipment| Resource {
        uri: format!("shipment://{}", shipment.id),
        name: format!("Shipment {}", shipment.reference),
        description: format!("{} shipment via {}", shipment.status, shipment.carrier),
        mime_type: JSON_MIME.to_string(),
    }));

    Ok(resources)
}

pub async fn read_resource(
    store: &Arc<dyn FreightStore>,
    uri: &str,
) -> Result<ReadResourceResult, AppError> {
    match uri {
        NETWORK_OVERVIEW_URI => read_network_overview(store).await,
        RECENT_SHIPMENTS_URI => read_recent_shipments(store).await,
        _ => read_entity_resource(store, uri).await,
    }
}

fn resource_json(uri: &str, payload: Value) -> ReadResourceResult {
    ReadResourceResult {
        contents: vec![ResourceContents {
            uri: uri.to_string(),
            mime_type: JSON_MIME.to_string(),
            text: payload.to_string(),
        }],
    }
}

async fn read_network_overview(
    store: &Arc<dyn FreightStore>,
) -> Result<ReadResourceResult, AppError> {
    let (facilities, shipments, contracts) = tokio::join!(
        store.list_facilities(),
        store.list_shipments(),
        store.list_contracts()
    );
    let facilities = facilities?;
    let shipments = shipments?;
    let contracts = contracts?;

    let mut shipments_by_status: BTreeMap<&str, usize> = BTreeMap::new();
    for shipment in &shipments {
        *shipments_by_status.entry(shipment.status.as_str()).or_default() += 1;
    }
    let value_in_motion: f64 = shipments
        .iter()
        .filter(|shipment| !is_terminal_status(&shipment.status))
        .map(|shipment| shipment.declared_value_usd)
        .sum();
    let active_contract_value: f64 = contracts
        .iter()
        .filter(|contract| contract.status == "active")
        .map(|contract| contract.annual_value_usd)
        .sum();

    let payload = json!({
        "facilities": { "total": facilities.len() },
        "shipments": {
            "total": shipments.len(),
            "by_status": shipments_by_status,
            "declared_value_in_motion_usd": value_in_motion
        },
        "contracts": {
            "total": contracts.len(),
            "active_annual_value_usd": active_contract_value
        },
        "generated_at_utc": format_utc(Utc::now())
    });
    Ok(resource_json(NETWORK_OVERVIEW_URI, payload))
}

async fn read_recent_shipments(
    store: &Arc<dyn FreightStore>,
) -> Result<ReadResourceResult, AppError> {
    let shipments = store.list_shipments().await?;
    // List order is creation order; the feed wants newest first.
    let recent: Vec<_> = shipments.iter().rev().take(RECENT_SHIPMENTS_LIMIT).collect();

    let payload = json!({
        "shipments": recent,
        "total": shipments.len(),
        "generated_at_utc": format_utc(Utc::now())
    });
    Ok(resource_json(RECENT_SHIPMENTS_URI, payload))
}

fn parse_entity_uri(uri: &str) -> Option<(&str, &str)> {
    let (kind, id) = uri.split_once("://")?;
    if !is_entity_id(id) {
        return None;
    }
    matches!(kind, "facility" | "shipment").then_some((kind, id))
}

async fn read_entity_resource(
    store: &Arc<dyn FreightStore>,
    uri: &str,
) -> Result<ReadResourceResult, AppError> {
    let Some((kind, id)) = parse_entity_uri(uri) else {
        return Err(AppError::bad_request(
            "unknown_resource",
            format!("unknown resource uri: {uri}"),
        ));
    };

    match kind {
        "facility" => {
            let (facility, shipments, contracts) = tokio::join!(
                store.get_facility(id),
                store.list_shipments(),
                store.list_contracts()
            );
            let Some(facility) = facility? else {
                return Err(AppError::not_found(
                    "resource_not_found",
                    format!("facility {id} not found"),
                ));
            };
            let shipments = shipments?;

            let inbound = shipments
                .iter()
                .filter(|shipment| shipment.destination_id == id)
                .count();
            let outbound = shipments
                .iter()
                .filter(|shipment| shipment.origin_id == id)
                .count();
            let value_in_motion: f64 = shipments
                .iter()
                .filter(|shipment| {
                    !is_terminal_status(&shipment.status)
                        && (shipment.origin_id == id || shipment.destination_id == id)
                })
                .map(|shipment| shipment.declared_value_usd)
                .sum();
            let active_contracts = contracts?
                .iter()
                .filter(|contract| contract.facility_id == id && contract.status == "active")
                .count();

            let payload = json!({
                "facility": facility,
                "metrics": {
                    "inbound_shipments": inbound,
                    "outbound_shipments": outbound,
                    "declared_value_in_motion_usd": value_in_motion,
                    "active_contracts": active_contracts
                }
            });
            Ok(resource_json(uri, payload))
        }
        "shipment" => {
            let Some(shipment) = store.get_shipment(id).await? else {
                return Err(AppError::not_found(
                    "resource_not_found",
                    format!("shipment {id} not found"),
                ));
            };

            let (origin, destination) = tokio::join!(
                store.get_facility(&shipment.origin_id),
                store.get_facility(&shipment.destination_id)
            );
            let payload = json!({
                "shipment": shipment,
                "origin": origin?.map(|facility| facility.name),
                "destination": destination?.map(|facility| facility.name)
            });
            Ok(resource_json(uri, payload))
        }
        _ => Err(AppError::bad_request(
            "unknown_resource",
            format!("unknown resource uri: {uri}"),
        )),
    }
}
