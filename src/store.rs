//! Entity store collaborator for freight-network records
//!
//! Persistence internals are outside the protocol core; everything upstream
//! consumes this through the `FreightStore` trait. Records are keyed by
//! 24-character lowercase hex identifiers minted here.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;

pub const ENTITY_ID_LEN: usize = 24;

/// Mint a fresh 24-hex entity id.
pub fn new_entity_id() -> String {
    hex::encode(&Uuid::new_v4().as_bytes()[..ENTITY_ID_LEN / 2])
}

pub fn is_entity_id(value: &str) -> bool {
    value.len() == ENTITY_ID_LEN
        && value
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Facility {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub region: String,
    pub capacity_teu: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Shipment {
    pub id: String,
    pub reference: String,
    pub origin_id: String,
    pub destination_id: String,
    pub carrier: String,
    pub status: String,
    pub declared_value_usd: f64,
    pub weight_kg: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Contract {
    pub id: String,
    pub carrier: String,
    pub facility_id: String,
    pub status: String,
    pub annual_value_usd: f64,
    pub expires_utc: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFacility {
    pub name: String,
    pub kind: String,
    pub region: String,
    pub capacity_teu: u32,
}

#[derive(Debug, Clone)]
pub struct NewShipment {
    pub reference: String,
    pub origin_id: String,
    pub destination_id: String,
    pub carrier: String,
    pub declared_value_usd: f64,
    pub weight_kg: f64,
}

#[derive(Debug, Clone)]
pub struct NewContract {
    pub carrier: String,
    pub facility_id: String,
    pub annual_value_usd: f64,
    pub expires_utc: DateTime<Utc>,
}

/// The store operations this core consumes. List results are in creation
/// order; reads return `None` for unknown ids. No transactional guarantees
/// across calls.
#[async_trait]
pub trait FreightStore: Send + Sync {
    async fn create_facility(&self, new: NewFacility) -> Result<Facility, AppError>;
    async fn get_facility(&self, id: &str) -> Result<Option<Facility>, AppError>;
    async fn list_facilities(&self) -> Result<Vec<Facility>, AppError>;
    async fn delete_facility(&self, id: &str) -> Result<bool, AppError>;

    async fn create_shipment(&self, new: NewShipment) -> Result<Shipment, AppError>;
    async fn get_shipment(&self, id: &str) -> Result<Option<Shipment>, AppError>;
    async fn list_shipments(&self) -> Result<Vec<Shipment>, AppError>;
    async fn update_shipment_status(
        &self,
        id: &str,
        status: &str,
    ) -> Result<Option<Shipment>, AppError>;

    async fn create_contract(&self, new: NewContract) -> Result<Contract, AppError>;
    async fn get_contract(&self, id: &str) -> Result<Option<Contract>, AppError>;
    async fn list_contracts(&self) -> Result<Vec<Contract>, AppError>;
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    facilities: RwLock<Vec<Facility>>,
    shipments: RwLock<Vec<Shipment>>,
    contracts: RwLock<Vec<Contract>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(table: &RwLock<Vec<T>>) -> RwLockReadGuard<'_, Vec<T>> {
        table.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write<T>(table: &RwLock<Vec<T>>) -> RwLockWriteGuard<'_, Vec<T>> {
        table.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl FreightStore for InMemoryStore {
    async fn create_facility(&self, new: NewFacility) -> Result<Facility, AppError> {
        let facility = Facility {
            id: new_entity_id(),
            name: new.name,
            kind: new.kind,
            region: new.region,
            capacity_teu: new.capacity_teu,
            created_at: Utc::now(),
        };
        Self::write(&self.facilities).push(facility.clone());
        Ok(facility)
    }

    async fn get_facility(&self, id: &str) -> Result<Option<Facility>, AppError> {
        Ok(Self::read(&self.facilities)
            .iter()
            .find(|facility| facility.id == id)
            .cloned())
    }

    async fn list_facilities(&self) -> Result<Vec<Facility>, AppError> {
        Ok(Self::read(&self.facilities).clone())
    }

    async fn delete_facility(&self, id: &str) -> Result<bool, AppError> {
        let mut facilities = Self::write(&self.facilities);
        let before = facilities.len();
        facilities.retain(|facility| facility.id != id);
        Ok(facilities.len() < before)
    }

    async fn create_shipment(&self, new: NewShipment) -> Result<Shipment, AppError> {
        let shipment = Shipment {
            id: new_entity_id(),
            reference: new.reference,
            origin_id: new.origin_id,
            destination_id: new.destination_id,
            carrier: new.carrier,
            status: "booked".to_string(),
            declared_value_usd: new.declared_value_usd,
            weight_kg: new.weight_kg,
            created_at: Utc::now(),
        };
        Self::write(&self.shipments).push(shipment.clone());
        Ok(shipment)
    }

    async fn get_shipment(&self, id: &str) -> Result<Option<Shipment>, AppError> {
        Ok(Self::read(&self.shipments)
            .iter()
            .find(|shipment| shipment.id == id)
            .cloned())
    }

    async fn list_shipments(&self) -> Result<Vec<Shipment>, AppError> {
        Ok(Self::read(&self.shipments).clone())
    }

    async fn update_shipment_status(
        &self,
        id: &str,
        status: &str,
    ) -> Result<Option<Shipment>, AppError> {
        let mut shipments = Self::write(&self.shipments);
        let Some(shipment) = shipments.iter_mut().find(|shipment| shipment.id == id) else {
            return Ok(None);
        };
        shipment.status = status.to_string();
        Ok(Some(shipment.clone()))
    }

    async fn create_contract(&self, new: NewContract) -> Result<Contract, AppError> {
        let contract = Contract {
            id: new_entity_id(),
            carrier: new.carrier,
            facility_id: new.facility_id,
            status: "active".to_string(),
            annual_value_usd: new.annual_value_usd,
            expires_utc: new.expires_utc,
            created_at: Utc::now(),
        };
        Self::write(&self.contracts).push(contract.clone());
        Ok(contract)
    }

    async fn get_contract(&self, id: &str) -> Result<Option<Contract>, AppError> {
        Ok(Self::read(&self.contracts)
            .iter()
            .find(|contract| contract.id == id)
            .cloned())
    }

    async fn list_contracts(&self) -> Result<Vec<Contract>, AppError> {
        Ok(Self::read(&self.contracts).clone())
    }
}
