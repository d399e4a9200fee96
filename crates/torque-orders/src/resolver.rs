//! # Party Resolver
//!
//! Finds or creates the client and vehicle an order refers to.
//!
//! ## Creation Checks
//! ```text
//! create_client(fields, policy)
//!   ├── field rules (name, phone, document, document pattern)
//!   ├── policy == Reject? same name or phone already on file → Duplicate
//!   └── store.create_client
//!
//! create_vehicle(fields, client_id)
//!   ├── owner exists
//!   ├── field rules (make, model, year range, color, plate, seat type)
//!   ├── normalized plate already on file → DuplicatePlate
//!   └── store.create_vehicle (UNIQUE plate catches a concurrent insert)
//! ```

use tracing::{debug, info};

use torque_core::error::ValidationError;
use torque_core::validation::{
    normalize_plate, validate_new_client, validate_new_vehicle, validate_search_query,
};
use torque_core::{Client, CoreError, CoreResult, NewClient, NewVehicle, Vehicle};
use torque_db::{ClientRepository, DbError, VehicleRepository};

use crate::config::OrdersConfig;

/// Whether `create_client` refuses a client whose name or phone is on file.
///
/// The direct product-sale flow rejects duplicates; the full service flow
/// allows them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    Allow,
    Reject,
}

/// Client and vehicle lookup/creation over a store.
#[derive(Debug, Clone)]
pub struct PartyResolver<S> {
    store: S,
    min_query_chars: usize,
    year_bounds: (i32, i32),
}

impl<S> PartyResolver<S>
where
    S: ClientRepository + VehicleRepository,
{
    pub fn new(store: S, config: &OrdersConfig) -> Self {
        PartyResolver {
            store,
            min_query_chars: config.min_query_chars(),
            year_bounds: config.year_bounds(),
        }
    }

    /// Clients whose name contains `query` (case-insensitive) or whose phone
    /// contains it.
    ///
    /// Returns nothing until the trimmed query reaches the configured minimum
    /// length.
    pub async fn find_client(&self, query: &str) -> CoreResult<Vec<Client>> {
        let query = validate_search_query(query)?;
        if query.chars().count() < self.min_query_chars {
            return Ok(Vec::new());
        }

        let found = self
            .store
            .find_clients(|c| c.matches_query(&query))
            .await?;

        debug!(query = %query, count = found.len(), "Client search");
        Ok(found)
    }

    /// Validates and stores a new client.
    ///
    /// ## Errors
    /// - `Validation` on the first failing field rule
    /// - `Validation(Duplicate)` under [`DuplicatePolicy::Reject`] when the
    ///   name (case-insensitive) or phone is already on file
    /// - `Persistence` if the store fails
    pub async fn create_client(
        &self,
        fields: NewClient,
        policy: DuplicatePolicy,
    ) -> CoreResult<Client> {
        validate_new_client(&fields)?;

        if policy == DuplicatePolicy::Reject {
            self.ensure_not_on_file(&fields).await?;
        }

        let client = self.store.create_client(fields).await?;
        info!(id = %client.id, ?policy, "Client registered");
        Ok(client)
    }

    async fn ensure_not_on_file(&self, fields: &NewClient) -> CoreResult<()> {
        let name = fields.name.trim().to_lowercase();
        let phone = fields.phone.trim().to_string();

        let existing = self
            .store
            .find_clients(|c| c.name.trim().to_lowercase() == name || c.phone.trim() == phone)
            .await?;

        if let Some(found) = existing.first() {
            let (field, value) = if found.name.trim().to_lowercase() == name {
                ("name", fields.name.trim().to_string())
            } else {
                ("phone", phone)
            };
            return Err(ValidationError::Duplicate {
                field: field.to_string(),
                value,
            }
            .into());
        }
        Ok(())
    }

    pub async fn get_client(&self, client_id: &str) -> CoreResult<Client> {
        self.store
            .get_client(client_id)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "Client".to_string(),
                id: client_id.to_string(),
            })
    }

    /// Vehicles owned by `client_id`, oldest first.
    pub async fn client_vehicles(&self, client_id: &str) -> CoreResult<Vec<Vehicle>> {
        Ok(self
            .store
            .find_vehicles(|v| v.client_id == client_id)
            .await?)
    }

    /// Validates and stores a vehicle for `client_id`.
    ///
    /// The plate is trimmed and uppercased before the uniqueness check, so
    /// `" abc123 "` collides with `"ABC123"`.
    ///
    /// ## Errors
    /// - `NotFound` if the owner does not exist
    /// - `Validation` on the first failing field rule
    /// - `DuplicatePlate` if the normalized plate is on file
    pub async fn create_vehicle(
        &self,
        mut fields: NewVehicle,
        client_id: &str,
    ) -> CoreResult<Vehicle> {
        self.get_client(client_id).await?;
        fields.client_id = client_id.to_string();

        let (min_year, max_year) = self.year_bounds;
        validate_new_vehicle(&fields, min_year, max_year)?;

        let plate = normalize_plate(&fields.plate);
        let taken = self.store.find_vehicles(|v| v.plate == plate).await?;
        if !taken.is_empty() {
            return Err(CoreError::DuplicatePlate { plate });
        }

        fields.plate = plate;
        let vehicle = self.store.create_vehicle(fields).await.map_err(|e| match e {
            DbError::UniqueViolation { value, .. } => CoreError::DuplicatePlate { plate: value },
            other => other.into(),
        })?;

        info!(id = %vehicle.id, plate = %vehicle.plate, "Vehicle registered");
        Ok(vehicle)
    }

    pub async fn get_vehicle(&self, vehicle_id: &str) -> CoreResult<Vehicle> {
        self.store
            .get_vehicle(vehicle_id)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "Vehicle".to_string(),
                id: vehicle_id.to_string(),
            })
    }
}
