//! # Vehicle Repository
//!
//! SQLite storage for client vehicles. The `plate` column carries a UNIQUE
//! index, so a plate race between two operators ends in `UniqueViolation`
//! rather than a second row.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::info;
use uuid::Uuid;

use torque_core::validation::normalize_plate;
use torque_core::{NewVehicle, Vehicle};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::VehicleRepository;

#[derive(FromRow)]
struct VehicleRow {
    id: String,
    client_id: String,
    make: String,
    model: String,
    year: i64,
    color: String,
    plate: String,
    seat_type: String,
    created_at: DateTime<Utc>,
}

impl From<VehicleRow> for Vehicle {
    fn from(row: VehicleRow) -> Self {
        Vehicle {
            id: row.id,
            client_id: row.client_id,
            make: row.make,
            model: row.model,
            year: row.year as i32,
            color: row.color,
            plate: row.plate,
            seat_type: row.seat_type,
            created_at: row.created_at,
        }
    }
}

const SELECT_VEHICLES: &str = r#"
    SELECT id, client_id, make, model, year, color, plate, seat_type, created_at
    FROM vehicles
"#;

impl VehicleRepository for Database {
    async fn find_vehicles<P>(&self, predicate: P) -> DbResult<Vec<Vehicle>>
    where
        P: Fn(&Vehicle) -> bool + Send,
    {
        let rows: Vec<VehicleRow> =
            sqlx::query_as(&format!("{SELECT_VEHICLES} ORDER BY created_at, id"))
                .fetch_all(self.pool())
                .await?;

        Ok(rows
            .into_iter()
            .map(Vehicle::from)
            .filter(|v| predicate(v))
            .collect())
    }

    async fn get_vehicle(&self, id: &str) -> DbResult<Option<Vehicle>> {
        let row: Option<VehicleRow> = sqlx::query_as(&format!("{SELECT_VEHICLES} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        Ok(row.map(Vehicle::from))
    }

    async fn create_vehicle(&self, vehicle: NewVehicle) -> DbResult<Vehicle> {
        let vehicle = Vehicle {
            id: Uuid::new_v4().to_string(),
            client_id: vehicle.client_id,
            make: vehicle.make.trim().to_string(),
            model: vehicle.model.trim().to_string(),
            year: vehicle.year,
            color: vehicle.color.trim().to_string(),
            plate: normalize_plate(&vehicle.plate),
            seat_type: vehicle.seat_type.trim().to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO vehicles (
                id, client_id, make, model, year, color, plate, seat_type, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&vehicle.id)
        .bind(&vehicle.client_id)
        .bind(&vehicle.make)
        .bind(&vehicle.model)
        .bind(vehicle.year as i64)
        .bind(&vehicle.color)
        .bind(&vehicle.plate)
        .bind(&vehicle.seat_type)
        .bind(vehicle.created_at)
        .execute(self.pool())
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &vehicle.plate),
            other => other,
        })?;

        info!(id = %vehicle.id, plate = %vehicle.plate, "Vehicle created");
        Ok(vehicle)
    }
}
