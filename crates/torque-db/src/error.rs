//! # Store Errors
//!
//! What can go wrong below the repository traits. The order flow never sees
//! these directly:
//!
//! ```text
//! sqlx / serde_json / injected failure ──► DbError ──► CoreError
//!                                                       ├── NotFound  (record missing)
//!                                                       ├── AlreadyPaid (payment kept)
//!                                                       └── Persistence (everything else)
//! ```
//!
//! The resolver looks at [`DbError::UniqueViolation`] before converting, to
//! report a plate taken by a concurrent insert as a duplicate plate.

use thiserror::Error;
use torque_core::CoreError;

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE column already holds `value` (vehicle plates).
    #[error("{field} '{value}' is already taken")]
    UniqueViolation { field: String, value: String },

    #[error("Could not open database: {0}")]
    ConnectionFailed(String),

    #[error("Schema migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A payment was written for an order that already carries one.
    #[error("Order {order_id} already has a payment")]
    AlreadyPaid { order_id: String },

    /// Bad JSON in an order column.
    #[error("Stored JSON is invalid: {0}")]
    Serialization(String),

    /// Pool closed or exhausted, or a write refused by `MemoryStore`.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Repositories that know the offending value (plates) replace the
/// placeholder `value` with [`DbError::duplicate`].
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        const UNIQUE_PREFIX: &str = "UNIQUE constraint failed: ";

        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Row", "?"),
            sqlx::Error::Database(db_err) => match db_err.message().strip_prefix(UNIQUE_PREFIX) {
                Some(column) => DbError::duplicate(column, "?"),
                None => DbError::QueryFailed(db_err.message().to_string()),
            },
            sqlx::Error::PoolTimedOut => DbError::Unavailable("no free connection".into()),
            sqlx::Error::PoolClosed => DbError::Unavailable("database closed".into()),
            other => DbError::QueryFailed(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

impl From<DbError> for CoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            DbError::AlreadyPaid { order_id } => CoreError::AlreadyPaid { order_id },
            other => CoreError::Persistence(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_core_not_found() {
        let core: CoreError = DbError::not_found("Order", "o1").into();
        assert!(matches!(core, CoreError::NotFound { ref entity, ref id } if entity == "Order" && id == "o1"));
    }

    #[test]
    fn test_refused_payment_maps_to_already_paid() {
        let core: CoreError = DbError::AlreadyPaid {
            order_id: "o1".into(),
        }
        .into();
        assert!(matches!(core, CoreError::AlreadyPaid { ref order_id } if order_id == "o1"));
        assert!(core.is_recoverable());
    }

    #[test]
    fn test_other_errors_map_to_persistence() {
        let core: CoreError = DbError::Unavailable("disk full".into()).into();
        assert!(matches!(core, CoreError::Persistence(ref m) if m.contains("disk full")));
        assert!(!core.is_recoverable());

        let core: CoreError = DbError::duplicate("vehicles.plate", "ABC123").into();
        assert!(matches!(core, CoreError::Persistence(_)));
    }
}
