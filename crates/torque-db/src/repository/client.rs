//! # Client Repository
//!
//! SQLite storage for shop clients.
//!
//! `find_clients` loads the table and filters in Rust: the predicate is an
//! arbitrary closure and a single shop's client list is small.

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::{debug, info};
use uuid::Uuid;

use torque_core::{Client, NewClient};

use crate::error::DbResult;
use crate::pool::Database;
use crate::repository::ClientRepository;

#[derive(FromRow)]
struct ClientRow {
    id: String,
    name: String,
    phone: String,
    email: Option<String>,
    address: Option<String>,
    document_number: String,
    created_at: DateTime<Utc>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            address: row.address,
            document_number: row.document_number,
            created_at: row.created_at,
        }
    }
}

const SELECT_CLIENTS: &str = r#"
    SELECT id, name, phone, email, address, document_number, created_at
    FROM clients
"#;

impl ClientRepository for Database {
    async fn find_clients<P>(&self, predicate: P) -> DbResult<Vec<Client>>
    where
        P: Fn(&Client) -> bool + Send,
    {
        let rows: Vec<ClientRow> =
            sqlx::query_as(&format!("{SELECT_CLIENTS} ORDER BY created_at, id"))
                .fetch_all(self.pool())
                .await?;

        let matches: Vec<Client> = rows
            .into_iter()
            .map(Client::from)
            .filter(|c| predicate(c))
            .collect();

        debug!(count = matches.len(), "Client search");
        Ok(matches)
    }

    async fn get_client(&self, id: &str) -> DbResult<Option<Client>> {
        let row: Option<ClientRow> = sqlx::query_as(&format!("{SELECT_CLIENTS} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        Ok(row.map(Client::from))
    }

    async fn create_client(&self, client: NewClient) -> DbResult<Client> {
        let client = Client {
            id: Uuid::new_v4().to_string(),
            name: client.name.trim().to_string(),
            phone: client.phone.trim().to_string(),
            email: client.email,
            address: client.address,
            document_number: client.document_number.trim().to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO clients (
                id, name, phone, email, address, document_number, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&client.id)
        .bind(&client.name)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(&client.address)
        .bind(&client.document_number)
        .bind(client.created_at)
        .execute(self.pool())
        .await?;

        info!(id = %client.id, "Client created");
        Ok(client)
    }
}
