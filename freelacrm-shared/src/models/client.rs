/// Client model and database operations
///
/// A client is a customer of the freelancer. Clients are owned by exactly one
/// user and are only ever read or written on that user's behalf.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE clients (
///     id UUID PRIMARY KEY,
///     user_id UUID NOT NULL REFERENCES users(id),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL DEFAULT '',
///     phone VARCHAR(64) NOT NULL DEFAULT '',
///     company VARCHAR(255) NOT NULL DEFAULT '',
///     address TEXT NOT NULL DEFAULT '',
///     notes TEXT NOT NULL DEFAULT '',
///     status client_status NOT NULL DEFAULT 'active',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const CLIENT_COLUMNS: &str = "id, user_id, name, email, phone, company, address, notes, status, \
     created_at, updated_at, deleted_at";

/// Client lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "client_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ClientStatus {
    #[default]
    Active,
    Inactive,
    Archived,
}

impl ClientStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientStatus::Active => "active",
            ClientStatus::Inactive => "inactive",
            ClientStatus::Archived => "archived",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ClientStatus::Active),
            "inactive" => Some(ClientStatus::Inactive),
            "archived" => Some(ClientStatus::Archived),
            _ => None,
        }
    }
}

/// Client record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Client {
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub address: String,
    pub notes: String,
    pub status: ClientStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing, default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Mutable client fields, as supplied on create and update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientInput {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub notes: String,
    /// Defaults to `active` on create; left unchanged on update when absent
    #[serde(default)]
    pub status: Option<ClientStatus>,
}

impl Client {
    /// Builds a new client owned by `user_id`
    pub fn new(user_id: Uuid, input: ClientInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            name: input.name,
            email: input.email,
            phone: input.phone,
            company: input.company,
            address: input.address,
            notes: input.notes,
            status: input.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Overwrites the mutable fields with `input`
    pub fn apply(&mut self, input: ClientInput) {
        self.name = input.name;
        self.email = input.email;
        self.phone = input.phone;
        self.company = input.company;
        self.address = input.address;
        self.notes = input.notes;
        if let Some(status) = input.status {
            self.status = status;
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == ClientStatus::Active
    }

    /// Inserts a client row
    pub async fn insert(pool: &PgPool, client: &Client) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO clients (id, user_id, name, email, phone, company, address, notes,
                                 status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {CLIENT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Client>(&query)
            .bind(client.id)
            .bind(client.user_id)
            .bind(&client.name)
            .bind(&client.email)
            .bind(&client.phone)
            .bind(&client.company)
            .bind(&client.address)
            .bind(&client.notes)
            .bind(client.status)
            .bind(client.created_at)
            .bind(client.updated_at)
            .fetch_one(pool)
            .await
    }

    /// Overwrites every mutable column of a live client
    pub async fn save(pool: &PgPool, client: &Client) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE clients
            SET name = $2, email = $3, phone = $4, company = $5, address = $6, notes = $7,
                status = $8, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {CLIENT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Client>(&query)
            .bind(client.id)
            .bind(&client.name)
            .bind(&client.email)
            .bind(&client.phone)
            .bind(&client.company)
            .bind(&client.address)
            .bind(&client.notes)
            .bind(client.status)
            .fetch_optional(pool)
            .await
    }

    /// Marks a client as deleted
    ///
    /// Returns false if no live client had this ID.
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE clients SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query =
            format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1 AND deleted_at IS NULL");

        sqlx::query_as::<_, Client>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists a user's live clients, newest first
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {CLIENT_COLUMNS}
            FROM clients
            WHERE user_id = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        );

        sqlx::query_as::<_, Client>(&query)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Counts a user's live clients
    pub async fn count_by_user(pool: &PgPool, user_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM clients WHERE user_id = $1 AND deleted_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }
}
