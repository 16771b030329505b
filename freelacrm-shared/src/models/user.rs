/// User model and database operations
///
/// Users own every client, task and payment in the system. Each account carries
/// a billing plan (used by the quota policy), an account status (checked on
/// login and token refresh) and, while a password reset is in flight, the
/// SHA-256 digest of the reset token together with its expiry.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'user',
///     plan user_plan NOT NULL DEFAULT 'free',
///     status user_status NOT NULL DEFAULT 'active',
///     reset_token_digest VARCHAR(64),
///     reset_token_expires_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     deleted_at TIMESTAMPTZ
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use freelacrm_shared::models::user::User;
/// use freelacrm_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
///
/// let user = User::new("Ada", "ada@example.com", "$argon2id$...");
/// let user = User::insert(&pool, &user).await?;
///
/// let found = User::find_by_email(&pool, "ada@example.com").await?;
/// assert_eq!(found.map(|u| u.id), Some(user.id));
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, password_hash, role, plan, status, \
     reset_token_digest, reset_token_expires_at, created_at, updated_at, deleted_at";

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    User,
}

/// Billing plan, which determines resource ceilings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_plan", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserPlan {
    Free,
    Basic,
    Pro,
}

impl UserPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserPlan::Free => "free",
            UserPlan::Basic => "basic",
            UserPlan::Pro => "pro",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "free" => Some(UserPlan::Free),
            "basic" => Some(UserPlan::Basic),
            "pro" => Some(UserPlan::Pro),
            _ => None,
        }
    }
}

/// Account status
///
/// Only `Active` accounts may log in or refresh their session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
    Blocked,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
            UserStatus::Blocked => "blocked",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "active" => Some(UserStatus::Active),
            "inactive" => Some(UserStatus::Inactive),
            "blocked" => Some(UserStatus::Blocked),
            _ => None,
        }
    }
}

/// User account
///
/// `password_hash` always holds an Argon2id PHC string once the record has been
/// saved through a store. It is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Email address, unique across live users (compared case-insensitively)
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    pub role: UserRole,

    pub plan: UserPlan,

    pub status: UserStatus,

    /// SHA-256 hex digest of the outstanding password reset token
    #[serde(skip_serializing, default)]
    pub reset_token_digest: Option<String>,

    /// When the outstanding reset token stops being accepted
    #[serde(skip_serializing, default)]
    pub reset_token_expires_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Soft-delete marker
    #[serde(skip_serializing, default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Builds a new active, free-plan user with a fresh ID
    ///
    /// `password` may be plaintext; stores hash it on save.
    pub fn new(name: impl Into<String>, email: impl Into<String>, password: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            email: email.into(),
            password_hash: password.into(),
            role: UserRole::User,
            plan: UserPlan::Free,
            status: UserStatus::Active,
            reset_token_digest: None,
            reset_token_expires_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Whether the account may authenticate
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// Removes any outstanding password reset token
    pub fn clear_reset_token(&mut self) {
        self.reset_token_digest = None;
        self.reset_token_expires_at = None;
    }

    /// Inserts a user row
    ///
    /// # Errors
    ///
    /// Returns a unique-violation database error if the email is already taken.
    pub async fn insert(pool: &PgPool, user: &User) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, plan, status,
                               reset_token_digest, reset_token_expires_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(user.plan)
            .bind(user.status)
            .bind(&user.reset_token_digest)
            .bind(user.reset_token_expires_at)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(pool)
            .await
    }

    /// Overwrites every mutable column of a live user
    ///
    /// Returns `None` if the user does not exist or was soft-deleted.
    pub async fn save(pool: &PgPool, user: &User) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE users
            SET name = $2, email = $3, password_hash = $4, role = $5, plan = $6, status = $7,
                reset_token_digest = $8, reset_token_expires_at = $9, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {USER_COLUMNS}
            "#
        );

        sqlx::query_as::<_, User>(&query)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(user.plan)
            .bind(user.status)
            .bind(&user.reset_token_digest)
            .bind(user.reset_token_expires_at)
            .fetch_optional(pool)
            .await
    }

    /// Finds a live user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a live user by email address (case-insensitive)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1) AND deleted_at IS NULL"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Finds the live user holding a reset token digest
    pub async fn find_by_reset_digest(
        pool: &PgPool,
        digest: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE reset_token_digest = $1 AND deleted_at IS NULL"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(digest)
            .fetch_optional(pool)
            .await
    }
}
