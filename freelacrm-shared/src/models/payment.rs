/// Payment model and database operations
///
/// A payment is an amount a client owes (or has paid) the freelancer. It always
/// references a client and may reference one of that client's tasks.
///
/// Pending payments whose due date has passed are overdue. They are flipped to
/// the `overdue` status on demand via [`Payment::mark_overdue`], never by a
/// background job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const PAYMENT_COLUMNS: &str = "id, user_id, client_id, task_id, amount, currency, status, method, \
     description, invoice_number, due_date, paid_date, created_at, updated_at, deleted_at";

/// Currency applied when none is given
pub const DEFAULT_CURRENCY: &str = "USD";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Overdue => "overdue",
            PaymentStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "overdue" => Some(PaymentStatus::Overdue),
            "cancelled" => Some(PaymentStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    BankTransfer,
    CreditCard,
    Paypal,
    Cash,
    Other,
}

/// Payment record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    pub client_id: Uuid,

    /// Optional task; when set it belongs to `client_id`
    pub task_id: Option<Uuid>,

    /// Always strictly positive
    pub amount: f64,

    /// ISO 4217 code
    pub currency: String,

    pub status: PaymentStatus,
    pub method: PaymentMethod,
    pub description: String,
    pub invoice_number: String,
    pub due_date: DateTime<Utc>,
    pub paid_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    #[serde(skip_serializing, default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Mutable payment fields, as supplied on create and update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInput {
    pub client_id: Uuid,
    #[serde(default)]
    pub task_id: Option<Uuid>,
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
    /// Ignored on create (new payments start `pending`)
    #[serde(default)]
    pub status: Option<PaymentStatus>,
    #[serde(default)]
    pub method: Option<PaymentMethod>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub invoice_number: String,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub paid_date: Option<DateTime<Utc>>,
}

impl Payment {
    /// Builds a new pending payment owned by `user_id`
    pub fn new(user_id: Uuid, input: PaymentInput) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            client_id: input.client_id,
            task_id: input.task_id,
            amount: input.amount,
            currency: normalize_currency(input.currency),
            status: PaymentStatus::Pending,
            method: input.method.unwrap_or_default(),
            description: input.description,
            invoice_number: input.invoice_number,
            due_date: input.due_date,
            paid_date: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// Overwrites the mutable fields with `input`
    ///
    /// A payment moved to `paid` without a paid date is stamped with `now`.
    pub fn apply(&mut self, input: PaymentInput, now: DateTime<Utc>) {
        self.client_id = input.client_id;
        self.task_id = input.task_id;
        self.amount = input.amount;
        self.currency = normalize_currency(input.currency);
        if let Some(status) = input.status {
            self.status = status;
        }
        if let Some(method) = input.method {
            self.method = method;
        }
        self.description = input.description;
        self.invoice_number = input.invoice_number;
        self.due_date = input.due_date;
        self.paid_date = input.paid_date;
        if self.status == PaymentStatus::Paid && self.paid_date.is_none() {
            self.paid_date = Some(now);
        }
    }

    /// Marks the payment as paid on `paid_date`
    pub fn mark_paid(&mut self, paid_date: DateTime<Utc>) {
        self.status = PaymentStatus::Paid;
        self.paid_date = Some(paid_date);
    }

    /// Whether the payment counts as overdue at `now`
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        match self.status {
            PaymentStatus::Overdue => true,
            PaymentStatus::Pending => self.due_date < now,
            _ => false,
        }
    }

    pub async fn insert(pool: &PgPool, payment: &Payment) -> Result<Self, sqlx::Error> {
        let query = format!(
            r#"
            INSERT INTO payments (id, user_id, client_id, task_id, amount, currency, status, method,
                                  description, invoice_number, due_date, paid_date,
                                  created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {PAYMENT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Payment>(&query)
            .bind(payment.id)
            .bind(payment.user_id)
            .bind(payment.client_id)
            .bind(payment.task_id)
            .bind(payment.amount)
            .bind(&payment.currency)
            .bind(payment.status)
            .bind(payment.method)
            .bind(&payment.description)
            .bind(&payment.invoice_number)
            .bind(payment.due_date)
            .bind(payment.paid_date)
            .bind(payment.created_at)
            .bind(payment.updated_at)
            .fetch_one(pool)
            .await
    }

    pub async fn save(pool: &PgPool, payment: &Payment) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            r#"
            UPDATE payments
            SET client_id = $2, task_id = $3, amount = $4, currency = $5, status = $6,
                method = $7, description = $8, invoice_number = $9, due_date = $10,
                paid_date = $11, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {PAYMENT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Payment>(&query)
            .bind(payment.id)
            .bind(payment.client_id)
            .bind(payment.task_id)
            .bind(payment.amount)
            .bind(&payment.currency)
            .bind(payment.status)
            .bind(payment.method)
            .bind(&payment.description)
            .bind(&payment.invoice_number)
            .bind(payment.due_date)
            .bind(payment.paid_date)
            .fetch_optional(pool)
            .await
    }

    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE payments SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query =
            format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1 AND deleted_at IS NULL");

        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists a user's live payments, optionally filtered by status, latest due first
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
        status: Option<PaymentStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE user_id = $1 AND ($2::payment_status IS NULL OR status = $2)
              AND deleted_at IS NULL
            ORDER BY due_date DESC
            LIMIT $3 OFFSET $4
            "#
        );

        sqlx::query_as::<_, Payment>(&query)
            .bind(user_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_by_user(
        pool: &PgPool,
        user_id: Uuid,
        status: Option<PaymentStatus>,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM payments
            WHERE user_id = $1 AND ($2::payment_status IS NULL OR status = $2)
              AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(pool)
        .await
    }

    pub async fn list_by_client(
        pool: &PgPool,
        client_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE client_id = $1 AND deleted_at IS NULL
            ORDER BY due_date DESC
            LIMIT $2 OFFSET $3
            "#
        );

        sqlx::query_as::<_, Payment>(&query)
            .bind(client_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_by_client(pool: &PgPool, client_id: Uuid) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM payments WHERE client_id = $1 AND deleted_at IS NULL",
        )
        .bind(client_id)
        .fetch_one(pool)
        .await
    }

    pub async fn list_by_task(pool: &PgPool, task_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE task_id = $1 AND deleted_at IS NULL
            ORDER BY due_date DESC
            "#
        );

        sqlx::query_as::<_, Payment>(&query)
            .bind(task_id)
            .fetch_all(pool)
            .await
    }

    /// Lists payments that are overdue at `now`, oldest due first
    pub async fn list_overdue(
        pool: &PgPool,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            r#"
            SELECT {PAYMENT_COLUMNS}
            FROM payments
            WHERE user_id = $1 AND deleted_at IS NULL
              AND (status = 'overdue' OR (status = 'pending' AND due_date < $2))
            ORDER BY due_date ASC
            "#
        );

        sqlx::query_as::<_, Payment>(&query)
            .bind(user_id)
            .bind(now)
            .fetch_all(pool)
            .await
    }

    /// Sums paid amounts with a paid date in `[start, end]`
    pub async fn paid_total(
        pool: &PgPool,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<f64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(amount), 0)::DOUBLE PRECISION
            FROM payments
            WHERE user_id = $1 AND status = 'paid' AND paid_date BETWEEN $2 AND $3
              AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(start)
        .bind(end)
        .fetch_one(pool)
        .await
    }

    /// Flips a user's pending payments due before `now` to overdue
    ///
    /// Returns the number of payments updated.
    pub async fn mark_overdue(
        pool: &PgPool,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'overdue', updated_at = NOW()
            WHERE user_id = $1 AND status = 'pending' AND due_date < $2 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .bind(now)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}

fn normalize_currency(currency: Option<String>) -> String {
    match currency {
        Some(c) if !c.trim().is_empty() => c.trim().to_uppercase(),
        _ => DEFAULT_CURRENCY.to_string(),
    }
}
