/// Payment tracking scoped to the owning user
///
/// A payment belongs to one of the user's clients and may reference a task of
/// that same client. Overdue detection is computed on read; `refresh_overdue`
/// persists it on demand.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::owned_or;
use crate::error::{ServiceError, ServiceResult};
use crate::models::payment::{Payment, PaymentInput, PaymentStatus};
use crate::store::{Page, PageRequest, Store};

/// Paid total over a date range
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaymentSummary {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub total_paid: f64,
}

#[derive(Clone)]
pub struct PaymentService {
    store: Arc<dyn Store>,
}

impl PaymentService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Records a pending payment
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` if the amount is not strictly positive
    /// - `ClientNotFound` if the client is not owned by the user
    /// - `TaskNotFound` if the task is not owned by the user
    /// - `TaskClientMismatch` if the task belongs to another client
    pub async fn create(&self, user_id: Uuid, input: PaymentInput) -> ServiceResult<Payment> {
        self.check_references(user_id, &input).await?;

        let payment = self.store.create_payment(Payment::new(user_id, input)).await?;
        info!(
            user_id = %user_id,
            payment_id = %payment.id,
            amount = payment.amount,
            currency = %payment.currency,
            "Payment created"
        );

        Ok(payment)
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> ServiceResult<Payment> {
        let payment = self.store.find_payment(id).await?;
        owned_or(payment, user_id, ServiceError::PaymentNotFound)
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        status: Option<PaymentStatus>,
        page: PageRequest,
    ) -> ServiceResult<Page<Payment>> {
        Ok(self.store.list_payments(user_id, status, page).await?)
    }

    /// Payments of one owned client
    pub async fn list_by_client(
        &self,
        user_id: Uuid,
        client_id: Uuid,
        page: PageRequest,
    ) -> ServiceResult<Page<Payment>> {
        let client = self.store.find_client(client_id).await?;
        let client = owned_or(client, user_id, ServiceError::ClientNotFound)?;
        Ok(self.store.list_payments_by_client(client.id, page).await?)
    }

    /// Payments of one owned task
    pub async fn list_by_task(&self, user_id: Uuid, task_id: Uuid) -> ServiceResult<Vec<Payment>> {
        let task = self.store.find_task(task_id).await?;
        let task = owned_or(task, user_id, ServiceError::TaskNotFound)?;
        Ok(self.store.list_payments_by_task(task.id).await?)
    }

    /// Overwrites the mutable fields of an owned payment
    ///
    /// Runs the same reference checks as [`create`](Self::create).
    pub async fn update(&self, user_id: Uuid, id: Uuid, input: PaymentInput) -> ServiceResult<Payment> {
        self.update_at(user_id, id, input, Utc::now()).await
    }

    pub async fn update_at(
        &self,
        user_id: Uuid,
        id: Uuid,
        input: PaymentInput,
        now: DateTime<Utc>,
    ) -> ServiceResult<Payment> {
        let mut payment = self.get(user_id, id).await?;
        self.check_references(user_id, &input).await?;

        payment.apply(input, now);
        self.store
            .update_payment(payment)
            .await?
            .ok_or(ServiceError::PaymentNotFound)
    }

    /// Marks an owned payment as paid; `paid_date` defaults to now
    pub async fn mark_as_paid(
        &self,
        user_id: Uuid,
        id: Uuid,
        paid_date: Option<DateTime<Utc>>,
    ) -> ServiceResult<Payment> {
        let mut payment = self.get(user_id, id).await?;
        payment.mark_paid(paid_date.unwrap_or_else(Utc::now));

        let payment = self
            .store
            .update_payment(payment)
            .await?
            .ok_or(ServiceError::PaymentNotFound)?;

        info!(payment_id = %payment.id, "Payment marked as paid");
        Ok(payment)
    }

    /// Soft-deletes an owned payment
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> ServiceResult<()> {
        let payment = self.get(user_id, id).await?;

        if !self.store.delete_payment(payment.id).await? {
            return Err(ServiceError::PaymentNotFound);
        }

        info!(user_id = %user_id, payment_id = %id, "Payment deleted");
        Ok(())
    }

    /// Payments flagged overdue, or pending with a due date in the past
    pub async fn overdue(&self, user_id: Uuid) -> ServiceResult<Vec<Payment>> {
        self.overdue_at(user_id, Utc::now()).await
    }

    pub async fn overdue_at(&self, user_id: Uuid, now: DateTime<Utc>) -> ServiceResult<Vec<Payment>> {
        Ok(self.store.overdue_payments(user_id, now).await?)
    }

    /// Sum of amounts paid within `[start, end]`
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `start` is after `end`
    pub async fn summary(
        &self,
        user_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ServiceResult<PaymentSummary> {
        if start > end {
            return Err(ServiceError::InvalidInput(
                "start must not be after end".to_string(),
            ));
        }

        let total_paid = self.store.paid_total(user_id, start, end).await?;
        Ok(PaymentSummary {
            start,
            end,
            total_paid,
        })
    }

    /// Persists the overdue status of every pending payment past its due date
    pub async fn refresh_overdue(&self, user_id: Uuid) -> ServiceResult<u64> {
        self.refresh_overdue_at(user_id, Utc::now()).await
    }

    pub async fn refresh_overdue_at(&self, user_id: Uuid, now: DateTime<Utc>) -> ServiceResult<u64> {
        let updated = self.store.mark_overdue(user_id, now).await?;
        if updated > 0 {
            info!(user_id = %user_id, updated, "Pending payments marked overdue");
        }
        Ok(updated)
    }

    async fn check_references(&self, user_id: Uuid, input: &PaymentInput) -> ServiceResult<()> {
        if !(input.amount.is_finite() && input.amount > 0.0) {
            return Err(ServiceError::InvalidAmount);
        }

        let client = self.store.find_client(input.client_id).await?;
        let client = owned_or(client, user_id, ServiceError::ClientNotFound)?;

        if let Some(task_id) = input.task_id {
            let task = self.store.find_task(task_id).await?;
            let task = owned_or(task, user_id, ServiceError::TaskNotFound)?;
            if task.client_id != client.id {
                return Err(ServiceError::TaskClientMismatch);
            }
        }

        Ok(())
    }
}
