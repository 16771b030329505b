/// Client management scoped to the owning user

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use super::owned_or;
use crate::error::{ServiceError, ServiceResult};
use crate::models::client::{Client, ClientInput};
use crate::quota::QuotaPolicy;
use crate::store::{Page, PageRequest, Store};

#[derive(Clone)]
pub struct ClientService {
    store: Arc<dyn Store>,
    quota: QuotaPolicy,
}

impl ClientService {
    pub fn new(store: Arc<dyn Store>, quota: QuotaPolicy) -> Self {
        Self { store, quota }
    }

    /// Creates a client after checking the plan ceiling
    ///
    /// # Errors
    ///
    /// `ClientLimitExceeded` when the user already has as many live clients as
    /// their plan allows
    pub async fn create(&self, user_id: Uuid, input: ClientInput) -> ServiceResult<Client> {
        validate(&input)?;
        self.quota.can_create_client(user_id).await?;

        let client = self.store.create_client(Client::new(user_id, input)).await?;
        info!(user_id = %user_id, client_id = %client.id, "Client created");

        Ok(client)
    }

    /// Fetches a client owned by `user_id`
    pub async fn get(&self, user_id: Uuid, id: Uuid) -> ServiceResult<Client> {
        let client = self.store.find_client(id).await?;
        owned_or(client, user_id, ServiceError::ClientNotFound)
    }

    pub async fn list(&self, user_id: Uuid, page: PageRequest) -> ServiceResult<Page<Client>> {
        Ok(self.store.list_clients(user_id, page).await?)
    }

    /// Overwrites the mutable fields of an owned client
    pub async fn update(&self, user_id: Uuid, id: Uuid, input: ClientInput) -> ServiceResult<Client> {
        validate(&input)?;

        let mut client = self.get(user_id, id).await?;
        client.apply(input);

        self.store
            .update_client(client)
            .await?
            .ok_or(ServiceError::ClientNotFound)
    }

    /// Soft-deletes an owned client
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> ServiceResult<()> {
        let client = self.get(user_id, id).await?;

        if !self.store.delete_client(client.id).await? {
            return Err(ServiceError::ClientNotFound);
        }

        info!(user_id = %user_id, client_id = %id, "Client deleted");
        Ok(())
    }

    pub async fn count(&self, user_id: Uuid) -> ServiceResult<i64> {
        Ok(self.store.count_clients(user_id).await?)
    }
}

fn validate(input: &ClientInput) -> ServiceResult<()> {
    if input.name.trim().is_empty() {
        return Err(ServiceError::InvalidInput("Client name is required".to_string()));
    }
    Ok(())
}
