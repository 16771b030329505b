//! Shared fixtures for service-level tests
//!
//! Everything runs over `MemoryStore`; no database is needed.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use freelacrm_shared::auth::jwt::TokenCodec;
use freelacrm_shared::models::client::{Client, ClientInput};
use freelacrm_shared::models::user::{User, UserPlan, UserStatus};
use freelacrm_shared::notify::{MailError, Mailer};
use freelacrm_shared::services::Services;
use freelacrm_shared::store::{MemoryStore, Store, UserStore};

pub const TEST_SECRET: &str = "test-secret-with-at-least-32-characters!!";
pub const TEST_PASSWORD: &str = "correct horse";

/// Mailer that keeps every reset token it is asked to send
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn last_token_for(&self, to: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(recipient, _)| recipient == to)
            .map(|(_, token)| token.clone())
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send_password_reset(&self, to: &str, token: &str) -> Result<(), MailError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), token.to_string()));
        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
    pub codec: TokenCodec,
    pub services: Services,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let codec = TokenCodec::new(TEST_SECRET, Duration::hours(24));

        let shared: Arc<dyn Store> = store.clone();
        let services = Services::new(shared, codec.clone(), mailer.clone());

        Self {
            store,
            mailer,
            codec,
            services,
        }
    }

    /// Registers a free-plan user with [`TEST_PASSWORD`]
    pub async fn user(&self, email: &str) -> User {
        self.services
            .sessions
            .register("Test User", email, TEST_PASSWORD)
            .await
            .expect("register")
    }

    pub async fn set_status(&self, user: &User, status: UserStatus) {
        let mut user = self.store.find_user(user.id).await.unwrap().unwrap();
        user.status = status;
        self.store.update_user(user).await.unwrap().unwrap();
    }

    pub async fn set_plan(&self, user: &User, plan: UserPlan) {
        let mut user = self.store.find_user(user.id).await.unwrap().unwrap();
        user.plan = plan;
        self.store.update_user(user).await.unwrap().unwrap();
    }

    pub async fn client(&self, user: &User, name: &str) -> Client {
        self.services
            .clients
            .create(user.id, client_input(name))
            .await
            .expect("create client")
    }
}

pub fn client_input(name: &str) -> ClientInput {
    ClientInput {
        name: name.to_string(),
        email: format!("{}@client.test", name.to_lowercase().replace(' ', "-")),
        ..Default::default()
    }
}

pub fn days_from_now(days: i64) -> chrono::DateTime<Utc> {
    Utc::now() + Duration::days(days)
}
