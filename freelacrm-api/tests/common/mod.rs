//! Common helpers for HTTP-level tests
//!
//! Builds the real router over `MemoryStore` with a mailer that records reset
//! tokens, and drives it with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use freelacrm_api::{
    app::{build_router, AppState},
    config::Config,
};
use freelacrm_shared::{
    notify::{MailError, Mailer},
    store::MemoryStore,
};
use serde_json::{json, Value};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "integration-secret-at-least-32-characters";
pub const TEST_PASSWORD: &str = "secret123";

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn last_token(&self) -> Option<String> {
        self.sent.lock().unwrap().last().map(|(_, token)| token.clone())
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

pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_env(&[])
    }

    /// Builds the app with extra configuration variables
    pub fn with_env(vars: &[(&str, &str)]) -> Self {
        let mut all = vec![("JWT_SECRET", TEST_SECRET)];
        all.extend_from_slice(vars);
        let config = Config::from_lookup(|key| {
            all.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
        .expect("test config");

        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::new(store.clone(), mailer.clone(), config);

        Self {
            app: build_router(state),
            store,
            mailer,
        }
    }

    /// Sends a request and returns the status and the JSON body (`Null` when empty)
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    /// Registers an account and logs in, returning `(user_id, token)`
    pub async fn signup(&self, email: &str) -> (String, String) {
        let (status, user) = self
            .post(
                "/api/v1/auth/register",
                None,
                json!({ "name": "Test User", "email": email, "password": TEST_PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {user}");

        let (status, login) = self
            .post(
                "/api/v1/auth/login",
                None,
                json!({ "email": email, "password": TEST_PASSWORD }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {login}");

        (
            user["id"].as_str().unwrap().to_string(),
            login["token"].as_str().unwrap().to_string(),
        )
    }

    /// Creates a client and returns its id
    pub async fn create_client(&self, token: &str, name: &str) -> String {
        let (status, client) = self
            .post("/api/v1/clients", Some(token), json!({ "name": name }))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create client failed: {client}");
        client["id"].as_str().unwrap().to_string()
    }

    /// Creates a task for `client_id` and returns its id
    pub async fn create_task(&self, token: &str, client_id: &str, title: &str) -> String {
        let (status, task) = self
            .post(
                "/api/v1/tasks",
                Some(token),
                json!({ "client_id": client_id, "title": title }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create task failed: {task}");
        task["id"].as_str().unwrap().to_string()
    }
}
