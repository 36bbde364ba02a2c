#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};

use cardstack_api::config::AppConfig;
use cardstack_api::database::models::user::NewUser;
use cardstack_api::database::Store;
use cardstack_api::services::{user_service, RecordingMailer};
use cardstack_api::types::Role;
use cardstack_api::{app, AppState};

/// An in-process server on its own port with a fresh in-memory store
pub struct TestApp {
    pub base_url: String,
    pub client: Client,
    pub store: Store,
    pub mailer: Arc<RecordingMailer>,
    pub config: AppConfig,
}

impl TestApp {
    pub async fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let config = AppConfig::testing();
        let store = Store::memory();
        let mailer = Arc::new(RecordingMailer::new());
        let state = AppState::new(config.clone(), store.clone(), mailer.clone());

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test port")?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        Ok(Self {
            base_url,
            client: Client::new(),
            store,
            mailer,
            config,
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.get(self.url(path)).bearer_auth(token)
    }

    pub fn post(&self, path: &str, token: &str, body: Value) -> RequestBuilder {
        self.client.post(self.url(path)).bearer_auth(token).json(&body)
    }

    pub fn put(&self, path: &str, token: &str, body: Value) -> RequestBuilder {
        self.client.put(self.url(path)).bearer_auth(token).json(&body)
    }

    pub fn delete(&self, path: &str, token: &str) -> RequestBuilder {
        self.client.delete(self.url(path)).bearer_auth(token)
    }

    /// Register through the API and return the session token
    pub async fn register(&self, name: &str, email: &str) -> Result<String> {
        let resp = self
            .client
            .post(self.url("/api/auth/register"))
            .json(&json!({ "name": name, "email": email, "password": "secret123" }))
            .send()
            .await?;
        anyhow::ensure!(resp.status() == StatusCode::CREATED, "register failed: {}", resp.status());
        token_of(resp).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Response> {
        Ok(self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?)
    }

    /// Admins cannot be registered through the API
    pub async fn admin(&self) -> Result<String> {
        let input = NewUser {
            name: Some("Admin".to_string()),
            email: Some("admin@example.com".to_string()),
            password: Some("secret123".to_string()),
            role: Some(Role::Admin),
        };
        user_service::create_user(&self.store, &self.config.security, input)
            .await
            .map_err(|e| anyhow::anyhow!(e.message().to_string()))?;

        let resp = self.login("admin@example.com", "secret123").await?;
        token_of(resp).await
    }

    pub async fn user_id(&self, token: &str) -> Result<String> {
        let body = json_of(self.get("/api/auth/me", token).send().await?).await?;
        body["data"]["id"].as_str().map(str::to_string).context("me has no id")
    }

    pub async fn create_card(&self, token: &str, body: Value) -> Result<Value> {
        let resp = self.post("/api/cards", token, body).send().await?;
        anyhow::ensure!(resp.status() == StatusCode::CREATED, "create card failed: {}", resp.status());
        Ok(json_of(resp).await?["data"].clone())
    }
}

pub async fn json_of(resp: Response) -> Result<Value> {
    resp.json::<Value>().await.context("response body is not JSON")
}

pub async fn token_of(resp: Response) -> Result<String> {
    let body = json_of(resp).await?;
    body["token"].as_str().map(str::to_string).context("response has no token")
}

pub fn id_of(value: &Value) -> String {
    value["id"].as_str().unwrap_or_default().to_string()
}
