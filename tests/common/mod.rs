#![allow(dead_code)]

use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::{RequestBuilder, StatusCode};
use serde_json::{json, Value};

use article_api::config::AppConfig;
use article_api::database::MemoryStore;
use article_api::state::AppState;

pub const JWT_SECRET: &str = "integration-test-secret";

/// A server running inside the test's runtime on its own port and its own
/// empty memory store.
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut config = AppConfig::development();
        config.security.jwt_secret = JWT_SECRET.to_string();
        config.security.bcrypt_cost = 4;

        let state = AppState::new(config, Arc::new(MemoryStore::new()));
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test listener")?;
        tokio::spawn(async move {
            axum::serve(listener, article_api::app(state))
                .await
                .expect("test server failed");
        });

        Ok(Self {
            port,
            base_url,
            client: reqwest::Client::new(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.client.put(self.url(path))
    }

    pub fn patch(&self, path: &str) -> RequestBuilder {
        self.client.patch(self.url(path))
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.client.delete(self.url(path))
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<StatusCode> {
        let res = self
            .post("/register")
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        Ok(res.status())
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<String> {
        let res = self
            .post("/login")
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "login failed: {}", res.status());

        let body: Value = res.json().await?;
        body["token"]
            .as_str()
            .map(str::to_string)
            .context("login response has no token")
    }

    /// Register `username` and return a bearer token for it
    pub async fn user(&self, username: &str) -> Result<String> {
        let status = self.register(username, "password").await?;
        anyhow::ensure!(status == StatusCode::OK, "register failed: {}", status);
        self.login(username, "password").await
    }

    pub async fn create_article(&self, token: &str, title: &str, content: &str) -> Result<StatusCode> {
        let res = self
            .post("/articles")
            .bearer_auth(token)
            .json(&json!({ "title": title, "content": content }))
            .send()
            .await?;
        Ok(res.status())
    }

    pub async fn list_articles(&self, token: &str) -> Result<Value> {
        let res = self.get("/articles").bearer_auth(token).send().await?;
        anyhow::ensure!(res.status() == StatusCode::OK, "list failed: {}", res.status());
        Ok(res.json().await?)
    }
}
