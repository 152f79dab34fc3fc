#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use bmup_setting::config::AppConfig;
use bmup_setting::database::MemoryMemberStore;
use bmup_setting::{router, AppState};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio::net::TcpListener;

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get_json(&self, path: &str) -> Result<(StatusCode, Value)> {
        let res = self.client.get(self.url(path)).send().await?;
        let status = res.status();
        Ok((status, res.json::<Value>().await?))
    }

    /// Creates a member and returns the stored record.
    pub async fn create_member(&self, body: &Value) -> Result<Value> {
        let res = self
            .client
            .post(self.url("/api/setting/members"))
            .json(body)
            .send()
            .await?;
        let status = res.status();
        let payload = res.json::<Value>().await?;
        anyhow::ensure!(status == StatusCode::CREATED, "create failed ({}): {}", status, payload);
        Ok(payload["data"].clone())
    }

    /// Seeds `User 1..=n` with usernames `user_1..=user_n`.
    pub async fn seed_users(&self, n: usize) -> Result<Vec<Value>> {
        let mut created = Vec::with_capacity(n);
        for i in 1..=n {
            created.push(self.create_member(&member_body(&format!("User {}", i), &format!("user_{}", i))).await?);
        }
        Ok(created)
    }
}

pub fn member_body(name: &str, username: &str) -> Value {
    json!({
        "name": name,
        "username": username,
        "gender": "Female",
        "birthdate": "1990-04-12",
        "address": "Jl. Merdeka 1",
        "phone": "08123456789",
        "active": true
    })
}

/// Starts an isolated server backed by the in-memory store on the current runtime.
/// Rate limiting is off so seeding never trips it.
pub async fn spawn_server() -> Result<TestServer> {
    let mut config = AppConfig::development();
    config.rate_limit.enabled = false;
    spawn_server_with(config).await
}

pub async fn spawn_server_with(config: AppConfig) -> Result<TestServer> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .context("failed to bind test listener")?;

    let app = router(AppState::new(config, Arc::new(MemoryMemberStore::new())));
    tokio::spawn(async move {
        let _ = axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await;
    });

    Ok(TestServer {
        port,
        base_url: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
    })
}
