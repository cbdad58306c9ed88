#![allow(dead_code)]

use service_core::config::Config as CoreConfig;
use user_service::config::{StoreBackend, StoreConfig, UserServiceConfig};
use user_service::services::StoreHandle;
use user_service::startup::Application;

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub store: StoreHandle,
    pub client: reqwest::Client,
}

pub fn test_config() -> UserServiceConfig {
    UserServiceConfig {
        common: CoreConfig {
            port: 0, // Random port for testing
            ..CoreConfig::default()
        },
        store: StoreConfig {
            backend: StoreBackend::Memory,
            ..StoreConfig::default()
        },
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(test_config()).await
    }

    pub async fn spawn_with(config: UserServiceConfig) -> Self {
        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let store = app.store().clone();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server by polling the liveness endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
        }

        TestApp {
            address,
            port,
            store,
            client,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn create_user(&self, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .post(self.url("/users"))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Creates a user and returns the generated id.
    pub async fn create_user_id(&self, body: &serde_json::Value) -> String {
        let response = self.create_user(body).await;
        assert_eq!(response.status(), reqwest::StatusCode::CREATED);
        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        body["id"].as_str().expect("missing id").to_string()
    }

    pub async fn get_user(&self, id: &str) -> reqwest::Response {
        self.client
            .get(self.url(&format!("/users/{}", id)))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn update_user(&self, id: &str, body: &serde_json::Value) -> reqwest::Response {
        self.client
            .put(self.url(&format!("/users/{}", id)))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete_user(&self, id: &str) -> reqwest::Response {
        self.client
            .delete(self.url(&format!("/users/{}", id)))
            .send()
            .await
            .expect("Failed to execute request")
    }
}

pub fn is_generated_key(id: &str) -> bool {
    id.strip_prefix("user::")
        .map(|millis| !millis.is_empty() && millis.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}
