//! HTTP client implementation for the Google Fit sync backend.
//!
//! This module provides a reqwest-based implementation of the [`FitnessService`](crate::FitnessService) trait.

use crate::config::{Config, DEFAULT_REQUEST_TIMEOUT};
use crate::{FitSyncError, FitnessEntry, FitnessService, SyncStatus};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const API_PREFIX: &str = "/api/google-fit";

/// Client for the sync backend using reqwest.
#[derive(Clone, Debug)]
pub struct ReqwestFitnessService {
    base_url: String,
    api_token: Option<SecretString>,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct StatusPayload {
    connected: bool,
}

#[derive(Deserialize)]
struct OutcomePayload {
    success: bool,
}

impl ReqwestFitnessService {
    /// Create a new client instance.
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the backend (e.g., "http://localhost:3000")
    /// * `api_token` - Optional bearer token sent with every request
    pub fn new(base_url: &str, api_token: Option<SecretString>) -> Result<Self, FitSyncError> {
        Self::with_timeout(base_url, api_token, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        base_url: &str,
        api_token: Option<SecretString>,
        timeout: Duration,
    ) -> Result<Self, FitSyncError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
            client,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self, FitSyncError> {
        Self::with_timeout(&cfg.base_url, cfg.api_token.clone(), cfg.request_timeout)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}/{}", self.base_url, API_PREFIX, endpoint)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token.expose_secret()),
            None => request,
        }
    }

    /// Build an authenticated GET request.
    fn get_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.get(self.url(endpoint)))
    }

    /// Build an authenticated POST request.
    fn post_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        self.authorize(self.client.post(self.url(endpoint)))
    }

    /// Execute a request and expect a JSON response.
    async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, FitSyncError> {
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(self.error_from_response(resp).await);
        }
        let body = resp.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| FitSyncError::Decode(e.to_string()))
    }

    /// Extract error information from a failed response.
    async fn error_from_response(&self, resp: reqwest::Response) -> FitSyncError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let body_snippet: String = body.chars().take(256).collect();
        debug!(status, "fit sync backend returned error status");
        FitSyncError::from_status(status, body_snippet)
    }
}

#[async_trait]
impl FitnessService for ReqwestFitnessService {
    async fn is_connected(&self) -> Result<bool, FitSyncError> {
        let payload: StatusPayload = self.execute_json(self.get_request("status")).await?;
        Ok(payload.connected)
    }

    async fn connect(&self) -> Result<bool, FitSyncError> {
        let payload: OutcomePayload = self.execute_json(self.post_request("connect")).await?;
        Ok(payload.success)
    }

    async fn disconnect(&self) -> Result<bool, FitSyncError> {
        let payload: OutcomePayload = self.execute_json(self.post_request("disconnect")).await?;
        Ok(payload.success)
    }

    async fn get_fitness_data(&self) -> Result<Vec<FitnessEntry>, FitSyncError> {
        self.execute_json(self.get_request("data")).await
    }

    async fn get_sync_status(&self) -> Result<SyncStatus, FitSyncError> {
        self.execute_json(self.get_request("sync-status")).await
    }
}
