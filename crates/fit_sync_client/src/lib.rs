//! `FitnessService` trait, wire types and a reqwest-based implementation for a
//! Google Fit style sync backend.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

pub mod config;
pub mod http_client;
pub mod observability;
pub mod utils;

#[derive(Debug, Error)]
pub enum FitSyncError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("authorization failed: {0}")]
    Auth(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl FitSyncError {
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            401 | 403 => FitSyncError::Auth(body),
            404 => FitSyncError::NotFound(body),
            429 => FitSyncError::RateLimited(body),
            _ => FitSyncError::Status { status, body },
        }
    }

    /// Short label used for metrics and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            FitSyncError::Http(_) => "http",
            FitSyncError::Auth(_) => "auth",
            FitSyncError::NotFound(_) => "not_found",
            FitSyncError::RateLimited(_) => "rate_limited",
            FitSyncError::Status { .. } => "status",
            FitSyncError::Decode(_) => "decode",
            FitSyncError::Config(_) => "config",
        }
    }
}

/// One row of the fitness data collection.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct FitnessEntry {
    pub name: String,
    pub steps: u64,
    pub calories: f64,
}

/// Remote-reported synchronization state. Each poll replaces the previous
/// value wholesale.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub syncing: bool,
    #[serde(default, deserialize_with = "deserialize_sync_time")]
    pub last_sync_time: Option<DateTime<Utc>>,
}

fn deserialize_sync_time<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value: Option<serde_json::Value> = Option::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => utils::parse_sync_timestamp(&v)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("unrecognized lastSyncTime: {v}"))),
    }
}

/// Calling contract toward the remote fitness service.
///
/// Every method is a single remote round trip; implementors must not retry.
#[async_trait]
pub trait FitnessService: Send + Sync + 'static {
    /// Whether the account link is currently established.
    async fn is_connected(&self) -> Result<bool, FitSyncError>;

    /// Run the OAuth-gated connect flow. `Ok(false)` means the provider
    /// declined or the user cancelled.
    async fn connect(&self) -> Result<bool, FitSyncError>;

    /// Revoke the account link.
    async fn disconnect(&self) -> Result<bool, FitSyncError>;

    async fn get_fitness_data(&self) -> Result<Vec<FitnessEntry>, FitSyncError>;

    async fn get_sync_status(&self) -> Result<SyncStatus, FitSyncError>;
}
