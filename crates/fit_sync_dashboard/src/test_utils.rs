//! Scripted `FitnessService` used by the unit tests in this crate.
//!
//! Each operation pops its next result from a queue and falls back to a
//! fixed default once the queue is empty. Optional delays use tokio time, so
//! tests running on a paused clock stay deterministic.
#![cfg(test)]

use async_trait::async_trait;
use fit_sync_client::{FitSyncError, FitnessEntry, FitnessService, SyncStatus};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub fn entries(n: usize) -> Vec<FitnessEntry> {
    (0..n)
        .map(|i| FitnessEntry {
            name: format!("Activity {}", i + 1),
            steps: 1000 * (i as u64 + 1),
            calories: 50.0 * (i as f64 + 1.0),
        })
        .collect()
}

pub fn backend_error() -> FitSyncError {
    FitSyncError::Status {
        status: 500,
        body: "backend down".into(),
    }
}

#[derive(Default)]
pub struct ScriptedService {
    pub connected: Mutex<VecDeque<Result<bool, FitSyncError>>>,
    pub connect: Mutex<VecDeque<Result<bool, FitSyncError>>>,
    pub disconnect: Mutex<VecDeque<Result<bool, FitSyncError>>>,
    pub data: Mutex<VecDeque<Result<Vec<FitnessEntry>, FitSyncError>>>,
    pub status: Mutex<VecDeque<Result<SyncStatus, FitSyncError>>>,
    pub connect_delay: Option<Duration>,
    pub data_delay: Option<Duration>,
    pub status_delay: Option<Duration>,
    pub connect_calls: AtomicUsize,
    pub disconnect_calls: AtomicUsize,
    pub data_calls: AtomicUsize,
    pub status_calls: AtomicUsize,
}

impl ScriptedService {
    pub fn push_connected(&self, r: Result<bool, FitSyncError>) -> &Self {
        self.connected.lock().unwrap().push_back(r);
        self
    }

    pub fn push_connect(&self, r: Result<bool, FitSyncError>) -> &Self {
        self.connect.lock().unwrap().push_back(r);
        self
    }

    pub fn push_disconnect(&self, r: Result<bool, FitSyncError>) -> &Self {
        self.disconnect.lock().unwrap().push_back(r);
        self
    }

    pub fn push_data(&self, r: Result<Vec<FitnessEntry>, FitSyncError>) -> &Self {
        self.data.lock().unwrap().push_back(r);
        self
    }

    pub fn push_status(&self, r: Result<SyncStatus, FitSyncError>) -> &Self {
        self.status.lock().unwrap().push_back(r);
        self
    }
}

async fn pause(delay: Option<Duration>) {
    if let Some(d) = delay {
        tokio::time::sleep(d).await;
    }
}

#[async_trait]
impl FitnessService for ScriptedService {
    async fn is_connected(&self) -> Result<bool, FitSyncError> {
        let next = self.connected.lock().unwrap().pop_front();
        next.unwrap_or(Ok(false))
    }

    async fn connect(&self) -> Result<bool, FitSyncError> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        pause(self.connect_delay).await;
        let next = self.connect.lock().unwrap().pop_front();
        next.unwrap_or(Ok(true))
    }

    async fn disconnect(&self) -> Result<bool, FitSyncError> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.disconnect.lock().unwrap().pop_front();
        next.unwrap_or(Ok(true))
    }

    async fn get_fitness_data(&self) -> Result<Vec<FitnessEntry>, FitSyncError> {
        self.data_calls.fetch_add(1, Ordering::SeqCst);
        pause(self.data_delay).await;
        let next = self.data.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn get_sync_status(&self) -> Result<SyncStatus, FitSyncError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        pause(self.status_delay).await;
        let next = self.status.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(SyncStatus::default()))
    }
}
