use fit_sync_client::{FitnessEntry, SyncStatus};
use serde::Serialize;

#[derive(Debug, Serialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub connected: bool,
    /// A connect or disconnect call is in flight.
    pub pending: bool,
}

#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct PollerState {
    /// Latest applied status; `None` until the first tick succeeds.
    pub status: Option<SyncStatus>,
    pub updates: u64,
    pub failures: u64,
}

#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct FetchState {
    pub loading: bool,
    pub data: Option<Vec<FitnessEntry>>,
    pub error: Option<String>,
}

/// What the data section should show, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    Idle,
    Loading,
    Failed,
    Empty,
    Loaded,
}

impl FetchState {
    pub fn phase(&self) -> FetchPhase {
        if self.loading {
            return FetchPhase::Loading;
        }
        if self.error.is_some() {
            return FetchPhase::Failed;
        }
        match &self.data {
            None => FetchPhase::Idle,
            Some(d) if d.is_empty() => FetchPhase::Empty,
            Some(_) => FetchPhase::Loaded,
        }
    }
}

/// Point-in-time copy of everything the view renders.
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct DashboardSnapshot {
    pub connection: ConnectionState,
    pub polling: bool,
    pub sync: Option<SyncStatus>,
    pub fetch: FetchState,
}
