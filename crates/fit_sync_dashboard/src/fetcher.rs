//! One-shot load of the fitness data collection.

use fit_sync_client::observability::record_fetch;
use fit_sync_client::{FitnessEntry, FitnessService};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::error::{DashboardError, DashboardResult};
use crate::scope::{InFlight, Scope};
use crate::state::FetchState;

pub struct DataFetcher {
    service: Arc<dyn FitnessService>,
    state: watch::Sender<FetchState>,
    in_flight: InFlight,
    scope: Scope,
}

/// Resets `loading` when a load ends, including when its future is dropped.
struct LoadingGuard<'a> {
    fetcher: &'a DataFetcher,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let still_loading = self.fetcher.in_flight.exit();
        self.fetcher.apply(|s| s.loading = still_loading);
    }
}

impl DataFetcher {
    pub fn new(service: Arc<dyn FitnessService>, scope: Scope) -> Self {
        let (state, _) = watch::channel(FetchState::default());
        Self {
            service,
            state,
            in_flight: InFlight::default(),
            scope,
        }
    }

    pub fn state(&self) -> FetchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.state.subscribe()
    }

    /// Fetch the collection once and publish the outcome.
    ///
    /// The result replaces any previous data wholesale; on failure the data is
    /// cleared and the error message published. Nothing is retried.
    #[instrument(skip(self))]
    pub async fn load(&self) -> DashboardResult<Vec<FitnessEntry>> {
        if !self.scope.is_mounted() {
            return Err(DashboardError::Unmounted);
        }
        self.in_flight.enter();
        let _loading = LoadingGuard { fetcher: self };
        self.apply(|s| {
            s.loading = true;
            s.error = None;
        });

        match self.service.get_fitness_data().await {
            Ok(data) => {
                debug!(rows = data.len(), "fitness data loaded");
                record_fetch(if data.is_empty() { "empty" } else { "success" });
                let published = data.clone();
                self.apply(move |s| {
                    s.data = Some(published);
                    s.error = None;
                });
                Ok(data)
            }
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "failed to load fitness data");
                record_fetch("error");
                let message = e.to_string();
                self.apply(move |s| {
                    s.data = None;
                    s.error = Some(message);
                });
                Err(e.into())
            }
        }
    }

    fn apply(&self, f: impl FnOnce(&mut FetchState)) {
        self.scope.apply(|| self.state.send_modify(f));
    }
}
