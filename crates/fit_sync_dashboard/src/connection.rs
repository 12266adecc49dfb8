//! Account-link lifecycle for the remote fitness service.
//!
//! `connected` only ever changes after the remote confirms a connect or
//! disconnect. Failures are logged and reported as `false`; they never reach
//! the caller as errors.

use fit_sync_client::FitnessService;
use fit_sync_client::observability::record_connection_change;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{info, instrument, warn};

use crate::scope::{InFlight, Scope};
use crate::state::ConnectionState;

pub struct ConnectionManager {
    service: Arc<dyn FitnessService>,
    state: watch::Sender<ConnectionState>,
    connect_lock: Mutex<()>,
    in_flight: InFlight,
    scope: Scope,
}

/// Clears `pending` once the last in-flight call finishes, however it ends.
struct PendingGuard<'a> {
    manager: &'a ConnectionManager,
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let still_pending = self.manager.in_flight.exit();
        self.manager.apply(|s| s.pending = still_pending);
    }
}

impl ConnectionManager {
    pub fn new(service: Arc<dyn FitnessService>, scope: Scope) -> Self {
        let (state, _) = watch::channel(ConnectionState::default());
        Self {
            service,
            state,
            connect_lock: Mutex::new(()),
            in_flight: InFlight::default(),
            scope,
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state.borrow().connected
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    /// Ask the remote whether the account is linked. A failed check counts as
    /// "not connected"; the user can still run `connect()`.
    #[instrument(skip(self))]
    pub async fn check_initial_status(&self) -> ConnectionState {
        let connected = match self.service.is_connected().await {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "initial connection check failed");
                false
            }
        };
        self.apply(|s| s.connected = connected);
        info!(connected, "initial connection status");
        self.state()
    }

    /// Run the connect flow. Returns `true` only when the remote confirmed.
    ///
    /// A call made while another connect is still in flight returns `false`
    /// right away without reaching the remote.
    #[instrument(skip(self))]
    pub async fn connect(&self) -> bool {
        let Ok(_attempt) = self.connect_lock.try_lock() else {
            warn!("connect already in progress");
            return false;
        };
        let _pending = self.begin();

        match self.service.connect().await {
            Ok(true) => {
                self.apply(|s| s.connected = true);
                record_connection_change("connect", "confirmed");
                info!("connected");
                true
            }
            Ok(false) => {
                record_connection_change("connect", "declined");
                info!("connect declined or cancelled");
                false
            }
            Err(e) => {
                record_connection_change("connect", "error");
                warn!(error = %e, kind = e.kind(), "connect failed");
                false
            }
        }
    }

    /// Revoke the link. On failure the state stays as it was.
    #[instrument(skip(self))]
    pub async fn disconnect(&self) -> bool {
        let _pending = self.begin();

        match self.service.disconnect().await {
            Ok(true) => {
                self.apply(|s| s.connected = false);
                record_connection_change("disconnect", "confirmed");
                info!("disconnected");
                true
            }
            Ok(false) => {
                record_connection_change("disconnect", "declined");
                info!("disconnect not confirmed");
                false
            }
            Err(e) => {
                record_connection_change("disconnect", "error");
                warn!(error = %e, kind = e.kind(), "disconnect failed");
                false
            }
        }
    }

    fn begin(&self) -> PendingGuard<'_> {
        self.in_flight.enter();
        self.apply(|s| s.pending = true);
        PendingGuard { manager: self }
    }

    fn apply(&self, f: impl FnOnce(&mut ConnectionState)) {
        self.scope.apply(|| {
            self.state.send_if_modified(|s| {
                let before = *s;
                f(s);
                before != *s
            })
        });
    }
}
