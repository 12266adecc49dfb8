//! View binding: wires connection, polling and fetching to one view lifetime
//! and renders their combined state as text.

use fit_sync_client::FitnessService;
use fit_sync_client::config::{Config, DEFAULT_POLL_INTERVAL};
use fit_sync_client::utils::format_sync_time;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::connection::ConnectionManager;
use crate::fetcher::DataFetcher;
use crate::poller::StatusPoller;
use crate::scope::Scope;
use crate::settings::{DisplaySettings, SettingsStore};
use crate::state::{ConnectionState, DashboardSnapshot, FetchPhase, FetchState, PollerState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewOptions {
    pub poll_interval: Duration,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ViewOptions {
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            poll_interval: cfg.poll_interval,
        }
    }
}

pub struct ViewBinding {
    service: Arc<dyn FitnessService>,
    options: ViewOptions,
    scope: Scope,
    settings: SettingsStore,
    connection: ConnectionManager,
    fetcher: DataFetcher,
    poller: Mutex<Option<StatusPoller>>,
    poller_feed: watch::Sender<Option<watch::Receiver<PollerState>>>,
}

impl ViewBinding {
    /// Build an idle view. Nothing talks to the remote until [`start`](Self::start).
    pub fn new(
        service: Arc<dyn FitnessService>,
        options: ViewOptions,
        settings: SettingsStore,
    ) -> Self {
        let scope = Scope::new();
        let (poller_feed, _) = watch::channel(None);
        Self {
            connection: ConnectionManager::new(service.clone(), scope.clone()),
            fetcher: DataFetcher::new(service.clone(), scope.clone()),
            service,
            options,
            scope,
            settings,
            poller: Mutex::new(None),
            poller_feed,
        }
    }

    /// Check the link once and, if it is up, start polling and load the data.
    /// Returns whether the account is linked.
    pub async fn start(&self) -> bool {
        let connected = self.connection.check_initial_status().await.connected;
        if connected {
            self.activate().await;
        }
        info!(connected, "view mounted");
        connected
    }

    /// [`new`](Self::new) followed by [`start`](Self::start).
    pub async fn mount(
        service: Arc<dyn FitnessService>,
        options: ViewOptions,
        settings: SettingsStore,
    ) -> Self {
        let view = Self::new(service, options, settings);
        view.start().await;
        view
    }

    pub fn is_mounted(&self) -> bool {
        self.scope.is_mounted()
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    /// User asked to link the account.
    pub async fn on_connect(&self) -> bool {
        if !self.is_mounted() {
            return false;
        }
        let confirmed = self.connection.connect().await;
        if confirmed {
            self.activate().await;
        }
        confirmed
    }

    /// User asked to unlink the account. Polling stops once the remote
    /// confirms.
    pub async fn on_disconnect(&self) -> bool {
        if !self.is_mounted() {
            return false;
        }
        let confirmed = self.connection.disconnect().await;
        if confirmed {
            self.deactivate();
        }
        confirmed
    }

    /// User asked to reload the data after a failure.
    pub async fn on_retry(&self) -> bool {
        if !self.connection.is_connected() {
            return false;
        }
        self.fetcher.load().await.is_ok()
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        let poller = self.lock_poller();
        DashboardSnapshot {
            connection: self.connection.state(),
            polling: poller.as_ref().is_some_and(StatusPoller::is_polling),
            sync: poller.as_ref().and_then(|p| p.state().status),
            fetch: self.fetcher.state(),
        }
    }

    pub fn render(&self) -> String {
        render(&self.snapshot(), &self.settings.current())
    }

    pub fn watchers(&self) -> ViewWatchers {
        let mut poller_feed = self.poller_feed.subscribe();
        let poller = poller_feed.borrow_and_update().clone();
        ViewWatchers {
            connection: self.connection.subscribe(),
            fetch: self.fetcher.subscribe(),
            settings: self.settings.subscribe(),
            poller_feed,
            poller,
        }
    }

    /// Tear the view down: stop polling and discard any late results.
    pub fn unmount(mut self) {
        self.teardown();
    }

    async fn activate(&self) {
        self.start_poller();
        if let Err(e) = self.fetcher.load().await {
            debug!(error = %e, "initial data load failed");
        }
    }

    fn start_poller(&self) {
        let mut slot = self.lock_poller();
        if slot.is_none() && self.is_mounted() {
            let poller = StatusPoller::start(self.service.clone(), self.options.poll_interval);
            self.poller_feed.send_replace(Some(poller.subscribe()));
            *slot = Some(poller);
        }
    }

    fn deactivate(&self) {
        let stopped = self.lock_poller().take();
        if let Some(mut poller) = stopped {
            poller.stop();
            self.poller_feed.send_replace(None);
        }
    }

    fn teardown(&mut self) {
        if self.scope.teardown() {
            self.deactivate();
            info!("view unmounted");
        }
    }

    fn lock_poller(&self) -> MutexGuard<'_, Option<StatusPoller>> {
        self.poller.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ViewBinding {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Receivers for every piece of state a view renders. The poller receiver
/// follows the view as polling starts and stops.
pub struct ViewWatchers {
    connection: watch::Receiver<ConnectionState>,
    fetch: watch::Receiver<FetchState>,
    settings: watch::Receiver<DisplaySettings>,
    poller_feed: watch::Receiver<Option<watch::Receiver<PollerState>>>,
    poller: Option<watch::Receiver<PollerState>>,
}

impl ViewWatchers {
    /// Wait until any watched state changes. Returns `false` once the view
    /// that produced these receivers is gone.
    pub async fn changed(&mut self) -> bool {
        loop {
            let Self {
                connection,
                fetch,
                settings,
                poller_feed,
                poller,
            } = &mut *self;
            let poller_changed = async {
                match poller {
                    Some(rx) => rx.changed().await.is_ok(),
                    None => std::future::pending().await,
                }
            };
            tokio::select! {
                r = connection.changed() => return r.is_ok(),
                r = fetch.changed() => return r.is_ok(),
                r = settings.changed() => return r.is_ok(),
                r = poller_feed.changed() => {
                    if r.is_err() {
                        return false;
                    }
                    *poller = poller_feed.borrow_and_update().clone();
                    return true;
                }
                alive = poller_changed => {
                    if alive {
                        return true;
                    }
                    // stopped poller; a new one arrives through the feed
                    *poller = None;
                }
            }
        }
    }
}

const TITLE: &str = "Fitness Dashboard";

/// Render a snapshot. Pure: the same inputs always give the same text.
pub fn render(snapshot: &DashboardSnapshot, settings: &DisplaySettings) -> String {
    let mut out = Vec::new();
    out.push(if settings.dark_mode {
        format!("\x1b[7m {TITLE} \x1b[0m")
    } else {
        format!("== {TITLE} ==")
    });
    out.push(connection_line(&snapshot.connection));

    if !snapshot.connection.connected {
        out.push("Connect Google Fit to see your activity.".to_string());
        return out.join("\n");
    }

    out.push(sync_line(snapshot));
    render_data(&snapshot.fetch, settings, &mut out);
    out.join("\n")
}

fn connection_line(c: &ConnectionState) -> String {
    match (c.pending, c.connected) {
        (true, false) => "Google Fit: connecting...".to_string(),
        (true, true) => "Google Fit: disconnecting...".to_string(),
        (false, true) => "Google Fit: connected  [d] disconnect".to_string(),
        (false, false) => "Google Fit: not connected  [c] connect".to_string(),
    }
}

fn sync_line(snapshot: &DashboardSnapshot) -> String {
    match &snapshot.sync {
        None if snapshot.polling => "Checking sync status...".to_string(),
        None => "Sync status unavailable".to_string(),
        Some(s) if s.syncing => "Syncing...".to_string(),
        Some(s) => match &s.last_sync_time {
            Some(t) => format!("Last synced: {}", format_sync_time(t)),
            None => "Never synced".to_string(),
        },
    }
}

fn render_data(fetch: &FetchState, settings: &DisplaySettings, out: &mut Vec<String>) {
    match fetch.phase() {
        FetchPhase::Idle => {}
        FetchPhase::Loading => out.push("Loading fitness data...".to_string()),
        FetchPhase::Failed => out.push(format!(
            "Failed to load fitness data: {}  [r] retry",
            fetch.error.as_deref().unwrap_or("unknown error")
        )),
        FetchPhase::Empty => out.push("No fitness data available".to_string()),
        FetchPhase::Loaded => {
            for entry in fetch.data.iter().flatten() {
                if settings.compact {
                    out.push(format!(
                        "- {}: {} steps, {:.0} kcal",
                        entry.name, entry.steps, entry.calories
                    ));
                } else {
                    out.push(format!("+ {}", entry.name));
                    out.push(format!("|   steps:    {}", entry.steps));
                    out.push(format!("|   calories: {:.0} kcal", entry.calories));
                }
            }
        }
    }
}
