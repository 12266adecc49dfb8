//! Metric names and recording helpers shared by the sync components.
//!
//! Recording is a no-op until the host installs a `metrics` recorder.

pub const POLL_TICKS: &str = "fit_sync_poll_ticks_total";
pub const POLL_FAILURES: &str = "fit_sync_poll_failures_total";
pub const FETCH_TOTAL: &str = "fit_sync_fetch_total";
pub const CONNECTION_CHANGES: &str = "fit_sync_connection_changes_total";

pub fn record_poll_tick(ok: bool) {
    metrics::counter!(POLL_TICKS).increment(1);
    if !ok {
        metrics::counter!(POLL_FAILURES).increment(1);
    }
}

pub fn record_fetch(outcome: &'static str) {
    metrics::counter!(FETCH_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_connection_change(action: &'static str, outcome: &'static str) {
    metrics::counter!(CONNECTION_CHANGES, "action" => action, "outcome" => outcome).increment(1);
}
