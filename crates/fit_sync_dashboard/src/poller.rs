//! Recurring sync-status poll bound to a view's lifetime.
//!
//! `StatusPoller::start` issues one check immediately and then one per
//! interval. Ticks run independently, so a slow tick may overlap the next one;
//! whichever completes last wins. A failing tick is logged and counted, and the
//! next scheduled tick is its retry.
//!
//! `stop` (or dropping the poller) tears the poller's scope down before
//! aborting the timer task, so a tick whose remote call is still in flight can
//! never publish afterwards.

use fit_sync_client::FitnessService;
use fit_sync_client::observability::record_poll_tick;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::scope::Scope;
use crate::state::PollerState;

/// Owned handle to the repeating timer task. Aborts the task when dropped.
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Shortest interval `StatusPoller::start` accepts; shorter ones are raised to it.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct StatusPoller {
    state: watch::Receiver<PollerState>,
    scope: Scope,
    handle: Option<PollHandle>,
}

impl StatusPoller {
    /// Spawn the poll loop on the current tokio runtime.
    pub fn start(service: Arc<dyn FitnessService>, interval: Duration) -> Self {
        let interval = if interval < MIN_POLL_INTERVAL {
            warn!(
                requested = ?interval,
                min = ?MIN_POLL_INTERVAL,
                "poll interval too short, using minimum"
            );
            MIN_POLL_INTERVAL
        } else {
            interval
        };
        let (tx, rx) = watch::channel(PollerState::default());
        let scope = Scope::new();
        let task = tokio::spawn(poll_loop(service, interval, Arc::new(tx), scope.clone()));
        info!(?interval, "status polling started");
        Self {
            state: rx,
            scope,
            handle: Some(PollHandle { task }),
        }
    }

    pub fn state(&self) -> PollerState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollerState> {
        self.state.clone()
    }

    pub fn is_polling(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Cancel polling. Only the first call does anything; it returns `true`.
    pub fn stop(&mut self) -> bool {
        if !self.scope.teardown() {
            return false;
        }
        drop(self.handle.take());
        info!("status polling stopped");
        true
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    service: Arc<dyn FitnessService>,
    interval: Duration,
    tx: Arc<watch::Sender<PollerState>>,
    scope: Scope,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ticks = JoinSet::new();
    let mut seq: u64 = 0;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                seq += 1;
                ticks.spawn(run_tick(seq, service.clone(), tx.clone(), scope.clone()));
            }
            Some(_) = ticks.join_next(), if !ticks.is_empty() => {}
        }
    }
}

async fn run_tick(
    seq: u64,
    service: Arc<dyn FitnessService>,
    tx: Arc<watch::Sender<PollerState>>,
    scope: Scope,
) {
    match service.get_sync_status().await {
        Ok(status) => {
            record_poll_tick(true);
            debug!(tick = seq, syncing = status.syncing, "sync status received");
            // subscribers only hear about a status that differs from the last one
            let applied = scope.apply(|| {
                tx.send_if_modified(|s| {
                    s.updates += 1;
                    let changed = s.status.as_ref() != Some(&status);
                    s.status = Some(status);
                    changed
                })
            });
            if applied.is_none() {
                debug!(tick = seq, "poller stopped, dropping status");
            }
        }
        Err(e) => {
            record_poll_tick(false);
            warn!(tick = seq, error = %e, kind = e.kind(), "sync status check failed");
            scope.apply(|| {
                tx.send_if_modified(|s| {
                    s.failures += 1;
                    false
                })
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ScriptedService, backend_error};
    use chrono::{TimeZone, Utc};
    use fit_sync_client::SyncStatus;
    use std::sync::atomic::Ordering;

    const INTERVAL: Duration = Duration::from_millis(5000);

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn first_check_is_immediate() {
        let svc = Arc::new(ScriptedService::default());
        svc.push_status(Ok(SyncStatus {
            syncing: true,
            last_sync_time: None,
        }));
        let poller = StatusPoller::start(svc.clone(), INTERVAL);
        settle().await;
        let state = poller.state();
        assert_eq!(state.updates, 1);
        assert!(state.status.unwrap().syncing);
        assert_eq!(svc.status_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn one_update_per_tick() {
        let svc = Arc::new(ScriptedService::default());
        let poller = StatusPoller::start(svc.clone(), INTERVAL);
        // ticks at 0s, 5s, 10s
        tokio::time::sleep(Duration::from_millis(12_000)).await;
        assert_eq!(poller.state().updates, 3);
        assert_eq!(svc.status_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn status_is_replaced_not_merged() {
        let t = Utc.with_ymd_and_hms(2025, 3, 1, 8, 30, 0).unwrap();
        let svc = Arc::new(ScriptedService::default());
        svc.push_status(Ok(SyncStatus {
            syncing: false,
            last_sync_time: Some(t),
        }))
        .push_status(Ok(SyncStatus {
            syncing: true,
            last_sync_time: None,
        }));
        let poller = StatusPoller::start(svc, INTERVAL);
        settle().await;
        assert_eq!(poller.state().status.unwrap().last_sync_time, Some(t));
        tokio::time::sleep(INTERVAL).await;
        let status = poller.state().status.unwrap();
        assert!(status.syncing);
        assert!(status.last_sync_time.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_tick_is_swallowed_and_retried_next_tick() {
        let svc = Arc::new(ScriptedService::default());
        svc.push_status(Err(backend_error()));
        let poller = StatusPoller::start(svc.clone(), INTERVAL);
        let rx = poller.subscribe();
        settle().await;
        let state = poller.state();
        assert_eq!(state.failures, 1);
        assert_eq!(state.updates, 0);
        assert!(state.status.is_none());
        assert!(!rx.has_changed().unwrap());

        tokio::time::sleep(INTERVAL).await;
        assert_eq!(poller.state().updates, 1);
        assert!(rx.has_changed().unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn no_updates_after_stop() {
        let svc = Arc::new(ScriptedService::default());
        let mut poller = StatusPoller::start(svc.clone(), INTERVAL);
        settle().await;
        assert_eq!(poller.state().updates, 1);

        assert!(poller.stop());
        assert!(!poller.stop());
        assert!(!poller.is_polling());
        tokio::time::sleep(INTERVAL * 4).await;
        assert_eq!(poller.state().updates, 1);
        assert_eq!(svc.status_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_while_tick_in_flight_drops_result() {
        let svc = Arc::new(ScriptedService {
            status_delay: Some(Duration::from_millis(1000)),
            ..Default::default()
        });
        let mut poller = StatusPoller::start(svc.clone(), INTERVAL);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(svc.status_calls.load(Ordering::SeqCst), 1);

        poller.stop();
        tokio::time::sleep(INTERVAL * 2).await;
        let state = poller.state();
        assert_eq!(state.updates, 0);
        assert!(state.status.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_ticks_overlap_and_completion_order_wins() {
        // every call outlasts the interval, so tick 2 starts before tick 1 lands
        let svc = Arc::new(ScriptedService {
            status_delay: Some(Duration::from_millis(7000)),
            ..Default::default()
        });
        svc.push_status(Ok(SyncStatus {
            syncing: true,
            last_sync_time: None,
        }));
        let poller = StatusPoller::start(svc.clone(), INTERVAL);
        // tick 1 at 0s completes at 7s, tick 2 at 5s completes at 12s
        tokio::time::sleep(Duration::from_millis(8000)).await;
        assert_eq!(svc.status_calls.load(Ordering::SeqCst), 2);
        assert!(poller.state().status.unwrap().syncing);
        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert!(!poller.state().status.unwrap().syncing);
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_status_does_not_notify() {
        let svc = Arc::new(ScriptedService::default());
        let poller = StatusPoller::start(svc.clone(), INTERVAL);
        settle().await;
        let mut rx = poller.subscribe();
        assert!(rx.borrow_and_update().status.is_some());

        tokio::time::sleep(INTERVAL * 2).await;
        assert_eq!(poller.state().updates, 3);
        assert!(!rx.has_changed().unwrap());

        svc.push_status(Ok(SyncStatus {
            syncing: true,
            last_sync_time: None,
        }));
        tokio::time::sleep(INTERVAL).await;
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().status.as_ref().unwrap().syncing);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_is_raised_to_minimum() {
        let svc = Arc::new(ScriptedService::default());
        let poller = StatusPoller::start(svc.clone(), Duration::ZERO);
        // ticks at 0, 100ms and 200ms
        tokio::time::sleep(MIN_POLL_INTERVAL * 2 + Duration::from_millis(50)).await;
        assert!(poller.is_polling());
        assert_eq!(poller.state().updates, 3);
        assert_eq!(svc.status_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_poller_cancels_timer() {
        let svc = Arc::new(ScriptedService::default());
        let poller = StatusPoller::start(svc.clone(), INTERVAL);
        settle().await;
        drop(poller);
        tokio::time::sleep(INTERVAL * 3).await;
        assert_eq!(svc.status_calls.load(Ordering::SeqCst), 1);
    }
}
