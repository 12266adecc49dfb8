//! Observable display settings.
//!
//! One store is created at startup and handed to every view that needs it.
//! Setters notify subscribers only when a value actually changes.

use fit_sync_client::config::Config;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

#[derive(Debug, Serialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplaySettings {
    pub dark_mode: bool,
    pub compact: bool,
}

#[derive(Clone, Debug)]
pub struct SettingsStore {
    tx: Arc<watch::Sender<DisplaySettings>>,
}

impl SettingsStore {
    pub fn init(initial: DisplaySettings) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::init(DisplaySettings {
            dark_mode: cfg.dark_mode,
            compact: cfg.compact,
        })
    }

    pub fn current(&self) -> DisplaySettings {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<DisplaySettings> {
        self.tx.subscribe()
    }

    pub fn set_dark_mode(&self, on: bool) {
        self.update(|s| s.dark_mode = on);
    }

    pub fn set_compact(&self, on: bool) {
        self.update(|s| s.compact = on);
    }

    /// Flip dark mode and return the new value.
    pub fn toggle_dark_mode(&self) -> bool {
        let mut now = false;
        self.update(|s| {
            s.dark_mode = !s.dark_mode;
            now = s.dark_mode;
        });
        now
    }

    fn update(&self, f: impl FnOnce(&mut DisplaySettings)) {
        self.tx.send_if_modified(|s| {
            let before = *s;
            f(s);
            before != *s
        });
    }
}
