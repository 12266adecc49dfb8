//! Lifetime scope shared by a view and the tasks it spawns.
//!
//! A [`Scope`] starts mounted and is torn down exactly once. State updates
//! produced by async work go through [`Scope::apply`], which runs the update
//! under the same lock `teardown` takes, so once `teardown` has returned no
//! update can land.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone, Debug)]
pub struct Scope {
    mounted: Arc<Mutex<bool>>,
}

impl Scope {
    pub fn new() -> Self {
        Self {
            mounted: Arc::new(Mutex::new(true)),
        }
    }

    pub fn is_mounted(&self) -> bool {
        *self.lock()
    }

    /// Run `f` only while the scope is still mounted.
    ///
    /// `f` must not touch this scope again; the lock is held while it runs.
    pub fn apply<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let mounted = self.lock();
        if *mounted { Some(f()) } else { None }
    }

    /// Mark the scope unmounted. Returns `true` only for the call that
    /// actually performed the teardown.
    pub fn teardown(&self) -> bool {
        std::mem::replace(&mut *self.lock(), false)
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.mounted.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

/// Count of overlapping in-flight operations backing a boolean "busy" flag.
#[derive(Debug, Default)]
pub(crate) struct InFlight {
    count: AtomicUsize,
}

impl InFlight {
    pub(crate) fn enter(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }

    /// Returns `true` while other operations are still running.
    pub(crate) fn exit(&self) -> bool {
        self.count.fetch_sub(1, Ordering::SeqCst) > 1
    }
}
