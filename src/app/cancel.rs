// LogWatch - app/cancel.rs
//
// Process-wide, fire-once cancellation broadcast.
//
// The fired flag is an `AtomicBool` so the hot path (checked once per line by
// every tailer) is a single load. A `Mutex<bool>` + `Condvar` pair lets
// sleepers wake immediately when the token fires instead of finishing their
// poll interval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
struct Shared {
    fired: AtomicBool,
    lock: Mutex<bool>,
    wake: Condvar,
}

/// Cloneable handle to a shared cancellation signal.
///
/// Fires at most once; stays fired thereafter.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    shared: Arc<Shared>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the token and wake every waiter.
    ///
    /// Returns `true` only for the call that actually fired it.
    pub fn cancel(&self) -> bool {
        let mut fired = self
            .shared
            .lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *fired {
            return false;
        }
        *fired = true;
        self.shared.fired.store(true, Ordering::SeqCst);
        self.shared.wake.notify_all();
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.fired.load(Ordering::SeqCst)
    }

    /// Block the calling thread until the token fires.
    pub fn wait(&self) {
        let guard = self
            .shared
            .lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let _fired = self
            .shared
            .wake
            .wait_while(guard, |fired| !*fired)
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Sleep for up to `timeout`, returning early if the token fires.
    ///
    /// Returns `true` if the token has fired.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut fired = self
            .shared
            .lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Loop guards against spurious wake-ups.
        while !*fired {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let (guard, _) = self
                .shared
                .wake
                .wait_timeout(fired, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            fired = guard;
        }
        true
    }
}
