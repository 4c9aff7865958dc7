// LogWatch - app/signal.rs
//
// Signal bridge: turns an OS interrupt (Ctrl-C, and SIGTERM on Unix) into a
// single firing of the shared `CancellationToken`.
//
// The handler runs on the `ctrlc` crate's dedicated thread. Only the first
// interrupt fires the token; later ones are counted and otherwise ignored.
// Other parties (an explicit shutdown request from a library caller) can
// fire the same token directly; the bridge does not need to be involved.

use crate::app::cancel::CancellationToken;
use crate::util::error::SignalError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub struct SignalBridge {
    token: CancellationToken,
    interrupts: AtomicUsize,
}

impl SignalBridge {
    /// A bridge for `token` that is not yet connected to any OS signal.
    pub fn new(token: CancellationToken) -> Self {
        Self {
            token,
            interrupts: AtomicUsize::new(0),
        }
    }

    /// Register the process-wide interrupt handler.
    ///
    /// Can succeed at most once per process.
    pub fn install(token: CancellationToken) -> Result<Arc<Self>, SignalError> {
        let bridge = Arc::new(Self::new(token));
        let handler = Arc::clone(&bridge);
        ctrlc::set_handler(move || handler.on_interrupt())?;
        tracing::debug!("Signal bridge installed");
        Ok(bridge)
    }

    /// Handle one interrupt. Fires the token on the first call only.
    pub fn on_interrupt(&self) {
        let n = self.interrupts.fetch_add(1, Ordering::SeqCst) + 1;
        if self.token.cancel() {
            tracing::info!("Interrupt received, shutting down");
        } else {
            tracing::debug!(interrupts = n, "Repeated interrupt ignored");
        }
    }

    /// Number of interrupts delivered so far.
    pub fn interrupts(&self) -> usize {
        self.interrupts.load(Ordering::SeqCst)
    }
}
