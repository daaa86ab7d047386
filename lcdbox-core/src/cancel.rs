//! Cooperative cancellation for the exclusive mode task.
//!
//! Cancellation is advisory: the orchestrator raises the token and the mode
//! notices at its next suspension point. Every sleep a mode performs goes
//! through [`CancelToken::guard`], so a raised token turns the sleep into
//! `Err(Cancelled)` which the mode propagates with `?`.
//!
//! ```text
//!   orchestrator            token              mode task
//!        │ cancel() ─────────► flag=1, wake ──► guard(sleep) -> Err(Cancelled)
//!        │                                      restore shared state
//!        │ ◄───────────────── stopped ───────── return
//! ```

use core::cell::Cell;
use core::future::Future;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;

/// Marker error: the running mode was asked to stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cancelled;

/// Cancellation flag shared between the orchestrator and one mode run
pub struct CancelToken<M: RawMutex> {
    requested: Mutex<M, Cell<bool>>,
    wake: Signal<M, ()>,
}

impl<M: RawMutex> Default for CancelToken<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> CancelToken<M> {
    /// Create a token in the not-cancelled state
    pub const fn new() -> Self {
        Self {
            requested: Mutex::new(Cell::new(false)),
            wake: Signal::new(),
        }
    }

    /// Request cancellation and wake a waiting mode
    pub fn cancel(&self) {
        self.requested.lock(|r| r.set(true));
        self.wake.signal(());
    }

    /// Re-arm the token for the next mode run
    pub fn reset(&self) {
        self.requested.lock(|r| r.set(false));
        self.wake.reset();
    }

    /// True once cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.requested.lock(|r| r.get())
    }

    /// Fail fast if cancellation has been requested
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Complete when cancellation is requested
    pub async fn cancelled(&self) {
        while !self.is_cancelled() {
            self.wake.wait().await;
        }
    }

    /// Run `fut` unless cancellation arrives first
    ///
    /// A token that is already raised never polls `fut`.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, Cancelled> {
        self.check()?;
        match select(self.cancelled(), fut).await {
            Either::First(()) => Err(Cancelled),
            Either::Second(output) => Ok(output),
        }
    }
}
