//! Client singleton lifecycle
//!
//! The shared [`Dispatcher`] is process-wide state with a documented
//! lifecycle rather than an ambient global:
//!
//! ```text
//! Uninitialized ──first caller──▶ Initializing ──success──▶ Ready
//!       ▲                              │
//!       └───────────failure────────────┘
//! ```
//!
//! The first caller runs the initialization routine; every caller racing it
//! awaits the same in-flight attempt and observes the same outcome — one
//! instance on success, the same error on failure. Failure returns the cell
//! to `Uninitialized` so a later call can try again. `reset()` is the only
//! way to leave `Ready` and exists for tests.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::dispatcher::Dispatcher;
use crate::error::{ApiError, Result};

type InitOutcome = Option<Result<Arc<Dispatcher>>>;

enum Lifecycle {
    Uninitialized,
    Initializing(watch::Receiver<InitOutcome>),
    Ready(Arc<Dispatcher>),
}

/// Guarded lazy-initialization cell for the shared dispatcher
///
/// Const-constructible so it can back a process-wide `static`; see
/// [`shared`].
pub struct ClientCell {
    state: Mutex<Lifecycle>,
}

impl ClientCell {
    /// Create an empty cell in the `Uninitialized` state
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(Lifecycle::Uninitialized),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Lifecycle> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// The instance, initializing it exactly once if needed
    ///
    /// `init` runs only for the caller that finds the cell `Uninitialized`;
    /// concurrent callers await that attempt's outcome. On failure every
    /// waiter receives the same error and the cell resets.
    pub async fn get_or_init<F, Fut>(&self, init: F) -> Result<Arc<Dispatcher>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Dispatcher>>,
    {
        enum Role {
            Lead(watch::Sender<InitOutcome>),
            Wait(watch::Receiver<InitOutcome>),
        }

        let role = {
            let mut state = self.lock();
            match &*state {
                Lifecycle::Ready(dispatcher) => return Ok(Arc::clone(dispatcher)),
                Lifecycle::Initializing(rx) => Role::Wait(rx.clone()),
                Lifecycle::Uninitialized => {
                    let (tx, rx) = watch::channel(None);
                    *state = Lifecycle::Initializing(rx);
                    Role::Lead(tx)
                }
            }
        };

        match role {
            Role::Wait(mut rx) => {
                debug!("awaiting in-flight client initialization");
                loop {
                    if let Some(outcome) = rx.borrow_and_update().clone() {
                        return outcome;
                    }
                    if rx.changed().await.is_err() {
                        // Leader dropped mid-initialization; the drop guard
                        // has already reset the cell.
                        let last = rx.borrow().clone();
                        return last.unwrap_or_else(|| {
                            Err(ApiError::other("client initialization was interrupted"))
                        });
                    }
                }
            }
            Role::Lead(tx) => {
                info!("initializing shared client");
                let mut guard = AbortGuard {
                    cell: self,
                    armed: true,
                };

                let outcome = init().await.map(Arc::new);

                {
                    let mut state = self.lock();
                    *state = match &outcome {
                        Ok(dispatcher) => Lifecycle::Ready(Arc::clone(dispatcher)),
                        Err(e) => {
                            warn!("client initialization failed: {}", e);
                            Lifecycle::Uninitialized
                        }
                    };
                }
                guard.armed = false;

                let _ = tx.send(Some(outcome.clone()));
                outcome
            }
        }
    }

    /// The instance if the cell is `Ready`, without initializing
    pub fn try_get(&self) -> Option<Arc<Dispatcher>> {
        match &*self.lock() {
            Lifecycle::Ready(dispatcher) => Some(Arc::clone(dispatcher)),
            _ => None,
        }
    }

    /// Whether the cell is `Ready`
    pub fn is_ready(&self) -> bool {
        matches!(&*self.lock(), Lifecycle::Ready(_))
    }

    /// Discard the instance, returning to `Uninitialized` (test escape hatch)
    ///
    /// Only `Ready` (and, vacuously, `Uninitialized`) cells transition; an
    /// in-flight initialization owns its own transition and is left alone.
    pub fn reset(&self) {
        let mut state = self.lock();
        if !matches!(&*state, Lifecycle::Initializing(_)) {
            *state = Lifecycle::Uninitialized;
        }
    }
}

impl Default for ClientCell {
    fn default() -> Self {
        Self::new()
    }
}

/// Resets the cell if the leading initializer is dropped before finishing,
/// so waiters and future callers are not stuck in `Initializing`
struct AbortGuard<'a> {
    cell: &'a ClientCell,
    armed: bool,
}

impl Drop for AbortGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("client initialization aborted before completion");
            let mut state = self.cell.lock();
            *state = Lifecycle::Uninitialized;
        }
    }
}

static SHARED: ClientCell = ClientCell::new();

/// The process-wide client cell
///
/// ```rust,ignore
/// let dispatcher = carelink_core::client::shared()
///     .get_or_init(|| async { carelink_http::build_dispatcher(&config) })
///     .await?;
/// ```
pub fn shared() -> &'static ClientCell {
    &SHARED
}
