//! Connectivity monitor
//!
//! Polls a [`NetworkStateSource`] at a fixed interval and fans effective
//! state changes out to subscribers. A repeated identical sample produces no
//! notifications; a failed check degrades to the offline state and is
//! logged, never surfaced to subscribers.
//!
//! ## Delivery guarantees
//!
//! Deduplication, callback dispatch, and (un)subscription all serialize on
//! one lock, so:
//! - callbacks for one state change run synchronously, in subscription order
//! - two successive distinct states are never reordered
//! - after `unsubscribe()` returns, the callback will not run again; an
//!   unsubscribe racing an in-progress broadcast waits for it
//!
//! Callbacks must not subscribe or unsubscribe from within themselves.
//!
//! Async consumers can use [`ConnectivityMonitor::watch`] instead of a
//! callback and receive the same states as a stream.

use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use crate::traits::{ConnectivityState, NetworkStateSource};

type Callback = Box<dyn Fn(&ConnectivityState) + Send + Sync + 'static>;

/// Subscriber list plus the last broadcast state, guarded as one unit
struct Fanout {
    last_broadcast: Option<ConnectivityState>,
    next_id: u64,
    subscribers: Vec<(u64, Callback)>,
}

struct MonitorInner {
    source: Arc<dyn NetworkStateSource>,
    fanout: Mutex<Fanout>,
    state_tx: watch::Sender<ConnectivityState>,
}

impl MonitorInner {
    fn lock_fanout(&self) -> MutexGuard<'_, Fanout> {
        match self.fanout.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    async fn check(&self) {
        let state = match self.source.check().await {
            Ok(state) => state,
            Err(e) => {
                warn!("connectivity check failed, treating as offline: {}", e);
                ConnectivityState::offline()
            }
        };
        self.broadcast_if_changed(state);
    }

    fn broadcast_if_changed(&self, state: ConnectivityState) {
        let mut fanout = self.lock_fanout();
        if fanout.last_broadcast.as_ref() == Some(&state) {
            return;
        }
        debug!(
            "connectivity changed: {:?} -> {:?}",
            fanout.last_broadcast, state
        );
        fanout.last_broadcast = Some(state.clone());
        self.state_tx.send_replace(state.clone());
        for (_, callback) in &fanout.subscribers {
            callback(&state);
        }
    }
}

/// Handle returned by [`ConnectivityMonitor::subscribe`]
pub struct Subscription {
    id: u64,
    inner: Weak<MonitorInner>,
}

impl Subscription {
    /// Stop delivering notifications to this subscriber
    ///
    /// When this returns, the callback will not be invoked again. Callbacks
    /// already dispatched by an in-progress broadcast are unaffected.
    pub fn unsubscribe(self) {
        if let Some(inner) = self.inner.upgrade() {
            let mut fanout = inner.lock_fanout();
            fanout.subscribers.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Observes device connectivity and broadcasts effective state changes
pub struct ConnectivityMonitor {
    inner: Arc<MonitorInner>,
    state_rx: watch::Receiver<ConnectivityState>,
    poll_interval: Duration,
    poll_task: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectivityMonitor {
    /// Create a monitor over a connectivity source
    pub fn new(source: Arc<dyn NetworkStateSource>, poll_interval: Duration) -> Self {
        let (state_tx, state_rx) = watch::channel(ConnectivityState::offline());
        Self {
            inner: Arc::new(MonitorInner {
                source,
                fanout: Mutex::new(Fanout {
                    last_broadcast: None,
                    next_id: 0,
                    subscribers: Vec::new(),
                }),
                state_tx,
            }),
            state_rx,
            poll_interval,
            poll_task: Mutex::new(None),
        }
    }

    /// Begin monitoring: one immediate check, then periodic polling
    ///
    /// Calling `start` while already running is a no-op; concurrent calls
    /// elect exactly one poll task. Returns once the baseline check has run.
    pub async fn start(&self) {
        let (ready_tx, ready_rx) = oneshot::channel();

        // The poll-task slot is claimed under the lock, before any await, so
        // racing starters cannot both spawn a poller.
        {
            let mut task = match self.poll_task.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if task.as_ref().is_some_and(|t| !t.is_finished()) {
                return;
            }

            let inner = Arc::clone(&self.inner);
            let poll_interval = self.poll_interval;
            let handle = tokio::spawn(async move {
                info!("connectivity monitoring started (interval {:?})", poll_interval);

                // Baseline before the poll loop takes over.
                inner.check().await;
                let _ = ready_tx.send(());

                let mut ticker = tokio::time::interval(poll_interval);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                // The first tick completes immediately and would double the
                // baseline check.
                ticker.tick().await;
                loop {
                    ticker.tick().await;
                    inner.check().await;
                }
            });
            *task = Some(handle);
        }

        let _ = ready_rx.await;
    }

    /// Stop periodic polling
    pub fn stop(&self) {
        let handle = match self.poll_task.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            handle.abort();
            info!("connectivity monitoring stopped");
        }
    }

    /// Register a callback for effective state changes
    ///
    /// The callback fires only on transitions observed after registration;
    /// read [`state`](Self::state) for the current value.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&ConnectivityState) + Send + Sync + 'static,
    {
        let mut fanout = self.inner.lock_fanout();
        let id = fanout.next_id;
        fanout.next_id += 1;
        fanout.subscribers.push((id, Box::new(callback)));
        Subscription {
            id,
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Current connectivity state
    pub fn state(&self) -> ConnectivityState {
        self.state_rx.borrow().clone()
    }

    /// Stream of connectivity states for async consumers
    ///
    /// Yields the current state first, then every subsequent change.
    pub fn watch(&self) -> WatchStream<ConnectivityState> {
        WatchStream::new(self.state_rx.clone())
    }

    /// Run one check immediately, outside the poll schedule
    pub async fn check_now(&self) {
        self.inner.check().await;
    }
}

impl Drop for ConnectivityMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}
