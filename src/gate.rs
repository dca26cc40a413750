//! One-shot readiness signal for a background load.
//!
//! A caller starts a load with [`ReadyGate::prefetch`] and later awaits
//! [`ReadyGate::wait_ready`]. Every waiter is woken when the load finishes,
//! whether it succeeded, failed or was cancelled.
//!
//! The gate moves `Idle -> Loading -> Ready | Failed` and only returns to
//! `Idle` through [`ReadyGate::reset`].

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::{ApiError, GateError};

#[derive(Debug, Clone)]
pub enum Readiness {
    Idle,
    Loading,
    Ready,
    Failed(GateError),
}

struct Shared {
    state: watch::Sender<Readiness>,
    // bumped by every prefetch, reset and cancel; a load only settles the
    // gate if its cycle is still current
    cycle: AtomicU64,
}

impl Shared {
    /// Settle the gate with a load's outcome. A successful value is handed to
    /// `commit` under the same lock that flips the state, and only if the
    /// load still belongs to the current cycle.
    fn settle<T, C>(&self, cycle: u64, outcome: Result<T, ApiError>, commit: C) -> bool
    where
        C: FnOnce(T),
    {
        self.state.send_if_modified(|state| {
            if self.cycle.load(Ordering::SeqCst) != cycle || !matches!(state, Readiness::Loading) {
                return false;
            }
            *state = match outcome {
                Ok(value) => {
                    commit(value);
                    Readiness::Ready
                }
                Err(e) => Readiness::Failed(GateError::Failed(Arc::new(e))),
            };
            true
        })
    }
}

pub struct ReadyGate {
    shared: Arc<Shared>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Default for ReadyGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadyGate {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Readiness::Idle);
        Self {
            shared: Arc::new(Shared {
                state,
                cycle: AtomicU64::new(0),
            }),
            task: Mutex::new(None),
        }
    }

    pub fn readiness(&self) -> Readiness {
        self.shared.state.borrow().clone()
    }

    /// Start `load` on the runtime and mark the gate as loading. On success
    /// the loaded value is passed to `commit` just before the gate turns
    /// `Ready`; a load that was cancelled or reset never reaches `commit`.
    ///
    /// Only an `Idle` gate accepts a prefetch. Otherwise nothing is started
    /// and `false` is returned. Must be called from within a tokio runtime.
    pub fn prefetch<F, T, C>(&self, load: F, commit: C) -> bool
    where
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
        T: Send + 'static,
        C: FnOnce(T) + Send + 'static,
    {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);

        let mut cycle = 0;
        let started = self.shared.state.send_if_modified(|state| {
            if !matches!(state, Readiness::Idle) {
                return false;
            }
            cycle = self.shared.cycle.fetch_add(1, Ordering::SeqCst) + 1;
            *state = Readiness::Loading;
            true
        });
        if !started {
            log::warn!("prefetch ignored: gate is {:?}, reset it first", self.readiness());
            return false;
        }

        let shared = Arc::clone(&self.shared);
        *task = Some(tokio::spawn(async move {
            let outcome = load.await;
            if let Err(e) = &outcome {
                log::error!("background load failed: {e}");
            }
            if !shared.settle(cycle, outcome, commit) {
                log::debug!("discarding result of superseded load");
            }
        }));
        true
    }

    /// Wait until the current load has settled.
    ///
    /// Returns immediately once the gate is `Ready` or `Failed`. Waiting on a
    /// gate that was never prefetched is an error rather than a hang.
    pub async fn wait_ready(&self) -> Result<(), GateError> {
        let mut rx = self.shared.state.subscribe();
        let state = rx
            .wait_for(|state| !matches!(state, Readiness::Loading))
            .await
            .map_err(|_| GateError::Cancelled)?;

        match &*state {
            Readiness::Ready => Ok(()),
            Readiness::Failed(e) => Err(e.clone()),
            Readiness::Idle => Err(GateError::NotPrefetched),
            Readiness::Loading => Err(GateError::Cancelled),
        }
    }

    /// Abort an in-flight load. Waiters are woken with `Cancelled`.
    pub fn cancel(&self) {
        let handle = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }

        self.shared.state.send_if_modified(|state| {
            if !matches!(state, Readiness::Loading) {
                return false;
            }
            self.shared.cycle.fetch_add(1, Ordering::SeqCst);
            *state = Readiness::Failed(GateError::Cancelled);
            true
        });
    }

    /// Return to `Idle` for the next cycle, cancelling any load in flight.
    pub fn reset(&self) {
        self.cancel();
        self.shared.state.send_if_modified(|state| {
            if matches!(state, Readiness::Idle) {
                return false;
            }
            *state = Readiness::Idle;
            true
        });
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.shared.state.borrow(), Readiness::Ready)
    }
}

impl Drop for ReadyGate {
    fn drop(&mut self) {
        let handle = self
            .task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }
}
