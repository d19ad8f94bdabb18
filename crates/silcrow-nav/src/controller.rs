//! Page controllers and the fan-out/fan-in barrier that runs them
//!
//! Every controller of a transition is spawned at once on the tokio runtime
//! and receives the same [`Scope`]. The runner returns only after all of them
//! completed. Completion is detected by [`Countdown`], an atomic counter whose
//! final decrement fires a single oneshot signal.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

use crate::error::{NavError, NavResult};
use crate::lock;
use crate::scope::Scope;

pub type ControllerFuture = BoxFuture<'static, anyhow::Result<()>>;

/// A function attached to a display scope, run on every qualifying page entry
#[derive(Clone)]
pub struct Controller {
    inner: Arc<dyn Fn(Arc<Scope>) -> ControllerFuture + Send + Sync>,
}

impl Controller {
    /// Wraps an async function taking the transition's scope
    ///
    /// # Examples
    ///
    /// ```
    /// use silcrow_nav::Controller;
    ///
    /// let ctrl = Controller::new(|scope| async move {
    ///     let id = scope.param("id").unwrap_or_default().to_string();
    ///     scope.bind("userId", &id)?;
    ///     Ok(())
    /// });
    /// # let _ = ctrl;
    /// ```
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Arc<Scope>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |scope| f(scope).boxed()),
        }
    }

    /// Wraps a synchronous function
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&Scope) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        Self::new(move |scope| {
            let f = Arc::clone(&f);
            async move { (*f)(scope.as_ref()) }
        })
    }

    pub fn call(&self, scope: Arc<Scope>) -> ControllerFuture {
        (self.inner)(scope)
    }
}

impl fmt::Debug for Controller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller").finish_non_exhaustive()
    }
}

/// A controller tagged with the id of the scope it was registered on
#[derive(Debug, Clone)]
pub struct ScopedController {
    pub scope_id: String,
    pub controller: Controller,
}

// ============================================================================
// Countdown barrier
// ============================================================================

/// One-shot countdown latch
///
/// `arrive()` decrements atomically; exactly the call that takes the count
/// from 1 to 0 sends the completion signal.
pub struct Countdown {
    remaining: AtomicUsize,
    signal: Mutex<Option<oneshot::Sender<()>>>,
}

impl Countdown {
    /// Creates a latch for `count` participants and the receiver that
    /// resolves once all of them arrived
    pub fn new(count: usize) -> (Arc<Self>, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let latch = Arc::new(Self {
            remaining: AtomicUsize::new(count),
            signal: Mutex::new(Some(tx)),
        });
        if count == 0 {
            latch.fire();
        }
        (latch, rx)
    }

    /// Marks one participant as done; returns true for the final arrival
    pub fn arrive(&self) -> bool {
        let prev = self.remaining.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev > 0, "countdown underflow");
        if prev == 1 {
            self.fire();
            true
        } else {
            false
        }
    }

    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    fn fire(&self) {
        if let Some(tx) = lock(&self.signal).take() {
            let _ = tx.send(());
        }
    }
}

/// Held by a running controller task; arrives at the latch when dropped,
/// including when the task is cancelled with the runtime
struct ArrivalGuard {
    latch: Arc<Countdown>,
}

impl Drop for ArrivalGuard {
    fn drop(&mut self) {
        self.latch.arrive();
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Runs a transition's controllers concurrently behind a completion barrier
pub struct ControllerRunner;

impl ControllerRunner {
    /// Spawns every controller and waits for all of them
    ///
    /// Returns the first failure in completion order once the barrier fired.
    pub async fn run(chain: Vec<ScopedController>, scope: Arc<Scope>) -> NavResult<()> {
        if chain.is_empty() {
            tracing::trace!(page = scope.page_id(), "no controllers to run");
            return Ok(());
        }

        let total = chain.len();
        let (latch, done) = Countdown::new(total);
        let failures: Arc<Mutex<Vec<NavError>>> = Arc::new(Mutex::new(Vec::new()));

        tracing::debug!(page = scope.page_id(), controllers = total, "controllers fan-out");

        for ScopedController {
            scope_id,
            controller,
        } in chain
        {
            let guard = ArrivalGuard {
                latch: Arc::clone(&latch),
            };
            let scope = Arc::clone(&scope);
            let failures = Arc::clone(&failures);

            tokio::spawn(async move {
                let _guard = guard;
                let outcome = AssertUnwindSafe(async { controller.call(scope).await })
                    .catch_unwind()
                    .await;

                let failure = match outcome {
                    Ok(Ok(())) => return,
                    Ok(Err(source)) => {
                        tracing::warn!(scope = %scope_id, error = %source, "controller failed");
                        NavError::Controller {
                            scope: scope_id,
                            source,
                        }
                    }
                    Err(_) => {
                        tracing::error!(scope = %scope_id, "controller panicked");
                        NavError::ControllerPanicked { scope: scope_id }
                    }
                };
                lock(&failures).push(failure);
            });
        }

        done.await.map_err(|_| NavError::BarrierDropped)?;
        tracing::debug!(page = scope.page_id(), controllers = total, "controllers fan-in");

        let mut failures = lock(&failures);
        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures.remove(0))
        }
    }
}
