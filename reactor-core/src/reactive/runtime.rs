//! Reactive Runtime
//!
//! The [`Reactor`] is the central coordinator: it knows which computation is
//! running, which ones need to re-run, and it drains that work when flushed.
//!
//! # How It Works
//!
//! 1. [`Reactor::auto_run`] creates a computation and runs it once, with the
//!    computation installed as current.
//!
//! 2. Every [`Dependency`](crate::Dependency) read while it runs registers
//!    the current computation as a dependant.
//!
//! 3. When a dependency changes, its dependants are invalidated:
//!    a. their invalidation callbacks fire (this is how they leave the
//!       dependency, and how nested computations get stopped)
//!    b. they are queued, and a flush is requested from the host loop
//!
//! 4. [`Reactor::flush`] re-runs the queued computations in FIFO order, then
//!    runs post-flush callbacks one at a time, until both queues are empty.
//!
//! # Failure Containment
//!
//! Panics escaping user closures are caught at the engine boundary and
//! reported through `tracing`. A computation whose first run fails is
//! stopped; one that fails on a re-run stays live. A failing post-flush
//! callback is dropped. Misuse of the engine itself (flushing re-entrantly,
//! registering callbacks with nothing running) is returned as an error.
//!
//! # Threading
//!
//! A reactor is single-threaded (`!Send`). Several reactors can coexist;
//! [`Reactor::global`] returns a lazily created per-thread default.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use crate::config::{LogLevel, ReactorConfig};
use crate::error::{ReactorError, Result};
use crate::graph::{Callback, ComputationNode, LifecycleFlags};
use crate::host::FlushScheduler;

use super::computation::Computation;
use super::context::{ComputeScope, FlushScope, NonReactiveScope, ReactiveState, RecomputeScope};
use super::ComputationId;

/// Shared body of a reactor.
pub(crate) struct Inner {
    state: RefCell<ReactiveState>,
    log_level: Cell<LogLevel>,
    host: RefCell<Option<Rc<dyn FlushScheduler>>>,
}

/// A reactive context: the scheduler computations and dependencies run on.
///
/// Cloning a `Reactor` is cheap and yields another handle to the same
/// context.
///
/// # Example
///
/// ```rust,ignore
/// let reactor = Reactor::new();
/// let count = Var::new_in(&reactor, 0);
///
/// let reader = count.clone();
/// reactor.auto_run(move |_| println!("count is {}", reader.get()));
///
/// count.set(5);
/// reactor.flush()?; // prints "count is 5"
/// ```
#[derive(Clone)]
pub struct Reactor {
    inner: Rc<Inner>,
}

thread_local! {
    static GLOBAL: Reactor = Reactor::new();
}

impl Reactor {
    /// Create a reactor with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ReactorConfig::default())
    }

    /// Create a reactor with the given configuration.
    pub fn with_config(config: ReactorConfig) -> Self {
        Self {
            inner: Rc::new(Inner {
                state: RefCell::new(ReactiveState::default()),
                log_level: Cell::new(config.log_level),
                host: RefCell::new(None),
            }),
        }
    }

    /// The default reactor of the current thread, created on first use.
    pub fn global() -> Self {
        GLOBAL.with(Reactor::clone)
    }

    pub(crate) fn from_inner(inner: Rc<Inner>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<Inner> {
        Rc::downgrade(&self.inner)
    }

    /// Whether two handles refer to the same reactor.
    pub fn ptr_eq(&self, other: &Reactor) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ------------------------------------------------------------------------
    // Configuration
    // ------------------------------------------------------------------------

    pub fn log_level(&self) -> LogLevel {
        self.inner.log_level.get()
    }

    /// Change diagnostic verbosity. Has no effect on behavior.
    pub fn set_log_level(&self, level: LogLevel) {
        self.inner.log_level.set(level);
    }

    /// Install the host loop that runs requested flushes.
    pub fn set_flush_scheduler<S>(&self, scheduler: S)
    where
        S: FlushScheduler + 'static,
    {
        *self.inner.host.borrow_mut() = Some(Rc::new(scheduler));

        // A flush requested before the host existed was never posted.
        let unposted = {
            let state = self.inner.state.borrow();
            state.will_flush && !state.in_flush
        };
        if unposted {
            self.post_flush_to_host();
        }
    }

    /// Remove the host loop. Flushes then only happen on explicit calls.
    pub fn clear_flush_scheduler(&self) {
        self.inner.host.borrow_mut().take();
    }

    fn logs(&self, level: LogLevel) -> bool {
        self.inner.log_level.get().includes(level)
    }

    // ------------------------------------------------------------------------
    // Public operations
    // ------------------------------------------------------------------------

    /// Run `work` now, and re-run it whenever the dependencies it read
    /// change.
    ///
    /// If a computation is running, the new one becomes its child and is
    /// stopped as soon as the parent is invalidated.
    ///
    /// The returned handle can be used to stop or inspect the computation.
    pub fn auto_run<F>(&self, work: F) -> Computation
    where
        F: FnMut(&Computation) + 'static,
    {
        let id = ComputationId::next();
        let flags = Rc::new(LifecycleFlags::new());
        let parent = {
            let mut state = self.inner.state.borrow_mut();
            let parent = state.current;
            state.nodes.insert(ComputationNode::new(
                id,
                parent,
                Box::new(work),
                Rc::clone(&flags),
            ));
            parent
        };
        let computation = Computation::new(id, self.downgrade(), flags);

        let succeeded = self.compute(&computation);
        computation.flags().first_run.set(false);

        if !succeeded {
            computation.flags().errored.set(true);
            self.stop(id);
        } else if let Some(parent) = parent {
            let child = computation.clone();
            self.add_invalidate_callback(parent, Box::new(move || child.stop()));
        }

        computation
    }

    /// Like [`auto_run`](Self::auto_run), for callers holding an optional
    /// work function.
    ///
    /// Fails with [`ReactorError::MissingFunction`] if `work` is `None`.
    pub fn try_auto_run<F>(&self, work: Option<F>) -> Result<Computation>
    where
        F: FnMut(&Computation) + 'static,
    {
        match work {
            Some(work) => Ok(self.auto_run(work)),
            None => Err(ReactorError::MissingFunction),
        }
    }

    /// Process all pending reactive updates now.
    ///
    /// Re-runs every invalidated computation, then post-flush callbacks, until
    /// nothing is left. Fails if called while already flushing or from inside
    /// a computation.
    pub fn flush(&self) -> Result<()> {
        {
            let state = self.inner.state.borrow();
            if state.in_flush {
                return Err(ReactorError::FlushWhileFlushing);
            }
            if state.in_compute {
                return Err(ReactorError::FlushInsideCompute);
            }
        }

        // Flags are reset by the flush scope on the way out. Give the queues
        // one more chance before letting the failure through.
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| self.drain())) {
            tracing::error!(error = panic_message(&*payload), "flush failed, retrying");
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| self.drain())) {
                panic::resume_unwind(payload);
            }
        }

        Ok(())
    }

    /// Ask the host loop for a flush, unless one is already scheduled.
    pub fn require_flush(&self) {
        let already_scheduled = std::mem::replace(&mut self.inner.state.borrow_mut().will_flush, true);
        if already_scheduled {
            return;
        }
        self.post_flush_to_host();
    }

    /// Hand a flush task to the host loop, if one is installed.
    fn post_flush_to_host(&self) {
        let host = self.inner.host.borrow().clone();
        let Some(host) = host else {
            return;
        };

        if self.logs(LogLevel::All) {
            tracing::trace!("flush scheduled");
        }

        let reactor = self.downgrade();
        host.schedule_flush(Box::new(move || {
            if let Some(inner) = reactor.upgrade() {
                if let Err(error) = Reactor::from_inner(inner).flush() {
                    tracing::warn!(%error, "scheduled flush skipped");
                }
            }
        }));
    }

    /// Register `callback` to run when the current computation is next
    /// invalidated or stopped.
    ///
    /// Fails with [`ReactorError::NoCurrentComputation`] outside a
    /// computation.
    pub fn on_invalidate<F>(&self, callback: F) -> Result<()>
    where
        F: FnOnce() + 'static,
    {
        let current = self
            .inner
            .state
            .borrow()
            .current
            .ok_or(ReactorError::NoCurrentComputation)?;

        self.add_invalidate_callback(current, Box::new(callback));
        Ok(())
    }

    /// Run `f` with no current computation, so nothing it reads becomes a
    /// dependency.
    pub fn non_reactive<R>(&self, f: impl FnOnce() -> R) -> R {
        let _scope = NonReactiveScope::enter(&self.inner.state);
        f()
    }

    /// Run `callback` once, at the end of the next flush, after all pending
    /// computations have re-run.
    pub fn after_flush<F>(&self, callback: F)
    where
        F: FnOnce() + 'static,
    {
        self.inner
            .state
            .borrow_mut()
            .post_flush
            .push_back(Box::new(callback));
        self.require_flush();
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    /// The computation currently running, if any.
    pub fn current(&self) -> Option<Computation> {
        let id = self.inner.state.borrow().current?;
        self.computation(id)
    }

    /// True if there is a current computation, meaning that reads of
    /// dependencies will be tracked.
    pub fn is_active(&self) -> bool {
        self.inner.state.borrow().current.is_some()
    }

    /// True while a computation runs, even inside `non_reactive`.
    pub fn in_compute(&self) -> bool {
        self.inner.state.borrow().in_compute
    }

    pub fn in_flush(&self) -> bool {
        self.inner.state.borrow().in_flush
    }

    /// True if a flush has been requested and not run yet, or is running.
    pub fn will_flush(&self) -> bool {
        self.inner.state.borrow().will_flush
    }

    /// Number of computations waiting to be recomputed.
    pub fn pending_len(&self) -> usize {
        self.inner.state.borrow().pending.len()
    }

    /// Number of live (not yet retired) computations.
    pub fn computation_count(&self) -> usize {
        self.inner.state.borrow().nodes.len()
    }

    /// Handle to a live computation.
    pub(crate) fn computation(&self, id: ComputationId) -> Option<Computation> {
        let flags = Rc::clone(self.inner.state.borrow().nodes.get(id)?.flags());
        Some(Computation::new(id, self.downgrade(), flags))
    }

    pub(crate) fn parent_of(&self, id: ComputationId) -> Option<ComputationId> {
        self.inner.state.borrow().nodes.get(id)?.parent()
    }

    pub(crate) fn children_of(&self, id: ComputationId) -> Vec<ComputationId> {
        self.inner.state.borrow().nodes.children_of(id)
    }

    // ------------------------------------------------------------------------
    // Computation lifecycle
    // ------------------------------------------------------------------------

    /// Invalidate a computation: queue it (unless it is re-running inline or
    /// stopped) and fire its invalidation callbacks.
    pub(crate) fn invalidate(&self, id: ComputationId) {
        let (callbacks, enqueued) = {
            let mut state = self.inner.state.borrow_mut();
            let Some(node) = state.nodes.get_mut(id) else {
                return;
            };
            let flags = Rc::clone(node.flags());
            let Some(callbacks) = node.invalidate() else {
                return;
            };

            // While recomputing, the recompute loop re-runs it immediately.
            let enqueue = !flags.recomputing.get() && !flags.stopped.get();
            if enqueue {
                state.enqueue(id);
            }
            (callbacks, enqueue)
        };

        if self.logs(LogLevel::All) {
            tracing::trace!(
                computation = %id,
                enqueued,
                callbacks = callbacks.len(),
                "computation invalidated"
            );
        }

        if enqueued {
            self.require_flush();
        }

        // Callbacks can't add callbacks for this invalidation: the node is
        // already marked invalidated, so any they register run immediately.
        for callback in callbacks {
            self.run_invalidate_callback(id, callback);
        }
    }

    /// Run one invalidation callback with no current computation.
    ///
    /// A failing callback is reported and skipped; the remaining callbacks
    /// still run, so dependencies are always released.
    fn run_invalidate_callback(&self, id: ComputationId, callback: Callback) {
        let outcome = self.non_reactive(|| panic::catch_unwind(AssertUnwindSafe(callback)));
        if let Err(payload) = outcome {
            tracing::error!(
                computation = %id,
                error = panic_message(&*payload),
                "invalidation callback failed"
            );
        }
    }

    /// Stop a computation for good. Idempotent.
    pub(crate) fn stop(&self, id: ComputationId) {
        {
            let state = self.inner.state.borrow();
            let Some(node) = state.nodes.get(id) else {
                return;
            };
            if node.flags().stopped.replace(true) {
                return;
            }
        }

        if self.logs(LogLevel::All) {
            tracing::trace!(computation = %id, "computation stopped");
        }

        self.invalidate(id);

        // A computation stopped from inside its own run is retired when the
        // run ends.
        let running = self
            .inner
            .state
            .borrow()
            .nodes
            .get(id)
            .map_or(true, ComputationNode::is_running);
        if !running {
            drop(self.retire(id));
        }
    }

    /// Remove a stopped computation from the arena and the queue.
    ///
    /// The node is handed back so it drops after the state borrow ends.
    fn retire(&self, id: ComputationId) -> Option<ComputationNode> {
        let mut state = self.inner.state.borrow_mut();
        state.pending.retain(|pending| *pending != id);
        state.nodes.remove(id)
    }

    /// Register an invalidation callback on `id`, or run it right away if the
    /// computation is already invalidated.
    pub(crate) fn add_invalidate_callback(&self, id: ComputationId, callback: Callback) {
        let refused = match self.inner.state.borrow_mut().nodes.get_mut(id) {
            Some(node) => node.push_callback(callback),
            None => Some(callback),
        };

        if let Some(callback) = refused {
            self.run_invalidate_callback(id, callback);
        }
    }

    /// Run a computation's work function once, with the computation as
    /// current. Returns `false` if the function panicked.
    fn compute(&self, computation: &Computation) -> bool {
        let id = computation.id();
        let work = self
            .inner
            .state
            .borrow_mut()
            .nodes
            .get_mut(id)
            .and_then(ComputationNode::begin_run);
        let Some(mut work) = work else {
            return true;
        };

        let outcome = {
            let _scope = ComputeScope::enter(&self.inner.state, id);
            panic::catch_unwind(AssertUnwindSafe(|| work(computation)))
        };

        // Stopped during its own run: retire the node now that it is idle.
        let leftover = match self.inner.state.borrow_mut().nodes.get_mut(id) {
            Some(node) if !node.flags().stopped.get() => {
                node.end_run(work);
                None
            }
            _ => Some(work),
        };
        if leftover.is_some() {
            let retired = self.retire(id);
            drop((leftover, retired));
        }

        if self.logs(LogLevel::Compute) {
            tracing::debug!(
                computation = %id,
                first_run = computation.is_first_run(),
                "computation ran"
            );
        }

        match outcome {
            Ok(()) => true,
            Err(payload) => {
                tracing::error!(
                    computation = %id,
                    first_run = computation.is_first_run(),
                    error = panic_message(&*payload),
                    "computation failed"
                );
                false
            }
        }
    }

    /// Re-run an invalidated computation until it stays valid.
    ///
    /// A run that invalidates its own computation is followed immediately by
    /// another run. A computation that never stabilizes loops forever.
    fn recompute(&self, computation: &Computation) {
        let Some(_scope) = RecomputeScope::enter(&self.inner.state, computation.id()) else {
            return;
        };

        while computation.flags().needs_rerun() {
            // Failures are contained per run; the loop ends once a run leaves
            // the computation valid.
            self.compute(computation);
        }
    }

    /// The flush loop proper.
    fn drain(&self) {
        let _scope = FlushScope::enter(&self.inner.state);
        if self.logs(LogLevel::All) {
            tracing::trace!(pending = self.pending_len(), "flush started");
        }

        loop {
            while let Some(id) = self.pop_pending() {
                if let Some(computation) = self.computation(id) {
                    self.recompute(&computation);
                }
            }

            let Some(callback) = self.pop_post_flush() else {
                break;
            };
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(callback)) {
                tracing::error!(error = panic_message(&*payload), "post-flush callback failed");
            }
        }

        if self.logs(LogLevel::All) {
            tracing::trace!("flush finished");
        }
    }

    fn pop_pending(&self) -> Option<ComputationId> {
        self.inner.state.borrow_mut().pending.pop_front()
    }

    fn pop_post_flush(&self) -> Option<Callback> {
        self.inner.state.borrow_mut().post_flush.pop_front()
    }
}

impl Default for Reactor {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Reactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reactor")
            .field("log_level", &self.log_level())
            .field("state", &*self.inner.state.borrow())
            .finish()
    }
}

/// Best-effort text of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
