//! Reactive Context
//!
//! The reactive context is the mutable state a reactor shares between all
//! of its computations: which computation is currently running, what is
//! waiting to be recomputed, and whether a flush is underway.
//!
//! # Implementation
//!
//! Each piece of state that is changed for the duration of a call (the
//! current computation, the in-compute and in-flush flags, a node's
//! recomputing flag) is changed through a guard. The guard restores the
//! previous value when dropped, so the context stays consistent even when a
//! user closure panics and the engine unwinds through it.
//!
//! This design supports nesting: a computation created inside another
//! computation's work function installs itself as current, and the outer
//! computation becomes current again when the inner run ends.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::graph::{Callback, ComputationArena, LifecycleFlags};
use super::ComputationId;

/// State shared by everything running on one reactor.
#[derive(Default)]
pub(crate) struct ReactiveState {
    /// The computation whose work function is executing, if any. Reads of
    /// dependencies register this computation.
    pub current: Option<ComputationId>,

    /// True while any computation runs, first time or recompute. Matches
    /// `current.is_some()` except inside `non_reactive`, which clears
    /// `current` while an enclosing computation is still running.
    pub in_compute: bool,

    /// True while `flush` is draining the queues.
    pub in_flush: bool,

    /// True if a flush has been requested from the host loop, or if we are
    /// in a flush now.
    pub will_flush: bool,

    /// Invalidated computations waiting to be recomputed, in FIFO order.
    pub pending: VecDeque<ComputationId>,

    /// Callbacks to run once the pending queue is empty.
    pub post_flush: VecDeque<Callback>,

    /// Every live computation.
    pub nodes: ComputationArena,
}

impl std::fmt::Debug for ReactiveState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveState")
            .field("current", &self.current)
            .field("in_compute", &self.in_compute)
            .field("in_flush", &self.in_flush)
            .field("will_flush", &self.will_flush)
            .field("pending", &self.pending)
            .field("post_flush", &self.post_flush.len())
            .field("nodes", &self.nodes.len())
            .finish()
    }
}

impl ReactiveState {
    /// Queue a computation for recomputation, once.
    pub fn enqueue(&mut self, id: ComputationId) {
        if !self.pending.contains(&id) {
            self.pending.push_back(id);
        }
    }
}

/// Guard installing a computation as current for the length of one run.
///
/// Snapshots the previous current computation and in-compute flag and
/// restores both when dropped.
pub(crate) struct ComputeScope<'a> {
    state: &'a RefCell<ReactiveState>,
    previous: Option<ComputationId>,
    previous_in_compute: bool,
}

impl<'a> ComputeScope<'a> {
    pub fn enter(state: &'a RefCell<ReactiveState>, id: ComputationId) -> Self {
        let mut guard = state.borrow_mut();
        let previous = guard.current.replace(id);
        let previous_in_compute = std::mem::replace(&mut guard.in_compute, true);
        drop(guard);

        Self {
            state,
            previous,
            previous_in_compute,
        }
    }
}

impl Drop for ComputeScope<'_> {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.current = self.previous;
        state.in_compute = self.previous_in_compute;
    }
}

/// Guard clearing the current computation, so nothing read while it lives
/// registers a dependency.
pub(crate) struct NonReactiveScope<'a> {
    state: &'a RefCell<ReactiveState>,
    previous: Option<ComputationId>,
}

impl<'a> NonReactiveScope<'a> {
    pub fn enter(state: &'a RefCell<ReactiveState>) -> Self {
        let previous = state.borrow_mut().current.take();
        Self { state, previous }
    }
}

impl Drop for NonReactiveScope<'_> {
    fn drop(&mut self) {
        self.state.borrow_mut().current = self.previous;
    }
}

/// Guard marking a flush in progress.
///
/// Both flush flags are cleared on drop, whether the flush finished or not.
pub(crate) struct FlushScope<'a> {
    state: &'a RefCell<ReactiveState>,
}

impl<'a> FlushScope<'a> {
    pub fn enter(state: &'a RefCell<ReactiveState>) -> Self {
        let mut guard = state.borrow_mut();
        guard.in_flush = true;
        guard.will_flush = true;
        drop(guard);

        Self { state }
    }
}

impl Drop for FlushScope<'_> {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.in_flush = false;
        state.will_flush = false;
    }
}

/// Guard setting a node's `recomputing` flag while the flush loop re-runs it.
///
/// While set, invalidating the node does not enqueue it: the recompute loop
/// re-runs it inline instead.
pub(crate) struct RecomputeScope {
    flags: Rc<LifecycleFlags>,
}

impl RecomputeScope {
    /// Returns `None` if the node no longer exists.
    pub fn enter(state: &RefCell<ReactiveState>, id: ComputationId) -> Option<Self> {
        let flags = Rc::clone(state.borrow().nodes.get(id)?.flags());
        flags.recomputing.set(true);
        Some(Self { flags })
    }
}

impl Drop for RecomputeScope {
    fn drop(&mut self) {
        // The node may have been retired by now; the flags outlive it.
        self.flags.recomputing.set(false);
    }
}
