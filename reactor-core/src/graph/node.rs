//! Computation Nodes
//!
//! This module defines the record the arena keeps for every live
//! computation: its work function, its pending invalidation callbacks and
//! the lifecycle flags that drive the state machine.

use std::cell::Cell;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::reactive::{Computation, ComputationId};

/// The work a computation repeats. It receives its own handle.
pub(crate) type WorkFn = Box<dyn FnMut(&Computation)>;

/// A one-shot callback (invalidation or post-flush).
pub(crate) type Callback = Box<dyn FnOnce()>;

/// Lifecycle state of a computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputationState {
    /// The first run, inside `auto_run`, has not finished yet.
    Constructing,

    /// Ran successfully and none of its dependencies changed since.
    Valid,

    /// A dependency changed (or it was invalidated directly); waiting for a
    /// flush to re-run it.
    Invalidated,

    /// Being re-run by the flush loop right now.
    Recomputing,

    /// Terminal. The computation never runs again.
    Stopped,
}

/// Lifecycle flags of one computation.
///
/// Shared between the arena node and every handle to the computation, so a
/// handle can still answer questions after the node has been retired.
#[derive(Debug)]
pub(crate) struct LifecycleFlags {
    pub stopped: Cell<bool>,
    pub invalidated: Cell<bool>,
    pub recomputing: Cell<bool>,
    pub first_run: Cell<bool>,
    pub errored: Cell<bool>,
}

impl LifecycleFlags {
    /// Flags of a computation about to make its first run.
    pub fn new() -> Self {
        Self {
            stopped: Cell::new(false),
            invalidated: Cell::new(false),
            recomputing: Cell::new(false),
            first_run: Cell::new(true),
            errored: Cell::new(false),
        }
    }

    /// Current lifecycle state, derived from the flags.
    pub fn state(&self) -> ComputationState {
        if self.stopped.get() {
            ComputationState::Stopped
        } else if self.first_run.get() {
            ComputationState::Constructing
        } else if self.recomputing.get() {
            ComputationState::Recomputing
        } else if self.invalidated.get() {
            ComputationState::Invalidated
        } else {
            ComputationState::Valid
        }
    }

    /// Whether the flush loop should run this computation again.
    pub fn needs_rerun(&self) -> bool {
        self.invalidated.get() && !self.stopped.get()
    }
}

/// A computation as stored in the arena.
pub(crate) struct ComputationNode {
    id: ComputationId,

    /// Whatever computation was current when this one was created.
    parent: Option<ComputationId>,

    /// Taken out of the node while the function runs, so the arena is never
    /// borrowed across user code.
    work: Option<WorkFn>,

    /// Callbacks fired (once) on the next invalidation.
    callbacks: SmallVec<[Callback; 2]>,

    flags: Rc<LifecycleFlags>,
}

impl ComputationNode {
    pub fn new(
        id: ComputationId,
        parent: Option<ComputationId>,
        work: WorkFn,
        flags: Rc<LifecycleFlags>,
    ) -> Self {
        Self {
            id,
            parent,
            work: Some(work),
            callbacks: SmallVec::new(),
            flags,
        }
    }

    pub fn id(&self) -> ComputationId {
        self.id
    }

    pub fn parent(&self) -> Option<ComputationId> {
        self.parent
    }

    pub fn flags(&self) -> &Rc<LifecycleFlags> {
        &self.flags
    }

    /// Whether the work function is currently executing.
    pub fn is_running(&self) -> bool {
        self.work.is_none()
    }

    /// Mark the node invalidated.
    ///
    /// Returns the callbacks to fire, or `None` if the node was already
    /// invalidated (invalidation is idempotent).
    pub fn invalidate(&mut self) -> Option<SmallVec<[Callback; 2]>> {
        if self.flags.invalidated.replace(true) {
            return None;
        }
        Some(std::mem::take(&mut self.callbacks))
    }

    /// Queue a callback for the next invalidation.
    ///
    /// Hands the callback back if the node is already invalidated; it then
    /// has to be run by the caller.
    pub fn push_callback(&mut self, callback: Callback) -> Option<Callback> {
        if self.flags.invalidated.get() {
            return Some(callback);
        }
        self.callbacks.push(callback);
        None
    }

    /// Take the work function out to run it.
    ///
    /// Clears `invalidated`: a run re-establishes validity.
    pub fn begin_run(&mut self) -> Option<WorkFn> {
        let work = self.work.take()?;
        self.flags.invalidated.set(false);
        Some(work)
    }

    /// Put the work function back after a run.
    pub fn end_run(&mut self, work: WorkFn) {
        self.work = Some(work);
    }

    /// Number of callbacks waiting for the next invalidation.
    pub fn callback_count(&self) -> usize {
        self.callbacks.len()
    }
}

impl std::fmt::Debug for ComputationNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputationNode")
            .field("id", &self.id)
            .field("parent", &self.parent)
            .field("state", &self.flags.state())
            .field("callbacks", &self.callback_count())
            .field("errored", &self.flags.errored.get())
            .finish()
    }
}
