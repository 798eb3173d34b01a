//! Computation Handles
//!
//! A [`Computation`] represents code that is repeatedly re-run in response to
//! reactive data changes. Computations don't return values; they perform
//! actions, such as re-rendering part of a screen. They are created with
//! [`Reactor::auto_run`], and [`Computation::stop`] prevents further
//! re-runs.
//!
//! The handle is a lightweight reference: the computation itself lives in
//! its reactor. Handles hold the reactor weakly, so storing one inside a
//! work function or a callback never keeps the reactor alive.

use std::fmt;
use std::rc::{Rc, Weak};

use crate::graph::{ComputationState, LifecycleFlags};

use super::runtime::{Inner, Reactor};
use super::ComputationId;

/// Handle to a computation created by [`Reactor::auto_run`].
#[derive(Clone)]
pub struct Computation {
    id: ComputationId,
    reactor: Weak<Inner>,
    flags: Rc<LifecycleFlags>,
}

impl Computation {
    pub(crate) fn new(id: ComputationId, reactor: Weak<Inner>, flags: Rc<LifecycleFlags>) -> Self {
        Self { id, reactor, flags }
    }

    pub(crate) fn flags(&self) -> &LifecycleFlags {
        &self.flags
    }

    /// The computation's unique id.
    pub fn id(&self) -> ComputationId {
        self.id
    }

    /// The reactor this computation runs on, if it still exists.
    pub fn reactor(&self) -> Option<Reactor> {
        self.reactor.upgrade().map(Reactor::from_inner)
    }

    /// The computation that was running when this one was created.
    ///
    /// `None` for top-level computations, and once this computation has
    /// been stopped.
    pub fn parent(&self) -> Option<Computation> {
        let reactor = self.reactor()?;
        let parent = reactor.parent_of(self.id)?;
        reactor.computation(parent)
    }

    /// Live computations created during this computation's latest run.
    pub fn children(&self) -> Vec<Computation> {
        let Some(reactor) = self.reactor() else {
            return Vec::new();
        };
        reactor
            .children_of(self.id)
            .into_iter()
            .filter_map(|child| reactor.computation(child))
            .collect()
    }

    /// Prevent this computation from re-running. Idempotent.
    ///
    /// Stopping invalidates first, so pending invalidation callbacks fire.
    pub fn stop(&self) {
        if let Some(reactor) = self.reactor() {
            reactor.stop(self.id);
        }
    }

    /// Invalidate this computation so it re-runs on the next flush.
    ///
    /// No-op if it is already invalidated or stopped.
    pub fn invalidate(&self) {
        if let Some(reactor) = self.reactor() {
            reactor.invalidate(self.id);
        }
    }

    /// Register `callback` to run when this computation is next invalidated
    /// or stopped.
    ///
    /// The callback runs exactly once, with no current computation. If the
    /// computation is already invalidated, it runs immediately.
    pub fn on_invalidate<F>(&self, callback: F)
    where
        F: FnOnce() + 'static,
    {
        match self.reactor() {
            Some(reactor) => reactor.add_invalidate_callback(self.id, Box::new(callback)),
            None => callback(),
        }
    }

    /// True once [`stop`](Self::stop) has been called, or the first run
    /// failed.
    pub fn is_stopped(&self) -> bool {
        self.flags.stopped.get() || self.reactor.strong_count() == 0
    }

    /// True if the computation has been invalidated (or stopped) and has not
    /// re-run since.
    pub fn is_invalidated(&self) -> bool {
        self.flags.invalidated.get() || self.is_stopped()
    }

    /// True only during the run made by `auto_run` itself.
    pub fn is_first_run(&self) -> bool {
        self.flags.first_run.get()
    }

    /// True if the first run failed.
    pub fn is_errored(&self) -> bool {
        self.flags.errored.get()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ComputationState {
        if self.reactor.strong_count() == 0 {
            return ComputationState::Stopped;
        }
        self.flags.state()
    }
}

impl PartialEq for Computation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Computation {}

impl fmt::Debug for Computation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Computation")
            .field("id", &self.id)
            .field("state", &self.state())
            .field("errored", &self.is_errored())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
