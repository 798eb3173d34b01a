//! Dependency Implementation
//!
//! A Dependency represents an atomic unit of reactive data that a
//! computation might depend on. It is the only way a computation finds out
//! that something it read has changed.
//!
//! # How Dependencies Work
//!
//! 1. [`Dependency::depend`] called while a computation runs registers that
//!    computation as a dependant, once.
//!
//! 2. Registration also attaches an invalidation callback to the
//!    computation that removes it from the dependants again. Tracking
//!    therefore lasts exactly one run.
//!
//! 3. [`Dependency::changed`] invalidates every dependant. Their callbacks
//!    fire during the call, which leaves the dependency with no dependants.
//!
//! Dependencies hold computation handles, which reference their reactor
//! weakly. Dropping a dependency never affects the computations that read
//! it.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use smallvec::SmallVec;

use super::computation::Computation;
use super::runtime::{Inner, Reactor};
use super::ComputationId;

/// An observable unit of reactive data.
///
/// Clones share the same set of dependants.
///
/// # Example
///
/// ```rust,ignore
/// let reactor = Reactor::new();
/// let dependency = Dependency::new_in(&reactor);
///
/// let d = dependency.clone();
/// reactor.auto_run(move |_| {
///     d.depend();
///     println!("ran");
/// });
///
/// dependency.changed();
/// reactor.flush()?; // prints "ran" again
/// ```
#[derive(Clone)]
pub struct Dependency {
    /// Reactor whose current computation `depend()` registers.
    reactor: Weak<Inner>,

    /// Computations currently depending on this dependency.
    dependents: Rc<RefCell<IndexMap<ComputationId, Computation>>>,
}

impl Dependency {
    /// Create a dependency on the thread's global reactor.
    pub fn new() -> Self {
        Self::new_in(&Reactor::global())
    }

    /// Create a dependency tracked by `reactor`.
    pub fn new_in(reactor: &Reactor) -> Self {
        Self {
            reactor: reactor.downgrade(),
            dependents: Rc::new(RefCell::new(IndexMap::new())),
        }
    }

    /// Declare that the current computation depends on this dependency.
    ///
    /// Returns `true` if the computation is a new dependant. Returns `false`
    /// if it already depends on this, or if no computation is running.
    pub fn depend(&self) -> bool {
        let current = self
            .reactor
            .upgrade()
            .and_then(|inner| Reactor::from_inner(inner).current());
        match current {
            Some(computation) => self.depend_on(&computation),
            None => false,
        }
    }

    /// Declare that `computation` depends on this dependency.
    ///
    /// The computation is invalidated the next time this dependency changes.
    /// Returns `true` if it is a new dependant.
    pub fn depend_on(&self, computation: &Computation) -> bool {
        let id = computation.id();
        if self.dependents.borrow().contains_key(&id) {
            return false;
        }
        self.dependents
            .borrow_mut()
            .insert(id, computation.clone());

        let dependents = Rc::downgrade(&self.dependents);
        computation.on_invalidate(move || {
            if let Some(dependents) = dependents.upgrade() {
                dependents.borrow_mut().swap_remove(&id);
            }
        });

        true
    }

    /// Invalidate every dependant computation and remove them as dependants.
    pub fn changed(&self) {
        // Invalidation removes entries as it goes; iterate a snapshot.
        let dependents: SmallVec<[Computation; 4]> =
            self.dependents.borrow().values().cloned().collect();

        for computation in dependents {
            computation.invalidate();
        }

        // Computations whose reactor is gone can't fire their callbacks.
        self.dependents
            .borrow_mut()
            .retain(|_, computation| computation.reactor().is_some());
    }

    /// True if one or more computations would be invalidated by
    /// [`changed`](Self::changed).
    pub fn has_dependants(&self) -> bool {
        !self.dependents.borrow().is_empty()
    }

    /// Number of computations currently depending on this.
    pub fn dependant_count(&self) -> usize {
        self.dependents.borrow().len()
    }
}

impl Default for Dependency {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("dependants", &self.dependents.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
