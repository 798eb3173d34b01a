//! Reactive Variables
//!
//! A [`Var`] pairs a value with a [`Dependency`]. Reading it inside a
//! computation records the dependency; writing a different value invalidates
//! everything that read it.
//!
//! This is the shape most application state takes: a view model is a
//! handful of vars, and the computations that render it read them.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::dependency::Dependency;
use super::runtime::Reactor;

/// A reactive variable holding a value of type `T`.
///
/// Clones share the value and the dependency.
///
/// # Example
///
/// ```rust,ignore
/// let reactor = Reactor::new();
/// let name = Var::new_in(&reactor, String::from("pizza"));
///
/// let reader = name.clone();
/// reactor.auto_run(move |_| println!("favorite: {}", reader.get()));
///
/// name.set(String::from("sushi"));
/// reactor.flush()?; // prints "favorite: sushi"
/// ```
pub struct Var<T> {
    value: Rc<RefCell<T>>,
    dependency: Dependency,
}

impl<T> Var<T> {
    /// Create a variable tracked by the thread's global reactor.
    pub fn new(value: T) -> Self {
        Self::new_in(&Reactor::global(), value)
    }

    /// Create a variable tracked by `reactor`.
    pub fn new_in(reactor: &Reactor, value: T) -> Self {
        Self {
            value: Rc::new(RefCell::new(value)),
            dependency: Dependency::new_in(reactor),
        }
    }

    /// Borrow the value, recording a dependency for the current
    /// computation.
    ///
    /// The borrow lasts only for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.dependency.depend();
        f(&self.value.borrow())
    }

    /// Replace the value through `f` and notify dependants unconditionally.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.value.borrow_mut());
        self.dependency.changed();
    }

    /// The dependency that tracks reads of this variable.
    pub fn dependency(&self) -> &Dependency {
        &self.dependency
    }
}

impl<T: Clone> Var<T> {
    /// Get the current value, recording a dependency for the current
    /// computation.
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Get the current value without recording a dependency.
    pub fn get_untracked(&self) -> T {
        self.value.borrow().clone()
    }
}

impl<T: PartialEq> Var<T> {
    /// Set a new value.
    ///
    /// Dependants are invalidated only if the value actually changed.
    /// Returns whether it did.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.value.borrow_mut();
            if *current == value {
                return false;
            }
            *current = value;
        }
        // Borrow released: invalidation callbacks may read the new value.
        self.dependency.changed();
        true
    }
}

impl<T> Clone for Var<T> {
    fn clone(&self) -> Self {
        Self {
            value: Rc::clone(&self.value),
            dependency: self.dependency.clone(),
        }
    }
}

impl<T: Default> Default for Var<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Var<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Var")
            .field("value", &*self.value.borrow())
            .field("dependants", &self.dependency.dependant_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn get_and_set_outside_computations() {
        let reactor = Reactor::new();
        let var = Var::new_in(&reactor, 10);

        assert_eq!(var.get(), 10);
        assert!(var.set(20));
        assert_eq!(var.get(), 20);
        assert!(!var.dependency().has_dependants());
    }

    #[test]
    fn reading_inside_computation_tracks() {
        let reactor = Reactor::new();
        let var = Var::new_in(&reactor, 1);
        let seen = Rc::new(RefCell::new(Vec::new()));

        let v = var.clone();
        let s = seen.clone();
        reactor.auto_run(move |_| s.borrow_mut().push(v.get()));

        var.set(2);
        reactor.flush().unwrap();
        var.set(3);
        reactor.flush().unwrap();

        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn setting_an_equal_value_is_silent() {
        let reactor = Reactor::new();
        let var = Var::new_in(&reactor, "same");
        let runs = Rc::new(Cell::new(0));

        let v = var.clone();
        let r = runs.clone();
        reactor.auto_run(move |_| {
            v.get();
            r.set(r.get() + 1);
        });

        assert!(!var.set("same"));
        assert!(!reactor.will_flush());
        reactor.flush().unwrap();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn untracked_reads_do_not_subscribe() {
        let reactor = Reactor::new();
        let var = Var::new_in(&reactor, 0);
        let runs = Rc::new(Cell::new(0));

        let v = var.clone();
        let r = runs.clone();
        reactor.auto_run(move |_| {
            v.get_untracked();
            r.set(r.get() + 1);
        });

        var.set(1);
        reactor.flush().unwrap();
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn update_always_notifies() {
        let reactor = Reactor::new();
        let var = Var::new_in(&reactor, vec![1, 2]);
        let lengths = Rc::new(RefCell::new(Vec::new()));

        let v = var.clone();
        let l = lengths.clone();
        reactor.auto_run(move |_| l.borrow_mut().push(v.with(Vec::len)));

        var.update(|items| items.push(3));
        reactor.flush().unwrap();
        var.update(|_| {});
        reactor.flush().unwrap();

        assert_eq!(*lengths.borrow(), vec![2, 3, 3]);
    }

    #[test]
    fn non_copy_values_work() {
        let reactor = Reactor::new();
        let var = Var::new_in(&reactor, String::from("hello"));

        assert_eq!(var.get(), "hello");
        var.set(String::from("world"));
        assert_eq!(var.with(|s| s.len()), 5);
    }

    #[test]
    fn default_uses_the_global_reactor() {
        let var: Var<i32> = Var::default();
        let runs = Rc::new(Cell::new(0));

        let v = var.clone();
        let r = runs.clone();
        let computation = Reactor::global().auto_run(move |_| {
            v.get();
            r.set(r.get() + 1);
        });

        var.set(7);
        Reactor::global().flush().unwrap();
        assert_eq!(runs.get(), 2);
        computation.stop();
    }
}
