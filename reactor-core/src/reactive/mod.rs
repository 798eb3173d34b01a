//! Reactive Primitives
//!
//! This module implements the core reactive system: computations,
//! dependencies, and the reactor that schedules them.
//!
//! # Concepts
//!
//! ## Computations
//!
//! A computation is a function that is re-run whenever the reactive data it
//! read changes. It is created with [`Reactor::auto_run`] and runs once
//! immediately. Computations created while another one runs are nested:
//! they are stopped when their parent re-runs.
//!
//! ## Dependencies
//!
//! A [`Dependency`] is an atomic unit of reactive data. Calling `depend()`
//! inside a computation subscribes it; calling `changed()` invalidates every
//! subscriber. [`Var`] wraps a value with a dependency.
//!
//! ## Flushing
//!
//! Invalidated computations are not re-run straight away. They are queued
//! and re-run together when the reactor is flushed, either by the host loop
//! or by an explicit [`Reactor::flush`].
//!
//! # Implementation Notes
//!
//! Dependency tracking is transparent: the reactor knows which computation
//! is current, and a dependency asks it when read. The same approach is
//! used by SolidJS, Vue 3, and Leptos.

mod computation;
mod context;
mod dependency;
mod id;
mod runtime;
mod var;

pub use computation::Computation;
pub use dependency::Dependency;
pub use id::ComputationId;
pub use runtime::Reactor;
pub use var::Var;
