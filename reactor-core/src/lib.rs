//! Reactor Core
//!
//! This crate provides a synchronous dependency-tracking engine for reactive
//! computations. It implements:
//!
//! - Computations that re-run when the data they read changes
//! - Dependencies and reactive variables that track their readers
//! - A flush scheduler that batches re-runs and post-flush callbacks
//! - Integration with a host main loop
//!
//! Everything runs on one thread. Several reactors can coexist; each one is
//! an explicit context object, with a lazily created per-thread default for
//! convenience.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: the reactor, computation handles, dependencies and vars
//! - `graph`: the arena of computation nodes the reactor schedules
//! - `host`: the seam to the application's main loop
//! - `config` / `error`: settings and the error taxonomy
//!
//! # Example
//!
//! ```rust,ignore
//! use reactor_core::{Reactor, Var};
//!
//! let reactor = Reactor::new();
//! let count = Var::new_in(&reactor, 0);
//!
//! // Runs once now, and again after every flush in which `count` changed
//! let reader = count.clone();
//! let computation = reactor.auto_run(move |_| {
//!     println!("Count: {}", reader.get());
//! });
//!
//! count.set(5);
//! reactor.flush()?;
//! // prints: "Count: 5"
//!
//! computation.stop();
//! ```

pub mod config;
pub mod error;
pub mod host;
pub mod reactive;

pub(crate) mod graph;

pub use config::{LogLevel, ReactorConfig};
pub use error::{ErrorKind, ReactorError, Result};
pub use graph::ComputationState;
pub use host::{FlushScheduler, MainLoop, Task};
pub use reactive::{Computation, ComputationId, Dependency, Reactor, Var};
