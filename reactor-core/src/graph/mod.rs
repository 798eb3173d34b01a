//! Computation Graph
//!
//! This module holds the reactor's bookkeeping for computations.
//!
//! # Overview
//!
//! Computations form a tree: a computation created while another one is
//! running becomes its child, and is stopped when the parent is
//! invalidated. Data dependencies are *not* stored here. They live on the
//! [`Dependency`](crate::Dependency) objects, which point back at
//! computations by id.
//!
//! # Design Decisions
//!
//! 1. Nodes are owned by a single arena indexed by id, never by each other.
//!    Handles, parents and dependencies hold ids, so dropping user objects
//!    can never leave a cycle behind.
//!
//! 2. A node's work function is moved out of the arena while it runs. The
//!    arena is therefore never borrowed across user code, which is what
//!    lets a work function create, stop and invalidate computations freely.

mod arena;
mod node;

pub(crate) use arena::ComputationArena;
pub(crate) use node::{Callback, ComputationNode, LifecycleFlags};
pub use node::ComputationState;
