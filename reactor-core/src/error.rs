//! Error Types
//!
//! Errors returned by the reactor when it is used in a way the engine
//! forbids. These are programmer errors: calling `flush` re-entrantly,
//! registering an invalidation callback with nothing running, and so on.
//!
//! Failures inside user closures are *not* represented here. They are
//! contained by the engine and reported through `tracing` instead.

use thiserror::Error;

/// Broad category of a [`ReactorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required argument was missing or malformed.
    InvalidArgument,

    /// The operation is not allowed in the reactor's current state.
    IllegalState,
}

/// An error raised by a reactor operation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReactorError {
    /// `auto_run` was given no work function.
    #[error("auto_run requires a work function")]
    MissingFunction,

    /// `flush` was called while a flush was already running.
    #[error("can't call flush while flushing")]
    FlushWhileFlushing,

    /// `flush` was called from inside a computation's work function.
    #[error("can't flush inside auto_run")]
    FlushInsideCompute,

    /// `on_invalidate` was called with no current computation.
    #[error("on_invalidate requires a current computation")]
    NoCurrentComputation,
}

impl ReactorError {
    /// The category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingFunction => ErrorKind::InvalidArgument,
            Self::FlushWhileFlushing | Self::FlushInsideCompute | Self::NoCurrentComputation => {
                ErrorKind::IllegalState
            }
        }
    }
}

/// Result alias for reactor operations.
pub type Result<T> = std::result::Result<T, ReactorError>;
