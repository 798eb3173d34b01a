//! Computation identifiers.
//!
//! Every computation gets a unique id when it is created. Dependencies key
//! their dependants by this id, and the reactor's arena stores nodes under it.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier for a computation.
///
/// Ids are process-wide and monotonically increasing, so they stay unique
/// even when several reactors coexist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ComputationId(u64);

impl ComputationId {
    /// Generate the next computation id.
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw id value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ComputationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let id1 = ComputationId::next();
        let id2 = ComputationId::next();
        let id3 = ComputationId::next();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert!(id1 < id2 && id2 < id3);
    }

    #[test]
    fn ids_start_above_zero() {
        assert!(ComputationId::next().raw() >= 1);
    }

    #[test]
    fn display_uses_hash_prefix() {
        let id = ComputationId::next();
        assert_eq!(id.to_string(), format!("#{}", id.raw()));
    }
}
