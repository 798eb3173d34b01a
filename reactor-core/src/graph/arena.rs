//! Computation Arena
//!
//! The arena owns every live computation node, indexed by id. Nothing else
//! holds a node directly: dependencies and handles refer to computations by
//! id, so there are no ownership cycles between data and the work that
//! reads it.

use std::collections::HashMap;

use super::node::ComputationNode;
use crate::reactive::ComputationId;

/// All live computations of one reactor.
#[derive(Debug, Default)]
pub(crate) struct ComputationArena {
    nodes: HashMap<ComputationId, ComputationNode>,
}

impl ComputationArena {
    /// Add a node to the arena.
    pub fn insert(&mut self, node: ComputationNode) -> ComputationId {
        let id = node.id();
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node, handing it back so the caller decides where it drops.
    pub fn remove(&mut self, id: ComputationId) -> Option<ComputationNode> {
        self.nodes.remove(&id)
    }

    pub fn get(&self, id: ComputationId) -> Option<&ComputationNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: ComputationId) -> Option<&mut ComputationNode> {
        self.nodes.get_mut(&id)
    }

    /// Ids of the live computations created inside `parent`.
    pub fn children_of(&self, parent: ComputationId) -> Vec<ComputationId> {
        let mut children: Vec<_> = self
            .nodes
            .values()
            .filter(|node| node.parent() == Some(parent))
            .map(ComputationNode::id)
            .collect();
        children.sort_unstable();
        children
    }

    /// Number of live computations.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}
