//! Dense indexing of store task ids.
//!
//! Maps sparse store ids onto `0..n` so per-pass graph data can live in flat
//! vectors indexed by position.

use rustc_hash::FxHashMap;

use crate::models::TaskId;

/// Position of a task inside one snapshot (u32 for compact storage).
pub type NodeId = u32;

/// Bidirectional map between store ids and node positions.
#[derive(Debug, Clone)]
pub struct TaskIdInterner {
    to_node: FxHashMap<TaskId, NodeId>,
    from_node: Vec<TaskId>,
}

impl TaskIdInterner {
    /// Create a new interner with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            to_node: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            from_node: Vec::with_capacity(capacity),
        }
    }

    /// Intern a task id, returning its node id.
    /// If already interned, returns the existing node id.
    pub fn intern(&mut self, id: TaskId) -> NodeId {
        if let Some(&node) = self.to_node.get(&id) {
            return node;
        }
        let node = self.from_node.len() as NodeId;
        self.from_node.push(id);
        self.to_node.insert(id, node);
        node
    }

    /// Get the node id for a task id, if it exists.
    #[inline]
    pub fn get(&self, id: TaskId) -> Option<NodeId> {
        self.to_node.get(&id).copied()
    }

    /// All task ids in node order.
    pub fn ids(&self) -> &[TaskId] {
        &self.from_node
    }

    pub fn len(&self) -> usize {
        self.from_node.len()
    }

    pub fn is_empty(&self) -> bool {
        self.from_node.is_empty()
    }
}

impl Default for TaskIdInterner {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}
