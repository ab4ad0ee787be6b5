//! String interning for task ids.
//!
//! The graph stores tasks in an arena and refers to them by dense integer
//! indexes; this maps caller-supplied ids to those indexes and back.

use rustc_hash::FxHashMap;

/// Dense index of a task in the graph arena.
pub type TaskIdx = u32;

/// Bidirectional mapping between task id strings and arena indexes.
///
/// Indexes are assigned in insertion order, so iterating `0..len()` visits
/// tasks in the order the caller supplied them.
#[derive(Debug, Clone, Default)]
pub struct TaskIdInterner {
    to_idx: FxHashMap<String, TaskIdx>,
    from_idx: Vec<String>,
}

impl TaskIdInterner {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            to_idx: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            from_idx: Vec::with_capacity(capacity),
        }
    }

    /// Intern an id, returning its index and whether it was newly added.
    pub fn intern(&mut self, id: &str) -> (TaskIdx, bool) {
        if let Some(&idx) = self.to_idx.get(id) {
            return (idx, false);
        }
        let idx = self.from_idx.len() as TaskIdx;
        self.from_idx.push(id.to_string());
        self.to_idx.insert(id.to_string(), idx);
        (idx, true)
    }

    #[inline]
    pub fn get(&self, id: &str) -> Option<TaskIdx> {
        self.to_idx.get(id).copied()
    }

    #[inline]
    pub fn resolve(&self, idx: TaskIdx) -> Option<&str> {
        self.from_idx.get(idx as usize).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.from_idx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.from_idx.is_empty()
    }
}
