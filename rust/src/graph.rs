//! Task dependency graph: construction, validation and ordering.
//!
//! Tasks live in an arena indexed by [`TaskIdx`]; edges are index lists in both
//! directions, built once per call. No task holds a reference to another.

use std::collections::VecDeque;

use crate::error::{EngineError, EngineResult};
use crate::interner::{TaskIdInterner, TaskIdx};
use crate::models::TaskNode;

/// An edge endpoint with the lag carried by the dependency, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
    pub task: TaskIdx,
    pub lag_ms: i64,
}

/// DFS colouring for cycle detection.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Directed graph over a borrowed task slice.
///
/// Construction checks referential integrity only; call [`TaskGraph::validate`]
/// (or [`TaskGraph::detect_cycle`]) before relying on acyclicity.
#[derive(Debug)]
pub struct TaskGraph<'a> {
    tasks: &'a [TaskNode],
    index: TaskIdInterner,
    predecessors: Vec<Vec<Edge>>,
    successors: Vec<Vec<Edge>>,
}

impl<'a> TaskGraph<'a> {
    /// Build the graph, rejecting duplicate ids, self-dependencies and unknown predecessors.
    pub fn build(tasks: &'a [TaskNode]) -> EngineResult<Self> {
        let mut index = TaskIdInterner::with_capacity(tasks.len());
        for task in tasks {
            let (_, is_new) = index.intern(&task.id);
            if !is_new {
                return Err(EngineError::DuplicateTask(task.id.clone()));
            }
        }

        let n = tasks.len();
        let mut predecessors: Vec<Vec<Edge>> = vec![Vec::new(); n];
        let mut successors: Vec<Vec<Edge>> = vec![Vec::new(); n];

        for (idx, task) in tasks.iter().enumerate() {
            for pred in &task.predecessors {
                if pred.task_id == task.id {
                    return Err(EngineError::SelfDependency(task.id.clone()));
                }
                let Some(pred_idx) = index.get(&pred.task_id) else {
                    return Err(EngineError::UnknownPredecessor {
                        task_id: task.id.clone(),
                        missing_id: pred.task_id.clone(),
                    });
                };
                let lag_ms = pred.lag.checked_millis().ok_or_else(|| {
                    EngineError::InvalidDuration(format!(
                        "lag from {} to {} exceeds representable range",
                        pred.task_id, task.id
                    ))
                })?;
                predecessors[idx].push(Edge {
                    task: pred_idx,
                    lag_ms,
                });
                successors[pred_idx as usize].push(Edge {
                    task: idx as TaskIdx,
                    lag_ms,
                });
            }
        }

        Ok(Self {
            tasks,
            index,
            predecessors,
            successors,
        })
    }

    /// Build the graph and reject it if it contains a cycle.
    pub fn validate(tasks: &'a [TaskNode]) -> EngineResult<Self> {
        let graph = Self::build(tasks)?;
        graph.detect_cycle()?;
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn task(&self, idx: TaskIdx) -> &'a TaskNode {
        &self.tasks[idx as usize]
    }

    pub fn index_of(&self, id: &str) -> Option<TaskIdx> {
        self.index.get(id)
    }

    pub fn id_of(&self, idx: TaskIdx) -> &'a str {
        self.tasks[idx as usize].id.as_str()
    }

    pub fn predecessor_edges(&self, idx: TaskIdx) -> &[Edge] {
        &self.predecessors[idx as usize]
    }

    pub fn successor_edges(&self, idx: TaskIdx) -> &[Edge] {
        &self.successors[idx as usize]
    }

    /// Ids of the direct successors of a task, in insertion order.
    pub fn successors(&self, id: &str) -> Vec<&'a str> {
        self.index
            .get(id)
            .map(|idx| {
                self.successors[idx as usize]
                    .iter()
                    .map(|e| self.id_of(e.task))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Ids of the direct predecessors of a task, in declaration order.
    pub fn predecessors(&self, id: &str) -> Vec<&'a str> {
        self.index
            .get(id)
            .map(|idx| {
                self.predecessors[idx as usize]
                    .iter()
                    .map(|e| self.id_of(e.task))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Tasks without predecessors, in insertion order.
    pub fn sources(&self) -> Vec<&'a str> {
        (0..self.len())
            .filter(|&i| self.predecessors[i].is_empty())
            .map(|i| self.tasks[i].id.as_str())
            .collect()
    }

    /// Tasks without successors, in insertion order.
    pub fn sinks(&self) -> Vec<&'a str> {
        (0..self.len())
            .filter(|&i| self.successors[i].is_empty())
            .map(|i| self.tasks[i].id.as_str())
            .collect()
    }

    /// Depth-first search for a cycle using an explicit stack.
    ///
    /// Returns the cycle as a list of ids starting and ending with the same task.
    pub fn find_cycle(&self) -> Option<Vec<String>> {
        let n = self.len();
        let mut marks = vec![Mark::Unvisited; n];
        // (node, position of next successor edge to explore)
        let mut stack: Vec<(TaskIdx, usize)> = Vec::new();

        for root in 0..n {
            if marks[root] != Mark::Unvisited {
                continue;
            }
            marks[root] = Mark::OnStack;
            stack.push((root as TaskIdx, 0));

            while let Some(top) = stack.last_mut() {
                let node = top.0;
                let edges = &self.successors[node as usize];
                if top.1 < edges.len() {
                    let child = edges[top.1].task;
                    top.1 += 1;
                    match marks[child as usize] {
                        Mark::Unvisited => {
                            marks[child as usize] = Mark::OnStack;
                            stack.push((child, 0));
                        }
                        Mark::OnStack => {
                            let start = stack
                                .iter()
                                .position(|&(t, _)| t == child)
                                .unwrap_or(0);
                            let mut cycle: Vec<String> = stack[start..]
                                .iter()
                                .map(|&(t, _)| self.id_of(t).to_string())
                                .collect();
                            cycle.push(self.id_of(child).to_string());
                            return Some(cycle);
                        }
                        Mark::Done => {}
                    }
                } else {
                    marks[node as usize] = Mark::Done;
                    stack.pop();
                }
            }
        }

        None
    }

    /// Fail with `CircularDependency` if the graph contains a cycle.
    pub fn detect_cycle(&self) -> EngineResult<()> {
        match self.find_cycle() {
            Some(cycle) => {
                let task_id = cycle.first().cloned().unwrap_or_default();
                Err(EngineError::circular(&task_id, cycle))
            }
            None => Ok(()),
        }
    }

    /// Topological order via Kahn's algorithm.
    ///
    /// Ready tasks are emitted first-in first-out, seeded in insertion order, so
    /// the order is deterministic for a given input order.
    pub fn topological_order(&self) -> EngineResult<Vec<TaskIdx>> {
        let n = self.len();
        let mut in_degree: Vec<usize> = self.predecessors.iter().map(|p| p.len()).collect();

        let mut queue: VecDeque<TaskIdx> = (0..n)
            .filter(|&i| in_degree[i] == 0)
            .map(|i| i as TaskIdx)
            .collect();

        let mut order: Vec<TaskIdx> = Vec::with_capacity(n);

        while let Some(idx) = queue.pop_front() {
            order.push(idx);
            for edge in &self.successors[idx as usize] {
                let degree = &mut in_degree[edge.task as usize];
                *degree -= 1;
                if *degree == 0 {
                    queue.push_back(edge.task);
                }
            }
        }

        if order.len() < n {
            let cycle = self.find_cycle().unwrap_or_else(|| {
                // Kahn and DFS disagree; report the first unreleased task.
                (0..n)
                    .filter(|&i| in_degree[i] > 0)
                    .map(|i| self.tasks[i].id.clone())
                    .take(1)
                    .collect()
            });
            let task_id = cycle.first().cloned().unwrap_or_default();
            return Err(EngineError::circular(&task_id, cycle));
        }

        Ok(order)
    }

    /// Topological order as task ids.
    pub fn topological_ids(&self) -> EngineResult<Vec<String>> {
        Ok(self
            .topological_order()?
            .into_iter()
            .map(|idx| self.id_of(idx).to_string())
            .collect())
    }

    /// Whether a chain of successor edges leads from `from` to `to`.
    ///
    /// Unknown ids never have a path. A task trivially reaches itself.
    pub fn has_path(&self, from: &str, to: &str) -> bool {
        let (Some(start), Some(goal)) = (self.index.get(from), self.index.get(to)) else {
            return false;
        };
        if start == goal {
            return true;
        }

        let mut visited = vec![false; self.len()];
        let mut queue: VecDeque<TaskIdx> = VecDeque::new();
        visited[start as usize] = true;
        queue.push_back(start);

        while let Some(idx) = queue.pop_front() {
            for edge in &self.successors[idx as usize] {
                if edge.task == goal {
                    return true;
                }
                if !visited[edge.task as usize] {
                    visited[edge.task as usize] = true;
                    queue.push_back(edge.task);
                }
            }
        }

        false
    }

    /// Whether adding `predecessor -> successor` would close a cycle.
    pub fn would_create_cycle(&self, predecessor: &str, successor: &str) -> bool {
        predecessor == successor || self.has_path(successor, predecessor)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::duration::Duration;

    pub(crate) fn make_task(id: &str, days: f64, preds: &[&str]) -> TaskNode {
        let mut task = TaskNode::new(id, Duration::days(days).unwrap());
        for pred in preds {
            task = task.after(*pred);
        }
        task
    }

    /// Small deterministic generator (LCG) so network sweeps are reproducible.
    pub(crate) struct Lcg(u64);

    impl Lcg {
        pub(crate) fn new(seed: u64) -> Self {
            Self(seed.wrapping_mul(6364136223846793005).wrapping_add(1))
        }

        pub(crate) fn next(&mut self) -> u64 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            self.0 >> 33
        }

        pub(crate) fn below(&mut self, bound: u64) -> u64 {
            self.next() % bound.max(1)
        }
    }

    /// Random DAG: task `t{i}` may only depend on tasks with a lower index.
    /// Tasks are then listed in a shuffled order so input order differs from
    /// dependency order.
    pub(crate) fn random_dag(seed: u64, n: usize) -> Vec<TaskNode> {
        let mut rng = Lcg::new(seed);
        let mut tasks: Vec<TaskNode> = (0..n)
            .map(|i| {
                let days = 1.0 + rng.below(5) as f64;
                let mut task = TaskNode::new(format!("t{}", i), Duration::days(days).unwrap());
                for j in 0..i {
                    if rng.below(3) == 0 {
                        task = task.after(format!("t{}", j));
                    }
                }
                task
            })
            .collect();
        for i in (1..tasks.len()).rev() {
            let j = rng.below(i as u64 + 1) as usize;
            tasks.swap(i, j);
        }
        tasks
    }

    #[test]
    fn test_build_rejects_self_dependency() {
        let tasks = vec![make_task("a", 1.0, &[]), make_task("b", 1.0, &["b"])];
        assert_eq!(
            TaskGraph::build(&tasks).unwrap_err(),
            EngineError::SelfDependency("b".to_string())
        );
    }

    #[test]
    fn test_build_rejects_unknown_predecessor() {
        let tasks = vec![make_task("a", 1.0, &["ghost"])];
        assert_eq!(
            TaskGraph::build(&tasks).unwrap_err(),
            EngineError::UnknownPredecessor {
                task_id: "a".to_string(),
                missing_id: "ghost".to_string(),
            }
        );
    }

    #[test]
    fn test_build_rejects_duplicate_ids() {
        let tasks = vec![make_task("a", 1.0, &[]), make_task("a", 2.0, &[])];
        assert_eq!(
            TaskGraph::build(&tasks).unwrap_err(),
            EngineError::DuplicateTask("a".to_string())
        );
    }

    #[test]
    fn test_detects_three_cycle() {
        let tasks = vec![
            make_task("a", 1.0, &["c"]),
            make_task("b", 1.0, &["a"]),
            make_task("c", 1.0, &["b"]),
        ];
        let graph = TaskGraph::build(&tasks).unwrap();
        let cycle = graph.find_cycle().unwrap();
        assert_eq!(cycle.first(), cycle.last());
        assert_eq!(cycle.len(), 4);

        match TaskGraph::validate(&tasks) {
            Err(EngineError::CircularDependency { task_id, .. }) => {
                assert!(["a", "b", "c"].contains(&task_id.as_str()));
            }
            other => panic!("expected circular dependency, got {:?}", other),
        }
        assert!(matches!(
            graph.topological_order(),
            Err(EngineError::CircularDependency { .. })
        ));
    }

    #[test]
    fn test_detects_cycle_off_the_main_chain() {
        // a -> b -> c is fine, d <-> e is the cycle
        let tasks = vec![
            make_task("a", 1.0, &[]),
            make_task("b", 1.0, &["a"]),
            make_task("c", 1.0, &["b"]),
            make_task("d", 1.0, &["a", "e"]),
            make_task("e", 1.0, &["d"]),
        ];
        let graph = TaskGraph::build(&tasks).unwrap();
        let cycle = graph.find_cycle().unwrap();
        assert!(cycle.contains(&"d".to_string()));
        assert!(cycle.contains(&"e".to_string()));
        assert!(!cycle.contains(&"c".to_string()));
    }

    #[test]
    fn test_long_chain_does_not_overflow() {
        let n = 50_000;
        let tasks: Vec<TaskNode> = (0..n)
            .map(|i| {
                let task = TaskNode::new(format!("t{}", i), Duration::hours(1.0).unwrap());
                if i == 0 {
                    task
                } else {
                    task.after(format!("t{}", i - 1))
                }
            })
            .collect();
        let graph = TaskGraph::validate(&tasks).unwrap();
        assert_eq!(graph.topological_order().unwrap().len(), n);
    }

    #[test]
    fn test_topological_order_is_stable() {
        // b and c are both ready after a; insertion order puts c first
        let tasks = vec![
            make_task("a", 1.0, &[]),
            make_task("c", 1.0, &["a"]),
            make_task("b", 1.0, &["a"]),
            make_task("d", 1.0, &["b", "c"]),
        ];
        let graph = TaskGraph::validate(&tasks).unwrap();
        assert_eq!(graph.topological_ids().unwrap(), vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn test_topological_order_on_random_dags() {
        for seed in 0..200 {
            let n = 1 + (seed as usize % 25);
            let tasks = random_dag(seed, n);
            let graph = TaskGraph::validate(&tasks).unwrap();
            let order = graph.topological_ids().unwrap();

            assert_eq!(order.len(), tasks.len());
            let position: std::collections::HashMap<&str, usize> = order
                .iter()
                .enumerate()
                .map(|(i, id)| (id.as_str(), i))
                .collect();
            assert_eq!(position.len(), tasks.len(), "each task emitted once");
            for task in &tasks {
                for pred in task.predecessor_ids() {
                    assert!(position[pred] < position[task.id.as_str()]);
                }
            }
        }
    }

    #[test]
    fn test_random_dags_with_back_edge_are_rejected() {
        for seed in 0..100 {
            let mut tasks = random_dag(seed, 6);
            // Close a cycle t0 -> ... -> t5 -> t0 by forcing a chain plus a back edge.
            for task in tasks.iter_mut() {
                let i: usize = task.id[1..].parse().unwrap();
                if i > 0 {
                    *task = task.clone().after(format!("t{}", i - 1));
                } else {
                    *task = task.clone().after("t5");
                }
            }
            assert!(matches!(
                TaskGraph::validate(&tasks),
                Err(EngineError::CircularDependency { .. })
            ));
        }
    }

    #[test]
    fn test_path_queries() {
        let tasks = vec![
            make_task("a", 1.0, &[]),
            make_task("b", 1.0, &["a"]),
            make_task("c", 1.0, &["b"]),
            make_task("x", 1.0, &[]),
        ];
        let graph = TaskGraph::validate(&tasks).unwrap();

        assert!(graph.has_path("a", "c"));
        assert!(!graph.has_path("c", "a"));
        assert!(!graph.has_path("a", "x"));
        assert!(!graph.has_path("a", "missing"));

        // c -> a would close a -> b -> c
        assert!(graph.would_create_cycle("c", "a"));
        assert!(!graph.would_create_cycle("a", "c"));
        assert!(!graph.would_create_cycle("x", "a"));
        assert!(graph.would_create_cycle("x", "x"));
    }

    #[test]
    fn test_neighbour_queries() {
        let tasks = vec![
            make_task("a", 1.0, &[]),
            make_task("b", 1.0, &["a"]),
            make_task("c", 1.0, &["a"]),
            make_task("d", 1.0, &["b", "c"]),
        ];
        let graph = TaskGraph::validate(&tasks).unwrap();
        assert_eq!(graph.successors("a"), vec!["b", "c"]);
        assert_eq!(graph.predecessors("d"), vec!["b", "c"]);
        assert_eq!(graph.sources(), vec!["a"]);
        assert_eq!(graph.sinks(), vec!["d"]);
        assert!(graph.successors("missing").is_empty());
    }
}
