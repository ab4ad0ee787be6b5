//! Critical path calculation using forward and backward passes.

use chrono::NaiveDateTime;

use crate::config::CriticalPathConfig;
use crate::duration::Duration;
use crate::error::{EngineError, EngineResult};
use crate::graph::TaskGraph;
use crate::interner::TaskIdx;
use crate::models::TaskNode;
use crate::{log_changes, log_debug};

use super::types::{CriticalPath, CriticalPathAnalysis, CriticalityStatus, Float, TaskTiming};

/// Run the Critical Path Method over a task network.
///
/// The network is validated first (duplicate ids, self-dependencies, unknown
/// predecessors, cycles). Offsets are computed in whole milliseconds from
/// `project_start`; `calculated_at` is stamped on the result as given.
///
/// # Returns
/// * `Err(EmptyNetwork)` for zero tasks
/// * validation errors from [`TaskGraph::validate`]
/// * `Err(InvalidDuration)` when an offset does not fit in `i64` milliseconds
/// * `Err(NegativeFloat)` / `Err(NoCriticalPathFound)` only on an internal defect
pub fn calculate_critical_path(
    tasks: &[TaskNode],
    project_start: NaiveDateTime,
    calculated_at: NaiveDateTime,
    config: &CriticalPathConfig,
) -> EngineResult<CriticalPathAnalysis> {
    if tasks.is_empty() {
        return Err(EngineError::EmptyNetwork);
    }
    let graph = TaskGraph::validate(tasks)?;
    calculate_for_graph(&graph, project_start, calculated_at, config)
}

/// Run the passes over an already validated graph.
pub fn calculate_for_graph(
    graph: &TaskGraph<'_>,
    project_start: NaiveDateTime,
    calculated_at: NaiveDateTime,
    config: &CriticalPathConfig,
) -> EngineResult<CriticalPathAnalysis> {
    let verbosity = config.verbosity;
    let n = graph.len();
    if n == 0 {
        return Err(EngineError::EmptyNetwork);
    }

    let order = graph.topological_order()?;
    let durations: Vec<i64> = (0..n as TaskIdx)
        .map(|idx| {
            graph
                .task(idx)
                .duration
                .checked_millis()
                .ok_or_else(|| out_of_range(graph, idx))
        })
        .collect::<EngineResult<_>>()?;

    // Forward pass. Topological order guarantees every predecessor is resolved
    // before its successor is visited, so each task is computed exactly once.
    let mut earliest_start = vec![0i64; n];
    let mut earliest_finish = vec![0i64; n];
    let mut resolved = vec![false; n];

    for &idx in &order {
        let i = idx as usize;
        let mut start = 0i64;
        for edge in graph.predecessor_edges(idx) {
            debug_assert!(resolved[edge.task as usize]);
            let ready = earliest_finish[edge.task as usize]
                .checked_add(edge.lag_ms)
                .ok_or_else(|| out_of_range(graph, idx))?;
            start = start.max(ready);
        }
        earliest_start[i] = start;
        earliest_finish[i] = start
            .checked_add(durations[i])
            .ok_or_else(|| out_of_range(graph, idx))?;
        resolved[i] = true;
        log_debug!(
            verbosity,
            "  forward {}: es={} ef={}",
            graph.id_of(idx),
            earliest_start[i],
            earliest_finish[i]
        );
    }

    let project_finish = earliest_finish.iter().copied().max().unwrap_or(0);
    let project_begin = earliest_start.iter().copied().min().unwrap_or(0);

    // Backward pass from the sinks.
    let mut latest_finish = vec![0i64; n];
    let mut latest_start = vec![0i64; n];

    for &idx in order.iter().rev() {
        let i = idx as usize;
        let successors = graph.successor_edges(idx);
        let mut finish = project_finish;
        for edge in successors {
            let deadline = latest_start[edge.task as usize]
                .checked_sub(edge.lag_ms)
                .ok_or_else(|| out_of_range(graph, idx))?;
            finish = finish.min(deadline);
        }
        latest_finish[i] = finish;
        latest_start[i] = finish
            .checked_sub(durations[i])
            .ok_or_else(|| out_of_range(graph, idx))?;
        log_debug!(
            verbosity,
            "  backward {}: ls={} lf={}",
            graph.id_of(idx),
            latest_start[i],
            latest_finish[i]
        );
    }

    let tolerance_ms = config.critical_tolerance.to_millis();
    let near_threshold_ms = config.near_critical_threshold.to_millis();

    let mut timings: Vec<TaskTiming> = Vec::with_capacity(n);
    for &idx in &order {
        let i = idx as usize;
        let task_id = graph.id_of(idx);

        let total_float =
            Float::calculate_total_float(task_id, earliest_start[i], latest_start[i])?;
        let successor_deadline = graph
            .successor_edges(idx)
            .iter()
            .map(|e| earliest_start[e.task as usize] - e.lag_ms)
            .min()
            .unwrap_or(project_finish);
        let free_float =
            Float::calculate_free_float(task_id, earliest_finish[i], successor_deadline)?;

        let float_ms = latest_start[i] - earliest_start[i];
        let status = if float_ms <= tolerance_ms {
            CriticalityStatus::Critical
        } else if float_ms <= near_threshold_ms {
            CriticalityStatus::NearCritical
        } else {
            CriticalityStatus::Normal
        };

        timings.push(TaskTiming {
            task_id: task_id.to_string(),
            duration: graph.task(idx).duration,
            earliest_start_ms: earliest_start[i],
            earliest_finish_ms: earliest_finish[i],
            latest_start_ms: latest_start[i],
            latest_finish_ms: latest_finish[i],
            float: Float::new(total_float, free_float),
            status,
        });
    }

    // Stable sort keeps topological position as the tie-break.
    let mut critical: Vec<&TaskTiming> = timings.iter().filter(|t| t.is_critical()).collect();
    critical.sort_by_key(|t| t.earliest_start_ms);
    let critical_ids: Vec<String> = critical.iter().map(|t| t.task_id.clone()).collect();

    debug_assert!(
        !critical_ids.is_empty(),
        "valid network produced no critical task"
    );
    if critical_ids.is_empty() {
        return Err(EngineError::NoCriticalPathFound);
    }

    let total_duration = Duration::from_millis(project_finish - project_begin)?;
    log_changes!(
        verbosity,
        "Critical path: {} ({} tasks, {})",
        critical_ids.join(" -> "),
        critical_ids.len(),
        total_duration
    );

    let critical_path = CriticalPath::new(critical_ids, total_duration, calculated_at)?;
    Ok(CriticalPathAnalysis::new(
        project_start,
        critical_path,
        timings,
    ))
}

fn out_of_range(graph: &TaskGraph<'_>, idx: TaskIdx) -> EngineError {
    EngineError::InvalidDuration(format!(
        "schedule for task {} exceeds representable range",
        graph.id_of(idx)
    ))
}
