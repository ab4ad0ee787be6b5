//! Resource leveling by delaying non-critical tasks.
//!
//! Each allocation point is split into per-task loads (equal shares of the
//! point's units). Delaying a task by whole days moves all of its loads on
//! every resource and pushes its successors forward through the network. One
//! allocation day corresponds to one 8-hour working day of schedule time.

use chrono::{Days, NaiveDate};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::LevelingConfig;
use crate::critical_path::{CriticalPathAnalysis, TaskTiming};
use crate::duration::{Duration, HOURS_PER_DAY};
use crate::error::{EngineError, EngineResult};
use crate::graph::TaskGraph;
use crate::interner::TaskIdx;
use crate::models::TaskNode;
use crate::{log_changes, log_checks, log_debug};

use super::resource::{ResourceAllocation, ResourceProfile};
use super::result::{DelayedTask, LevelingMetrics, LevelingResult};

const DAY_MS: i64 = (HOURS_PER_DAY as i64) * 3_600_000;
const UNITS_EPSILON: f64 = 1e-9;

/// Heuristic deciding which conflicting task is delayed first.
///
/// Ties are broken by task id so results are reproducible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LevelingAlgorithm {
    /// Delay the task with the most total float first.
    MinimumTotalFloat,
    /// Tasks that must finish soonest keep the resource; delay the latest late finish first.
    MinimumLateFinish,
    /// Tasks that must start soonest keep the resource; delay the latest late start first.
    MinimumLateStart,
    /// Delay the shortest task first.
    ShortestDuration,
    /// Delay the longest task first.
    LongestDuration,
}

impl LevelingAlgorithm {
    /// Sort key; the smallest key is delayed first.
    fn delay_key(self, timing: &TaskTiming) -> i64 {
        match self {
            LevelingAlgorithm::MinimumTotalFloat => {
                -(timing.latest_start_ms - timing.earliest_start_ms)
            }
            LevelingAlgorithm::MinimumLateFinish => -timing.latest_finish_ms,
            LevelingAlgorithm::MinimumLateStart => -timing.latest_start_ms,
            LevelingAlgorithm::ShortestDuration => {
                timing.earliest_finish_ms - timing.earliest_start_ms
            }
            LevelingAlgorithm::LongestDuration => {
                -(timing.earliest_finish_ms - timing.earliest_start_ms)
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LevelingAlgorithm::MinimumTotalFloat => "minimum-total-float",
            LevelingAlgorithm::MinimumLateFinish => "minimum-late-finish",
            LevelingAlgorithm::MinimumLateStart => "minimum-late-start",
            LevelingAlgorithm::ShortestDuration => "shortest-duration",
            LevelingAlgorithm::LongestDuration => "longest-duration",
        }
    }
}

/// Share of a resource used by one task (or by unattributed work) on one date.
#[derive(Clone, Debug)]
struct Load {
    task: Option<TaskIdx>,
    date: NaiveDate,
    units: f64,
}

/// Per-date totals of a resource after applying the current shifts.
struct DayUsage {
    units: f64,
    tasks: Vec<(TaskIdx, f64)>,
    external: bool,
}

/// First overallocated run found on a resource.
struct Conflict {
    resource: usize,
    date: NaiveDate,
    run_days: u64,
    capacity: f64,
    usage: DayUsage,
}

/// Mutable working state of one leveling call.
struct LevelingState<'g, 'a> {
    graph: &'g TaskGraph<'a>,
    order: Vec<TaskIdx>,
    timings: Vec<&'g TaskTiming>,
    loads: Vec<Vec<Load>>,
    shift_days: Vec<u64>,
    reasons: Vec<Option<String>>,
}

impl<'g, 'a> LevelingState<'g, 'a> {
    fn shifted_date(&self, load: &Load) -> NaiveDate {
        match load.task {
            Some(t) => load
                .date
                .checked_add_days(Days::new(self.shift_days[t as usize]))
                .unwrap_or(load.date),
            None => load.date,
        }
    }

    fn usage(&self, resource: usize) -> BTreeMap<NaiveDate, DayUsage> {
        let mut days: BTreeMap<NaiveDate, DayUsage> = BTreeMap::new();
        for load in &self.loads[resource] {
            let entry = days.entry(self.shifted_date(load)).or_insert(DayUsage {
                units: 0.0,
                tasks: Vec::new(),
                external: false,
            });
            entry.units += load.units;
            match load.task {
                Some(t) => match entry.tasks.iter_mut().find(|(idx, _)| *idx == t) {
                    Some((_, units)) => *units += load.units,
                    None => entry.tasks.push((t, load.units)),
                },
                None => entry.external = true,
            }
        }
        days
    }

    fn earliest_start_ms(&self, idx: TaskIdx) -> i64 {
        let shift_ms = (self.shift_days[idx as usize] as i64).saturating_mul(DAY_MS);
        self.timings[idx as usize]
            .earliest_start_ms
            .saturating_add(shift_ms)
    }

    fn earliest_finish_ms(&self, idx: TaskIdx) -> i64 {
        let timing = self.timings[idx as usize];
        self.earliest_start_ms(idx)
            .saturating_add(timing.earliest_finish_ms - timing.earliest_start_ms)
    }

    /// Push successors of delayed tasks forward so precedence still holds.
    fn propagate(&mut self, verbosity: u8) {
        for pos in 0..self.order.len() {
            let idx = self.order[pos];
            let i = idx as usize;
            let original_es = self.timings[i].earliest_start_ms;

            let mut required = self.earliest_start_ms(idx);
            let mut pusher: Option<TaskIdx> = None;
            for edge in self.graph.predecessor_edges(idx) {
                let ready = self.earliest_finish_ms(edge.task).saturating_add(edge.lag_ms);
                if ready > required {
                    required = ready;
                    pusher = Some(edge.task);
                }
            }

            if let Some(pred) = pusher {
                let needed_ms = required - original_es;
                let needed_days = ((needed_ms + DAY_MS - 1) / DAY_MS).max(0) as u64;
                if needed_days > self.shift_days[i] {
                    self.shift_days[i] = needed_days;
                    if self.reasons[i].is_none() {
                        self.reasons[i] = Some(format!(
                            "pushed by delayed predecessor {}",
                            self.graph.id_of(pred)
                        ));
                    }
                    log_debug!(
                        verbosity,
                        "    {} pushed to +{} days by {}",
                        self.graph.id_of(idx),
                        needed_days,
                        self.graph.id_of(pred)
                    );
                }
            }
        }
    }
}

/// Resolve resource overallocation by delaying non-critical tasks.
///
/// `analysis` must come from the same task set. Allocations naming tasks that
/// are not in the network are treated as fixed load that cannot be moved.
///
/// The leveled duration is never shorter than the original critical path.
pub fn level_resources(
    tasks: &[TaskNode],
    analysis: &CriticalPathAnalysis,
    profiles: &[ResourceProfile],
    algorithm: LevelingAlgorithm,
    config: &LevelingConfig,
) -> EngineResult<LevelingResult> {
    let verbosity = config.verbosity;
    if tasks.is_empty() {
        return Err(EngineError::EmptyNetwork);
    }
    let graph = TaskGraph::validate(tasks)?;
    let order = graph.topological_order()?;

    let mut timings: Vec<&TaskTiming> = Vec::with_capacity(graph.len());
    for task in tasks {
        let timing = analysis
            .timing(&task.id)
            .ok_or_else(|| EngineError::MissingTiming(task.id.clone()))?;
        timings.push(timing);
    }

    let loads: Vec<Vec<Load>> = profiles
        .iter()
        .map(|profile| split_loads(profile, &graph))
        .collect();

    let n = graph.len();
    let mut state = LevelingState {
        graph: &graph,
        order,
        timings,
        loads,
        shift_days: vec![0; n],
        reasons: vec![None; n],
    };

    let overallocations_before: usize = profiles
        .iter()
        .map(|p| p.overallocation_periods().len())
        .sum();

    let mut unresolvable: FxHashSet<(usize, NaiveDate)> = FxHashSet::default();
    let mut iterations = 0usize;

    while iterations < config.max_iterations {
        let Some(conflict) = find_conflict(&state, profiles, &unresolvable) else {
            break;
        };
        iterations += 1;
        let Conflict {
            resource,
            date,
            run_days,
            capacity,
            usage,
        } = conflict;

        // A task needing more than the resource ever offers is over wherever it goes.
        let max_units = profiles[resource].constraint().max_units_available();
        let resource_id = profiles[resource].resource_id();
        let mut movable: Vec<TaskIdx> = Vec::new();
        let mut pinned_units = usage.units;
        for &(task, units) in &usage.tasks {
            if !state.timings[task as usize].is_critical() && units <= max_units + UNITS_EPSILON {
                movable.push(task);
                pinned_units -= units;
            }
        }

        if movable.is_empty() || pinned_units > capacity + UNITS_EPSILON {
            log_checks!(
                verbosity,
                "  {} overallocated on {} by work that cannot be moved",
                resource_id,
                date
            );
            unresolvable.insert((resource, date));
            continue;
        }

        movable.sort_by(|&a, &b| {
            let ta = state.timings[a as usize];
            let tb = state.timings[b as usize];
            algorithm
                .delay_key(ta)
                .cmp(&algorithm.delay_key(tb))
                .then_with(|| ta.task_id.cmp(&tb.task_id))
        });
        for &candidate in &movable {
            log_checks!(
                verbosity,
                "  candidate {} (key {})",
                graph.id_of(candidate),
                algorithm.delay_key(state.timings[candidate as usize])
            );
        }

        let chosen = movable[0];
        let c = chosen as usize;
        state.shift_days[c] += run_days;
        if state.reasons[c].is_none() {
            state.reasons[c] = Some(format!(
                "resource conflict on {} starting {}",
                resource_id, date
            ));
        }
        log_changes!(
            verbosity,
            "Delayed {} by {} day(s) to relieve {} on {} ({})",
            graph.id_of(chosen),
            run_days,
            resource_id,
            date,
            algorithm.name()
        );
        state.propagate(verbosity);
    }

    if iterations >= config.max_iterations {
        log_changes!(
            verbosity,
            "Leveling stopped after {} iterations with conflicts remaining",
            iterations
        );
    }

    let leveled_profiles: Vec<ResourceProfile> = profiles
        .iter()
        .enumerate()
        .map(|(r, profile)| rebuild_profile(&state, r, profile))
        .collect::<EngineResult<_>>()?;

    let original_duration = analysis.critical_path().total_duration();
    let project_begin = state
        .timings
        .iter()
        .map(|t| t.earliest_start_ms)
        .min()
        .unwrap_or(0);
    let leveled_finish = (0..n as TaskIdx)
        .map(|t| state.earliest_finish_ms(t))
        .max()
        .unwrap_or(0);
    let leveled_duration = Duration::from_millis(leveled_finish - project_begin)?;
    // Shifts only move work later, so this never shortens the schedule.
    let leveled_duration = if leveled_duration.is_shorter_than(&original_duration) {
        original_duration
    } else {
        leveled_duration
    };

    let mut delayed_tasks = Vec::new();
    for &idx in &state.order {
        let i = idx as usize;
        if state.shift_days[i] == 0 {
            continue;
        }
        delayed_tasks.push(DelayedTask {
            task_id: graph.id_of(idx).to_string(),
            delay: Duration::days(state.shift_days[i] as f64)?,
            reason: state.reasons[i].clone().unwrap_or_default(),
        });
    }

    let metrics = LevelingMetrics::measure(
        &original_duration,
        &leveled_duration,
        overallocations_before,
        &leveled_profiles,
    );

    let result = LevelingResult::new(
        algorithm,
        original_duration,
        leveled_duration,
        leveled_profiles,
        delayed_tasks,
        metrics,
        iterations,
    );
    log_changes!(
        verbosity,
        "Leveling finished: {} delayed, score {:.1}, {:?}",
        result.delayed_tasks.len(),
        result.effectiveness_score,
        result.recommendation
    );
    Ok(result)
}

fn split_loads(profile: &ResourceProfile, graph: &TaskGraph<'_>) -> Vec<Load> {
    let mut loads = Vec::new();
    for allocation in profile.allocations() {
        if allocation.task_ids.is_empty() {
            loads.push(Load {
                task: None,
                date: allocation.date,
                units: allocation.units_allocated,
            });
            continue;
        }
        let share = allocation.units_allocated / allocation.task_ids.len() as f64;
        for id in &allocation.task_ids {
            loads.push(Load {
                task: graph.index_of(id),
                date: allocation.date,
                units: share,
            });
        }
    }
    loads
}

/// Earliest overallocated point across resources (in input order) and the
/// length in days of the contiguous overallocated run starting there.
fn find_conflict(
    state: &LevelingState<'_, '_>,
    profiles: &[ResourceProfile],
    unresolvable: &FxHashSet<(usize, NaiveDate)>,
) -> Option<Conflict> {
    for (resource, profile) in profiles.iter().enumerate() {
        let constraint = profile.constraint();
        let mut found: Option<(NaiveDate, NaiveDate, DayUsage)> = None;

        for (date, day) in state.usage(resource) {
            let is_over = day.units > constraint.capacity_on(date) + UNITS_EPSILON;
            if let Some((_, run_end, _)) = found.as_mut() {
                if !is_over || run_end.succ_opt() != Some(date) {
                    break;
                }
                *run_end = date;
            } else if is_over && !unresolvable.contains(&(resource, date)) {
                found = Some((date, date, day));
            }
        }

        if let Some((start, end, usage)) = found {
            return Some(Conflict {
                resource,
                date: start,
                run_days: ((end - start).num_days() + 1).max(1) as u64,
                capacity: constraint.capacity_on(start),
                usage,
            });
        }
    }
    None
}

fn rebuild_profile(
    state: &LevelingState<'_, '_>,
    resource: usize,
    original: &ResourceProfile,
) -> EngineResult<ResourceProfile> {
    let allocations: Vec<ResourceAllocation> = state
        .usage(resource)
        .into_iter()
        .map(|(date, day)| {
            let mut task_ids: Vec<String> = day
                .tasks
                .iter()
                .map(|&(t, _)| state.graph.id_of(t).to_string())
                .collect();
            if day.external {
                // Keep ids of unattributed work the caller supplied on this date.
                for allocation in original.allocations() {
                    if allocation.date == date {
                        for id in &allocation.task_ids {
                            if state.graph.index_of(id).is_none() && !task_ids.contains(id) {
                                task_ids.push(id.clone());
                            }
                        }
                    }
                }
            }
            ResourceAllocation::new(date, day.units, task_ids)
        })
        .collect();
    ResourceProfile::new(original.constraint().clone(), allocations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CriticalPathConfig;
    use crate::critical_path::calculate_critical_path;
    use crate::graph::tests::make_task;
    use crate::leveling::resource::tests::{alloc, crew, d};
    use crate::models::Recommendation;
    use chrono::NaiveDateTime;

    fn start() -> NaiveDateTime {
        d(2025, 3, 3).and_hms_opt(8, 0, 0).unwrap()
    }

    fn analyze(tasks: &[TaskNode]) -> CriticalPathAnalysis {
        calculate_critical_path(tasks, start(), start(), &CriticalPathConfig::default()).unwrap()
    }

    /// a (3d) critical, b (1d) and c (1d) float alongside it, all needing the crew.
    fn parallel_network() -> (Vec<TaskNode>, ResourceProfile) {
        let tasks = vec![
            make_task("a", 3.0, &[]),
            make_task("b", 1.0, &[]),
            make_task("c", 2.0, &[]),
        ];
        let profile = ResourceProfile::new(
            crew(2.0),
            vec![
                alloc(3, 3.0, &["a", "b", "c"]),
                alloc(4, 2.0, &["a", "c"]),
                alloc(5, 1.0, &["a"]),
            ],
        )
        .unwrap();
        (tasks, profile)
    }

    #[test]
    fn test_no_conflict_is_a_no_op() {
        let tasks = vec![make_task("a", 2.0, &[]), make_task("b", 1.0, &[])];
        let analysis = analyze(&tasks);
        let profile = ResourceProfile::new(
            crew(2.0),
            vec![alloc(3, 2.0, &["a", "b"]), alloc(4, 1.0, &["a"])],
        )
        .unwrap();

        let result = level_resources(
            &tasks,
            &analysis,
            &[profile],
            LevelingAlgorithm::MinimumTotalFloat,
            &LevelingConfig::default(),
        )
        .unwrap();

        assert!(result.delayed_tasks.is_empty());
        assert_eq!(result.leveled_duration, result.original_duration);
        assert_eq!(result.metrics.overallocations_before, 0);
        assert_eq!(result.metrics.remaining_overallocations, 0);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_delays_task_with_most_float() {
        let (tasks, profile) = parallel_network();
        let analysis = analyze(&tasks);

        let result = level_resources(
            &tasks,
            &analysis,
            &[profile],
            LevelingAlgorithm::MinimumTotalFloat,
            &LevelingConfig::default(),
        )
        .unwrap();

        // b has 2 days of float, c has 1: b moves first, out of day 3 onto day 4,
        // which then overloads day 4 and moves b again onto day 5.
        assert_eq!(result.delayed_tasks.len(), 1);
        let delayed = &result.delayed_tasks[0];
        assert_eq!(delayed.task_id, "b");
        assert!((delayed.delay.to_days() - 2.0).abs() < 1e-9);
        assert!(delayed.reason.contains("crew"));

        assert_eq!(result.metrics.remaining_overallocations, 0);
        assert_eq!(result.metrics.overallocations_resolved, 1);
        assert_eq!(result.leveled_duration, result.original_duration);
        assert!(!result.leveled_profiles[0].is_overallocated());
        assert_eq!(result.recommendation, Recommendation::Accept);
    }

    #[test]
    fn test_longest_duration_heuristic_picks_other_task() {
        let (tasks, profile) = parallel_network();
        let analysis = analyze(&tasks);

        let result = level_resources(
            &tasks,
            &analysis,
            &[profile],
            LevelingAlgorithm::LongestDuration,
            &LevelingConfig::default(),
        )
        .unwrap();

        assert_eq!(result.delayed_tasks[0].task_id, "c");
        assert_eq!(result.metrics.remaining_overallocations, 0);
    }

    #[test]
    fn test_late_date_and_shortest_heuristics_pick_their_own_task() {
        // z (10d) is critical. t and v (9d) finish late at day 10, u (1d)
        // must finish by day 2 for w, x (2d) must start by day 6 for y.
        let tasks = vec![
            make_task("v", 9.0, &[]),
            make_task("t", 9.0, &[]),
            make_task("u", 1.0, &[]),
            make_task("x", 2.0, &[]),
            make_task("z", 10.0, &[]),
            make_task("w", 8.0, &["u"]),
            make_task("y", 2.0, &["x"]),
        ];
        let analysis = analyze(&tasks);
        let profile =
            ResourceProfile::new(crew(3.0), vec![alloc(3, 4.0, &["v", "t", "u", "x"])]).unwrap();

        let delayed_first = |algorithm: LevelingAlgorithm| {
            let result = level_resources(
                &tasks,
                &analysis,
                &[profile.clone()],
                algorithm,
                &LevelingConfig::default(),
            )
            .unwrap();
            assert_eq!(result.metrics.remaining_overallocations, 0);
            assert!(result.delayed_tasks[0]
                .reason
                .starts_with("resource conflict on crew"));
            result.delayed_tasks[0].task_id.clone()
        };

        // t and v tie on late finish; the lower id is delayed.
        assert_eq!(delayed_first(LevelingAlgorithm::MinimumLateFinish), "t");
        assert_eq!(delayed_first(LevelingAlgorithm::MinimumLateStart), "x");
        assert_eq!(delayed_first(LevelingAlgorithm::ShortestDuration), "u");
    }

    #[test]
    fn test_critical_tasks_are_never_delayed() {
        let tasks = vec![make_task("a", 1.0, &[]), make_task("b", 1.0, &[])];
        let analysis = analyze(&tasks);
        let profile =
            ResourceProfile::new(crew(1.0), vec![alloc(3, 2.0, &["a", "b"])]).unwrap();

        let result = level_resources(
            &tasks,
            &analysis,
            &[profile],
            LevelingAlgorithm::MinimumTotalFloat,
            &LevelingConfig::default(),
        )
        .unwrap();

        assert!(result.delayed_tasks.is_empty());
        assert_eq!(result.metrics.remaining_overallocations, 1);
        assert_eq!(result.iterations, 1);
        // No extension and a flat profile, but the conflict is still there.
        assert!((result.effectiveness_score - 60.0).abs() < 1e-9);
        assert_eq!(result.recommendation, Recommendation::Review);
    }

    #[test]
    fn test_task_larger_than_resource_is_not_chased() {
        let tasks = vec![make_task("a", 2.0, &[]), make_task("b", 1.0, &[])];
        let analysis = analyze(&tasks);
        let profile = ResourceProfile::new(crew(2.0), vec![alloc(3, 3.0, &["b"])]).unwrap();

        let result = level_resources(
            &tasks,
            &analysis,
            &[profile],
            LevelingAlgorithm::MinimumTotalFloat,
            &LevelingConfig::default(),
        )
        .unwrap();

        assert!(result.delayed_tasks.is_empty());
        assert_eq!(result.metrics.remaining_overallocations, 1);
    }

    #[test]
    fn test_delay_beyond_float_extends_schedule_and_pushes_successors() {
        // a (2d) critical; b (1d) -> c (1d) has no float to spare once b slips 2 days.
        let tasks = vec![
            make_task("a", 2.0, &[]),
            make_task("b", 1.0, &[]),
            make_task("c", 1.0, &["b"]),
            make_task("x", 3.0, &[]),
        ];
        let analysis = analyze(&tasks);
        let profile = ResourceProfile::new(
            crew(1.0),
            vec![
                alloc(3, 2.0, &["x", "b"]),
                alloc(4, 2.0, &["x", "c"]),
                alloc(5, 1.0, &["x"]),
            ],
        )
        .unwrap();

        let result = level_resources(
            &tasks,
            &analysis,
            &[profile],
            LevelingAlgorithm::MinimumTotalFloat,
            &LevelingConfig::default(),
        )
        .unwrap();

        let ids: Vec<&str> = result
            .delayed_tasks
            .iter()
            .map(|t| t.task_id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert!(result.delayed_tasks[1].reason.contains("predecessor b"));
        assert!(!result.leveled_duration.is_shorter_than(&result.original_duration));
        assert!(result.leveled_duration.is_longer_than(&result.original_duration));
        assert!(result.metrics.schedule_extension_percent > 0.0);
    }

    #[test]
    fn test_work_outside_network_is_left_in_place() {
        let tasks = vec![make_task("a", 2.0, &[]), make_task("b", 1.0, &[])];
        let analysis = analyze(&tasks);
        let profile = ResourceProfile::new(
            crew(1.0),
            vec![alloc(3, 1.0, &["maintenance"]), alloc(3, 1.0, &["b"])],
        )
        .unwrap();

        let result = level_resources(
            &tasks,
            &analysis,
            &[profile],
            LevelingAlgorithm::MinimumTotalFloat,
            &LevelingConfig::default(),
        )
        .unwrap();

        assert_eq!(result.delayed_tasks.len(), 1);
        assert_eq!(result.delayed_tasks[0].task_id, "b");
        let leveled = &result.leveled_profiles[0];
        assert_eq!(leveled.allocations()[0].date, d(2025, 3, 3));
        assert!((leveled.allocations()[0].units_allocated - 1.0).abs() < 1e-9);
        assert_eq!(leveled.allocations()[0].task_ids, vec!["maintenance"]);
        assert_eq!(leveled.allocations()[1].task_ids, vec!["b"]);
    }

    #[test]
    fn test_missing_timing_is_rejected() {
        let tasks = vec![make_task("a", 1.0, &[])];
        let analysis = analyze(&tasks);
        let more = vec![make_task("a", 1.0, &[]), make_task("z", 1.0, &[])];
        let err = level_resources(
            &more,
            &analysis,
            &[],
            LevelingAlgorithm::MinimumTotalFloat,
            &LevelingConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, EngineError::MissingTiming("z".to_string()));
    }

    #[test]
    fn test_every_heuristic_never_shortens_schedule_and_is_deterministic() {
        let algorithms = [
            LevelingAlgorithm::MinimumTotalFloat,
            LevelingAlgorithm::MinimumLateFinish,
            LevelingAlgorithm::MinimumLateStart,
            LevelingAlgorithm::ShortestDuration,
            LevelingAlgorithm::LongestDuration,
        ];
        for seed in 0..40u64 {
            let tasks = crate::graph::tests::random_dag(seed, 8);
            let analysis = analyze(&tasks);

            // Every task loads the crew for each day of its earliest schedule.
            let mut allocations = Vec::new();
            for timing in &analysis.timings {
                let first_day = (timing.earliest_start_ms / DAY_MS) as u32;
                let days = ((timing.earliest_finish_ms - timing.earliest_start_ms) / DAY_MS) as u32;
                for offset in 0..days {
                    allocations.push(ResourceAllocation::new(
                        d(2025, 3, 3) + Days::new(u64::from(first_day + offset)),
                        1.0,
                        vec![timing.task_id.clone()],
                    ));
                }
            }
            let profile = ResourceProfile::new(crew(2.0), allocations).unwrap();

            for &algorithm in &algorithms {
                let config = LevelingConfig {
                    max_iterations: 500,
                    ..LevelingConfig::default()
                };
                let first =
                    level_resources(&tasks, &analysis, &[profile.clone()], algorithm, &config)
                        .unwrap();
                let second =
                    level_resources(&tasks, &analysis, &[profile.clone()], algorithm, &config)
                        .unwrap();

                assert!(!first
                    .leveled_duration
                    .is_shorter_than(&analysis.critical_path().total_duration()));
                assert_eq!(first.delayed_tasks, second.delayed_tasks);
                assert!((0.0..=100.0).contains(&first.effectiveness_score));
            }
        }
    }
}
