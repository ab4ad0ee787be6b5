//! Python bindings, built with the `python` feature.
//!
//! Tasks and critical path results cross the boundary as Python classes.
//! Leveling and compression take and return JSON documents shaped like the
//! serde form of their Rust types.

// Allow clippy warning triggered by PyO3 macro expansion
#![allow(clippy::useless_conversion)]

use chrono::NaiveDateTime;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use serde::Deserialize;

use crate::compression::{CompressionPlan, CrashingOption, FastTrackingOption};
use crate::config::{CompressionConfig, CriticalPathConfig, LevelingConfig};
use crate::critical_path::{CriticalPathAnalysis, CriticalityStatus};
use crate::duration::Duration;
use crate::error::EngineError;
use crate::leveling::{LevelingAlgorithm, ResourceProfile};
use crate::models::{Predecessor, TaskNode};

impl From<EngineError> for PyErr {
    fn from(err: EngineError) -> Self {
        PyValueError::new_err(err.to_string())
    }
}

fn json_error(err: serde_json::Error) -> PyErr {
    PyValueError::new_err(format!("Invalid JSON: {}", err))
}

/// A task with its duration and lagged predecessors, in hours.
#[pyclass(name = "Task")]
#[derive(Clone, Debug)]
pub struct PyTask {
    #[pyo3(get, set)]
    pub id: String,
    #[pyo3(get, set)]
    pub duration_hours: f64,
    /// `(predecessor_id, lag_hours)` pairs.
    #[pyo3(get, set)]
    pub predecessors: Vec<(String, f64)>,
}

#[pymethods]
impl PyTask {
    #[new]
    #[pyo3(signature = (id, duration_hours, predecessors=Vec::new()))]
    fn new(id: String, duration_hours: f64, predecessors: Vec<(String, f64)>) -> Self {
        Self {
            id,
            duration_hours,
            predecessors,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "Task(id={}, duration_hours={}, predecessors={:?})",
            self.id, self.duration_hours, self.predecessors
        )
    }
}

impl PyTask {
    fn to_node(&self) -> Result<TaskNode, EngineError> {
        let mut node = TaskNode::new(self.id.clone(), Duration::hours(self.duration_hours)?);
        for (id, lag_hours) in &self.predecessors {
            node.predecessors
                .push(Predecessor::with_lag(id.clone(), Duration::hours(*lag_hours)?));
        }
        Ok(node)
    }
}

fn to_nodes(tasks: &[PyTask]) -> Result<Vec<TaskNode>, EngineError> {
    tasks.iter().map(PyTask::to_node).collect()
}

/// CPM timing of one task as calendar instants.
#[pyclass(name = "TaskTiming")]
#[derive(Clone, Debug)]
pub struct PyTaskTiming {
    #[pyo3(get)]
    pub task_id: String,
    #[pyo3(get)]
    pub earliest_start: NaiveDateTime,
    #[pyo3(get)]
    pub earliest_finish: NaiveDateTime,
    #[pyo3(get)]
    pub latest_start: NaiveDateTime,
    #[pyo3(get)]
    pub latest_finish: NaiveDateTime,
    #[pyo3(get)]
    pub total_float_hours: f64,
    #[pyo3(get)]
    pub free_float_hours: f64,
    /// "critical", "near-critical" or "normal".
    #[pyo3(get)]
    pub status: String,
}

#[pyclass(name = "CriticalPathResult")]
#[derive(Clone, Debug)]
pub struct PyCriticalPathResult {
    #[pyo3(get)]
    pub critical_path: Vec<String>,
    #[pyo3(get)]
    pub total_duration_hours: f64,
    #[pyo3(get)]
    pub project_finish: NaiveDateTime,
    #[pyo3(get)]
    pub timings: Vec<PyTaskTiming>,
}

fn instant(analysis: &CriticalPathAnalysis, offset_ms: i64) -> PyResult<NaiveDateTime> {
    analysis.instant_at(offset_ms).ok_or_else(|| {
        PyValueError::new_err(format!(
            "Offset of {} ms from {} is outside the supported date range",
            offset_ms, analysis.project_start
        ))
    })
}

impl TryFrom<&CriticalPathAnalysis> for PyCriticalPathResult {
    type Error = PyErr;

    fn try_from(analysis: &CriticalPathAnalysis) -> PyResult<Self> {
        let timings = analysis
            .timings
            .iter()
            .map(|t| {
                Ok(PyTaskTiming {
                    task_id: t.task_id.clone(),
                    earliest_start: instant(analysis, t.earliest_start_ms)?,
                    earliest_finish: instant(analysis, t.earliest_finish_ms)?,
                    latest_start: instant(analysis, t.latest_start_ms)?,
                    latest_finish: instant(analysis, t.latest_finish_ms)?,
                    total_float_hours: t.total_float().to_hours(),
                    free_float_hours: t.free_float().to_hours(),
                    status: match t.status {
                        CriticalityStatus::Critical => "critical",
                        CriticalityStatus::NearCritical => "near-critical",
                        CriticalityStatus::Normal => "normal",
                    }
                    .to_string(),
                })
            })
            .collect::<PyResult<Vec<_>>>()?;
        Ok(Self {
            critical_path: analysis.critical_path().task_ids().to_vec(),
            total_duration_hours: analysis.critical_path().total_duration().to_hours(),
            project_finish: instant(analysis, analysis.project_finish_ms())?,
            timings,
        })
    }
}

/// Check the network for duplicate ids, bad references and cycles.
///
/// # Raises
/// * ValueError describing the first problem found
#[pyfunction]
fn validate_network(tasks: Vec<PyTask>) -> PyResult<()> {
    let nodes = to_nodes(&tasks)?;
    crate::validate_network(&nodes)?;
    Ok(())
}

/// Task ids in dependency order (input order breaks ties).
#[pyfunction]
fn topological_sort(tasks: Vec<PyTask>) -> PyResult<Vec<String>> {
    let nodes = to_nodes(&tasks)?;
    Ok(crate::topological_sort(&nodes)?)
}

/// Run the forward and backward passes from `project_start`.
///
/// # Arguments
/// * `tasks` - The task network
/// * `project_start` - Instant the earliest tasks start
/// * `calculated_at` - Timestamp recorded on the result (defaults to `project_start`)
/// * `verbosity` - 0=silent, 1=changes, 2=checks, 3=debug
///
/// # Raises
/// * ValueError for an invalid network or a schedule past the supported dates
#[pyfunction]
#[pyo3(signature = (tasks, project_start, calculated_at=None, verbosity=0))]
fn calculate_critical_path(
    tasks: Vec<PyTask>,
    project_start: NaiveDateTime,
    calculated_at: Option<NaiveDateTime>,
    verbosity: u8,
) -> PyResult<PyCriticalPathResult> {
    let nodes = to_nodes(&tasks)?;
    let config = CriticalPathConfig {
        verbosity,
        ..CriticalPathConfig::default()
    };
    let analysis = crate::calculate_critical_path(
        &nodes,
        project_start,
        calculated_at.unwrap_or(project_start),
        &config,
    )?;
    PyCriticalPathResult::try_from(&analysis)
}

#[derive(Deserialize)]
struct LevelingRequest {
    tasks: Vec<TaskNode>,
    project_start: NaiveDateTime,
    profiles: Vec<ResourceProfile>,
    algorithm: LevelingAlgorithm,
    #[serde(default)]
    config: LevelingConfig,
}

/// Level resources for a JSON request and return the JSON result.
///
/// The request carries `tasks`, `project_start`, `profiles`, `algorithm` and
/// an optional `config`.
#[pyfunction]
fn level_resources_json(request: &str) -> PyResult<String> {
    let request: LevelingRequest = serde_json::from_str(request).map_err(json_error)?;
    let analysis = crate::calculate_critical_path(
        &request.tasks,
        request.project_start,
        request.project_start,
        &CriticalPathConfig {
            verbosity: request.config.verbosity,
            ..CriticalPathConfig::default()
        },
    )?;
    let result = crate::level_resources(
        &request.tasks,
        &analysis,
        &request.profiles,
        request.algorithm,
        &request.config,
    )?;
    serde_json::to_string(&result).map_err(json_error)
}

#[derive(Deserialize)]
struct CompressionRequest {
    #[serde(default)]
    crashing: Vec<CrashingOption>,
    #[serde(default)]
    fast_tracking: Vec<FastTrackingOption>,
    plan: CompressionPlan,
    #[serde(default)]
    config: CompressionConfig,
}

/// Analyze a compression plan given as JSON and return the JSON result.
#[pyfunction]
fn analyze_compression_json(request: &str) -> PyResult<String> {
    let request: CompressionRequest = serde_json::from_str(request).map_err(json_error)?;
    let result = crate::analyze_compression(
        &request.crashing,
        &request.fast_tracking,
        &request.plan,
        &request.config,
    )?;
    serde_json::to_string(&result).map_err(json_error)
}

/// The schedule_engine Python module.
#[pymodule]
fn schedule_engine(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyTask>()?;
    m.add_class::<PyTaskTiming>()?;
    m.add_class::<PyCriticalPathResult>()?;

    m.add_function(wrap_pyfunction!(validate_network, m)?)?;
    m.add_function(wrap_pyfunction!(topological_sort, m)?)?;
    m.add_function(wrap_pyfunction!(calculate_critical_path, m)?)?;
    m.add_function(wrap_pyfunction!(level_resources_json, m)?)?;
    m.add_function(wrap_pyfunction!(analyze_compression_json, m)?)?;

    Ok(())
}
