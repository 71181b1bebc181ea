use crate::model::vehicle::{TaskId, VehicleId};
use fixed::types::I32F32;
use std::collections::BTreeMap;
use strum_macros::Display;

/// The strategy the Decide phase selected for a cycle.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "kebab-case")]
pub enum Strategy {
    NoOp,
    FullReallocation,
    /// An internal invariant violation aborted the cycle; no commands were
    /// emitted and the previous plan remains in force.
    Error,
}

/// Per-phase wall-clock timings for one OODA cycle, in milliseconds.
#[derive(Debug, Clone, Copy, Default, serde::Serialize, serde::Deserialize)]
pub struct PhaseTimingsMs {
    pub observe: u64,
    pub orient: u64,
    pub decide: u64,
    pub act: u64,
}

/// Structured metrics carried by every Decision Event. `coverage_loss` is
/// defined as a priority-weighted fraction, not count-weighted — see the
/// coverage-loss resolution in the design notes.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CycleMetrics {
    pub recovery_rate: f64,
    pub tasks_recovered: u32,
    pub tasks_lost: u32,
    pub unallocated_count: u32,
    pub coverage_loss: f64,
    pub battery_spare: f64,
    pub payload_spare: f64,
    pub operational_uavs: u32,
    pub failed_uavs: u32,
    pub temporal_margin_secs: f64,
    pub affected_zones: u32,
    pub objective_score: f64,
    pub optimization_time_ms: u64,
    pub optimization_iterations: u32,
    pub optimality_gap_estimate: f64,
}

impl CycleMetrics {
    pub fn recovery_rate(tasks_recovered: u32, tasks_lost: u32) -> f64 {
        if tasks_lost == 0 { 0.0 } else { f64::from(tasks_recovered) / f64::from(tasks_lost) }
    }
}

/// One emitted record on the dashboard event channel: everything an
/// operator needs to understand why a cycle did what it did.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DecisionEvent {
    pub cycle: u64,
    pub strategy: Strategy,
    pub rationale: String,
    pub phase_timings_ms: PhaseTimingsMs,
    pub metrics: CycleMetrics,
    pub assignments: BTreeMap<VehicleId, Vec<TaskId>>,
    pub escalated: Vec<TaskId>,
}

/// Energy-unit helper kept next to the event types it feeds: converts a
/// fixed-point fraction into the `f64` the metrics record reports, since
/// the event/transport boundary is plain JSON-shaped data, not fixed-point.
pub fn to_f64(value: I32F32) -> f64 { value.to_num() }
