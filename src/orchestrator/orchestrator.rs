use crate::config::{Config, MissionType};
use crate::mission_db::MissionDatabase;
use crate::model::{
    CycleMetrics, DecisionEvent, OperatingRegion, PhaseTimingsMs, Strategy, TaskId, TaskSnapshot, TaskState, Vec3,
    VehicleId,
};
use crate::optimizer::optimize;
use crate::orchestrator::cycle::{distinct_zones, orphaned_tasks};
use crate::orchestrator::fault_detection::failure_predicate;
use crate::orchestrator::metrics::AggregateMetrics;
use crate::orchestrator::state::OrchestratorState;
use crate::store::FleetStateStore;
use crate::transport::{CommandChannel, CommandTask, EventChannel, VehicleCommand};
use crate::{critical, info};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// The OODA driver: owns the cycle counter, the aggregate metrics, and the
/// two outbound channels. One instance per fleet; there is exactly one
/// orchestrator task per process.
pub struct Orchestrator {
    store: Arc<FleetStateStore>,
    mission_db: Arc<dyn MissionDatabase>,
    config: Arc<Config>,
    base: Vec3,
    region: OperatingRegion,
    mission: MissionType,
    state: OrchestratorState,
    cycle_counter: u64,
    metrics: AggregateMetrics,
    command_channel: CommandChannel,
    event_channel: EventChannel,
    /// Set by the tick loop when the failure sweep finds a newly-failed
    /// vehicle, and externally by fault injection. Checked once per tick;
    /// any number of sets between two ticks coalesce into one cycle.
    pending_trigger: Arc<AtomicBool>,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<FleetStateStore>,
        mission_db: Arc<dyn MissionDatabase>,
        config: Arc<Config>,
        base: Vec3,
        region: OperatingRegion,
        mission: MissionType,
    ) -> Self {
        let command_channel = CommandChannel::new(config.command_channel_capacity);
        let event_channel = EventChannel::new(config.event_channel_capacity);
        Self {
            store,
            mission_db,
            config,
            base,
            region,
            mission,
            state: OrchestratorState::Idle,
            cycle_counter: 0,
            metrics: AggregateMetrics::new(),
            command_channel,
            event_channel,
            pending_trigger: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn state(&self) -> OrchestratorState { self.state }
    pub fn metrics(&self) -> &AggregateMetrics { &self.metrics }
    pub fn cycle_count(&self) -> u64 { self.cycle_counter }

    /// Applies a lifecycle transition, panicking on an illegal one — the
    /// same contract as `Task::transition_to`, since the orchestrator only
    /// ever drives the documented transitions in normal operation.
    fn transition_state(&mut self, next: OrchestratorState) {
        assert!(
            self.state.can_transition_to(next),
            "illegal orchestrator transition {:?} -> {:?}",
            self.state,
            next
        );
        self.state = next;
    }

    /// A handle external fault-injection code can use to request a cycle
    /// on the next tick, independent of the regular failure sweep.
    pub fn trigger_handle(&self) -> TriggerHandle { TriggerHandle { flag: Arc::clone(&self.pending_trigger) } }

    pub async fn next_command(&mut self) -> Option<VehicleCommand> { self.command_channel.recv().await }
    pub async fn next_event(&mut self) -> Option<DecisionEvent> { self.event_channel.recv().await }

    /// Runs the tick loop until `cancel` fires. An in-flight cycle always
    /// finishes before the loop observes cancellation (the cooperative
    /// shutdown point is between ticks, never mid-Act).
    pub async fn run(&mut self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.telemetry_period);
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    self.transition_state(OrchestratorState::Stopped);
                    info!("orchestrator stopping on cancellation");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }
    }

    async fn tick(&mut self) {
        let now = chrono::Utc::now();
        let newly_failed = self.store.sweep_faults(failure_predicate(&self.config, now));
        let externally_triggered = self.pending_trigger.swap(false, Ordering::SeqCst);

        if newly_failed.is_empty() && !externally_triggered {
            return;
        }
        if !newly_failed.is_empty() {
            info!("fault sweep marked {} vehicle(s) failed", newly_failed.len());
        }

        self.transition_state(OrchestratorState::Cycling);
        let event = self.run_cycle(!newly_failed.is_empty() || externally_triggered).await;
        self.event_channel.send(event);
        self.transition_state(OrchestratorState::Idle);

        // A trigger set while this cycle ran is still pending; the next
        // tick's check above will pick it up and run exactly one more
        // cycle, satisfying the coalescing contract.
    }

    /// Runs exactly one OODA cycle and returns the resulting decision
    /// event, without going through the ticker. `run()` calls this
    /// internally; it is also the entry point integration tests drive
    /// directly to exercise a single cycle without waiting on real time.
    pub async fn run_cycle(&mut self, fault_just_observed: bool) -> DecisionEvent {
        self.cycle_counter += 1;
        let cycle = self.cycle_counter;
        let cycle_start = Instant::now();

        let observe_start = Instant::now();
        let fleet = self.store.snapshot();
        let observe_ms = observe_start.elapsed().as_millis() as u64;

        let orient_start = Instant::now();
        let all_tasks = self.mission_db.snapshot();
        let orphaned = orphaned_tasks(&fleet, &all_tasks);
        let orient_ms = orient_start.elapsed().as_millis() as u64;

        let decide_start = Instant::now();
        let strategy =
            if orphaned.is_empty() && !fault_just_observed { Strategy::NoOp } else { Strategy::FullReallocation };

        let mut rng = rand::rng();
        let outcome = optimize(
            &fleet,
            &all_tasks,
            &orphaned,
            self.base,
            self.region,
            self.mission,
            &self.config,
            &mut rng,
        );
        let decide_ms = decide_start.elapsed().as_millis() as u64;

        let act_start = Instant::now();
        let tasks_recovered = self.apply_plan(&orphaned, &outcome.plan);
        let act_ms = act_start.elapsed().as_millis() as u64;

        if cycle_start.elapsed() > self.config.cycle_budget {
            critical!("cycle {} exceeded its soft deadline", cycle);
        }

        let tasks_lost =
            orphaned.iter().filter(|t| matches!(t.state(), TaskState::Assigned | TaskState::InProgress)).count() as u32;
        let escalated_count = outcome.plan.escalated().len() as u32;
        let recovery_rate = CycleMetrics::recovery_rate(tasks_recovered, tasks_lost);

        let total_priority: i64 = all_tasks.iter().map(|t| i64::from(t.priority())).sum();
        let escalated_priority: i64 = outcome
            .plan
            .escalated()
            .iter()
            .filter_map(|id| all_tasks.get(*id))
            .map(|t| i64::from(t.priority()))
            .sum();
        let coverage_loss =
            if total_priority == 0 { 0.0 } else { escalated_priority as f64 / total_priority as f64 };

        let operational_uavs = fleet.operational_vehicles().count() as u32;
        let failed_uavs = fleet.vehicle_count() as u32 - operational_uavs;
        let battery_spare = mean_fraction(fleet.operational_vehicles().map(|v| {
            let f: f64 = v.energy_fraction().to_num();
            f
        }));
        let payload_spare = mean_fraction(fleet.operational_vehicles().map(|v| {
            let spare: f64 = v.spare_payload().to_num();
            let max: f64 = v.max_payload().to_num();
            if max > 0.0 { spare / max } else { 0.0 }
        }));

        let temporal_margin_secs = orphaned
            .iter()
            .filter_map(|t| t.deadline())
            .map(|deadline| (deadline - fleet.taken_at()).num_seconds() as f64)
            .fold(f64::INFINITY, f64::min);
        let temporal_margin_secs = if temporal_margin_secs.is_finite() { temporal_margin_secs } else { 0.0 };

        let metrics = CycleMetrics {
            recovery_rate,
            tasks_recovered,
            tasks_lost,
            unallocated_count: escalated_count,
            coverage_loss,
            battery_spare,
            payload_spare,
            operational_uavs,
            failed_uavs,
            temporal_margin_secs,
            affected_zones: distinct_zones(&orphaned) as u32,
            objective_score: outcome.objective_score,
            optimization_time_ms: outcome.optimization_time_ms,
            optimization_iterations: outcome.optimization_iterations,
            optimality_gap_estimate: outcome.optimality_gap_estimate,
        };

        self.metrics.record_cycle(tasks_recovered, tasks_lost, recovery_rate, metrics.objective_score);

        let rationale = match strategy {
            Strategy::NoOp => "no orphaned tasks and no fault observed this cycle".to_string(),
            Strategy::FullReallocation => {
                format!("reallocated {} task(s), escalated {}", outcome.plan.assignments().len(), escalated_count)
            }
            Strategy::Error => "internal invariant violation aborted the cycle".to_string(),
        };

        DecisionEvent {
            cycle,
            strategy,
            rationale,
            phase_timings_ms: PhaseTimingsMs { observe: observe_ms, orient: orient_ms, decide: decide_ms, act: act_ms },
            metrics,
            assignments: outcome.plan.assignments().clone(),
            escalated: outcome.plan.escalated().iter().copied().collect(),
        }
    }

    /// Applies a finished plan: transitions orphaned tasks through the
    /// mission database's lifecycle states, updates each affected
    /// vehicle's committed-task list in the store, and enqueues one
    /// command per changed vehicle in ascending vehicle-id order.
    fn apply_plan(&mut self, orphaned: &TaskSnapshot, plan: &crate::model::AssignmentPlan) -> u32 {
        // Every task named in `orphaned` is Unassigned, Assigned, or
        // InProgress (orphaned_tasks() never surfaces one already
        // Orphaned), so this unconditionally routes all of them through
        // Orphaned before the escalation loop below, no matter whether
        // the task ever had an owner.
        for task in orphaned.iter() {
            self.mission_db.transition(task.id(), TaskState::Orphaned, None);
        }

        let mut recovered = 0u32;
        for (vehicle_id, task_ids) in plan.assignments() {
            for task_id in task_ids {
                self.mission_db.transition(*task_id, TaskState::Assigned, Some(*vehicle_id));
                recovered += 1;
            }
            self.store.set_committed_tasks(*vehicle_id, task_ids.clone());
            self.command_channel.send(build_command(*vehicle_id, task_ids, &self.mission_db));
        }

        for task_id in plan.escalated() {
            self.mission_db.transition(*task_id, TaskState::Escalated, None);
        }

        recovered
    }
}

/// A cheap clonable handle for requesting a cycle on the next tick from
/// outside the orchestrator task (e.g. an external fault-injection
/// harness).
#[derive(Clone)]
pub struct TriggerHandle {
    flag: Arc<AtomicBool>,
}

impl TriggerHandle {
    pub fn trigger(&self) { self.flag.store(true, Ordering::SeqCst); }
}

fn mean_fraction(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / f64::from(count) }
}

fn build_command(vehicle_id: VehicleId, task_ids: &[TaskId], mission_db: &Arc<dyn MissionDatabase>) -> VehicleCommand {
    let snapshot = mission_db.snapshot();
    let tasks = task_ids
        .iter()
        .filter_map(|id| snapshot.get(*id))
        .map(|task| CommandTask {
            task_id: task.id(),
            waypoints: vec![[
                task.target().x().to_num(),
                task.target().y().to_num(),
                task.target().z().to_num(),
            ]],
            kind: task.task_type().to_string(),
        })
        .collect();
    VehicleCommand { vehicle_id, tasks }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission_db::InMemoryMissionDatabase;
    use crate::model::{Task, TaskType, Vehicle};
    use fixed::types::I32F32;

    fn region() -> OperatingRegion {
        OperatingRegion::new(Vec3::ZERO, Vec3::from_f64(3000.0, 2000.0, 1000.0))
    }

    fn orchestrator() -> Orchestrator {
        let store = Arc::new(FleetStateStore::new());
        store.register(Vehicle::new(
            1,
            Vec3::ZERO,
            I32F32::from_num(1.0),
            I32F32::from_num(100.0),
            I32F32::from_num(5.0),
            I32F32::from_num(10.0),
            chrono::Utc::now(),
        ));
        let mission_db: Arc<dyn MissionDatabase> = Arc::new(InMemoryMissionDatabase::new());
        mission_db.insert(Task::new(
            1,
            TaskType::PatrolZone,
            Vec3::from_f64(10.0, 0.0, 0.0),
            5,
            chrono::Duration::seconds(5),
            I32F32::ZERO,
            None,
            None,
        ));
        Orchestrator::new(store, mission_db, Arc::new(Config::defaults()), Vec3::ZERO, region(), MissionType::Surveillance)
    }

    #[tokio::test]
    async fn a_cycle_with_one_unassigned_task_assigns_it_and_increments_the_counter() {
        let mut orch = orchestrator();
        let event = orch.run_cycle(false).await;
        assert_eq!(event.cycle, 1);
        assert_eq!(orch.cycle_count(), 1);
        assert_eq!(event.strategy, Strategy::FullReallocation);
        assert_eq!(event.metrics.unallocated_count, 0);
    }

    #[tokio::test]
    async fn cycle_numbers_are_contiguous_across_calls() {
        let mut orch = orchestrator();
        let first = orch.run_cycle(false).await;
        let second = orch.run_cycle(false).await;
        assert_eq!(second.cycle, first.cycle + 1);
    }
}
