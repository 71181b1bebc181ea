use crate::model::vec3::Vec3;
use chrono::{DateTime, Utc};
use fixed::types::I32F32;
use std::collections::HashSet;
use strum_macros::Display;

pub type VehicleId = u32;
pub type TaskId = u32;

/// Operational health of a vehicle as classified by the Fleet Monitor.
///
/// `ChargingComplete` is a distinct, operational-eligible variant from
/// `Charging`: a vehicle mid-charge is not a valid assignment target (see
/// the operational constraint), one that has just finished is.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "kebab-case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Failed,
    Charging,
    ChargingComplete,
    AwaitingPermission,
    Crashed,
}

impl HealthStatus {
    /// Health states from which the vehicle may receive a new assignment,
    /// per the operational constraint in the Constraint Validator.
    pub fn is_assignment_eligible(self) -> bool {
        matches!(self, HealthStatus::Healthy | HealthStatus::Degraded | HealthStatus::ChargingComplete)
    }
}

/// Latest known state of one fleet vehicle, as maintained by the Fleet
/// State Store. Task ownership is a field here (`committed_tasks`) and
/// *only* an id reference on the `Task` side (`Task::owner`) — there is no
/// bidirectional pointer graph between vehicle and task records.
#[derive(Debug, Clone)]
pub struct Vehicle {
    id: VehicleId,
    position: Vec3,
    velocity: Vec3,
    /// Energy level as a fraction of capacity, in [0, 1].
    energy_fraction: I32F32,
    energy_capacity: I32F32,
    current_payload: I32F32,
    max_payload: I32F32,
    operational: bool,
    health: HealthStatus,
    last_contact: DateTime<Utc>,
    committed_tasks: Vec<TaskId>,
    /// Task ids for which this vehicle holds an explicit grant to leave the
    /// operating region.
    boundary_permissions: HashSet<TaskId>,
    /// Distance (meters) this vehicle can travel per unit of energy.
    efficiency: I32F32,
    /// Planned cruise speed (meters/second), used by the temporal
    /// constraint to estimate a task's completion time against its
    /// deadline.
    cruise_speed_mps: I32F32,
    /// Discharge-rate EMA maintained by the Fleet State Store (fraction of
    /// capacity per second), used by failure detection.
    discharge_rate_ema: I32F32,
    /// Consecutive telemetry samples seen with altitude outside bounds.
    altitude_violation_streak: u32,
    /// Horizontal distance (meters) covered between the two most recent
    /// ingested samples, for the position-discontinuity failure check.
    last_jump_distance: I32F32,
}

impl Vehicle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: VehicleId,
        position: Vec3,
        energy_fraction: I32F32,
        energy_capacity: I32F32,
        max_payload: I32F32,
        efficiency: I32F32,
        last_contact: DateTime<Utc>,
    ) -> Self {
        Self::with_cruise_speed(
            id,
            position,
            energy_fraction,
            energy_capacity,
            max_payload,
            efficiency,
            I32F32::from_num(12.0),
            last_contact,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn with_cruise_speed(
        id: VehicleId,
        position: Vec3,
        energy_fraction: I32F32,
        energy_capacity: I32F32,
        max_payload: I32F32,
        efficiency: I32F32,
        cruise_speed_mps: I32F32,
        last_contact: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            position,
            velocity: Vec3::ZERO,
            energy_fraction,
            energy_capacity,
            current_payload: I32F32::ZERO,
            max_payload,
            operational: true,
            health: HealthStatus::Healthy,
            last_contact,
            committed_tasks: Vec::new(),
            boundary_permissions: HashSet::new(),
            efficiency,
            cruise_speed_mps,
            discharge_rate_ema: I32F32::ZERO,
            altitude_violation_streak: 0,
            last_jump_distance: I32F32::ZERO,
        }
    }

    pub fn id(&self) -> VehicleId { self.id }
    pub fn position(&self) -> Vec3 { self.position }
    pub fn velocity(&self) -> Vec3 { self.velocity }
    pub fn energy_fraction(&self) -> I32F32 { self.energy_fraction }
    pub fn energy_capacity(&self) -> I32F32 { self.energy_capacity }
    pub fn current_payload(&self) -> I32F32 { self.current_payload }
    pub fn max_payload(&self) -> I32F32 { self.max_payload }
    pub fn is_operational(&self) -> bool { self.operational }
    pub fn health(&self) -> HealthStatus { self.health }
    pub fn last_contact(&self) -> DateTime<Utc> { self.last_contact }
    pub fn committed_tasks(&self) -> &[TaskId] { &self.committed_tasks }
    pub fn efficiency(&self) -> I32F32 { self.efficiency }
    pub fn cruise_speed_mps(&self) -> I32F32 { self.cruise_speed_mps }
    pub fn discharge_rate_ema(&self) -> I32F32 { self.discharge_rate_ema }
    pub fn altitude_violation_streak(&self) -> u32 { self.altitude_violation_streak }
    pub fn last_jump_distance(&self) -> I32F32 { self.last_jump_distance }

    pub fn has_permission_for(&self, task: TaskId) -> bool {
        self.boundary_permissions.contains(&task)
    }

    pub fn grant_permission(&mut self, task: TaskId) { self.boundary_permissions.insert(task); }

    /// Spare energy in absolute energy-units at the current fraction.
    pub fn spare_energy(&self) -> I32F32 { self.energy_fraction * self.energy_capacity }

    pub fn spare_payload(&self) -> I32F32 { self.max_payload - self.current_payload }

    pub(crate) fn set_position(&mut self, pos: Vec3) { self.position = pos; }
    pub(crate) fn set_velocity(&mut self, vel: Vec3) { self.velocity = vel; }
    pub(crate) fn set_energy_fraction(&mut self, e: I32F32) { self.energy_fraction = e; }
    pub(crate) fn set_current_payload(&mut self, p: I32F32) { self.current_payload = p; }
    pub(crate) fn set_last_contact(&mut self, t: DateTime<Utc>) { self.last_contact = t; }
    pub(crate) fn set_discharge_rate_ema(&mut self, rate: I32F32) { self.discharge_rate_ema = rate; }
    pub(crate) fn bump_altitude_violation_streak(&mut self) { self.altitude_violation_streak += 1; }
    pub(crate) fn reset_altitude_violation_streak(&mut self) { self.altitude_violation_streak = 0; }
    pub(crate) fn set_last_jump_distance(&mut self, d: I32F32) { self.last_jump_distance = d; }

    /// Merges newly-assigned task ids into the vehicle's standing route.
    /// A cycle only ever reports the tasks it placed this pass, not the
    /// vehicle's whole route, so this must add to `committed_tasks`
    /// rather than replace it or previously-committed, still in-progress
    /// tasks would silently vanish from the store every cycle that
    /// touches the vehicle.
    pub(crate) fn set_committed_tasks(&mut self, tasks: Vec<TaskId>) {
        for id in tasks {
            if !self.committed_tasks.contains(&id) {
                self.committed_tasks.push(id);
            }
        }
    }

    /// Transitions health to `Failed` and clears the operational flag.
    /// Idempotent: calling this on an already-failed vehicle is a no-op.
    pub(crate) fn mark_failed(&mut self) {
        if self.health == HealthStatus::Failed {
            return;
        }
        self.health = HealthStatus::Failed;
        self.operational = false;
    }

    pub(crate) fn set_health(&mut self, health: HealthStatus) {
        self.health = health;
        self.operational = health.is_assignment_eligible();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: VehicleId) -> Vehicle {
        Vehicle::new(
            id,
            Vec3::ZERO,
            I32F32::from_num(0.8),
            I32F32::from_num(100.0),
            I32F32::from_num(2.5),
            I32F32::from_num(10.0),
            Utc::now(),
        )
    }

    #[test]
    fn mark_failed_is_idempotent() {
        let mut v = sample(1);
        v.mark_failed();
        assert_eq!(v.health(), HealthStatus::Failed);
        assert!(!v.is_operational());
        v.mark_failed();
        assert_eq!(v.health(), HealthStatus::Failed);
    }

    #[test]
    fn charging_complete_is_assignment_eligible_but_charging_is_not() {
        assert!(HealthStatus::ChargingComplete.is_assignment_eligible());
        assert!(!HealthStatus::Charging.is_assignment_eligible());
    }

    #[test]
    fn set_committed_tasks_merges_rather_than_replaces() {
        let mut v = sample(1);
        v.set_committed_tasks(vec![1, 2]);
        v.set_committed_tasks(vec![2, 3]);
        assert_eq!(v.committed_tasks(), &[1, 2, 3]);
    }
}
