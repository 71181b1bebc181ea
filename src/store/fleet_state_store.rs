use crate::model::vehicle::VehicleId;
use crate::model::{FleetSnapshot, HealthStatus, Vehicle};
use crate::store::telemetry::TelemetryMessage;
use chrono::{DateTime, Utc};
use fixed::types::I32F32;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Exponential-moving-average smoothing factor for the discharge-rate
/// estimate, per the Fleet State Store's `ingest` contract.
const DISCHARGE_EMA_ALPHA: I32F32 = I32F32::lit("0.3");

/// In-memory fleet state: one record per vehicle, guarded by a single lock
/// held only for the short duration of a write or a snapshot copy.
/// Snapshots are defensive deep copies, so the Orchestrator reads without
/// holding this lock any longer than the copy itself takes — matching the
/// many-writers/one-reader resource policy.
pub struct FleetStateStore {
    vehicles: Mutex<HashMap<VehicleId, Vehicle>>,
    generation: AtomicU64,
}

impl Default for FleetStateStore {
    fn default() -> Self { Self::new() }
}

impl FleetStateStore {
    pub fn new() -> Self {
        Self { vehicles: Mutex::new(HashMap::new()), generation: AtomicU64::new(0) }
    }

    /// Registers a vehicle at fleet initialization. Vehicles persist for
    /// the mission; this is never called again for the same id afterward.
    pub fn register(&self, vehicle: Vehicle) {
        let mut guard = self.vehicles.lock().expect("fleet state store mutex poisoned");
        guard.insert(vehicle.id(), vehicle);
    }

    /// Applies one telemetry sample: updates last-contact, position,
    /// velocity, energy and payload, and recomputes the discharge-rate EMA
    /// from the delta against the previous sample. Telemetry for an
    /// unregistered vehicle id is ignored (the vehicle registration is an
    /// out-of-band mission-loader concern).
    pub fn ingest(&self, telemetry: &TelemetryMessage, arrival_time: DateTime<Utc>) {
        let mut guard = self.vehicles.lock().expect("fleet state store mutex poisoned");
        let Some(vehicle) = guard.get_mut(&telemetry.vehicle_id) else { return };

        let dt_secs = (arrival_time - vehicle.last_contact()).num_milliseconds().max(0) as f64 / 1000.0;
        let prev_energy = vehicle.energy_fraction();
        let new_energy = I32F32::from_num(telemetry.energy.clamp(0.0, 1.0));

        if dt_secs > 0.0 {
            let discharged = (prev_energy - new_energy).max(I32F32::ZERO);
            let instantaneous = discharged / I32F32::from_num(dt_secs);
            let smoothed =
                DISCHARGE_EMA_ALPHA * instantaneous + (I32F32::ONE - DISCHARGE_EMA_ALPHA) * vehicle.discharge_rate_ema();
            vehicle.set_discharge_rate_ema(smoothed);

            let jump = vehicle.position().horizontal_distance_to(telemetry.position());
            vehicle.set_last_jump_distance(jump);
        }

        vehicle.set_position(telemetry.position());
        vehicle.set_velocity(telemetry.velocity());
        vehicle.set_energy_fraction(new_energy);
        vehicle.set_current_payload(I32F32::from_num(telemetry.payload));
        vehicle.set_last_contact(arrival_time);
        if vehicle.health() != HealthStatus::Failed {
            vehicle.set_health(telemetry.health);
        }
    }

    /// Takes an atomic, defensive-copy snapshot of every vehicle record and
    /// increments the generation counter. All Decide-phase logic operates
    /// on the returned value; nothing here is mutated afterward.
    pub fn snapshot(&self) -> FleetSnapshot {
        let guard = self.vehicles.lock().expect("fleet state store mutex poisoned");
        let vehicles = guard.clone();
        drop(guard);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        FleetSnapshot::new(vehicles, Utc::now(), generation)
    }

    /// Transitions a vehicle's health to `Failed` and clears its
    /// operational flag. Idempotent.
    pub fn mark_failed(&self, vehicle_id: VehicleId) {
        let mut guard = self.vehicles.lock().expect("fleet state store mutex poisoned");
        if let Some(vehicle) = guard.get_mut(&vehicle_id) {
            vehicle.mark_failed();
        }
    }

    /// Merges `tasks` into the vehicle's standing committed-task list; see
    /// `Vehicle::set_committed_tasks`.
    pub fn set_committed_tasks(&self, vehicle_id: VehicleId, tasks: Vec<u32>) {
        let mut guard = self.vehicles.lock().expect("fleet state store mutex poisoned");
        if let Some(vehicle) = guard.get_mut(&vehicle_id) {
            vehicle.set_committed_tasks(tasks);
        }
    }

    pub fn grant_permission(&self, vehicle_id: VehicleId, task_id: u32) {
        let mut guard = self.vehicles.lock().expect("fleet state store mutex poisoned");
        if let Some(vehicle) = guard.get_mut(&vehicle_id) {
            vehicle.grant_permission(task_id);
        }
    }

    /// Runs `should_fail` against every not-yet-failed vehicle, in
    /// ascending id order, marking it failed wherever the predicate
    /// returns true. The predicate itself carries the actual failure
    /// classification (timeout, discharge anomaly, position jump, altitude
    /// bounds) — this store only owns the iteration and the mutation, per
    /// the "detection is not done here" split with the Orchestrator.
    pub fn sweep_faults(&self, mut should_fail: impl FnMut(&mut Vehicle) -> bool) -> Vec<VehicleId> {
        let mut guard = self.vehicles.lock().expect("fleet state store mutex poisoned");
        let mut ids: Vec<_> = guard.keys().copied().collect();
        ids.sort_unstable();

        let mut newly_failed = Vec::new();
        for id in ids {
            let vehicle = guard.get_mut(&id).expect("id from own keys must resolve");
            if vehicle.health() == HealthStatus::Failed {
                continue;
            }
            if should_fail(vehicle) {
                vehicle.mark_failed();
                newly_failed.push(id);
            }
        }
        newly_failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Vec3;

    fn vehicle(id: VehicleId) -> Vehicle {
        Vehicle::new(
            id,
            Vec3::ZERO,
            I32F32::from_num(1.0),
            I32F32::from_num(100.0),
            I32F32::from_num(5.0),
            I32F32::from_num(10.0),
            Utc::now(),
        )
    }

    #[test]
    fn ingest_updates_last_contact_monotonically() {
        let store = FleetStateStore::new();
        store.register(vehicle(1));
        let t1 = Utc::now();
        let msg = TelemetryMessage {
            vehicle_id: 1,
            t: 0.0,
            pos: [1.0, 2.0, 0.0],
            vel: [0.0, 0.0, 0.0],
            energy: 0.95,
            payload: 0.0,
            health: HealthStatus::Healthy,
            task_progress: HashMap::new(),
        };
        store.ingest(&msg, t1);
        let snap = store.snapshot();
        assert_eq!(snap.vehicle(1).unwrap().last_contact(), t1);
    }

    #[test]
    fn mark_failed_is_idempotent_through_store() {
        let store = FleetStateStore::new();
        store.register(vehicle(7));
        store.mark_failed(7);
        store.mark_failed(7);
        let snap = store.snapshot();
        assert_eq!(snap.vehicle(7).unwrap().health(), HealthStatus::Failed);
        assert!(!snap.vehicle(7).unwrap().is_operational());
    }

    #[test]
    fn snapshot_generation_increments() {
        let store = FleetStateStore::new();
        store.register(vehicle(1));
        let g1 = store.snapshot().generation();
        let g2 = store.snapshot().generation();
        assert!(g2 > g1);
    }

    #[test]
    fn sweep_faults_skips_already_failed_vehicles() {
        let store = FleetStateStore::new();
        store.register(vehicle(1));
        store.register(vehicle(2));
        store.mark_failed(1);

        let mut evaluated = Vec::new();
        let newly_failed = store.sweep_faults(|v| {
            evaluated.push(v.id());
            v.id() == 2
        });

        assert_eq!(evaluated, vec![2]);
        assert_eq!(newly_failed, vec![2]);
    }

    #[test]
    fn discharge_ema_reacts_to_energy_drop() {
        let store = FleetStateStore::new();
        store.register(vehicle(3));
        let base = Utc::now();
        for i in 1..=3 {
            let msg = TelemetryMessage {
                vehicle_id: 3,
                t: 0.0,
                pos: [0.0, 0.0, 0.0],
                vel: [0.0, 0.0, 0.0],
                energy: 1.0 - 0.05 * f64::from(i),
                payload: 0.0,
                health: HealthStatus::Healthy,
                task_progress: HashMap::new(),
            };
            store.ingest(&msg, base + chrono::Duration::seconds(i64::from(i)));
        }
        let snap = store.snapshot();
        assert!(snap.vehicle(3).unwrap().discharge_rate_ema() > I32F32::ZERO);
    }
}
