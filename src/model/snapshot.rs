use crate::model::task::Task;
use crate::model::vehicle::{Vehicle, VehicleId};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// An immutable point-in-time copy of fleet state, produced by the Fleet
/// State Store's `snapshot()` at the start of every OODA cycle. All
/// Decide-phase logic — the Constraint Validator and the Optimizer —
/// operates on exactly one of these; nothing in this core mutates a
/// `FleetSnapshot` after it is built.
#[derive(Debug, Clone)]
pub struct FleetSnapshot {
    vehicles: HashMap<VehicleId, Vehicle>,
    taken_at: DateTime<Utc>,
    generation: u64,
}

impl FleetSnapshot {
    pub fn new(vehicles: HashMap<VehicleId, Vehicle>, taken_at: DateTime<Utc>, generation: u64) -> Self {
        Self { vehicles, taken_at, generation }
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> { self.vehicles.get(&id) }

    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        let mut ids: Vec<_> = self.vehicles.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter().filter_map(move |id| self.vehicles.get(&id))
    }

    pub fn operational_vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles().filter(|v| v.is_operational())
    }

    pub fn taken_at(&self) -> DateTime<Utc> { self.taken_at }
    pub fn generation(&self) -> u64 { self.generation }
    pub fn vehicle_count(&self) -> usize { self.vehicles.len() }
}

/// Tasks as known by the mission database at the moment a snapshot was
/// taken, keyed by task id. Kept separate from `FleetSnapshot` because
/// tasks are owned by the mission database, not the Fleet State Store (see
/// the lifetimes note in the data model).
#[derive(Debug, Clone)]
pub struct TaskSnapshot {
    tasks: HashMap<u32, Task>,
}

impl TaskSnapshot {
    pub fn new(tasks: HashMap<u32, Task>) -> Self { Self { tasks } }

    pub fn get(&self, id: u32) -> Option<&Task> { self.tasks.get(&id) }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        let mut ids: Vec<_> = self.tasks.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter().filter_map(move |id| self.tasks.get(&id))
    }

    pub fn len(&self) -> usize { self.tasks.len() }
    pub fn is_empty(&self) -> bool { self.tasks.is_empty() }
}
