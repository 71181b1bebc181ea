//! The mission database boundary: task records are owned by a store
//! external to the Fleet State Store. This core only ever reads task
//! records and applies lifecycle transitions to them; it never attempts a
//! vehicle-to-task back-reference (see the data model's no-cyclic-owner
//! rule).

use crate::model::{Task, TaskSnapshot, TaskState, VehicleId};
use std::collections::HashMap;
use std::sync::Mutex;

/// Operations the Orchestrator's Orient/Act phases need against the task
/// store. A real deployment backs this with a persistent database; this
/// core only ships the in-memory reference implementation below.
pub trait MissionDatabase: Send + Sync {
    /// A point-in-time copy of every task record, for the Orient phase.
    fn snapshot(&self) -> TaskSnapshot;

    /// Applies a lifecycle transition and, where relevant, an owner change.
    /// Panics if the transition is illegal — the Orchestrator only ever
    /// drives the documented transitions, so an illegal one here is a bug
    /// in the calling code, not a value worth propagating.
    fn transition(&self, task_id: u32, next: TaskState, owner: Option<VehicleId>);

    fn insert(&self, task: Task);
}

/// In-memory reference `MissionDatabase`. Sufficient for this core and for
/// the integration tests; a full deployment replaces this with a real
/// store behind the same trait.
#[derive(Default)]
pub struct InMemoryMissionDatabase {
    tasks: Mutex<HashMap<u32, Task>>,
}

impl InMemoryMissionDatabase {
    pub fn new() -> Self { Self::default() }
}

impl MissionDatabase for InMemoryMissionDatabase {
    fn snapshot(&self) -> TaskSnapshot {
        let guard = self.tasks.lock().expect("mission database mutex poisoned");
        TaskSnapshot::new(guard.clone())
    }

    fn transition(&self, task_id: u32, next: TaskState, owner: Option<VehicleId>) {
        let mut guard = self.tasks.lock().expect("mission database mutex poisoned");
        if let Some(task) = guard.get_mut(&task_id) {
            task.transition_to(next);
            task.set_owner(owner);
        }
    }

    fn insert(&self, task: Task) {
        let mut guard = self.tasks.lock().expect("mission database mutex poisoned");
        guard.insert(task.id(), task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TaskType, Vec3};
    use fixed::types::I32F32;

    #[test]
    fn insert_then_snapshot_round_trips() {
        let db = InMemoryMissionDatabase::new();
        db.insert(Task::new(
            1,
            TaskType::PatrolZone,
            Vec3::ZERO,
            5,
            chrono::Duration::seconds(10),
            I32F32::ZERO,
            None,
            None,
        ));
        let snap = db.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap.get(1).unwrap().state(), TaskState::Unassigned);
    }

    #[test]
    fn transition_updates_state_and_owner() {
        let db = InMemoryMissionDatabase::new();
        db.insert(Task::new(
            1,
            TaskType::PatrolZone,
            Vec3::ZERO,
            5,
            chrono::Duration::seconds(10),
            I32F32::ZERO,
            None,
            None,
        ));
        db.transition(1, TaskState::Assigned, Some(7));
        let snap = db.snapshot();
        let task = snap.get(1).unwrap();
        assert_eq!(task.state(), TaskState::Assigned);
        assert_eq!(task.owner(), Some(7));
    }
}
