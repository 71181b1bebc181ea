use crate::model::{FleetSnapshot, Task, TaskSnapshot, TaskState};
use std::collections::HashMap;

/// The set of tasks that need a Decide-phase decision this cycle: those
/// still `unassigned`, and those `assigned`/`in-progress` whose owning
/// vehicle is no longer operational.
pub fn orphaned_tasks(fleet: &FleetSnapshot, tasks: &TaskSnapshot) -> TaskSnapshot {
    let mut orphans: HashMap<u32, Task> = HashMap::new();
    for task in tasks.iter() {
        let is_orphan = match task.state() {
            TaskState::Unassigned => true,
            TaskState::Assigned | TaskState::InProgress => match task.owner() {
                Some(vehicle_id) => fleet.vehicle(vehicle_id).map_or(true, |v| !v.is_operational()),
                None => true,
            },
            TaskState::Completed | TaskState::Orphaned | TaskState::Escalated => false,
        };
        if is_orphan {
            orphans.insert(task.id(), task.clone());
        }
    }
    TaskSnapshot::new(orphans)
}

/// Distinct zone tags among a set of tasks, for the `affected_zones` metric.
pub fn distinct_zones(tasks: &TaskSnapshot) -> usize {
    let mut zones: Vec<&str> = tasks.iter().filter_map(Task::zone_tag).collect();
    zones.sort_unstable();
    zones.dedup();
    zones.len()
}
