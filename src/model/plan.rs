use crate::model::vehicle::{TaskId, VehicleId};
use std::collections::{BTreeMap, BTreeSet};

/// A mapping from vehicle id to an ordered list of task ids, plus the set
/// of task ids that could not be placed. `BTreeMap`/`BTreeSet` are used
/// rather than hash collections so that iteration — and therefore command
/// emission order — is always by ascending vehicle id without an explicit
/// sort, matching the "commands ordered by vehicle id" ordering guarantee.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentPlan {
    assignments: BTreeMap<VehicleId, Vec<TaskId>>,
    escalated: BTreeSet<TaskId>,
}

impl AssignmentPlan {
    pub fn new() -> Self { Self::default() }

    pub fn tasks_for(&self, vehicle: VehicleId) -> &[TaskId] {
        self.assignments.get(&vehicle).map_or(&[], Vec::as_slice)
    }

    pub fn assign(&mut self, vehicle: VehicleId, task: TaskId) {
        self.assignments.entry(vehicle).or_default().push(task);
        self.escalated.remove(&task);
    }

    pub fn escalate(&mut self, task: TaskId) { self.escalated.insert(task); }

    pub fn escalated(&self) -> &BTreeSet<TaskId> { &self.escalated }

    pub fn assignments(&self) -> &BTreeMap<VehicleId, Vec<TaskId>> { &self.assignments }

    pub fn is_empty(&self) -> bool { self.assignments.is_empty() && self.escalated.is_empty() }

    /// Removes `task` from wherever it is currently assigned, if anywhere.
    /// Used by the local-search moves (swap / relocate) before re-inserting
    /// the task under its new owner.
    pub fn remove_task(&mut self, task: TaskId) -> Option<VehicleId> {
        for (vehicle, tasks) in &mut self.assignments {
            if let Some(pos) = tasks.iter().position(|t| *t == task) {
                tasks.remove(pos);
                return Some(*vehicle);
            }
        }
        None
    }
}
