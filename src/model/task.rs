use crate::model::vec3::Vec3;
use crate::model::vehicle::{TaskId, VehicleId};
use chrono::{DateTime, Utc};
use fixed::types::I32F32;
use strum_macros::Display;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "kebab-case")]
pub enum TaskType {
    PatrolZone,
    SearchZone,
    Pickup,
    Dropoff,
    DeliveryPair,
}

/// Lifecycle state of a mission task.
///
/// Legal transitions: `Unassigned -> Assigned -> InProgress -> Completed`,
/// `Assigned | InProgress -> Orphaned` on loss of owner, `Unassigned ->
/// Orphaned` for a task swept into the orphan pool before it was ever
/// assigned, `Orphaned -> Escalated` when no feasible reassignment exists,
/// and `Orphaned -> Assigned` on successful reallocation.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "kebab-case")]
pub enum TaskState {
    Unassigned,
    Assigned,
    InProgress,
    Completed,
    Orphaned,
    Escalated,
}

impl TaskState {
    pub fn can_transition_to(self, next: TaskState) -> bool {
        use TaskState::{Assigned, Completed, Escalated, InProgress, Orphaned, Unassigned};
        matches!(
            (self, next),
            (Unassigned, Assigned)
                | (Assigned, InProgress)
                | (InProgress, Completed)
                | (Unassigned, Orphaned)
                | (Assigned, Orphaned)
                | (InProgress, Orphaned)
                | (Orphaned, Escalated)
                | (Orphaned, Assigned)
        )
    }
}

/// A unit of mission work the Optimizer assigns to a vehicle. Carries only
/// an `owner` id reference back to its vehicle — ownership itself lives as
/// a field on the `Vehicle` record, per the no-cyclic-references rule.
#[derive(Debug, Clone)]
pub struct Task {
    id: TaskId,
    task_type: TaskType,
    target: Vec3,
    priority: i32,
    estimated_duration: chrono::Duration,
    payload_req: I32F32,
    deadline: Option<DateTime<Utc>>,
    zone_tag: Option<String>,
    state: TaskState,
    owner: Option<VehicleId>,
}

impl Task {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: TaskId,
        task_type: TaskType,
        target: Vec3,
        priority: i32,
        estimated_duration: chrono::Duration,
        payload_req: I32F32,
        deadline: Option<DateTime<Utc>>,
        zone_tag: Option<String>,
    ) -> Self {
        Self {
            id,
            task_type,
            target,
            priority,
            estimated_duration,
            payload_req,
            deadline,
            zone_tag,
            state: TaskState::Unassigned,
            owner: None,
        }
    }

    pub fn id(&self) -> TaskId { self.id }
    pub fn task_type(&self) -> TaskType { self.task_type }
    pub fn target(&self) -> Vec3 { self.target }
    pub fn priority(&self) -> i32 { self.priority }
    pub fn estimated_duration(&self) -> chrono::Duration { self.estimated_duration }
    pub fn payload_req(&self) -> I32F32 { self.payload_req }
    pub fn deadline(&self) -> Option<DateTime<Utc>> { self.deadline }
    pub fn zone_tag(&self) -> Option<&str> { self.zone_tag.as_deref() }
    pub fn state(&self) -> TaskState { self.state }
    pub fn owner(&self) -> Option<VehicleId> { self.owner }

    /// Applies a state transition, panicking on an illegal one. Illegal
    /// transitions are an internal invariant violation, not a value the
    /// caller is expected to branch on — the orchestrator never attempts
    /// one in normal operation because it only ever drives the states
    /// documented in `TaskState::can_transition_to`.
    pub(crate) fn transition_to(&mut self, next: TaskState) {
        assert!(
            self.state.can_transition_to(next),
            "illegal task transition {:?} -> {:?} for task {}",
            self.state,
            next,
            self.id
        );
        self.state = next;
    }

    pub(crate) fn set_owner(&mut self, owner: Option<VehicleId>) { self.owner = owner; }
}
