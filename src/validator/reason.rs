use crate::model::vehicle::VehicleId;
use fixed::types::I32F32;
use std::fmt::{Display, Formatter};

/// A tagged infeasibility reason, carrying a numeric margin where one is
/// meaningful. The validator never raises an error — infeasibility is
/// always a value of this type, consumed by the Optimizer for
/// tie-breaking and by the Orchestrator for escalation rationale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InfeasibilityReason {
    NotOperational,
    /// Margin: how far `current_payload + task.payload_req` exceeds
    /// `max_payload`, in mass-units. Always positive.
    PayloadExceeded { margin: I32F32 },
    /// Margin: how far the post-plan energy falls short of the safety
    /// reserve, as a fraction of capacity. Always positive.
    InsufficientEnergy { margin: I32F32 },
    OutsideRegionNoPermission,
    /// Margin: how far inside the collision buffer the closest approach
    /// is, in meters. Always positive.
    CollisionWith { other: VehicleId, margin: I32F32 },
    /// How far past the deadline the estimated completion time falls.
    DeadlineMissed { overrun: chrono::Duration },
}

impl Display for InfeasibilityReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InfeasibilityReason::NotOperational => write!(f, "not-operational"),
            InfeasibilityReason::PayloadExceeded { margin } => write!(f, "payload-exceeded:{margin}"),
            InfeasibilityReason::InsufficientEnergy { margin } => write!(f, "insufficient-energy:{margin}"),
            InfeasibilityReason::OutsideRegionNoPermission => write!(f, "outside-region-no-permission"),
            InfeasibilityReason::CollisionWith { other, margin } => {
                write!(f, "collision-with:{other}:{margin}")
            }
            InfeasibilityReason::DeadlineMissed { overrun } => {
                write!(f, "deadline-missed:{}s", overrun.num_seconds())
            }
        }
    }
}

/// Outcome of `can_assign`: either the candidate is feasible, or it is
/// rejected for exactly one reason (the first constraint, in evaluation
/// order, that fails).
pub type AssignResult = Result<(), InfeasibilityReason>;

/// Outcome of `validate_plan`: feasible, or every violation found across
/// the whole plan (not just the first).
#[derive(Debug, Clone, Default)]
pub struct PlanViolations(pub Vec<(VehicleId, InfeasibilityReason)>);

impl PlanViolations {
    pub fn is_ok(&self) -> bool { self.0.is_empty() }
}
