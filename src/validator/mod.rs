//! The Constraint Validator: a pure function layer with no stored state of
//! its own, consulted by the Optimizer while it searches and again by the
//! Orchestrator to certify a finished plan before it is committed.

pub mod reason;
pub mod rules;

pub use reason::{AssignResult, InfeasibilityReason, PlanViolations};
pub use rules::{can_assign, validate_plan};
