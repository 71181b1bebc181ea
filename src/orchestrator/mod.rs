//! The OODA Orchestrator: drives the tick loop, runs the fault sweep, calls
//! into the Optimizer, applies the resulting plan to the mission database
//! and the Fleet State Store, and emits one `DecisionEvent` per cycle.

pub mod cycle;
pub mod fault_detection;
pub mod metrics;
pub mod orchestrator;
pub mod state;

pub use orchestrator::{Orchestrator, TriggerHandle};
pub use state::OrchestratorState;
