use strum_macros::Display;

/// The orchestrator's own lifecycle, kept separate from any one vehicle's
/// or task's state machine.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[strum(serialize_all = "kebab-case")]
pub enum OrchestratorState {
    Idle,
    Cycling,
    Stopped,
}

impl OrchestratorState {
    /// `idle -> cycling` on trigger, `cycling -> idle` on completion, any
    /// state may move to `stopped`. There is deliberately no `cycling ->
    /// cycling` — a trigger arriving mid-cycle coalesces instead (see the
    /// orchestrator's pending-trigger flag).
    pub fn can_transition_to(self, next: OrchestratorState) -> bool {
        use OrchestratorState::{Cycling, Idle, Stopped};
        matches!((self, next), (Idle, Cycling) | (Cycling, Idle) | (_, Stopped))
    }
}
