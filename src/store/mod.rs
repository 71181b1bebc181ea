//! The Fleet State Store: a concurrent-write, single-reader map from
//! vehicle id to latest known state, fed by telemetry ingest and sampled
//! by the Orchestrator at the start of every cycle.

pub mod fleet_state_store;
pub mod telemetry;

pub use fleet_state_store::FleetStateStore;
pub use telemetry::TelemetryMessage;
