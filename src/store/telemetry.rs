use crate::model::vehicle::{TaskId, VehicleId};
use crate::model::{HealthStatus, Vec3};
use std::collections::HashMap;

/// A per-vehicle telemetry sample, already decoded from the wire format by
/// a transport adapter outside this core. Unknown wire fields are simply
/// not represented here (`serde(deny_unknown_fields)` is deliberately
/// *not* set, so an adapter built against a newer wire schema can still
/// decode into this type); fields absent from a given sample are handled
/// by `ingest` defaulting to the vehicle's last-known value.
#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct TelemetryMessage {
    pub vehicle_id: VehicleId,
    /// Seconds since the Unix epoch, as sent by the vehicle.
    pub t: f64,
    pub pos: [f64; 3],
    #[serde(default)]
    pub vel: [f64; 3],
    pub energy: f64,
    #[serde(default)]
    pub payload: f64,
    pub health: HealthStatus,
    #[serde(default)]
    pub task_progress: HashMap<TaskId, f64>,
}

impl TelemetryMessage {
    pub fn position(&self) -> Vec3 { Vec3::from_f64(self.pos[0], self.pos[1], self.pos[2]) }
    pub fn velocity(&self) -> Vec3 { Vec3::from_f64(self.vel[0], self.vel[1], self.vel[2]) }
}
