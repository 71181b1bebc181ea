use crate::config::Config;
use crate::model::Vehicle;
use chrono::{DateTime, Utc};
use fixed::types::I32F32;

/// Builds the per-tick failure predicate the Orchestrator hands to
/// `FleetStateStore::sweep_faults`. Evaluates all four signals from the
/// tick contract: contact timeout, discharge-rate anomaly, a sudden
/// position jump, and altitude held outside bounds for more than one
/// sample. The altitude streak is bumped or reset as a side effect here
/// since it only means anything accumulated across consecutive sweeps of
/// the same vehicle.
pub fn failure_predicate(config: &Config, now: DateTime<Utc>) -> impl FnMut(&mut Vehicle) -> bool + '_ {
    move |vehicle: &mut Vehicle| {
        let timed_out = match chrono::Duration::from_std(config.timeout_threshold) {
            Ok(threshold) => now.signed_duration_since(vehicle.last_contact()) > threshold,
            Err(_) => false,
        };

        let baseline = I32F32::from_num(config.baseline_discharge_rate);
        let anomaly_threshold = baseline * I32F32::from_num(config.anomaly_multiplier);
        let discharge_anomaly = vehicle.discharge_rate_ema() > anomaly_threshold;

        let jump = vehicle.last_jump_distance() > I32F32::from_num(config.position_jump_threshold_m);

        let altitude: f64 = vehicle.position().altitude().to_num();
        let out_of_bounds = altitude < config.min_altitude_m || altitude > config.max_altitude_m;
        if out_of_bounds {
            vehicle.bump_altitude_violation_streak();
        } else {
            vehicle.reset_altitude_violation_streak();
        }
        let altitude_failure = vehicle.altitude_violation_streak() > 1;

        timed_out || discharge_anomaly || jump || altitude_failure
    }
}
