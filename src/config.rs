use fixed::types::I32F32;
use std::collections::HashMap;
use std::env;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use strum_macros::Display as StrumDisplay;

/// Mission type hint selecting an objective weight vector. Carried by the
/// Orient phase into the Optimizer.
#[derive(Debug, StrumDisplay, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[strum(serialize_all = "kebab-case")]
pub enum MissionType {
    Surveillance,
    Search,
    Delivery,
}

/// Weights for the Optimizer's objective function, one vector per mission
/// type (see the weighted-sum objective in the Optimizer design).
#[derive(Debug, Clone, Copy)]
pub struct ObjectiveWeights {
    pub travel_energy: f64,
    pub load_balance: f64,
    pub priority_satisfaction: f64,
    pub temporal_slack: f64,
}

impl ObjectiveWeights {
    const fn surveillance() -> Self {
        Self { travel_energy: 1.0, load_balance: 0.6, priority_satisfaction: 1.2, temporal_slack: 0.2 }
    }
    const fn search() -> Self {
        Self { travel_energy: 0.8, load_balance: 0.3, priority_satisfaction: 1.0, temporal_slack: 1.0 }
    }
    const fn delivery() -> Self {
        Self { travel_energy: 1.2, load_balance: 0.8, priority_satisfaction: 0.9, temporal_slack: 0.6 }
    }
}

/// A configuration value failed validation at startup. Refusing to run on
/// a malformed config is the error-taxonomy's "configuration error —
/// fatal at startup" category; `main` logs this via `fatal!` and exits
/// without ever starting the orchestrator.
#[derive(Debug, Clone)]
pub enum ConfigError {
    InvalidEnvValue { key: &'static str, value: String },
    OutOfRange { key: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidEnvValue { key, value } => {
                write!(f, "environment variable {key} has invalid value {value:?}")
            }
            ConfigError::OutOfRange { key, reason } => write!(f, "config key {key} out of range: {reason}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Immutable configuration for one process lifetime. Built once at startup
/// (`Config::from_env`) and shared freely via `Arc` thereafter — nothing in
/// the core ever mutates a `Config` after construction.
#[derive(Debug, Clone)]
pub struct Config {
    pub telemetry_period: Duration,
    pub timeout_threshold: Duration,
    pub anomaly_multiplier: f64,
    pub baseline_discharge_rate: f64,
    pub position_jump_threshold_m: f64,
    pub min_altitude_m: f64,
    pub max_altitude_m: f64,
    pub safety_reserve_fraction: I32F32,
    pub collision_buffer_m: f64,
    pub optimization_budget: Duration,
    pub max_iterations: u32,
    pub max_iterations_without_improvement: u32,
    pub cycle_budget: Duration,
    pub hover_energy_rate: I32F32,
    pub command_channel_capacity: usize,
    pub event_channel_capacity: usize,
    objective_weights: HashMap<MissionType, ObjectiveWeights>,
}

impl Config {
    pub fn weights_for(&self, mission: MissionType) -> ObjectiveWeights {
        self.objective_weights[&mission]
    }

    /// Compiled-in defaults, matching §6's documented default values.
    pub fn defaults() -> Self {
        let mut objective_weights = HashMap::new();
        objective_weights.insert(MissionType::Surveillance, ObjectiveWeights::surveillance());
        objective_weights.insert(MissionType::Search, ObjectiveWeights::search());
        objective_weights.insert(MissionType::Delivery, ObjectiveWeights::delivery());
        Self {
            telemetry_period: Duration::from_millis(500),
            timeout_threshold: Duration::from_millis(1500),
            anomaly_multiplier: 1.5,
            baseline_discharge_rate: 0.002,
            position_jump_threshold_m: 100.0,
            min_altitude_m: 0.0,
            max_altitude_m: 500.0,
            safety_reserve_fraction: I32F32::from_num(0.20),
            collision_buffer_m: 15.0,
            optimization_budget: Duration::from_millis(100),
            max_iterations: 50,
            max_iterations_without_improvement: 10,
            cycle_budget: Duration::from_millis(6000),
            hover_energy_rate: I32F32::ZERO,
            command_channel_capacity: 256,
            event_channel_capacity: 256,
            objective_weights,
        }
    }

    /// Loads configuration from environment variables, falling back to
    /// `Config::defaults()` for anything unset. A variable that *is* set
    /// but does not parse is a `ConfigError`, not a silent fallback — this
    /// is the "missing falls back, malformed is fatal" rule from §6.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::defaults();
        cfg.telemetry_period = read_millis("TELEMETRY_PERIOD_MS", cfg.telemetry_period)?;
        cfg.timeout_threshold = read_millis("TIMEOUT_THRESHOLD_MS", cfg.timeout_threshold)?;
        cfg.anomaly_multiplier = read_f64("ANOMALY_MULTIPLIER", cfg.anomaly_multiplier)?;
        cfg.position_jump_threshold_m = read_f64("POSITION_JUMP_THRESHOLD_M", cfg.position_jump_threshold_m)?;
        cfg.safety_reserve_fraction = read_fixed("SAFETY_RESERVE_FRACTION", cfg.safety_reserve_fraction)?;
        cfg.collision_buffer_m = read_f64("COLLISION_BUFFER_M", cfg.collision_buffer_m)?;
        cfg.optimization_budget = read_millis("OPTIMIZATION_BUDGET_MS", cfg.optimization_budget)?;
        cfg.max_iterations = read_u32("MAX_ITERATIONS", cfg.max_iterations)?;
        cfg.cycle_budget = read_millis("CYCLE_BUDGET_MS", cfg.cycle_budget)?;
        cfg.hover_energy_rate = read_fixed("HOVER_ENERGY_RATE", cfg.hover_energy_rate)?;

        if cfg.safety_reserve_fraction < I32F32::ZERO || cfg.safety_reserve_fraction > I32F32::ONE {
            return Err(ConfigError::OutOfRange {
                key: "SAFETY_RESERVE_FRACTION",
                reason: "must be within [0, 1]".to_string(),
            });
        }
        if cfg.max_iterations == 0 {
            return Err(ConfigError::OutOfRange {
                key: "MAX_ITERATIONS",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(cfg)
    }
}

fn read_millis(key: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidEnvValue { key, value: raw }),
    }
}

fn read_f64(key: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => raw.parse::<f64>().map_err(|_| ConfigError::InvalidEnvValue { key, value: raw }),
    }
}

fn read_u32(key: &'static str, default: u32) -> Result<u32, ConfigError> {
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => raw.parse::<u32>().map_err(|_| ConfigError::InvalidEnvValue { key, value: raw }),
    }
}

fn read_fixed(key: &'static str, default: I32F32) -> Result<I32F32, ConfigError> {
    match env::var(key) {
        Err(_) => Ok(default),
        Ok(raw) => raw
            .parse::<f64>()
            .map(I32F32::from_num)
            .map_err(|_| ConfigError::InvalidEnvValue { key, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::defaults();
        assert_eq!(cfg.telemetry_period, Duration::from_millis(500));
        assert_eq!(cfg.timeout_threshold, Duration::from_millis(1500));
        assert!((cfg.anomaly_multiplier - 1.5).abs() < f64::EPSILON);
        assert_eq!(cfg.safety_reserve_fraction, I32F32::from_num(0.20));
        assert_eq!(cfg.max_iterations, 50);
    }

    #[test]
    fn each_mission_type_has_weights() {
        let cfg = Config::defaults();
        for mission in [MissionType::Surveillance, MissionType::Search, MissionType::Delivery] {
            let w = cfg.weights_for(mission);
            assert!(w.travel_energy > 0.0);
        }
    }
}
