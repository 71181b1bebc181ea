/// Lifetime aggregate counters across every cycle the Orchestrator has run,
/// kept as a field on the Orchestrator instance rather than any module-level
/// global.
#[derive(Debug, Clone, Default)]
pub struct AggregateMetrics {
    total_cycles: u64,
    total_tasks_recovered: u64,
    total_tasks_lost: u64,
    recovery_rates: Vec<f64>,
    objective_scores: Vec<f64>,
}

impl AggregateMetrics {
    pub fn new() -> Self { Self::default() }

    pub fn record_cycle(&mut self, tasks_recovered: u32, tasks_lost: u32, recovery_rate: f64, objective_score: f64) {
        self.total_cycles += 1;
        self.total_tasks_recovered += u64::from(tasks_recovered);
        self.total_tasks_lost += u64::from(tasks_lost);
        self.recovery_rates.push(recovery_rate);
        self.objective_scores.push(objective_score);
    }

    pub fn total_cycles(&self) -> u64 { self.total_cycles }
    pub fn total_tasks_recovered(&self) -> u64 { self.total_tasks_recovered }
    pub fn total_tasks_lost(&self) -> u64 { self.total_tasks_lost }

    pub fn recovery_rate_stats(&self) -> Stats { Stats::from_samples(&self.recovery_rates) }
    pub fn objective_score_stats(&self) -> Stats { Stats::from_samples(&self.objective_scores) }
}

/// Mean/std/min/max over a set of per-cycle samples, for reporting on
/// either recovery rate or objective score.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Stats {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
}

impl Stats {
    fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let n = samples.len() as f64;
        let mean = samples.iter().sum::<f64>() / n;
        let variance = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self { mean, std_dev: variance.sqrt(), min, max }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_of_empty_samples_is_all_zero() {
        let metrics = AggregateMetrics::new();
        assert_eq!(metrics.recovery_rate_stats(), Stats::default());
    }

    #[test]
    fn record_cycle_accumulates_totals() {
        let mut metrics = AggregateMetrics::new();
        metrics.record_cycle(2, 3, 2.0 / 3.0, 10.0);
        metrics.record_cycle(1, 1, 1.0, 5.0);
        assert_eq!(metrics.total_cycles(), 2);
        assert_eq!(metrics.total_tasks_recovered(), 3);
        assert_eq!(metrics.total_tasks_lost(), 4);
        let stats = metrics.objective_score_stats();
        assert!((stats.mean - 7.5).abs() < 1e-9);
        assert!((stats.min - 5.0).abs() < 1e-9);
        assert!((stats.max - 10.0).abs() < 1e-9);
    }
}
