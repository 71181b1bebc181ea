use crate::config::{Config, MissionType};
use crate::model::{AssignmentPlan, FleetSnapshot, OperatingRegion, TaskSnapshot, Vec3};
use crate::optimizer::greedy::seed_plan;
use crate::optimizer::local_search::local_search;
use rand::Rng;
use std::time::Instant;

/// Result of one full optimization pass: the plan the Orchestrator should
/// commit, plus the figures that feed straight into `CycleMetrics`.
pub struct OptimizationOutcome {
    pub plan: AssignmentPlan,
    pub objective_score: f64,
    pub optimization_time_ms: u64,
    pub optimization_iterations: u32,
    pub optimality_gap_estimate: f64,
}

/// Builds a seed assignment by priority-greedy placement, then improves it
/// with a bounded local search, for exactly the tasks named in `orphaned`
/// (everything else keeps its existing owner and is never touched). If
/// there are no operational vehicles at all, every orphaned task is
/// escalated without spending any search budget.
pub fn optimize(
    snapshot: &FleetSnapshot,
    tasks: &TaskSnapshot,
    orphaned: &TaskSnapshot,
    base: Vec3,
    region: OperatingRegion,
    mission: MissionType,
    config: &Config,
    rng: &mut impl Rng,
) -> OptimizationOutcome {
    let started = Instant::now();

    if snapshot.operational_vehicles().next().is_none() {
        let mut plan = AssignmentPlan::new();
        for task in orphaned.iter() {
            plan.escalate(task.id());
        }
        return OptimizationOutcome {
            plan,
            objective_score: 0.0,
            optimization_time_ms: started.elapsed().as_millis() as u64,
            optimization_iterations: 0,
            optimality_gap_estimate: 0.0,
        };
    }

    if orphaned.is_empty() {
        return OptimizationOutcome {
            plan: AssignmentPlan::new(),
            objective_score: 0.0,
            optimization_time_ms: started.elapsed().as_millis() as u64,
            optimization_iterations: 0,
            optimality_gap_estimate: 0.0,
        };
    }

    let seed = seed_plan(snapshot, tasks, orphaned, base, region, config);
    let weights = config.weights_for(mission);
    let result = local_search(snapshot, tasks, seed, base, region, weights, config, rng);

    let epsilon = 1e-9;
    let optimality_gap_estimate =
        (result.seed_objective - result.best_objective) / result.seed_objective.abs().max(epsilon);

    OptimizationOutcome {
        plan: result.plan,
        objective_score: result.best_objective,
        optimization_time_ms: started.elapsed().as_millis() as u64,
        optimization_iterations: result.iterations,
        optimality_gap_estimate,
    }
}
