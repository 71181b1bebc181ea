use crate::config::{Config, ObjectiveWeights};
use crate::model::{AssignmentPlan, FleetSnapshot, OperatingRegion, TaskSnapshot, Vec3};
use crate::optimizer::objective::score_plan;
use crate::validator::validate_plan;
use rand::Rng;
use std::time::Instant;

/// Outcome of a bounded local-search pass over a seed plan.
pub struct SearchResult {
    pub plan: AssignmentPlan,
    pub iterations: u32,
    pub seed_objective: f64,
    pub best_objective: f64,
}

/// Runs relocate/swap moves over `seed` until `config.max_iterations`,
/// `config.max_iterations_without_improvement`, or `config.optimization_budget`
/// is hit, whichever comes first. Each candidate move is accepted only if it
/// both lowers the objective score and leaves the plan fully feasible —
/// first-improvement, not best-improvement, to keep each iteration cheap.
#[allow(clippy::too_many_arguments)]
pub fn local_search(
    snapshot: &FleetSnapshot,
    tasks: &TaskSnapshot,
    seed: AssignmentPlan,
    base: Vec3,
    region: OperatingRegion,
    weights: ObjectiveWeights,
    config: &Config,
    rng: &mut impl Rng,
) -> SearchResult {
    let started = Instant::now();
    let seed_objective = score_plan(snapshot, tasks, &seed, base, weights);
    let mut best_plan = seed.clone();
    let mut best_objective = seed_objective;
    let mut iterations = 0u32;
    let mut since_improvement = 0u32;

    let vehicle_ids: Vec<_> = snapshot.operational_vehicles().map(|v| v.id()).collect();
    if vehicle_ids.len() < 2 {
        return SearchResult { plan: best_plan, iterations: 0, seed_objective, best_objective };
    }

    while iterations < config.max_iterations
        && since_improvement < config.max_iterations_without_improvement
        && started.elapsed() < config.optimization_budget
    {
        iterations += 1;
        let candidate = if rng.random_bool(0.5) {
            swap_move(&best_plan, rng)
        } else {
            relocate_move(&best_plan, &vehicle_ids, rng)
        };
        let Some(candidate) = candidate else {
            since_improvement += 1;
            continue;
        };

        if !validate_plan(snapshot, tasks, &candidate, base, region, config).is_ok() {
            since_improvement += 1;
            continue;
        }
        let candidate_objective = score_plan(snapshot, tasks, &candidate, base, weights);
        if candidate_objective < best_objective {
            best_plan = candidate;
            best_objective = candidate_objective;
            since_improvement = 0;
        } else {
            since_improvement += 1;
        }
    }

    SearchResult { plan: best_plan, iterations, seed_objective, best_objective }
}

/// Picks one committed task at random and reassigns it to a different,
/// randomly chosen vehicle. Returns `None` if there is nothing to move
/// (every vehicle's route is empty).
fn relocate_move(
    plan: &AssignmentPlan,
    vehicle_ids: &[crate::model::VehicleId],
    rng: &mut impl Rng,
) -> Option<AssignmentPlan> {
    let candidates: Vec<(crate::model::VehicleId, crate::model::TaskId)> = plan
        .assignments()
        .iter()
        .flat_map(|(vehicle, tasks)| tasks.iter().map(move |t| (*vehicle, *t)))
        .collect();
    if candidates.is_empty() {
        return None;
    }
    let (_, task_id) = candidates[rng.random_range(0..candidates.len())];
    let target_vehicle = vehicle_ids[rng.random_range(0..vehicle_ids.len())];

    let mut next = plan.clone();
    next.remove_task(task_id);
    next.assign(target_vehicle, task_id);
    Some(next)
}

/// Picks two tasks on two different vehicles at random and exchanges
/// their owners. Returns `None` if fewer than two vehicles currently
/// carry a task.
fn swap_move(plan: &AssignmentPlan, rng: &mut impl Rng) -> Option<AssignmentPlan> {
    let occupied: Vec<crate::model::VehicleId> =
        plan.assignments().iter().filter(|(_, tasks)| !tasks.is_empty()).map(|(v, _)| *v).collect();
    if occupied.len() < 2 {
        return None;
    }
    let a = occupied[rng.random_range(0..occupied.len())];
    let b = loop {
        let candidate = occupied[rng.random_range(0..occupied.len())];
        if candidate != a {
            break candidate;
        }
    };
    let task_a = plan.tasks_for(a)[rng.random_range(0..plan.tasks_for(a).len())];
    let task_b = plan.tasks_for(b)[rng.random_range(0..plan.tasks_for(b).len())];

    let mut next = plan.clone();
    next.remove_task(task_a);
    next.remove_task(task_b);
    next.assign(a, task_b);
    next.assign(b, task_a);
    Some(next)
}
