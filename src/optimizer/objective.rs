use crate::config::ObjectiveWeights;
use crate::model::{AssignmentPlan, FleetSnapshot, TaskSnapshot, Vehicle};
use fixed::types::I32F32;

/// Weighted-sum score for a completed plan: lower is better. Each term is
/// normalized to a roughly comparable scale before weighting, so that a
/// single weight vector produces sane trade-offs across mission types (see
/// the per-mission weight table).
pub fn score_plan(
    snapshot: &FleetSnapshot,
    tasks: &TaskSnapshot,
    plan: &AssignmentPlan,
    base: crate::model::Vec3,
    weights: ObjectiveWeights,
) -> f64 {
    let travel = travel_energy_term(snapshot, tasks, plan, base);
    let balance = load_balance_term(snapshot, plan);
    let priority = priority_satisfaction_term(snapshot, tasks, plan);
    let slack = temporal_slack_term(snapshot, tasks, plan);

    weights.travel_energy * travel + weights.load_balance * balance
        - weights.priority_satisfaction * priority
        - weights.temporal_slack * slack
}

fn travel_energy_term(
    snapshot: &FleetSnapshot,
    tasks: &TaskSnapshot,
    plan: &AssignmentPlan,
    base: crate::model::Vec3,
) -> f64 {
    let mut total = I32F32::ZERO;
    for vehicle in snapshot.vehicles() {
        let mut cursor = vehicle.position();
        for task_id in plan.tasks_for(vehicle.id()) {
            if let Some(task) = tasks.get(*task_id) {
                total += cursor.distance_to(task.target()) / vehicle.efficiency();
                cursor = task.target();
            }
        }
        total += cursor.distance_to(base) / vehicle.efficiency();
    }
    crate::model::event::to_f64(total)
}

/// Variance of committed-task counts across operational vehicles — the
/// Optimizer favors plans that spread work evenly rather than saturating
/// one vehicle while others idle.
fn load_balance_term(snapshot: &FleetSnapshot, plan: &AssignmentPlan) -> f64 {
    let counts: Vec<f64> =
        snapshot.operational_vehicles().map(|v| plan.tasks_for(v.id()).len() as f64).collect();
    if counts.is_empty() {
        return 0.0;
    }
    let mean = counts.iter().sum::<f64>() / counts.len() as f64;
    counts.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / counts.len() as f64
}

/// Sum of priorities of every task that ended up assigned (not escalated),
/// rewarding plans that cover the highest-value work.
fn priority_satisfaction_term(_snapshot: &FleetSnapshot, tasks: &TaskSnapshot, plan: &AssignmentPlan) -> f64 {
    let mut total = 0.0;
    for assigned in plan.assignments().values() {
        for task_id in assigned {
            if let Some(task) = tasks.get(*task_id) {
                total += f64::from(task.priority());
            }
        }
    }
    total
}

/// Sum of remaining slack (seconds) between each committed task's estimated
/// completion and its deadline, for tasks that carry one. Tasks without a
/// deadline contribute nothing — there is no slack to reward or penalize.
fn temporal_slack_term(snapshot: &FleetSnapshot, tasks: &TaskSnapshot, plan: &AssignmentPlan) -> f64 {
    let mut total = 0.0;
    for vehicle in snapshot.vehicles() {
        let mut cursor = vehicle.position();
        let mut elapsed = chrono::Duration::zero();
        for task_id in plan.tasks_for(vehicle.id()) {
            let Some(task) = tasks.get(*task_id) else { continue };
            let leg: f64 = (cursor.distance_to(task.target()) / vehicle.cruise_speed_mps()).to_num();
            elapsed += chrono::Duration::milliseconds((leg * 1000.0) as i64) + task.estimated_duration();
            cursor = task.target();
            if let Some(deadline) = task.deadline() {
                let eta = snapshot.taken_at() + elapsed;
                total += (deadline - eta).num_seconds() as f64;
            }
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MissionType;
    use crate::model::{TaskType, Vec3};
    use chrono::Utc;
    use std::collections::HashMap;

    fn weights() -> ObjectiveWeights {
        crate::config::Config::defaults().weights_for(MissionType::Surveillance)
    }

    #[test]
    fn empty_plan_scores_to_zero_travel_and_balance() {
        let vehicle = Vehicle::new(
            1,
            Vec3::ZERO,
            I32F32::from_num(1.0),
            I32F32::from_num(100.0),
            I32F32::from_num(5.0),
            I32F32::from_num(10.0),
            Utc::now(),
        );
        let mut vehicles = HashMap::new();
        vehicles.insert(1, vehicle);
        let snapshot = FleetSnapshot::new(vehicles, Utc::now(), 1);
        let tasks = TaskSnapshot::new(HashMap::new());
        let plan = AssignmentPlan::new();
        let score = score_plan(&snapshot, &tasks, &plan, Vec3::ZERO, weights());
        assert!(score.abs() < f64::EPSILON, "expected zero score for empty plan, got {score}");
    }

    #[test]
    fn assigning_a_task_increases_priority_term() {
        let vehicle = Vehicle::new(
            1,
            Vec3::ZERO,
            I32F32::from_num(1.0),
            I32F32::from_num(100.0),
            I32F32::from_num(5.0),
            I32F32::from_num(10.0),
            Utc::now(),
        );
        let mut vehicles = HashMap::new();
        vehicles.insert(1, vehicle);
        let snapshot = FleetSnapshot::new(vehicles, Utc::now(), 1);
        let mut task_map = HashMap::new();
        task_map.insert(
            1,
            crate::model::Task::new(
                1,
                TaskType::PatrolZone,
                Vec3::from_f64(10.0, 0.0, 0.0),
                5,
                chrono::Duration::seconds(10),
                I32F32::ZERO,
                None,
                None,
            ),
        );
        let tasks = TaskSnapshot::new(task_map);
        let mut plan = AssignmentPlan::new();
        plan.assign(1, 1);
        let score = score_plan(&snapshot, &tasks, &plan, Vec3::ZERO, weights());
        let empty_score = score_plan(&snapshot, &tasks, &AssignmentPlan::new(), Vec3::ZERO, weights());
        assert!(score < empty_score, "assigning a task should lower (improve) the score");
    }
}
