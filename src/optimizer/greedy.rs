use crate::config::Config;
use crate::model::{AssignmentPlan, FleetSnapshot, OperatingRegion, Task, TaskSnapshot, Vec3};
use crate::validator::can_assign;

/// Builds a seed plan by walking `to_place` in priority order (highest
/// priority first, ties broken by earliest deadline then lightest payload)
/// and greedily placing each onto whichever operational vehicle can take it
/// at least cost, per the feasibility check. A task with no feasible vehicle
/// among the whole fleet is escalated outright.
///
/// Feasibility for each vehicle starts from its *actual* standing route —
/// `all_tasks` resolves `Vehicle::committed_tasks()` ids back into task
/// records so a vehicle's already-committed payload and energy load from
/// prior cycles is accounted for, not just what this pass places on it.
pub fn seed_plan(
    snapshot: &FleetSnapshot,
    all_tasks: &TaskSnapshot,
    to_place: &TaskSnapshot,
    base: Vec3,
    region: OperatingRegion,
    config: &Config,
) -> AssignmentPlan {
    let mut ordered: Vec<&Task> = to_place.iter().collect();
    ordered.sort_by(|a, b| {
        b.priority()
            .cmp(&a.priority())
            .then_with(|| a.deadline().cmp(&b.deadline()))
            .then_with(|| a.payload_req().cmp(&b.payload_req()))
    });

    let mut plan = AssignmentPlan::new();
    let mut committed: std::collections::HashMap<crate::model::VehicleId, Vec<Task>> =
        std::collections::HashMap::new();
    for vehicle in snapshot.operational_vehicles() {
        let standing: Vec<Task> =
            vehicle.committed_tasks().iter().filter_map(|id| all_tasks.get(*id)).cloned().collect();
        committed.insert(vehicle.id(), standing);
    }

    for task in ordered {
        let mut best: Option<(crate::model::VehicleId, fixed::types::I32F32)> = None;
        for vehicle in snapshot.operational_vehicles() {
            let owned = committed.entry(vehicle.id()).or_default();
            let refs: Vec<&Task> = owned.iter().collect();
            if can_assign(vehicle, &refs, task, base, region, config).is_err() {
                continue;
            }
            let cost = vehicle.position().distance_to(task.target());
            let replace = match &best {
                None => true,
                Some((_, best_cost)) => cost < *best_cost,
            };
            if replace {
                best = Some((vehicle.id(), cost));
            }
        }

        match best {
            Some((vehicle_id, _)) => {
                plan.assign(vehicle_id, task.id());
                committed.entry(vehicle_id).or_default().push(task.clone());
            }
            None => plan.escalate(task.id()),
        }
    }

    plan
}
