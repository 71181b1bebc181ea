use crate::config::Config;
use crate::model::task::TaskType;
use crate::model::vehicle::VehicleId;
use crate::model::{AssignmentPlan, FleetSnapshot, OperatingRegion, Task, TaskSnapshot, Vec3, Vehicle};
use crate::validator::reason::{AssignResult, InfeasibilityReason, PlanViolations};
use chrono::Utc;
use fixed::types::I32F32;

/// Signed payload change a task applies to whichever vehicle carries it:
/// a pickup or delivery-pair loads cargo, a dropoff releases it, patrol
/// and search tasks carry nothing.
fn payload_delta(task: &Task) -> I32F32 {
    match task.task_type() {
        TaskType::Pickup | TaskType::DeliveryPair => task.payload_req(),
        TaskType::Dropoff => -task.payload_req(),
        TaskType::PatrolZone | TaskType::SearchZone => I32F32::ZERO,
    }
}

/// Total energy-units required to fly from `vehicle`'s current position
/// through every committed waypoint, then the candidate (if given), and
/// finally back to `base`. Vertical motion is folded into distance by
/// adding altitude change (an intentional approximation — see the energy
/// model note); `hover_energy_rate` additionally charges energy for each
/// task's estimated duration when configured non-zero.
fn route_energy_cost(
    vehicle: &Vehicle,
    committed: &[&Task],
    candidate: Option<&Task>,
    base: Vec3,
    config: &Config,
) -> I32F32 {
    let mut cursor = vehicle.position();
    let mut distance = I32F32::ZERO;
    let mut hover_seconds = I32F32::ZERO;

    for task in committed.iter().copied().chain(candidate) {
        let target = task.target();
        distance += cursor.horizontal_distance_to(target) + cursor.altitude_delta_to(target);
        hover_seconds += I32F32::from_num(task.estimated_duration().num_seconds());
        cursor = target;
    }
    distance += cursor.horizontal_distance_to(base) + cursor.altitude_delta_to(base);

    let travel_cost = distance / vehicle.efficiency();
    let hover_cost = config.hover_energy_rate * hover_seconds;
    travel_cost + hover_cost
}

/// Estimated completion time of `candidate`, assuming the vehicle flies
/// the committed route first and then the candidate, at its configured
/// cruise speed.
fn estimated_completion_time(
    vehicle: &Vehicle,
    committed: &[&Task],
    candidate: &Task,
) -> chrono::DateTime<Utc> {
    let mut cursor = vehicle.position();
    let mut distance = I32F32::ZERO;
    for task in committed {
        distance += cursor.distance_to(task.target());
        cursor = task.target();
    }
    distance += cursor.distance_to(candidate.target());

    let travel_secs: f64 = (distance / vehicle.cruise_speed_mps()).to_num();
    let total_secs = travel_secs + candidate.estimated_duration().num_seconds() as f64;
    Utc::now() + chrono::Duration::milliseconds((total_secs * 1000.0) as i64)
}

/// Decides feasibility of assigning `candidate` to `vehicle`, given the
/// tasks already committed to it. Constraints are evaluated in the
/// documented order and the first failure short-circuits; a collision
/// check is deliberately not performed here since it is inherently a
/// whole-plan property — see `validate_plan`.
pub fn can_assign(
    vehicle: &Vehicle,
    committed: &[&Task],
    candidate: &Task,
    base: Vec3,
    region: OperatingRegion,
    config: &Config,
) -> AssignResult {
    // 1. Operational.
    if !vehicle.is_operational() || !vehicle.health().is_assignment_eligible() {
        return Err(InfeasibilityReason::NotOperational);
    }

    // 2. Payload. Fold the delta across the committed route too, not just
    // the candidate — two payload-bearing tasks queued onto the same
    // vehicle in one pass must not each pass this check against the
    // vehicle's snapshot-time payload alone.
    let committed_delta: I32F32 = committed.iter().copied().map(|t| payload_delta(t)).sum();
    let projected_payload = vehicle.current_payload() + committed_delta + payload_delta(candidate);
    if projected_payload > vehicle.max_payload() {
        return Err(InfeasibilityReason::PayloadExceeded {
            margin: projected_payload - vehicle.max_payload(),
        });
    }

    // 3. Energy.
    let cost = route_energy_cost(vehicle, committed, Some(candidate), base, config);
    let remaining_energy = vehicle.spare_energy() - cost;
    let remaining_fraction = remaining_energy / vehicle.energy_capacity();
    if remaining_fraction < config.safety_reserve_fraction {
        return Err(InfeasibilityReason::InsufficientEnergy {
            margin: config.safety_reserve_fraction - remaining_fraction,
        });
    }

    // 4. Boundary.
    if !region.contains(candidate.target()) && !vehicle.has_permission_for(candidate.id()) {
        return Err(InfeasibilityReason::OutsideRegionNoPermission);
    }

    // 6. Temporal (5, collision, is whole-plan only).
    if let Some(deadline) = candidate.deadline() {
        let eta = estimated_completion_time(vehicle, committed, candidate);
        if eta > deadline {
            return Err(InfeasibilityReason::DeadlineMissed { overrun: eta - deadline });
        }
    }

    Ok(())
}

/// Closest approach (meters) between two straight-line routes, each
/// starting at a vehicle's current position and passing through its
/// ordered waypoints. Evaluated at waypoint vertices only (a deliberate,
/// documented approximation to the true continuous closest-approach,
/// cheap enough for O(n^2 * k) pairwise checking across the whole plan).
fn closest_approach(route_a: &[Vec3], route_b: &[Vec3]) -> I32F32 {
    let mut min_dist: Option<I32F32> = None;
    for a in route_a {
        for b in route_b {
            let d = a.distance_to(*b);
            min_dist = Some(min_dist.map_or(d, |m| m.min(d)));
        }
    }
    min_dist.unwrap_or(I32F32::MAX)
}

fn route_waypoints(vehicle: &Vehicle, plan: &AssignmentPlan, tasks: &TaskSnapshot) -> Vec<Vec3> {
    let mut route = vec![vehicle.position()];
    for task_id in plan.tasks_for(vehicle.id()) {
        if let Some(task) = tasks.get(*task_id) {
            route.push(task.target());
        }
    }
    route
}

/// Checks an entire plan atomically against a snapshot: every constraint
/// in §4.1 for every vehicle, plus the whole-plan-only collision check.
/// Unlike `can_assign`, every violation found is collected rather than
/// short-circuiting on the first.
pub fn validate_plan(
    snapshot: &FleetSnapshot,
    tasks: &TaskSnapshot,
    plan: &AssignmentPlan,
    base: Vec3,
    region: OperatingRegion,
    config: &Config,
) -> PlanViolations {
    let mut violations = Vec::new();

    for vehicle in snapshot.vehicles() {
        let committed: Vec<&Task> =
            plan.tasks_for(vehicle.id()).iter().filter_map(|id| tasks.get(*id)).collect();

        // Re-check the route incrementally: each task must be feasible
        // given only the tasks that precede it, matching how `can_assign`
        // would have placed them one at a time.
        for (idx, task) in committed.iter().enumerate() {
            let prefix = &committed[..idx];
            if let Err(reason) = can_assign(vehicle, prefix, task, base, region, config) {
                violations.push((vehicle.id(), reason));
            }
        }
    }

    let vehicle_ids: Vec<VehicleId> = snapshot.vehicles().map(Vehicle::id).collect();
    for (i, &va) in vehicle_ids.iter().enumerate() {
        for &vb in &vehicle_ids[i + 1..] {
            let vehicle_a = snapshot.vehicle(va).expect("vehicle id from snapshot must resolve");
            let vehicle_b = snapshot.vehicle(vb).expect("vehicle id from snapshot must resolve");
            let route_a = route_waypoints(vehicle_a, plan, tasks);
            let route_b = route_waypoints(vehicle_b, plan, tasks);
            if route_a.len() <= 1 || route_b.len() <= 1 {
                continue;
            }
            let margin_into_buffer = I32F32::from_num(config.collision_buffer_m) - closest_approach(&route_a, &route_b);
            if margin_into_buffer > I32F32::ZERO {
                violations.push((va, InfeasibilityReason::CollisionWith { other: vb, margin: margin_into_buffer }));
            }
        }
    }

    PlanViolations(violations)
}
