//! End-to-end scenarios driving the Orchestrator's public API, one per
//! documented recovery case.

use fixed::types::I32F32;
use fleet_ooda_core::config::{Config, MissionType};
use fleet_ooda_core::mission_db::{InMemoryMissionDatabase, MissionDatabase};
use fleet_ooda_core::model::{OperatingRegion, Strategy, Task, TaskType, Vec3, Vehicle};
use fleet_ooda_core::orchestrator::Orchestrator;
use fleet_ooda_core::store::{FleetStateStore, TelemetryMessage};
use std::sync::Arc;

fn region() -> OperatingRegion {
    OperatingRegion::new(Vec3::ZERO, Vec3::from_f64(3000.0, 2000.0, 1000.0))
}

fn vehicle_at(id: u32, x: f64, y: f64, energy: f64) -> Vehicle {
    Vehicle::new(
        id,
        Vec3::from_f64(x, y, 0.0),
        I32F32::from_num(energy),
        I32F32::from_num(100.0),
        I32F32::from_num(2.5),
        I32F32::from_num(10.0),
        chrono::Utc::now(),
    )
}

fn build(store: Arc<FleetStateStore>, mission_db: Arc<dyn MissionDatabase>, mission: MissionType) -> Orchestrator {
    Orchestrator::new(store, mission_db, Arc::new(Config::defaults()), Vec3::ZERO, region(), mission)
}

/// Scenario A — five vehicles, one fails, its zone is reassigned to a
/// vehicle with sufficient reserve; full recovery.
#[tokio::test]
async fn scenario_a_surveillance_single_failure_full_recovery() {
    let store = Arc::new(FleetStateStore::new());
    let positions = [(0.0, 0.0), (20.0, 0.0), (40.0, 0.0), (0.0, 20.0), (20.0, 20.0)];
    for (i, (x, y)) in positions.iter().enumerate() {
        store.register(vehicle_at(i as u32 + 1, *x, *y, 0.8));
    }

    let mission_db: Arc<dyn MissionDatabase> = Arc::new(InMemoryMissionDatabase::new());
    for zone in 1..=9u32 {
        mission_db.insert(Task::new(
            zone,
            TaskType::PatrolZone,
            Vec3::from_f64(10.0 * f64::from(zone), 0.0, 0.0),
            5,
            chrono::Duration::seconds(30),
            I32F32::ZERO,
            None,
            Some(format!("zone-{zone}")),
        ));
        let owner = ((zone - 1) % 5) + 1;
        mission_db.transition(zone, fleet_ooda_core::model::TaskState::Assigned, Some(owner));
    }

    store.mark_failed(3);
    let mut orchestrator = build(Arc::clone(&store), Arc::clone(&mission_db), MissionType::Surveillance);
    let event = orchestrator.run_cycle(true).await;

    assert_eq!(event.strategy, Strategy::FullReallocation);
    assert!(event.metrics.unallocated_count == 0, "vehicle 3's zones must be reassigned, not escalated");
    assert!((event.metrics.recovery_rate - 1.0).abs() < 1e-9);
}

/// Scenario B — a delivery task requiring more payload than any vehicle
/// has spare is escalated, never silently dropped.
#[tokio::test]
async fn scenario_b_delivery_payload_infeasible_is_escalated() {
    let store = Arc::new(FleetStateStore::new());
    for id in 1..=3u32 {
        store.register(vehicle_at(id, 0.0, 0.0, 1.0));
        store.ingest(
            &TelemetryMessage {
                vehicle_id: id,
                t: 0.0,
                pos: [0.0, 0.0, 0.0],
                vel: [0.0, 0.0, 0.0],
                energy: 1.0,
                payload: 1.8,
                health: fleet_ooda_core::model::HealthStatus::Healthy,
                task_progress: std::collections::HashMap::new(),
            },
            chrono::Utc::now(),
        );
    }

    let mission_db: Arc<dyn MissionDatabase> = Arc::new(InMemoryMissionDatabase::new());
    mission_db.insert(Task::new(
        1,
        TaskType::Dropoff,
        Vec3::from_f64(5.0, 0.0, 0.0),
        5,
        chrono::Duration::seconds(30),
        I32F32::from_num(2.0),
        None,
        None,
    ));

    let mut orchestrator = build(store, mission_db, MissionType::Delivery);
    let event = orchestrator.run_cycle(true).await;

    assert_eq!(event.metrics.unallocated_count, 1);
    assert!(event.escalated.contains(&1));
    assert!((event.metrics.recovery_rate - 0.0).abs() < 1e-9);
}

/// Scenario C — a task outside the operating region with no grant on any
/// vehicle is escalated and no command is emitted for it.
#[tokio::test]
async fn scenario_c_out_of_region_without_permission_is_escalated() {
    let store = Arc::new(FleetStateStore::new());
    store.register(vehicle_at(1, 0.0, 0.0, 1.0));

    let mission_db: Arc<dyn MissionDatabase> = Arc::new(InMemoryMissionDatabase::new());
    mission_db.insert(Task::new(
        1,
        TaskType::SearchZone,
        Vec3::from_f64(3500.0, 2500.0, 0.0),
        5,
        chrono::Duration::seconds(30),
        I32F32::ZERO,
        None,
        None,
    ));

    let mut orchestrator = build(store, mission_db, MissionType::Search);
    let event = orchestrator.run_cycle(true).await;

    assert!(event.escalated.contains(&1));
    assert!(event.assignments.values().all(|tasks| !tasks.contains(&1)));
}

/// Scenario D — a golden-hour search-and-rescue task with a tight deadline
/// still completes its decide phase within the optimization budget and
/// reports positive temporal margin.
#[tokio::test]
async fn scenario_d_golden_hour_sar_within_budget() {
    let store = Arc::new(FleetStateStore::new());
    store.register(vehicle_at(1, 0.0, 0.0, 1.0));
    store.register(vehicle_at(2, 500.0, 500.0, 1.0));

    let mission_db: Arc<dyn MissionDatabase> = Arc::new(InMemoryMissionDatabase::new());
    mission_db.insert(Task::new(
        1,
        TaskType::SearchZone,
        Vec3::from_f64(50.0, 0.0, 0.0),
        100,
        chrono::Duration::seconds(30),
        I32F32::ZERO,
        Some(chrono::Utc::now() + chrono::Duration::seconds(60)),
        None,
    ));

    let mut orchestrator = build(store, mission_db, MissionType::Search);
    let event = orchestrator.run_cycle(true).await;

    assert!(event.phase_timings_ms.decide <= 200, "decide phase exceeded its budget");
    assert!(event.metrics.temporal_margin_secs > 0.0);
}

/// Scenario E — two failures observed between ticks coalesce into exactly
/// one extra cycle, not two.
#[tokio::test]
async fn scenario_e_coalesced_failures_run_one_cycle() {
    let store = Arc::new(FleetStateStore::new());
    store.register(vehicle_at(1, 0.0, 0.0, 1.0));
    store.register(vehicle_at(2, 10.0, 0.0, 1.0));
    store.register(vehicle_at(3, 20.0, 0.0, 1.0));

    let mission_db: Arc<dyn MissionDatabase> = Arc::new(InMemoryMissionDatabase::new());
    mission_db.insert(Task::new(
        1,
        TaskType::PatrolZone,
        Vec3::from_f64(0.0, 1.0, 0.0),
        5,
        chrono::Duration::seconds(30),
        I32F32::ZERO,
        None,
        None,
    ));
    mission_db.transition(1, fleet_ooda_core::model::TaskState::Assigned, Some(1));

    store.mark_failed(1);
    store.mark_failed(2);

    let mut orchestrator = build(Arc::clone(&store), Arc::clone(&mission_db), MissionType::Surveillance);
    let event = orchestrator.run_cycle(true).await;
    assert_eq!(orchestrator.cycle_count(), 1, "both failures observed in one snapshot must cost one cycle");
    assert_eq!(event.metrics.operational_uavs, 1);
}

/// Scenario F — running an identical snapshot twice through the optimizer
/// produces bit-identical plans and objective scores.
#[tokio::test]
async fn scenario_f_identical_snapshots_produce_identical_plans() {
    fn build_fixture() -> (Arc<FleetStateStore>, Arc<dyn MissionDatabase>) {
        let store = Arc::new(FleetStateStore::new());
        let positions = [(0.0, 0.0), (20.0, 0.0), (40.0, 0.0), (0.0, 20.0), (20.0, 20.0)];
        for (i, (x, y)) in positions.iter().enumerate() {
            store.register(vehicle_at(i as u32 + 1, *x, *y, 0.8));
        }
        let mission_db: Arc<dyn MissionDatabase> = Arc::new(InMemoryMissionDatabase::new());
        for zone in 1..=9u32 {
            mission_db.insert(Task::new(
                zone,
                TaskType::PatrolZone,
                Vec3::from_f64(10.0 * f64::from(zone), 0.0, 0.0),
                5,
                chrono::Duration::seconds(30),
                I32F32::ZERO,
                None,
                Some(format!("zone-{zone}")),
            ));
            let owner = ((zone - 1) % 5) + 1;
            mission_db.transition(zone, fleet_ooda_core::model::TaskState::Assigned, Some(owner));
        }
        store.mark_failed(3);
        (store, mission_db)
    }

    let (store_a, db_a) = build_fixture();
    let mut orch_a = build(store_a, db_a, MissionType::Surveillance);
    let event_a = orch_a.run_cycle(true).await;

    let (store_b, db_b) = build_fixture();
    let mut orch_b = build(store_b, db_b, MissionType::Surveillance);
    let event_b = orch_b.run_cycle(true).await;

    assert_eq!(event_a.assignments, event_b.assignments);
    assert!((event_a.metrics.objective_score - event_b.metrics.objective_score).abs() < 1e-12);
}
