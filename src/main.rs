use fixed::types::I32F32;
use fleet_ooda_core::config::{Config, MissionType};
use fleet_ooda_core::mission_db::{InMemoryMissionDatabase, MissionDatabase};
use fleet_ooda_core::model::{OperatingRegion, Vec3};
use fleet_ooda_core::orchestrator::Orchestrator;
use fleet_ooda_core::store::FleetStateStore;
use fleet_ooda_core::{fatal, info};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() {
    let config = match Config::from_env() {
        Ok(cfg) => Arc::new(cfg),
        Err(e) => fatal!("refusing to start with a malformed configuration: {e}"),
    };

    let region = OperatingRegion::new(Vec3::ZERO, Vec3::from_f64(3000.0, 2000.0, 1000.0));
    let mission = match std::env::var("MISSION_TYPE").as_deref() {
        Ok("search") => MissionType::Search,
        Ok("delivery") => MissionType::Delivery,
        _ => MissionType::Surveillance,
    };

    let store = Arc::new(FleetStateStore::new());
    let mission_db: Arc<dyn MissionDatabase> = Arc::new(InMemoryMissionDatabase::new());

    info!("starting fleet orchestrator, mission={mission}");
    let mut orchestrator = Orchestrator::new(
        store,
        mission_db,
        Arc::clone(&config),
        Vec3::new(I32F32::ZERO, I32F32::ZERO, I32F32::ZERO),
        region,
        mission,
    );

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            shutdown.cancel();
        }
    });

    orchestrator.run(cancel).await;
    info!("orchestrator stopped after {} cycle(s)", orchestrator.cycle_count());
}
