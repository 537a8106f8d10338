// Scripted walk - drives one hunt end to end against the simulated platform

use ai_service::TipClient;
use database::{load_targets, TargetStore};
use proximity::platform::sim::{SimulatedCamera, SimulatedLocationSource};
use proximity::{geo, HuntSession, HuntSettings, CAMPUS_ZONES};
use serde_json::{json, Value};
use shared::{Coordinate, Target};
use std::sync::Arc;
use tracing::{info, warn};

/// Distances (meters south of the target) the walker stops at
const APPROACH_STEPS_M: [f64; 6] = [150.0, 90.0, 45.0, 25.0, 12.0, 3.0];

#[derive(Debug, Clone, Default)]
pub struct WalkReport {
    pub targets_loaded: usize,
    pub target_id: Option<String>,
    /// Distance at which the reveal succeeded
    pub revealed_at_m: Option<f64>,
    pub revealed_message: Option<String>,
    pub tip: Option<String>,
    pub new_drop_id: Option<String>,
}

/// One drop per campus zone, used when no database is configured
pub fn seed_documents() -> Vec<Value> {
    CAMPUS_ZONES
        .iter()
        .map(|zone| {
            json!({
                "id": format!("zone-{}", zone.id),
                "message": zone.description,
                "latitude": zone.coordinate.latitude,
                "longitude": zone.coordinate.longitude,
            })
        })
        .collect()
}

fn south_of(target: Coordinate, meters: f64) -> Coordinate {
    let dlat = (meters / geo::EARTH_RADIUS_M).to_degrees();
    Coordinate::new(target.latitude - dlat, target.longitude)
}

/// The campus zone a target sits in, for the tip prompt
pub fn nearest_zone_name(target: &Target) -> &'static str {
    CAMPUS_ZONES
        .iter()
        .min_by(|a, b| {
            geo::distance(a.coordinate, target.coordinate)
                .total_cmp(&geo::distance(b.coordinate, target.coordinate))
        })
        .map(|zone| zone.name)
        .unwrap_or("campus")
}

/// Load targets, walk up to the first one, reveal it, then leave a drop behind.
pub async fn scripted_walk(
    store: &dyn TargetStore,
    tips: &TipClient,
    settings: HuntSettings,
) -> anyhow::Result<WalkReport> {
    let targets = load_targets(store).await;
    let mut report = WalkReport {
        targets_loaded: targets.len(),
        ..WalkReport::default()
    };

    let Some(target) = targets.first().cloned() else {
        warn!("No targets to hunt");
        return Ok(report);
    };

    let location = Arc::new(SimulatedLocationSource::new());
    let camera = Arc::new(SimulatedCamera::new());
    let mut session = HuntSession::new(location.clone(), camera.clone(), settings)?;

    session.enter().await;
    info!("Map centered on {}", session.map_center().await);
    session.select_by_id(&targets, &target.id).await?;
    report.target_id = Some(target.id.clone());

    for meters in APPROACH_STEPS_M {
        location.move_to(south_of(target.coordinate, meters));
        session.pump_location().await;

        let snapshot = session.snapshot();
        info!(
            distance_m = ?snapshot.proximity.distance_m,
            level = %snapshot.proximity.level,
            "Walker {} m from target",
            meters
        );

        if snapshot.can_reveal && session.reveal().await {
            let snapshot = session.snapshot();
            report.revealed_at_m = snapshot.proximity.distance_m;
            report.revealed_message = snapshot.revealed_message.clone();
            info!("Camera: {:?}", snapshot.camera);
            break;
        }
    }

    if report.revealed_message.is_some() {
        let tip = tips.campus_tip(nearest_zone_name(&target)).await;
        info!("Pro tip: {}", tip);
        report.tip = Some(tip);

        session.close().await;

        let drop = session.drop_here("Found it! Left a note for the next hunter.").await?;
        match store.insert_drop(drop).await {
            Ok(stored) => report.new_drop_id = Some(stored.id),
            Err(e) => warn!("Could not store drop: {}", e),
        }
    }

    session.leave();
    Ok(report)
}
