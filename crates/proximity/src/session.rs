// Hunt Session - one view's worth of tracking, unlock state and camera, with guaranteed teardown

use crate::camera::{CameraSession, CameraStream};
use crate::evaluator::ProximityEvaluator;
use crate::permissions::{Capability, PermissionManager};
use crate::platform::{CameraDevice, LocationSource};
use crate::tracker::{LocationTracker, WatchHandle};
use crate::unlock::UnlockSession;
use crate::zones::{self, DEFAULT_CENTER};
use crate::{
    CameraConstraints, CameraError, CameraState, ErrorContext, LocationError, LocationEvent,
    LocationStatus, Position, ProximityError, ProximityState, Result, SessionPhase, WatchOptions,
};
use shared::config::{Config, UnlockFlow};
use shared::{Coordinate, NewDrop, Target};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub struct HuntSettings {
    pub threshold_m: f64,
    pub watch_options: WatchOptions,
    pub camera: CameraConstraints,
    pub default_center: Coordinate,
}

impl HuntSettings {
    pub fn from_config(config: &Config, flow: UnlockFlow) -> Result<Self> {
        Ok(Self {
            threshold_m: config.unlock.threshold_for(flow),
            watch_options: WatchOptions::from(&config.location),
            camera: CameraConstraints::try_from(&config.camera)?,
            default_center: config.map.default_center,
        })
    }
}

impl Default for HuntSettings {
    fn default() -> Self {
        Self {
            threshold_m: 20.0,
            watch_options: WatchOptions::default(),
            camera: CameraConstraints::default(),
            default_center: DEFAULT_CENTER,
        }
    }
}

/// Everything the UI needs to render one frame of the hunt
#[derive(Debug, Clone, PartialEq)]
pub struct HuntSnapshot {
    pub phase: SessionPhase,
    pub target: Option<Target>,
    pub proximity: ProximityState,
    pub threshold_m: f64,
    pub can_reveal: bool,
    /// The hidden message, only while revealed
    pub revealed_message: Option<String>,
    pub position: Option<Position>,
    pub location: LocationStatus,
    pub camera: CameraState,
    /// User-facing explanation of whatever is degraded right now
    pub notice: Option<String>,
}

/// Inputs the hunt view accepts from the UI
#[derive(Debug, Clone)]
pub enum HuntCommand {
    Select(Target),
    Reveal,
    Close,
    Deselect,
    Teleport(Coordinate),
    CameraFailed(CameraError),
    Leave,
}

pub struct HuntSession {
    session_id: Uuid,
    unlock: Arc<RwLock<UnlockSession>>,
    tracker: LocationTracker,
    watch: Option<WatchHandle>,
    camera: CameraSession,
    camera_stream: Option<CameraStream>,
    camera_constraints: CameraConstraints,
    camera_error: Option<CameraError>,
    permissions: PermissionManager,
    location_status: LocationStatus,
    default_center: Coordinate,
    snapshot_tx: watch::Sender<HuntSnapshot>,
}

impl HuntSession {
    pub fn new(
        location: Arc<dyn LocationSource>,
        camera: Arc<dyn CameraDevice>,
        settings: HuntSettings,
    ) -> Result<Self> {
        let evaluator = ProximityEvaluator::new(settings.threshold_m)?;
        let unlock = UnlockSession::new(evaluator);

        let initial = HuntSnapshot {
            phase: unlock.phase(),
            target: None,
            proximity: unlock.proximity(),
            threshold_m: unlock.threshold_m(),
            can_reveal: false,
            revealed_message: None,
            position: None,
            location: LocationStatus::Inactive,
            camera: CameraState::Idle,
            notice: None,
        };
        let (snapshot_tx, _) = watch::channel(initial);

        Ok(Self {
            session_id: Uuid::new_v4(),
            unlock: Arc::new(RwLock::new(unlock)),
            tracker: LocationTracker::new(location, settings.watch_options),
            watch: None,
            camera: CameraSession::new(camera),
            camera_stream: None,
            camera_constraints: settings.camera,
            camera_error: None,
            permissions: PermissionManager::new(),
            location_status: LocationStatus::Inactive,
            default_center: settings.default_center,
            snapshot_tx,
        })
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Shared read access to the unlock state
    pub fn unlock_state(&self) -> Arc<RwLock<UnlockSession>> {
        Arc::clone(&self.unlock)
    }

    pub fn permissions(&self) -> &PermissionManager {
        &self.permissions
    }

    pub fn camera(&self) -> &CameraSession {
        &self.camera
    }

    pub fn location_status(&self) -> LocationStatus {
        self.location_status
    }

    pub fn subscribe(&self) -> watch::Receiver<HuntSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> HuntSnapshot {
        self.snapshot_tx.borrow().clone()
    }

    /// Enter the view: start watching location. Failures degrade, they don't abort.
    pub async fn enter(&mut self) -> LocationStatus {
        if self.watch.is_some() {
            debug!("Hunt view already entered");
            return self.location_status;
        }

        match self.tracker.start() {
            Ok(handle) => {
                self.watch = Some(handle);
                self.location_status = LocationStatus::Searching;
                info!(session_id = %self.session_id, "Hunt view entered, searching for position");
            }
            Err(ProximityError::Location(error)) => {
                self.on_location_error(error).await;
            }
            Err(other) => {
                other.log_with_context(&self.error_context().await);
                self.location_status = LocationStatus::Unavailable(LocationError::Unavailable);
            }
        }

        self.publish().await;
        self.location_status
    }

    /// Process one location event to completion
    pub async fn apply_location_event(&mut self, event: LocationEvent) {
        match event {
            LocationEvent::Position(position) => {
                self.unlock.write().await.on_position_update(position);
                if self.location_status != LocationStatus::Tracking {
                    self.permissions.record_location_outcome(Ok(())).await;
                    self.location_status = LocationStatus::Tracking;
                }
            }
            LocationEvent::Error(error) => self.on_location_error(error).await,
        }
        self.publish().await;
    }

    /// Apply every location event already queued, without waiting. Returns how many were applied.
    pub async fn pump_location(&mut self) -> usize {
        let mut applied = 0;
        while let Some(event) = self.watch.as_mut().and_then(WatchHandle::try_next_event) {
            self.apply_location_event(event).await;
            applied += 1;
        }
        applied
    }

    async fn on_location_error(&mut self, error: LocationError) {
        self.permissions.record_location_outcome(Err(error)).await;
        self.location_status = LocationStatus::Unavailable(error);

        if error == LocationError::PermissionDenied {
            ProximityError::from(error).log_with_context(&self.error_context().await);
        } else {
            warn!(session_id = %self.session_id, "Location degraded: {}", error);
        }
    }

    pub async fn select_target(&mut self, target: Target) {
        self.release_camera();
        self.unlock.write().await.select_target(target);
        self.publish().await;
    }

    /// Select a target from a fetched list by its store id
    pub async fn select_by_id(&mut self, targets: &[Target], id: &str) -> Result<()> {
        let target = targets
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| ProximityError::TargetNotFound(id.to_string()))?;
        self.select_target(target).await;
        Ok(())
    }

    /// Reveal the selected target and bring up the camera under it.
    ///
    /// Returns false (and changes nothing) unless proximity is High. A camera
    /// failure does not undo the reveal; it shows up in the snapshot instead.
    pub async fn reveal(&mut self) -> bool {
        if !self.unlock.write().await.reveal() {
            return false;
        }

        self.camera_error = None;
        match self.camera.acquire(self.camera_constraints).await {
            Ok(stream) => {
                self.permissions.record_camera_outcome(Ok(())).await;
                self.camera_stream = Some(stream);
            }
            Err(ProximityError::Camera(error)) => {
                self.permissions.record_camera_outcome(Err(error)).await;
                self.camera_error = Some(error);
                ProximityError::from(error).log_with_context(&self.error_context().await);
            }
            Err(other) => {
                warn!(session_id = %self.session_id, "Camera not started: {}", other);
            }
        }

        self.publish().await;
        true
    }

    /// Dismiss the reveal and release the camera. Tracking continues.
    pub async fn close(&mut self) -> bool {
        let closed = self.unlock.write().await.close();
        self.release_camera();
        self.publish().await;
        closed
    }

    /// Back to target selection
    pub async fn deselect(&mut self) {
        self.release_camera();
        self.unlock.write().await.deselect();
        self.publish().await;
    }

    /// Pretend to be somewhere else. Used by the zone warp on the home screen.
    pub async fn teleport(&mut self, coordinate: Coordinate) {
        info!(session_id = %self.session_id, "Warping to {}", coordinate);
        self.apply_location_event(LocationEvent::Position(Position::now(coordinate)))
            .await;
    }

    pub async fn warp_to_zone(&mut self, zone_id: u32) -> Result<()> {
        let zone = zones::find_zone(zone_id)
            .ok_or_else(|| ProximityError::InvalidInput(format!("no campus zone {}", zone_id)))?;
        self.teleport(zone.coordinate).await;
        Ok(())
    }

    /// The stream broke while in use
    pub async fn report_camera_error(&mut self, error: CameraError) {
        match self.camera_stream.take() {
            Some(stream) => {
                stream.fail(error);
            }
            None => self.camera.fail(error),
        }
        self.camera_error = Some(error);
        ProximityError::from(error).log_with_context(&self.error_context().await);
        self.publish().await;
    }

    /// A new drop at the current position
    pub async fn drop_here(&self, message: &str) -> Result<NewDrop> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ProximityError::InvalidInput("drop message is empty".to_string()));
        }

        let position = self
            .unlock
            .read()
            .await
            .latest_position()
            .ok_or(ProximityError::NoPositionFix)?;

        Ok(NewDrop {
            coordinate: position.coordinate,
            message: message.to_string(),
        })
    }

    /// Where the map should center: the user, or the campus default before a fix
    pub async fn map_center(&self) -> Coordinate {
        self.unlock
            .read()
            .await
            .latest_position()
            .map(|p| p.coordinate)
            .unwrap_or(self.default_center)
    }

    pub async fn handle_command(&mut self, command: HuntCommand) {
        debug!(session_id = %self.session_id, "Command: {:?}", command);
        match command {
            HuntCommand::Select(target) => self.select_target(target).await,
            HuntCommand::Reveal => {
                self.reveal().await;
            }
            HuntCommand::Close => {
                self.close().await;
            }
            HuntCommand::Deselect => self.deselect().await,
            HuntCommand::Teleport(coordinate) => self.teleport(coordinate).await,
            HuntCommand::CameraFailed(error) => self.report_camera_error(error).await,
            HuntCommand::Leave => self.leave(),
        }
    }

    /// Drive the view: location events and UI commands, one at a time, until
    /// `Leave` arrives or the command channel closes. Always tears down on exit.
    pub async fn run(&mut self, mut commands: mpsc::Receiver<HuntCommand>) {
        self.enter().await;

        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(HuntCommand::Leave) | None => break,
                    Some(command) => self.handle_command(command).await,
                },
                event = next_watch_event(&mut self.watch) => match event {
                    Some(event) => self.apply_location_event(event).await,
                    None => {
                        warn!(session_id = %self.session_id, "Location watch ended by the platform");
                        self.watch = None;
                        self.location_status = LocationStatus::Unavailable(LocationError::Unavailable);
                        self.publish().await;
                    }
                },
            }
        }

        self.leave();
    }

    /// Leave the view: cancel the location watch and release the camera, synchronously.
    pub fn leave(&mut self) {
        let mut released = false;
        if let Some(mut handle) = self.watch.take() {
            handle.stop();
            released = true;
        }
        if self.release_camera() {
            released = true;
        }

        self.location_status = LocationStatus::Inactive;
        let camera = self.camera.state();
        self.snapshot_tx.send_modify(|snapshot| {
            snapshot.location = LocationStatus::Inactive;
            snapshot.camera = camera;
        });

        if released {
            info!(session_id = %self.session_id, "Hunt view left, resources released");
        }
    }

    fn release_camera(&mut self) -> bool {
        let mut released = false;
        if let Some(stream) = self.camera_stream.take() {
            released |= stream.release();
        }
        // Covers a request still in flight
        released |= self.camera.release();
        released
    }

    async fn error_context(&self) -> ErrorContext {
        let context = ErrorContext::new().with_session_id(self.session_id);
        match self.unlock.read().await.selected_target() {
            Some(target) => context.with_target_id(target.id.clone()),
            None => context,
        }
    }

    fn notice(&self) -> Option<String> {
        if let Some(error) = self.camera_error {
            return Some(match error {
                CameraError::PermissionDenied => {
                    self.permissions.handle_permission_denial(Capability::Camera)
                }
                CameraError::DeviceUnavailable => error.user_message().to_string(),
            });
        }

        match self.location_status {
            LocationStatus::Unavailable(LocationError::PermissionDenied) => {
                Some(self.permissions.handle_permission_denial(Capability::Location))
            }
            LocationStatus::Unavailable(error) => Some(error.user_message().to_string()),
            _ => None,
        }
    }

    async fn publish(&self) {
        let snapshot = {
            let unlock = self.unlock.read().await;
            HuntSnapshot {
                phase: unlock.phase(),
                target: unlock.selected_target().cloned(),
                proximity: unlock.proximity(),
                threshold_m: unlock.threshold_m(),
                can_reveal: unlock.can_reveal(),
                revealed_message: unlock
                    .selected_target()
                    .filter(|_| unlock.is_revealed())
                    .map(|t| t.message.clone()),
                position: unlock.latest_position(),
                location: self.location_status,
                camera: self.camera.state(),
                notice: self.notice(),
            }
        };
        self.snapshot_tx.send_replace(snapshot);
    }
}

impl Drop for HuntSession {
    fn drop(&mut self) {
        self.leave();
    }
}

async fn next_watch_event(watch: &mut Option<WatchHandle>) -> Option<LocationEvent> {
    match watch {
        Some(handle) => handle.next_event().await,
        None => std::future::pending().await,
    }
}
