// Camera Session - acquisition and guaranteed release of the live video feed under the reveal

use crate::platform::CameraDevice;
use crate::{CameraConstraints, CameraError, CameraState, FacingMode, ProximityError, Result, StreamId};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

#[derive(Debug)]
struct Slot {
    state: CameraState,
    active: Option<StreamId>,
    /// Bumped on every new request and on release, so a late open can tell it is stale
    request: u64,
}

#[derive(Debug)]
struct Shared {
    device: Arc<dyn CameraDevice>,
    slot: Mutex<Slot>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The single release path: every exit route ends here.
    /// Closes the device stream only if `id` is still the active one.
    fn release_stream(&self, id: StreamId, terminal: CameraState) -> bool {
        {
            let mut slot = self.lock();
            if slot.active != Some(id) {
                return false;
            }
            slot.active = None;
            slot.state = terminal;
        }

        self.device.close(id);
        info!("Camera stream {} released ({:?})", id.0, terminal);
        true
    }
}

/// Held across the device open. If the acquire future is dropped first,
/// the slot goes back to `Idle` so the next request is not blocked.
struct PendingRequest<'a> {
    shared: &'a Shared,
    request: u64,
    armed: bool,
}

impl PendingRequest<'_> {
    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for PendingRequest<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut slot = self.shared.lock();
        if slot.request == self.request && slot.state == CameraState::Requesting {
            slot.state = CameraState::Idle;
            debug!("Camera request {} cancelled before the stream opened", self.request);
        }
    }
}

/// One view's camera. Cloning shares the same slot.
#[derive(Debug, Clone)]
pub struct CameraSession {
    shared: Arc<Shared>,
}

impl CameraSession {
    pub fn new(device: Arc<dyn CameraDevice>) -> Self {
        Self {
            shared: Arc::new(Shared {
                device,
                slot: Mutex::new(Slot {
                    state: CameraState::Idle,
                    active: None,
                    request: 0,
                }),
            }),
        }
    }

    pub fn state(&self) -> CameraState {
        self.shared.lock().state
    }

    pub fn is_streaming(&self) -> bool {
        self.state().is_streaming()
    }

    /// Open the camera. Only one request may be in flight and only one stream may be live.
    pub async fn acquire(&self, constraints: CameraConstraints) -> Result<CameraStream> {
        let request = {
            let mut slot = self.shared.lock();
            match slot.state {
                CameraState::Requesting => return Err(ProximityError::CameraRequestPending),
                CameraState::Streaming { .. } => return Err(ProximityError::CameraAlreadyActive),
                CameraState::Idle | CameraState::Failed(_) | CameraState::Released => {
                    slot.state = CameraState::Requesting;
                    slot.request += 1;
                    slot.request
                }
            }
        };
        let mut pending = PendingRequest {
            shared: &self.shared,
            request,
            armed: true,
        };

        info!(
            "Requesting {} camera from {}",
            constraints.facing,
            self.shared.device.platform_name()
        );
        let outcome = self.open_with_fallback(constraints).await;
        pending.disarm();

        let mut slot = self.shared.lock();
        let still_wanted = slot.state == CameraState::Requesting && slot.request == request;

        match outcome {
            Ok((id, facing)) if still_wanted => {
                slot.state = CameraState::Streaming { facing };
                slot.active = Some(id);
                info!("Camera stream {} live ({})", id.0, facing);
                Ok(CameraStream {
                    shared: Arc::clone(&self.shared),
                    id,
                    facing,
                })
            }
            Ok((id, _)) => {
                drop(slot);
                // The view went away while the request was pending
                self.shared.device.close(id);
                warn!("Camera stream {} opened after release, closed immediately", id.0);
                Err(ProximityError::CameraReleased)
            }
            Err(error) => {
                if still_wanted {
                    slot.state = CameraState::Failed(error);
                }
                warn!("Camera request failed: {}", error);
                Err(error.into())
            }
        }
    }

    async fn open_with_fallback(
        &self,
        constraints: CameraConstraints,
    ) -> std::result::Result<(StreamId, FacingMode), CameraError> {
        let device = &self.shared.device;
        match device.open(constraints.facing).await {
            Ok(id) => Ok((id, constraints.facing)),
            Err(CameraError::DeviceUnavailable) if constraints.allow_fallback => {
                let fallback = constraints.facing.opposite();
                debug!(
                    "No {} camera, falling back to {}",
                    constraints.facing, fallback
                );
                let id = device.open(fallback).await?;
                Ok((id, fallback))
            }
            Err(error) => Err(error),
        }
    }

    /// Release whatever this session holds. Safe to call in any state, any number of times.
    pub fn release(&self) -> bool {
        let active = {
            let mut slot = self.shared.lock();
            match slot.active {
                Some(id) => Some(id),
                None => {
                    if slot.state == CameraState::Requesting {
                        slot.state = CameraState::Released;
                        slot.request += 1;
                        debug!("Camera released while a request was pending");
                    }
                    None
                }
            }
        };

        match active {
            Some(id) => self.shared.release_stream(id, CameraState::Released),
            None => false,
        }
    }

    /// An error surfaced while the stream was in use: release and mark failed.
    pub fn fail(&self, error: CameraError) {
        let active = self.shared.lock().active;
        match active {
            Some(id) => {
                self.shared.release_stream(id, CameraState::Failed(error));
            }
            None => {
                self.shared.lock().state = CameraState::Failed(error);
            }
        }
        warn!("Camera failed during use: {}", error);
    }
}

/// A live camera stream. Dropping it releases the device.
#[derive(Debug)]
pub struct CameraStream {
    shared: Arc<Shared>,
    id: StreamId,
    facing: FacingMode,
}

impl CameraStream {
    pub fn id(&self) -> StreamId {
        self.id
    }

    pub fn facing(&self) -> FacingMode {
        self.facing
    }

    pub fn is_live(&self) -> bool {
        self.shared.lock().active == Some(self.id)
    }

    pub fn release(&self) -> bool {
        self.shared.release_stream(self.id, CameraState::Released)
    }

    pub fn fail(&self, error: CameraError) -> bool {
        warn!("Camera stream {} failed: {}", self.id.0, error);
        self.shared.release_stream(self.id, CameraState::Failed(error))
    }
}

impl Drop for CameraStream {
    fn drop(&mut self) {
        self.shared.release_stream(self.id, CameraState::Released);
    }
}
