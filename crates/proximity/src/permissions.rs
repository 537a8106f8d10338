// Permission tracking for the hunt
// The browser or OS prompts on first watch/open; this records what the user answered.

use crate::{CameraError, LocationError, ProximityError, Result};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Host capabilities the hunt needs consent for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Location,
    Camera,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Capability::Location => write!(f, "Location"),
            Capability::Camera => write!(f, "Camera"),
        }
    }
}

/// Permission status for a specific capability
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    /// Permission has been granted
    Granted,
    /// Permission has been denied by the user
    Denied,
    /// Permission has not been requested yet
    NotRequested,
}

/// Tracks consent for location and camera
#[derive(Clone)]
pub struct PermissionManager {
    location_permission: Arc<RwLock<PermissionStatus>>,
    camera_permission: Arc<RwLock<PermissionStatus>>,
}

impl PermissionManager {
    pub fn new() -> Self {
        Self {
            location_permission: Arc::new(RwLock::new(PermissionStatus::NotRequested)),
            camera_permission: Arc::new(RwLock::new(PermissionStatus::NotRequested)),
        }
    }

    fn slot(&self, capability: Capability) -> &Arc<RwLock<PermissionStatus>> {
        match capability {
            Capability::Location => &self.location_permission,
            Capability::Camera => &self.camera_permission,
        }
    }

    pub async fn check_permission(&self, capability: Capability) -> PermissionStatus {
        *self.slot(capability).read().await
    }

    pub async fn set_permission(&self, capability: Capability, status: PermissionStatus) {
        let mut current = self.slot(capability).write().await;
        if *current != status {
            info!("{} permission status: {:?}", capability, status);
        }
        *current = status;
    }

    /// Record what a location watch attempt told us about consent
    pub async fn record_location_outcome(&self, outcome: std::result::Result<(), LocationError>) {
        match outcome {
            Ok(()) => self.set_permission(Capability::Location, PermissionStatus::Granted).await,
            Err(LocationError::PermissionDenied) => {
                self.set_permission(Capability::Location, PermissionStatus::Denied).await
            }
            // Unavailable/timeout says nothing about consent
            Err(other) => debug!("Location outcome {} leaves permission unchanged", other),
        }
    }

    /// Record what a camera open attempt told us about consent
    pub async fn record_camera_outcome(&self, outcome: std::result::Result<(), CameraError>) {
        match outcome {
            Ok(()) => self.set_permission(Capability::Camera, PermissionStatus::Granted).await,
            Err(CameraError::PermissionDenied) => {
                self.set_permission(Capability::Camera, PermissionStatus::Denied).await
            }
            Err(other) => debug!("Camera outcome {} leaves permission unchanged", other),
        }
    }

    /// Fail fast when the user already said no
    pub async fn verify_permission(&self, capability: Capability) -> Result<()> {
        match self.check_permission(capability).await {
            PermissionStatus::Granted | PermissionStatus::NotRequested => Ok(()),
            PermissionStatus::Denied => Err(match capability {
                Capability::Location => ProximityError::Location(LocationError::PermissionDenied),
                Capability::Camera => ProximityError::Camera(CameraError::PermissionDenied),
            }),
        }
    }

    /// User-facing remediation for a denied capability
    pub fn handle_permission_denial(&self, capability: Capability) -> String {
        let message = match capability {
            Capability::Location => {
                "The hunt needs your location to tell how close you are to a drop. \
                 Enable location access for CampusLens in your settings, then reopen the map."
            }
            Capability::Camera => {
                "The reveal shows the drop through your camera. \
                 Enable camera access for CampusLens in your settings, then reopen the reveal."
            }
        };

        warn!("Permission denied for {}", capability);
        format!("{} ({})", message, self.get_settings_link())
    }

    /// Remediation text for every denied capability, in display order
    pub async fn pending_remediations(&self) -> Vec<String> {
        let mut messages = Vec::new();
        for capability in [Capability::Location, Capability::Camera] {
            if self.check_permission(capability).await == PermissionStatus::Denied {
                messages.push(self.handle_permission_denial(capability));
            }
        }
        messages
    }

    /// Get a link to device settings for permission management
    pub fn get_settings_link(&self) -> String {
        #[cfg(target_os = "ios")]
        {
            "app-settings:".to_string()
        }

        #[cfg(target_os = "android")]
        {
            "android.settings.APPLICATION_DETAILS_SETTINGS".to_string()
        }

        #[cfg(target_arch = "wasm32")]
        {
            "Browser site settings".to_string()
        }

        #[cfg(not(any(target_os = "ios", target_os = "android", target_arch = "wasm32")))]
        {
            "System settings".to_string()
        }
    }
}

impl Default for PermissionManager {
    fn default() -> Self {
        Self::new()
    }
}
