use thiserror::Error;
use tracing::error;
use uuid::Uuid;

/// Failures reported by the location capability. None of them are fatal.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Position unavailable")]
    Unavailable,

    #[error("Location request timed out")]
    Timeout,
}

impl LocationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => {
                "Location access is off. Allow location for this site in your browser or device settings, then reopen the map."
            }
            LocationError::Unavailable => {
                "Searching for your position. Step outside or away from tall buildings to get a GPS fix."
            }
            LocationError::Timeout => {
                "Still searching for your position. Make sure location services are enabled and try again."
            }
        }
    }
}

/// Failures reported by the camera capability.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraError {
    #[error("Camera permission denied")]
    PermissionDenied,

    #[error("Camera device unavailable")]
    DeviceUnavailable,
}

impl CameraError {
    pub fn user_message(&self) -> &'static str {
        match self {
            CameraError::PermissionDenied => {
                "Camera access was blocked. Tap the camera icon in the address bar (or open Settings > Privacy > Camera), allow access, then reopen the reveal."
            }
            CameraError::DeviceUnavailable => {
                "No usable camera was found. Close other apps that may be using the camera, check that one is connected, then reopen the reveal."
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum ProximityError {
    #[error("Location error: {0}")]
    Location(#[from] LocationError),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("A camera request is already in flight")]
    CameraRequestPending,

    #[error("A camera stream is already active")]
    CameraAlreadyActive,

    #[error("Camera session released before the stream opened")]
    CameraReleased,

    #[error("No position fix yet")]
    NoPositionFix,

    #[error("Target not found: {0}")]
    TargetNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

pub type Result<T> = std::result::Result<T, ProximityError>;

/// Context for error logging
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    pub session_id: Option<Uuid>,
    pub target_id: Option<String>,
    pub additional_info: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session_id(mut self, session_id: Uuid) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn with_target_id(mut self, target_id: impl Into<String>) -> Self {
        self.target_id = Some(target_id.into());
        self
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.additional_info = Some(info.into());
        self
    }
}

impl ProximityError {
    /// Log error with structured context
    pub fn log_with_context(&self, context: &ErrorContext) {
        error!(
            error = %self,
            error_type = ?self,
            category = %self.category(),
            session_id = ?context.session_id,
            target_id = ?context.target_id,
            additional_info = ?context.additional_info,
            timestamp = %chrono::Utc::now(),
            "Hunt error occurred"
        );
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            ProximityError::Location(err) => err.user_message().to_string(),
            ProximityError::Camera(err) => err.user_message().to_string(),
            ProximityError::CameraRequestPending => {
                "The camera is still starting. Give it a moment.".to_string()
            }
            ProximityError::CameraAlreadyActive => {
                "The camera is already running.".to_string()
            }
            ProximityError::CameraReleased => {
                "The camera view was closed before it finished starting.".to_string()
            }
            ProximityError::NoPositionFix => {
                "We don't know where you are yet. Wait for the map to find you and try again.".to_string()
            }
            ProximityError::TargetNotFound(id) => {
                format!("The drop '{}' could not be found. It may have been removed.", id)
            }
            ProximityError::InvalidInput(details) => {
                format!("Invalid input: {}. Please check your entry and try again.", details)
            }
            ProximityError::InternalError(details) => {
                format!("An internal error occurred: {}. Please try again.", details)
            }
        }
    }

    /// Get error category for monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProximityError::Location(LocationError::PermissionDenied) => ErrorCategory::Permission,
            ProximityError::Location(_) => ErrorCategory::Location,
            ProximityError::Camera(CameraError::PermissionDenied) => ErrorCategory::Permission,
            ProximityError::Camera(_) => ErrorCategory::Device,
            ProximityError::CameraRequestPending => ErrorCategory::Device,
            ProximityError::CameraAlreadyActive => ErrorCategory::Device,
            ProximityError::CameraReleased => ErrorCategory::Device,
            ProximityError::NoPositionFix => ErrorCategory::Location,
            ProximityError::TargetNotFound(_) => ErrorCategory::NotFound,
            ProximityError::InvalidInput(_) => ErrorCategory::Validation,
            ProximityError::InternalError(_) => ErrorCategory::Internal,
        }
    }
}

/// Error categories for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Permission,
    Location,
    Device,
    NotFound,
    Validation,
    Internal,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Permission => write!(f, "permission"),
            ErrorCategory::Location => write!(f, "location"),
            ErrorCategory::Device => write!(f, "device"),
            ErrorCategory::NotFound => write!(f, "not_found"),
            ErrorCategory::Validation => write!(f, "validation"),
            ErrorCategory::Internal => write!(f, "internal"),
        }
    }
}
