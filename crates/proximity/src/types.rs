use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::Coordinate;

use crate::{CameraError, LocationError};

/// A normalized location fix. Only the latest one matters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub coordinate: Coordinate,
    pub captured_at: DateTime<Utc>,
    /// Horizontal accuracy in meters, when the platform reports one
    pub accuracy_m: Option<f64>,
}

impl Position {
    pub fn new(coordinate: Coordinate, captured_at: DateTime<Utc>) -> Self {
        Self {
            coordinate,
            captured_at,
            accuracy_m: None,
        }
    }

    pub fn now(coordinate: Coordinate) -> Self {
        Self::new(coordinate, Utc::now())
    }
}

/// A fix exactly as the platform delivered it, before normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawFix {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: Option<f64>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl RawFix {
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy_m: None,
            timestamp: None,
        }
    }
}

/// What a platform location watch pushes into its sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawLocationEvent {
    Fix(RawFix),
    Error(LocationError),
}

/// What the tracker hands to its consumer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LocationEvent {
    Position(Position),
    Error(LocationError),
}

/// Identifier of a platform location watch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    pub high_accuracy: bool,
    pub maximum_age_ms: u64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            maximum_age_ms: 0,
        }
    }
}

impl From<&shared::config::LocationConfig> for WatchOptions {
    fn from(config: &shared::config::LocationConfig) -> Self {
        Self {
            high_accuracy: config.high_accuracy,
            maximum_age_ms: config.maximum_age_ms,
        }
    }
}

/// Coarse classification of the distance to the selected target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProximityLevel {
    Unknown,
    Weak,
    High,
}

impl std::fmt::Display for ProximityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProximityLevel::Unknown => write!(f, "Unknown"),
            ProximityLevel::Weak => write!(f, "Weak"),
            ProximityLevel::High => write!(f, "High"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProximityState {
    pub distance_m: Option<f64>,
    pub level: ProximityLevel,
}

impl ProximityState {
    pub const UNKNOWN: ProximityState = ProximityState {
        distance_m: None,
        level: ProximityLevel::Unknown,
    };
}

impl Default for ProximityState {
    fn default() -> Self {
        Self::UNKNOWN
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No target selected
    Selecting,
    /// Target selected, distance live-updating
    Tracking,
    /// Hidden content surfaced
    Revealed,
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPhase::Selecting => write!(f, "Selecting"),
            SessionPhase::Tracking => write!(f, "Tracking"),
            SessionPhase::Revealed => write!(f, "Revealed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FacingMode {
    Environment,
    User,
}

impl FacingMode {
    pub fn opposite(self) -> Self {
        match self {
            FacingMode::Environment => FacingMode::User,
            FacingMode::User => FacingMode::Environment,
        }
    }
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacingMode::Environment => write!(f, "environment"),
            FacingMode::User => write!(f, "user"),
        }
    }
}

impl std::str::FromStr for FacingMode {
    type Err = crate::ProximityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "environment" | "rear" | "back" => Ok(FacingMode::Environment),
            "user" | "front" => Ok(FacingMode::User),
            other => Err(crate::ProximityError::InvalidInput(format!(
                "unknown camera facing '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraConstraints {
    pub facing: FacingMode,
    /// Try the opposite facing once if the preferred one has no device
    pub allow_fallback: bool,
}

impl Default for CameraConstraints {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
            allow_fallback: true,
        }
    }
}

impl TryFrom<&shared::config::CameraConfig> for CameraConstraints {
    type Error = crate::ProximityError;

    fn try_from(config: &shared::config::CameraConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            facing: config.facing.parse()?,
            allow_fallback: config.allow_fallback,
        })
    }
}

/// Identifier of a live platform video stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraState {
    Idle,
    Requesting,
    Streaming { facing: FacingMode },
    Failed(CameraError),
    Released,
}

impl CameraState {
    pub fn is_streaming(&self) -> bool {
        matches!(self, CameraState::Streaming { .. })
    }
}

/// What the UI shows for the location subsystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationStatus {
    Inactive,
    Searching,
    Tracking,
    Unavailable(LocationError),
}
