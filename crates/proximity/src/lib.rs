pub mod types;
pub mod error;
pub mod geo;
pub mod evaluator;
pub mod platform;
pub mod tracker;
pub mod camera;
pub mod unlock;
pub mod permissions;
pub mod zones;
pub mod session;

pub use types::*;
pub use error::{CameraError, ErrorCategory, ErrorContext, LocationError, ProximityError, Result};
pub use evaluator::ProximityEvaluator;
pub use platform::{CameraDevice, LocationSink, LocationSource};
pub use tracker::{LocationTracker, WatchHandle};
pub use camera::{CameraSession, CameraStream};
pub use unlock::UnlockSession;
pub use permissions::{Capability, PermissionManager, PermissionStatus};
pub use zones::{CampusZone, CAMPUS_ZONES, DEFAULT_CENTER};
pub use session::{HuntCommand, HuntSession, HuntSettings, HuntSnapshot};
