use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Geo models
/// A point on the WGS84 ellipsoid, in degrees. No datum conversion is performed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180].
    pub fn is_within_bounds(&self) -> bool {
        self.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

// Drop models
/// A dropped note waiting to be found. Owned by the target store; read-only to the hunt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub id: String,
    pub coordinate: Coordinate,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// A drop about to be written to the store; the store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDrop {
    pub coordinate: Coordinate,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_check() {
        assert!(Coordinate::new(28.364, 77.534).is_within_bounds());
        assert!(Coordinate::new(-90.0, 180.0).is_within_bounds());
        assert!(!Coordinate::new(91.0, 0.0).is_within_bounds());
        assert!(!Coordinate::new(0.0, -180.5).is_within_bounds());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_within_bounds());
    }

    #[test]
    fn test_target_serde_shape() {
        let target = Target {
            id: "drop-1".to_string(),
            coordinate: Coordinate::new(28.364, 77.534),
            message: "Look under the bench".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&target).unwrap();
        assert_eq!(json["coordinate"]["latitude"], 28.364);
        assert_eq!(json["message"], "Look under the bench");
    }
}
