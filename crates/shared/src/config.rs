use serde::Deserialize;
use std::env;

use crate::{Coordinate, Error};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub unlock: UnlockConfig,
    pub location: LocationConfig,
    pub map: MapConfig,
    pub camera: CameraConfig,
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Absent means the drops live in memory for this run
    pub url: Option<String>,
    pub max_connections: u32,
}

/// The two places a proximity check gates something.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum UnlockFlow {
    /// Map selection followed by an explicit reveal of the hidden note
    GatedReveal,
    /// Walk-up unlock that drops straight into the AR view
    ArUnlock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnlockConfig {
    /// Strict upper bound, in meters, for the gated reveal flow (default: 20)
    pub reveal_threshold_m: f64,
    /// Strict upper bound, in meters, for the AR unlock flow (default: 30)
    pub ar_threshold_m: f64,
}

impl UnlockConfig {
    pub fn threshold_for(&self, flow: UnlockFlow) -> f64 {
        match flow {
            UnlockFlow::GatedReveal => self.reveal_threshold_m,
            UnlockFlow::ArUnlock => self.ar_threshold_m,
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        for (name, value) in [
            ("reveal_threshold_m", self.reveal_threshold_m),
            ("ar_threshold_m", self.ar_threshold_m),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::Validation(format!(
                    "{} must be a positive number of meters, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

impl Default for UnlockConfig {
    fn default() -> Self {
        Self {
            reveal_threshold_m: 20.0,
            ar_threshold_m: 30.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationConfig {
    pub high_accuracy: bool,
    /// Oldest cached fix the platform may hand back, in milliseconds (default: 0)
    pub maximum_age_ms: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            maximum_age_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    /// Where the map opens before the first fix arrives
    pub default_center: Coordinate,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            default_center: Coordinate::new(28.364, 77.534),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CameraConfig {
    /// "environment" or "user"
    pub facing: String,
    pub allow_fallback: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            facing: "environment".to_string(),
            allow_fallback: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup, falling back to defaults for unset keys.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Config {
            database: DatabaseConfig {
                url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
                max_connections: var("DATABASE_MAX_CONNECTIONS", "10").parse()?,
            },
            unlock: UnlockConfig {
                reveal_threshold_m: var("UNLOCK_REVEAL_THRESHOLD_METERS", "20").parse()?,
                ar_threshold_m: var("UNLOCK_AR_THRESHOLD_METERS", "30").parse()?,
            },
            location: LocationConfig {
                high_accuracy: var("LOCATION_HIGH_ACCURACY", "true").parse()?,
                maximum_age_ms: var("LOCATION_MAXIMUM_AGE_MS", "0").parse()?,
            },
            map: MapConfig {
                default_center: Coordinate::new(
                    var("MAP_DEFAULT_LAT", "28.364").parse()?,
                    var("MAP_DEFAULT_LNG", "77.534").parse()?,
                ),
            },
            camera: CameraConfig {
                facing: var("CAMERA_FACING", "environment"),
                allow_fallback: var("CAMERA_ALLOW_FALLBACK", "true").parse()?,
            },
            gemini: GeminiConfig {
                api_key: lookup("GEMINI_API_KEY").filter(|key| !key.is_empty()),
                model: var("GEMINI_MODEL", "gemini-1.5-flash"),
            },
        };

        config.unlock.validate()?;
        if !config.map.default_center.is_within_bounds() {
            return Err(Error::Config(format!(
                "map default center {} is not a valid coordinate",
                config.map.default_center
            ))
            .into());
        }

        Ok(config)
    }
}
