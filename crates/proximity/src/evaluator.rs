// Proximity Evaluator - classifies the live distance to a target against a threshold

use shared::config::{UnlockConfig, UnlockFlow};
use shared::Target;

use crate::geo;
use crate::{Position, ProximityError, ProximityLevel, ProximityState, Result};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityEvaluator {
    threshold_m: f64,
}

impl ProximityEvaluator {
    pub fn new(threshold_m: f64) -> Result<Self> {
        if !threshold_m.is_finite() || threshold_m <= 0.0 {
            return Err(ProximityError::InvalidInput(format!(
                "unlock threshold must be a positive number of meters, got {}",
                threshold_m
            )));
        }
        Ok(Self { threshold_m })
    }

    /// Evaluator for one of the configured unlock flows
    pub fn for_flow(config: &UnlockConfig, flow: UnlockFlow) -> Result<Self> {
        Self::new(config.threshold_for(flow))
    }

    pub fn threshold_m(&self) -> f64 {
        self.threshold_m
    }

    /// Distance and level for the given inputs. Unknown when either is missing.
    pub fn evaluate(&self, position: Option<&Position>, target: Option<&Target>) -> ProximityState {
        let (Some(position), Some(target)) = (position, target) else {
            return ProximityState::UNKNOWN;
        };

        let distance_m = geo::distance(position.coordinate, target.coordinate);
        ProximityState {
            distance_m: Some(distance_m),
            level: self.classify(distance_m),
        }
    }

    /// High strictly inside the threshold, Weak at or beyond it
    pub fn classify(&self, distance_m: f64) -> ProximityLevel {
        if distance_m < self.threshold_m {
            ProximityLevel::High
        } else {
            ProximityLevel::Weak
        }
    }
}
