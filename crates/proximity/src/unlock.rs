// Unlock state machine - selected target, live proximity and the reveal flag

use crate::evaluator::ProximityEvaluator;
use crate::{Position, ProximityLevel, ProximityState, SessionPhase};
use shared::Target;
use tracing::{debug, info};

/// The mutable core of a hunt view.
///
/// `revealed` is only ever set while proximity is `High`. Once set it stays set
/// if the user walks away again: a found drop stays found until the reveal is
/// closed or another target is selected.
#[derive(Debug, Clone)]
pub struct UnlockSession {
    evaluator: ProximityEvaluator,
    selected_target: Option<Target>,
    proximity: ProximityState,
    revealed: bool,
    latest_position: Option<Position>,
}

impl UnlockSession {
    pub fn new(evaluator: ProximityEvaluator) -> Self {
        Self {
            evaluator,
            selected_target: None,
            proximity: ProximityState::UNKNOWN,
            revealed: false,
            latest_position: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match (&self.selected_target, self.revealed) {
            (None, _) => SessionPhase::Selecting,
            (Some(_), false) => SessionPhase::Tracking,
            (Some(_), true) => SessionPhase::Revealed,
        }
    }

    pub fn selected_target(&self) -> Option<&Target> {
        self.selected_target.as_ref()
    }

    pub fn proximity(&self) -> ProximityState {
        self.proximity
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn latest_position(&self) -> Option<Position> {
        self.latest_position
    }

    pub fn threshold_m(&self) -> f64 {
        self.evaluator.threshold_m()
    }

    /// Whether the reveal control should be enabled
    pub fn can_reveal(&self) -> bool {
        self.phase() == SessionPhase::Tracking && self.proximity.level == ProximityLevel::High
    }

    /// Pick a target. Always lands in Tracking with the reveal cleared.
    pub fn select_target(&mut self, target: Target) {
        info!("Selected target {}", target.id);
        self.selected_target = Some(target);
        self.revealed = false;
        self.recompute();
    }

    /// Record a fix and refresh proximity. The phase never changes here.
    pub fn on_position_update(&mut self, position: Position) {
        self.latest_position = Some(position);
        if self.selected_target.is_some() {
            self.recompute();
        }
    }

    /// Surface the hidden content. Returns false and changes nothing unless proximity is High.
    pub fn reveal(&mut self) -> bool {
        if !self.can_reveal() {
            debug!(
                "Reveal ignored in {} with proximity {}",
                self.phase(),
                self.proximity.level
            );
            return false;
        }
        self.revealed = true;
        if let Some(target) = &self.selected_target {
            info!(
                "Revealed target {} at {:.1} m",
                target.id,
                self.proximity.distance_m.unwrap_or_default()
            );
        }
        true
    }

    /// Dismiss the reveal; the target stays selected and tracking continues.
    pub fn close(&mut self) -> bool {
        if !self.revealed {
            return false;
        }
        self.revealed = false;
        debug!("Reveal closed");
        true
    }

    /// Back to target selection
    pub fn deselect(&mut self) {
        if let Some(target) = self.selected_target.take() {
            info!("Deselected target {}", target.id);
        }
        self.revealed = false;
        self.proximity = ProximityState::UNKNOWN;
    }

    fn recompute(&mut self) {
        self.proximity = self
            .evaluator
            .evaluate(self.latest_position.as_ref(), self.selected_target.as_ref());
        debug!(
            distance_m = ?self.proximity.distance_m,
            level = %self.proximity.level,
            "Proximity recomputed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use shared::Coordinate;

    const ORIGIN: Coordinate = Coordinate::new(28.364, 77.534);

    fn target(id: &str, coordinate: Coordinate) -> Target {
        Target {
            id: id.to_string(),
            coordinate,
            message: format!("message for {}", id),
            created_at: Utc::now(),
        }
    }

    /// A point roughly `meters` north of `from`
    fn north_of(from: Coordinate, meters: f64) -> Coordinate {
        let dlat = (meters / crate::geo::EARTH_RADIUS_M).to_degrees();
        Coordinate::new(from.latitude + dlat, from.longitude)
    }

    fn session() -> UnlockSession {
        UnlockSession::new(ProximityEvaluator::new(20.0).unwrap())
    }

    #[test]
    fn test_starts_selecting() {
        let session = session();
        assert_eq!(session.phase(), SessionPhase::Selecting);
        assert_eq!(session.proximity(), ProximityState::UNKNOWN);
        assert!(!session.can_reveal());
    }

    #[test]
    fn test_select_without_fix_is_unknown() {
        let mut session = session();
        session.select_target(target("a", ORIGIN));

        assert_eq!(session.phase(), SessionPhase::Tracking);
        assert_eq!(session.proximity().level, ProximityLevel::Unknown);
    }

    #[test]
    fn test_select_uses_latest_fix() {
        let mut session = session();
        session.on_position_update(Position::now(ORIGIN));
        assert_eq!(session.proximity(), ProximityState::UNKNOWN);

        session.select_target(target("a", north_of(ORIGIN, 5.0)));
        assert_eq!(session.proximity().level, ProximityLevel::High);
    }

    #[test]
    fn test_reveal_is_gated_on_high() {
        let mut session = session();
        session.select_target(target("a", ORIGIN));
        session.on_position_update(Position::now(north_of(ORIGIN, 50.0)));
        assert_eq!(session.proximity().level, ProximityLevel::Weak);

        assert!(!session.reveal());
        assert_eq!(session.phase(), SessionPhase::Tracking);
        assert!(!session.is_revealed());

        session.on_position_update(Position::now(north_of(ORIGIN, 10.0)));
        assert!(session.can_reveal());
        assert!(session.reveal());
        assert_eq!(session.phase(), SessionPhase::Revealed);
    }

    #[test]
    fn test_reveal_from_unknown_is_noop() {
        let mut session = session();
        session.select_target(target("a", ORIGIN));
        assert!(!session.reveal());
        assert_eq!(session.phase(), SessionPhase::Tracking);
    }

    #[test]
    fn test_no_relock_after_reveal() {
        let mut session = session();
        session.select_target(target("a", ORIGIN));
        session.on_position_update(Position::now(ORIGIN));
        assert!(session.reveal());

        session.on_position_update(Position::now(north_of(ORIGIN, 500.0)));
        assert_eq!(session.proximity().level, ProximityLevel::Weak);
        assert_eq!(session.phase(), SessionPhase::Revealed);
        assert!(session.is_revealed());
    }

    #[test]
    fn test_close_keeps_target_and_tracking() {
        let mut session = session();
        session.select_target(target("a", ORIGIN));
        session.on_position_update(Position::now(ORIGIN));
        session.reveal();

        assert!(session.close());
        assert_eq!(session.phase(), SessionPhase::Tracking);
        assert_eq!(session.selected_target().unwrap().id, "a");

        session.on_position_update(Position::now(north_of(ORIGIN, 100.0)));
        assert_eq!(session.proximity().level, ProximityLevel::Weak);
        assert!(!session.close());
    }

    #[test]
    fn test_selection_reset() {
        let mut session = session();
        session.on_position_update(Position::now(ORIGIN));
        session.select_target(target("t1", ORIGIN));
        assert!(session.reveal());
        let t1_distance = session.proximity().distance_m.unwrap();

        let t2_coord = north_of(ORIGIN, 300.0);
        session.select_target(target("t2", t2_coord));

        assert!(!session.is_revealed());
        assert_eq!(session.phase(), SessionPhase::Tracking);
        let d = session.proximity().distance_m.unwrap();
        assert_ne!(d, t1_distance);
        assert!((d - crate::geo::distance(ORIGIN, t2_coord)).abs() < 1e-9);
        assert_eq!(session.proximity().level, ProximityLevel::Weak);
    }

    #[test]
    fn test_deselect_clears_everything_but_position() {
        let mut session = session();
        session.on_position_update(Position::now(ORIGIN));
        session.select_target(target("a", ORIGIN));
        session.reveal();

        session.deselect();
        assert_eq!(session.phase(), SessionPhase::Selecting);
        assert!(session.selected_target().is_none());
        assert_eq!(session.proximity(), ProximityState::UNKNOWN);
        assert!(session.latest_position().is_some());

        // Updates while selecting don't invent proximity
        session.on_position_update(Position::now(ORIGIN));
        assert_eq!(session.proximity(), ProximityState::UNKNOWN);
    }
}
