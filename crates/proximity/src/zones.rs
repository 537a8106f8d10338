// Campus zones - fixed hotspots the home screen can warp to

use serde::Serialize;
use shared::Coordinate;

/// Map center before the first fix: the main campus quad
pub const DEFAULT_CENTER: Coordinate = Coordinate::new(28.364, 77.534);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CampusZone {
    pub id: u32,
    pub name: &'static str,
    pub description: &'static str,
    pub coordinate: Coordinate,
}

pub const CAMPUS_ZONES: [CampusZone; 3] = [
    CampusZone {
        id: 1,
        name: "The Innovation Core",
        description: "The heart of technology. Rumor has it a Golden Glitch floats near the server room.",
        coordinate: Coordinate::new(28.364, 77.534),
    },
    CampusZone {
        id: 2,
        name: "Library of Whispers",
        description: "Silence is required, but magic is loud here. Find the floating book.",
        coordinate: Coordinate::new(28.363, 77.533),
    },
    CampusZone {
        id: 3,
        name: "Victory Arena",
        description: "Where champions are made. Look for the hidden trophy AR marker.",
        coordinate: Coordinate::new(28.365, 77.535),
    },
];

pub fn find_zone(id: u32) -> Option<&'static CampusZone> {
    CAMPUS_ZONES.iter().find(|zone| zone.id == id)
}

pub fn find_zone_by_name(name: &str) -> Option<&'static CampusZone> {
    CAMPUS_ZONES
        .iter()
        .find(|zone| zone.name.eq_ignore_ascii_case(name.trim()))
}
