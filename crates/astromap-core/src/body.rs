use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// The fixed set of bodies a caller may request.
///
/// Variant order is the conventional Sun-outward order and doubles as the
/// key order of a serialized result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CelestialBody {
    Sun,
    Moon,
    Mercury,
    Venus,
    Mars,
    Jupiter,
    Saturn,
    Uranus,
    Neptune,
    Pluto,
}

impl CelestialBody {
    pub const ALL: [CelestialBody; 10] = [
        CelestialBody::Sun,
        CelestialBody::Moon,
        CelestialBody::Mercury,
        CelestialBody::Venus,
        CelestialBody::Mars,
        CelestialBody::Jupiter,
        CelestialBody::Saturn,
        CelestialBody::Uranus,
        CelestialBody::Neptune,
        CelestialBody::Pluto,
    ];

    /// Bodies requested when the caller names none.
    pub const DEFAULT_REQUEST: [CelestialBody; 5] = [
        CelestialBody::Sun,
        CelestialBody::Moon,
        CelestialBody::Mercury,
        CelestialBody::Venus,
        CelestialBody::Mars,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            CelestialBody::Sun => "Sun",
            CelestialBody::Moon => "Moon",
            CelestialBody::Mercury => "Mercury",
            CelestialBody::Venus => "Venus",
            CelestialBody::Mars => "Mars",
            CelestialBody::Jupiter => "Jupiter",
            CelestialBody::Saturn => "Saturn",
            CelestialBody::Uranus => "Uranus",
            CelestialBody::Neptune => "Neptune",
            CelestialBody::Pluto => "Pluto",
        }
    }
}

impl std::fmt::Display for CelestialBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Names match exactly (`"Sun"`, not `"sun"`), as callers have always sent them.
impl FromStr for CelestialBody {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CelestialBody::ALL
            .into_iter()
            .find(|body| body.name() == s)
            .ok_or_else(|| CoreError::UnknownBody(s.to_string()))
    }
}
