use async_trait::async_trait;

use crate::error::LookupError;

/// Resolves an IANA timezone identifier from geographic coordinates.
#[async_trait]
pub trait TimezoneLookup: Send + Sync {
    /// Returns `Ok(None)` when no zone covers the point.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] when the backend itself fails.
    async fn resolve(&self, latitude: f64, longitude: f64) -> Result<Option<String>, LookupError>;
}

#[derive(Debug, Clone)]
struct ZoneEntry {
    latitude: f64,
    longitude: f64,
    radius_deg: f64,
    timezone: String,
}

/// In-memory lookup: the nearest registered point within its radius wins.
///
/// Handy for tests and for running offline with a known set of places.
#[derive(Debug, Clone, Default)]
pub struct StaticTimezoneLookup {
    entries: Vec<ZoneEntry>,
}

impl StaticTimezoneLookup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `timezone` for every point within `radius_deg` of the given
    /// coordinates (flat-plane distance in degrees).
    #[must_use]
    pub fn with_zone(
        mut self,
        latitude: f64,
        longitude: f64,
        radius_deg: f64,
        timezone: impl Into<String>,
    ) -> Self {
        self.entries.push(ZoneEntry {
            latitude,
            longitude,
            radius_deg,
            timezone: timezone.into(),
        });
        self
    }

    fn nearest(&self, latitude: f64, longitude: f64) -> Option<&ZoneEntry> {
        self.entries
            .iter()
            .map(|e| (e, f64::hypot(e.latitude - latitude, e.longitude - longitude)))
            .filter(|(e, dist)| *dist <= e.radius_deg)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(e, _)| e)
    }
}

#[async_trait]
impl TimezoneLookup for StaticTimezoneLookup {
    async fn resolve(&self, latitude: f64, longitude: f64) -> Result<Option<String>, LookupError> {
        Ok(self
            .nearest(latitude, longitude)
            .map(|e| e.timezone.clone()))
    }
}
