use astromap_core::{CelestialBody, UtTimeReference};

use crate::error::{EphemerisError, HouseCalculationError};

/// Earliest Julian Day accepted for matching (about 1000 CE).
pub const MIN_JULIAN_DAY: f64 = 2_086_302.5;
/// Latest Julian Day accepted for matching (about 3000 CE), inside the
/// Moshier ephemeris range.
pub const MAX_JULIAN_DAY: f64 = 2_816_787.5;

/// Positions of bodies and horizon angles of places.
///
/// Implementations must be synchronous, deterministic and safe to share
/// across threads; the matcher calls `ascendant` once per city per body.
pub trait AstronomicalOracle: Send + Sync {
    /// Geocentric ecliptic longitude of `body`, degrees in `[0, 360)`.
    ///
    /// # Errors
    ///
    /// Returns [`EphemerisError`] when the time is unusable or the body is
    /// not covered. Callers treat this as fatal.
    fn body_longitude(
        &self,
        time: UtTimeReference,
        body: CelestialBody,
    ) -> Result<f64, EphemerisError>;

    /// Ascendant degree at `latitude`/`longitude` (east positive), `[0, 360)`.
    ///
    /// # Errors
    ///
    /// Returns [`HouseCalculationError`] for degenerate geometries. Callers
    /// exclude the location and carry on.
    fn ascendant(
        &self,
        time: UtTimeReference,
        latitude: f64,
        longitude: f64,
    ) -> Result<f64, HouseCalculationError>;
}

/// Check that `time` is finite and falls in the accepted range.
///
/// # Errors
///
/// Returns [`EphemerisError::InvalidTime`] or
/// [`EphemerisError::EpochOutOfRange`].
pub fn check_epoch(time: UtTimeReference) -> Result<f64, EphemerisError> {
    let jd = time.julian_day();
    if !jd.is_finite() {
        return Err(EphemerisError::InvalidTime(jd));
    }
    if !(MIN_JULIAN_DAY..=MAX_JULIAN_DAY).contains(&jd) {
        return Err(EphemerisError::EpochOutOfRange {
            julian_day: jd,
            min: MIN_JULIAN_DAY,
            max: MAX_JULIAN_DAY,
        });
    }
    Ok(jd)
}
