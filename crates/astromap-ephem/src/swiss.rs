//! [`AstronomicalOracle`] backed by the Swiss Ephemeris.
//!
//! Positions come from `swe_calc_ut` in Moshier mode, so no ephemeris data
//! files are needed and Delta T is applied by the library. The ascendant is
//! the first angle of `swe_houses_ex` with the Placidus system.

use std::sync::{Mutex, MutexGuard, PoisonError};

use astromap_core::{normalize_degrees, CelestialBody, UtTimeReference};
use swisseph::swe::{calc_ut, houses_ex};
use swisseph::AscMc;

use crate::error::{EphemerisError, HouseCalculationError};
use crate::oracle::{check_epoch, AstronomicalOracle};

/// Built-in analytical planetary theory; no data files.
const SEFLG_MOSEPH: i32 = 4;

const PLACIDUS: u8 = b'P';

/// The C library keeps its computation caches in process globals.
static SWE_LOCK: Mutex<()> = Mutex::new(());

fn swe_guard() -> MutexGuard<'static, ()> {
    SWE_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

fn swe_body_id(body: CelestialBody) -> u32 {
    match body {
        CelestialBody::Sun => 0,
        CelestialBody::Moon => 1,
        CelestialBody::Mercury => 2,
        CelestialBody::Venus => 3,
        CelestialBody::Mars => 4,
        CelestialBody::Jupiter => 5,
        CelestialBody::Saturn => 6,
        CelestialBody::Uranus => 7,
        CelestialBody::Neptune => 8,
        CelestialBody::Pluto => 9,
    }
}

/// Mean obliquity of the ecliptic in degrees (Meeus, Astronomical Algorithms 22.2).
fn mean_obliquity_deg(jd: f64) -> f64 {
    let t = (jd - 2_451_545.0) / 36_525.0;
    let arcsec = 84_381.448 - 46.815 * t - 0.000_59 * t * t + 0.001_813 * t * t * t;
    arcsec / 3600.0
}

/// Placidus cusps have no solution at or beyond this absolute latitude.
#[must_use]
pub fn polar_latitude_limit(jd: f64) -> f64 {
    90.0 - mean_obliquity_deg(jd)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SwissEphOracle;

impl SwissEphOracle {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl AstronomicalOracle for SwissEphOracle {
    fn body_longitude(
        &self,
        time: UtTimeReference,
        body: CelestialBody,
    ) -> Result<f64, EphemerisError> {
        let jd = check_epoch(time)?;
        let result = {
            let _guard = swe_guard();
            calc_ut(jd, swe_body_id(body), SEFLG_MOSEPH.unsigned_abs())
        };
        let position = result.map_err(|e| EphemerisError::Calculation {
            body,
            message: e.to_string(),
        })?;

        let longitude = position.out[0];
        if !longitude.is_finite() {
            return Err(EphemerisError::Calculation {
                body,
                message: format!("non-finite longitude at JD {jd}"),
            });
        }
        Ok(normalize_degrees(longitude))
    }

    fn ascendant(
        &self,
        time: UtTimeReference,
        latitude: f64,
        longitude: f64,
    ) -> Result<f64, HouseCalculationError> {
        let jd = check_epoch(time)?;
        if !(latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude))
        {
            return Err(HouseCalculationError::InvalidCoordinates { latitude, longitude });
        }

        let limit = polar_latitude_limit(jd);
        if latitude.abs() >= limit {
            return Err(HouseCalculationError::PolarLatitude { latitude, limit });
        }

        let (_cusps, angles) = {
            let _guard = swe_guard();
            houses_ex(jd, SEFLG_MOSEPH, latitude, longitude, i32::from(PLACIDUS))
        };
        let ascendant = AscMc::from_array(angles).ascendant;
        if !ascendant.is_finite() {
            tracing::debug!(latitude, longitude, jd, "swe_houses_ex returned no ascendant");
            return Err(HouseCalculationError::NoAscendant { latitude, longitude });
        }
        Ok(normalize_degrees(ascendant))
    }
}
