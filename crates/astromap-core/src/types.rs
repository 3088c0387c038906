use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::{CelestialBody, CoreError};

/// A birth reading on a local wall clock, plus where that clock hung.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BirthMoment {
    pub local: NaiveDateTime,
    pub latitude: f64,
    pub longitude: f64,
}

impl BirthMoment {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinate`] when latitude is outside
    /// `[-90, 90]` or longitude outside `[-180, 180]`.
    pub fn new(local: NaiveDateTime, latitude: f64, longitude: f64) -> Result<Self, CoreError> {
        validate_coordinates(latitude, longitude)?;
        Ok(Self {
            local,
            latitude,
            longitude,
        })
    }
}

/// A fractional Julian Day on the UT scale.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UtTimeReference(f64);

impl UtTimeReference {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidJulianDay`] for NaN or infinite input.
    pub fn from_julian_day(jd: f64) -> Result<Self, CoreError> {
        if jd.is_finite() {
            Ok(Self(jd))
        } else {
            Err(CoreError::InvalidJulianDay(jd))
        }
    }

    /// Julian Day for a Gregorian calendar reading already expressed in UTC.
    ///
    /// Meeus, "Astronomical Algorithms" ch. 7, with the time of day folded in
    /// as a day fraction (sub-second precision retained).
    #[must_use]
    pub fn from_utc(utc: NaiveDateTime) -> Self {
        let date = utc.date();
        let time = utc.time();

        let (mut year, mut month) = (f64::from(date.year()), f64::from(date.month()));
        if month <= 2.0 {
            year -= 1.0;
            month += 12.0;
        }
        let a = (year / 100.0).floor();
        let b = 2.0 - a + (a / 4.0).floor();

        let seconds = f64::from(time.num_seconds_from_midnight())
            + f64::from(time.nanosecond().min(999_999_999)) / 1e9;
        let day = f64::from(date.day()) + seconds / 86_400.0;

        let jd = (365.25 * (year + 4716.0)).floor() + (30.6001 * (month + 1.0)).floor() + day + b
            - 1524.5;
        Self(jd)
    }

    #[must_use]
    pub fn julian_day(self) -> f64 {
        self.0
    }
}

/// One candidate location; immutable once the catalog is loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRecord {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl CityRecord {
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidCoordinate`] for out-of-range coordinates.
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Result<Self, CoreError> {
        validate_coordinates(latitude, longitude)?;
        Ok(Self {
            name: name.into(),
            latitude,
            longitude,
        })
    }
}

/// A city whose ascendant fell within tolerance of a body's longitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub city: String,
    /// Angular distance in degrees, rounded to 4 decimal places.
    pub orb: f64,
    pub lat: f64,
    pub lon: f64,
}

/// Acceptance bound for an orb, in `[0, 10]` degrees.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct OrbTolerance(f64);

impl OrbTolerance {
    pub const MAX_DEGREES: f64 = 10.0;
    pub const DEFAULT_DEGREES: f64 = 3.0;

    /// # Errors
    ///
    /// Returns [`CoreError::InvalidOrbTolerance`] when `degrees` is not a
    /// finite value in `[0, 10]`.
    pub fn new(degrees: f64) -> Result<Self, CoreError> {
        if degrees.is_finite() && (0.0..=Self::MAX_DEGREES).contains(&degrees) {
            Ok(Self(degrees))
        } else {
            Err(CoreError::InvalidOrbTolerance(degrees))
        }
    }

    #[must_use]
    pub fn degrees(self) -> f64 {
        self.0
    }
}

impl Default for OrbTolerance {
    fn default() -> Self {
        Self(Self::DEFAULT_DEGREES)
    }
}

impl TryFrom<f64> for OrbTolerance {
    type Error = CoreError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<OrbTolerance> for f64 {
    fn from(value: OrbTolerance) -> Self {
        value.0
    }
}

/// Per-body ranked matches. Bodies with no match are absent, never empty.
pub type ResultSet = BTreeMap<CelestialBody, Vec<MatchCandidate>>;

fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), CoreError> {
    if !(latitude.is_finite() && (-90.0..=90.0).contains(&latitude)) {
        return Err(CoreError::InvalidCoordinate {
            field: "latitude",
            value: latitude,
        });
    }
    if !(longitude.is_finite() && (-180.0..=180.0).contains(&longitude)) {
        return Err(CoreError::InvalidCoordinate {
            field: "longitude",
            value: longitude,
        });
    }
    Ok(())
}

const BIRTH_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 date-time without offset. A bare date means midnight.
///
/// # Errors
///
/// Returns [`CoreError::InvalidDateTime`] for anything else, including
/// strings carrying a UTC offset.
pub fn parse_birth_date(input: &str) -> Result<NaiveDateTime, CoreError> {
    let input = input.trim();
    BIRTH_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| CoreError::InvalidDateTime(input.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, s))
            .expect("valid date")
    }

    #[test]
    fn julian_day_of_j2000_epoch() {
        let jd = UtTimeReference::from_utc(dt(2000, 1, 1, 12, 0, 0)).julian_day();
        assert!((jd - 2_451_545.0).abs() < 1e-9, "got {jd}");
    }

    #[test]
    fn julian_day_of_meeus_example() {
        // Meeus example 7.a: 1957 October 4.81 = JD 2436116.31
        let jd = UtTimeReference::from_utc(dt(1957, 10, 4, 19, 26, 24)).julian_day();
        assert!((jd - 2_436_116.31).abs() < 1e-6, "got {jd}");
    }

    #[test]
    fn julian_day_for_january_uses_previous_year_branch() {
        let jd = UtTimeReference::from_utc(dt(1990, 1, 1, 0, 0, 0)).julian_day();
        assert!((jd - 2_447_892.5).abs() < 1e-9, "got {jd}");
    }

    #[test]
    fn julian_day_matches_unix_timestamp_arithmetic() {
        let utc = dt(1990, 5, 15, 10, 30, 0);
        let reference = UtTimeReference::from_utc(utc);
        #[allow(clippy::cast_precision_loss)]
        let from_timestamp = utc.and_utc().timestamp() as f64 / 86_400.0;
        let days_since_unix_epoch = reference.julian_day() - 2_440_587.5;
        assert!((days_since_unix_epoch - from_timestamp).abs() < 1e-9);
        assert!((reference.julian_day() - 2_448_026.937_5).abs() < 1e-9);
    }

    #[test]
    fn julian_day_is_monotonic_across_midnight() {
        let before = UtTimeReference::from_utc(dt(1999, 12, 31, 23, 59, 59));
        let after = UtTimeReference::from_utc(dt(2000, 1, 1, 0, 0, 0));
        assert!(after > before);
    }

    #[test]
    fn from_julian_day_rejects_non_finite() {
        assert!(UtTimeReference::from_julian_day(f64::NAN).is_err());
        assert!(UtTimeReference::from_julian_day(f64::INFINITY).is_err());
        assert!(UtTimeReference::from_julian_day(2_451_545.0).is_ok());
    }

    #[test]
    fn orb_tolerance_bounds() {
        assert!(OrbTolerance::new(0.0).is_ok());
        assert!(OrbTolerance::new(10.0).is_ok());
        assert_eq!(
            OrbTolerance::new(10.5),
            Err(CoreError::InvalidOrbTolerance(10.5))
        );
        assert!(OrbTolerance::new(-0.1).is_err());
        assert!(OrbTolerance::new(f64::NAN).is_err());
        assert!((OrbTolerance::default().degrees() - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn orb_tolerance_deserialization_validates() {
        let ok: OrbTolerance = serde_json::from_str("2.5").expect("valid tolerance");
        assert!((ok.degrees() - 2.5).abs() < f64::EPSILON);
        assert!(serde_json::from_str::<OrbTolerance>("42").is_err());
    }

    #[test]
    fn city_record_rejects_out_of_range_coordinates() {
        assert!(CityRecord::new("Nowhere", 91.0, 0.0).is_err());
        assert!(CityRecord::new("Nowhere", 0.0, -180.5).is_err());
        assert!(CityRecord::new("Quito", -0.1807, -78.4678).is_ok());
    }

    #[test]
    fn birth_moment_validates_coordinates() {
        let local = dt(1992, 11, 3, 14, 45, 0);
        assert!(BirthMoment::new(local, 41.8781, -87.6298).is_ok());
        assert!(matches!(
            BirthMoment::new(local, f64::NAN, 0.0),
            Err(CoreError::InvalidCoordinate {
                field: "latitude",
                ..
            })
        ));
    }

    #[test]
    fn result_set_serializes_bodies_as_keys() {
        let mut results = ResultSet::new();
        results.insert(
            CelestialBody::Mars,
            vec![MatchCandidate {
                city: "London".to_string(),
                orb: 0.5,
                lat: 51.5074,
                lon: -0.1278,
            }],
        );
        let json = serde_json::to_value(&results).expect("serialize");
        assert_eq!(json["Mars"][0]["city"], "London");
        assert_eq!(json["Mars"][0]["orb"], 0.5);
    }

    #[test]
    fn parses_iso_birth_dates() {
        assert_eq!(parse_birth_date("1990-06-01T12:00:00"), Ok(dt(1990, 6, 1, 12, 0, 0)));
        assert_eq!(parse_birth_date("1990-06-01T12:00"), Ok(dt(1990, 6, 1, 12, 0, 0)));
        assert_eq!(parse_birth_date("1990-06-01 08:15:30"), Ok(dt(1990, 6, 1, 8, 15, 30)));
        assert_eq!(parse_birth_date(" 1990-06-01 "), Ok(dt(1990, 6, 1, 0, 0, 0)));
        let frac = parse_birth_date("1990-06-01T12:00:00.250").expect("fractional seconds");
        assert_eq!(frac.and_utc().timestamp_subsec_millis(), 250);
    }

    #[test]
    fn rejects_malformed_birth_dates() {
        for bad in [
            "",
            "yesterday",
            "1990-13-01T00:00:00",
            "1990-06-01T12:00:00Z",
            "1990-06-01T12:00:00+02:00",
            "06/01/1990",
        ] {
            assert!(
                matches!(parse_birth_date(bad), Err(CoreError::InvalidDateTime(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
