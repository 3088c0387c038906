use astromap_core::CelestialBody;
use thiserror::Error;

/// Failures computing a body's position. Fatal for that body.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EphemerisError {
    #[error("Julian day {0} is not a finite number")]
    InvalidTime(f64),

    #[error("Julian day {julian_day} is outside the supported range {min}..={max}")]
    EpochOutOfRange { julian_day: f64, min: f64, max: f64 },

    #[error("Swiss Ephemeris failed for {body}: {message}")]
    Calculation { body: CelestialBody, message: String },
}

/// Failures computing house angles for one location. Recoverable per city.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum HouseCalculationError {
    #[error("latitude {latitude} lies within a polar circle (limit {limit:.4}); Placidus houses are undefined")]
    PolarLatitude { latitude: f64, limit: f64 },

    #[error("invalid observer coordinates: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    #[error("house calculation returned no ascendant at {latitude}, {longitude}")]
    NoAscendant { latitude: f64, longitude: f64 },

    #[error(transparent)]
    Time(#[from] EphemerisError),
}
