pub mod angle;
pub mod app_config;
pub mod body;
pub mod config;
pub mod types;

pub use angle::{angular_distance, normalize_degrees, round_orb};
pub use app_config::{AppConfig, Environment};
pub use body::CelestialBody;
pub use config::{load_app_config, load_app_config_from_env};
pub use types::{
    parse_birth_date, BirthMoment, CityRecord, MatchCandidate, OrbTolerance, ResultSet,
    UtTimeReference,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    #[error("unrecognized celestial body: {0}")]
    UnknownBody(String),

    #[error("orb tolerance must be between 0 and 10 degrees, got {0}")]
    InvalidOrbTolerance(f64),

    #[error("{field} out of range: {value}")]
    InvalidCoordinate { field: &'static str, value: f64 },

    #[error("invalid Julian day: {0}")]
    InvalidJulianDay(f64),

    #[error("invalid date-time '{0}': expected ISO format like 1990-06-01T12:00:00")]
    InvalidDateTime(String),
}
