use chrono::NaiveDateTime;
use thiserror::Error;

/// Errors returned by timezone lookup backends.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Network or TLS failure, or a non-2xx status other than "no zone".
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid lookup base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors from turning a local birth moment into a UT time reference.
#[derive(Debug, Error)]
pub enum TimeError {
    /// No timezone covers the coordinates.
    #[error("no timezone could be resolved for latitude {latitude}, longitude {longitude}")]
    TimezoneResolution { latitude: f64, longitude: f64 },

    /// The lookup answered with an identifier the tz database does not know.
    #[error("unknown timezone identifier '{0}'")]
    InvalidTimezone(String),

    /// The wall-clock time falls in a DST gap and never happened.
    #[error("local time {local} does not exist in {timezone}")]
    NonexistentLocalTime {
        local: NaiveDateTime,
        timezone: String,
    },

    #[error("timezone lookup failed: {0}")]
    Lookup(#[from] LookupError),
}
