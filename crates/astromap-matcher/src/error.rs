use std::path::PathBuf;

use astromap_core::CelestialBody;
use astromap_ephem::EphemerisError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot open city table {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("city table has no '{0}' column")]
    MissingColumn(&'static str),

    #[error("city table contains no valid rows")]
    Empty,
}

/// Fatal failures of a matching pass.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("ephemeris failed for {body}: {source}")]
    Ephemeris {
        body: CelestialBody,
        #[source]
        source: EphemerisError,
    },

    #[error("matching pass cancelled")]
    Cancelled,
}
