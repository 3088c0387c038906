//! City catalog and the power-spot matching pass.

pub mod catalog;
pub mod error;
pub mod matcher;

pub use catalog::{CatalogSource, CityCatalog};
pub use error::{CatalogError, MatchError};
pub use matcher::{
    BodyReport, ExcludedCity, MatchReport, PowerSpotMatcher, SkipReason, SkippedBody, TOP_N,
};
