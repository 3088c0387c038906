//! Timezone resolution and birth-time normalization.

pub mod client;
pub mod error;
pub mod lookup;
pub mod normalize;

pub use client::HttpTimezoneLookup;
pub use error::{LookupError, TimeError};
pub use lookup::{StaticTimezoneLookup, TimezoneLookup};
pub use normalize::{local_to_utc, parse_timezone, NormalizedTime, TimeNormalizer};
