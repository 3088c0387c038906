//! Astronomical oracle for power-spot matching.
//!
//! [`AstronomicalOracle`] is the seam the matcher consumes; [`SwissEphOracle`]
//! implements it on the Swiss Ephemeris.

pub mod error;
pub mod oracle;
pub mod swiss;

pub use error::{EphemerisError, HouseCalculationError};
pub use oracle::{check_epoch, AstronomicalOracle, MAX_JULIAN_DAY, MIN_JULIAN_DAY};
pub use swiss::{polar_latitude_limit, SwissEphOracle};
