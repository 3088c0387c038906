//! Power-spot matching: which cities had a body on the ascendant.
//!
//! For every requested body the matcher takes its ecliptic longitude, walks
//! the catalog computing each city's ascendant, and keeps the cities whose
//! orb is within tolerance. Each requested name and each city produces an
//! explicit outcome so callers can see exactly what was skipped and why.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use astromap_core::{
    angular_distance, round_orb, CelestialBody, CityRecord, MatchCandidate, OrbTolerance,
    ResultSet, UtTimeReference,
};
use astromap_ephem::{AstronomicalOracle, HouseCalculationError};
use rayon::prelude::*;
use serde::Serialize;

use crate::catalog::CityCatalog;
use crate::error::MatchError;

/// Maximum candidates kept per body.
pub const TOP_N: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    UnknownBody,
    Duplicate,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UnknownBody => "unknown_body",
            Self::Duplicate => "duplicate",
        })
    }
}

/// A requested name that was not matched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedBody {
    pub name: String,
    pub reason: SkipReason,
}

/// A city left out of one body's scan.
#[derive(Debug, Clone, PartialEq)]
pub struct ExcludedCity {
    pub city: String,
    pub reason: HouseCalculationError,
}

/// What happened for one recognised body.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyReport {
    pub body: CelestialBody,
    pub longitude: f64,
    /// Cities within tolerance before truncation to [`TOP_N`].
    pub within_tolerance: usize,
    pub excluded: Vec<ExcludedCity>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MatchReport {
    pub results: ResultSet,
    pub bodies: Vec<BodyReport>,
    pub skipped: Vec<SkippedBody>,
}

enum CityOutcome {
    Within(MatchCandidate),
    Outside,
    Excluded(HouseCalculationError),
}

#[derive(Clone)]
pub struct PowerSpotMatcher {
    oracle: Arc<dyn AstronomicalOracle>,
    catalog: Arc<CityCatalog>,
    parallel: bool,
}

impl PowerSpotMatcher {
    #[must_use]
    pub fn new(oracle: Arc<dyn AstronomicalOracle>, catalog: Arc<CityCatalog>) -> Self {
        Self {
            oracle,
            catalog,
            parallel: true,
        }
    }

    /// Scan cities on the rayon pool (`true`, the default) or sequentially.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    #[must_use]
    pub fn catalog(&self) -> &CityCatalog {
        &self.catalog
    }

    /// Run a matching pass and return only the result mapping.
    ///
    /// # Errors
    ///
    /// See [`PowerSpotMatcher::run`].
    pub fn find_power_spots<S: AsRef<str>>(
        &self,
        time: UtTimeReference,
        bodies: &[S],
        tolerance: OrbTolerance,
    ) -> Result<ResultSet, MatchError> {
        self.run(time, bodies, tolerance).map(|report| report.results)
    }

    /// Run a matching pass with full per-item outcomes.
    ///
    /// Names are processed in input order. Unknown names and repeats are
    /// recorded in `skipped`. Bodies with no city within tolerance get a
    /// [`BodyReport`] but no key in `results`.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Ephemeris`] if the oracle cannot place a body.
    pub fn run<S: AsRef<str>>(
        &self,
        time: UtTimeReference,
        bodies: &[S],
        tolerance: OrbTolerance,
    ) -> Result<MatchReport, MatchError> {
        self.run_cancellable(time, bodies, tolerance, &AtomicBool::new(false))
    }

    /// Like [`PowerSpotMatcher::run`], but stops once `cancel` is set.
    ///
    /// The flag is checked before each body and before each city, so a
    /// caller that gives up (for example on a request timeout) frees the
    /// worker threads within one oracle call.
    ///
    /// # Errors
    ///
    /// Returns [`MatchError::Cancelled`] when the flag was observed, or
    /// [`MatchError::Ephemeris`] as for `run`.
    pub fn run_cancellable<S: AsRef<str>>(
        &self,
        time: UtTimeReference,
        bodies: &[S],
        tolerance: OrbTolerance,
        cancel: &AtomicBool,
    ) -> Result<MatchReport, MatchError> {
        let mut report = MatchReport::default();
        let mut seen = BTreeSet::new();

        for name in bodies {
            let name = name.as_ref();
            let Ok(body) = name.parse::<CelestialBody>() else {
                tracing::warn!(planet = name, "invalid planet name skipped");
                report.skipped.push(SkippedBody {
                    name: name.to_owned(),
                    reason: SkipReason::UnknownBody,
                });
                continue;
            };
            if !seen.insert(body) {
                tracing::debug!(planet = name, "duplicate planet name skipped");
                report.skipped.push(SkippedBody {
                    name: name.to_owned(),
                    reason: SkipReason::Duplicate,
                });
                continue;
            }

            if cancel.load(Ordering::Relaxed) {
                return Err(MatchError::Cancelled);
            }
            let (body_report, candidates) = self.scan_body(time, body, tolerance, cancel)?;
            if !candidates.is_empty() {
                report.results.insert(body, candidates);
            }
            report.bodies.push(body_report);
        }

        Ok(report)
    }

    fn scan_body(
        &self,
        time: UtTimeReference,
        body: CelestialBody,
        tolerance: OrbTolerance,
        cancel: &AtomicBool,
    ) -> Result<(BodyReport, Vec<MatchCandidate>), MatchError> {
        let longitude = self
            .oracle
            .body_longitude(time, body)
            .map_err(|source| MatchError::Ephemeris { body, source })?;

        let cities = self.catalog.all();
        let scan = |city: &CityRecord| {
            if cancel.load(Ordering::Relaxed) {
                CityOutcome::Outside
            } else {
                self.scan_city(time, longitude, city, tolerance)
            }
        };
        // Indexed collect keeps catalog order on both paths.
        let outcomes: Vec<CityOutcome> = if self.parallel {
            cities.par_iter().map(scan).collect()
        } else {
            cities.iter().map(scan).collect()
        };
        if cancel.load(Ordering::Relaxed) {
            tracing::debug!(%body, "matching pass cancelled");
            return Err(MatchError::Cancelled);
        }

        let mut candidates = Vec::new();
        let mut excluded = Vec::new();
        for (city, outcome) in cities.iter().zip(outcomes) {
            match outcome {
                CityOutcome::Within(candidate) => candidates.push(candidate),
                CityOutcome::Outside => {}
                CityOutcome::Excluded(reason) => {
                    tracing::debug!(%body, city = %city.name, error = %reason, "city excluded");
                    excluded.push(ExcludedCity {
                        city: city.name.clone(),
                        reason,
                    });
                }
            }
        }

        let within_tolerance = candidates.len();
        // Stable: equal orbs keep catalog order.
        candidates.sort_by(|a, b| a.orb.total_cmp(&b.orb));
        candidates.truncate(TOP_N);

        tracing::debug!(
            %body,
            longitude,
            within_tolerance,
            excluded = excluded.len(),
            "body scanned"
        );

        Ok((
            BodyReport {
                body,
                longitude,
                within_tolerance,
                excluded,
            },
            candidates,
        ))
    }

    fn scan_city(
        &self,
        time: UtTimeReference,
        longitude: f64,
        city: &CityRecord,
        tolerance: OrbTolerance,
    ) -> CityOutcome {
        let ascendant = match self.oracle.ascendant(time, city.latitude, city.longitude) {
            Ok(asc) => asc,
            Err(e) => return CityOutcome::Excluded(e),
        };
        let orb = angular_distance(longitude, ascendant);
        let rounded = round_orb(orb);
        if orb <= tolerance.degrees() && rounded <= tolerance.degrees() {
            CityOutcome::Within(MatchCandidate {
                city: city.name.clone(),
                orb: rounded,
                lat: city.latitude,
                lon: city.longitude,
            })
        } else {
            CityOutcome::Outside
        }
    }
}

impl fmt::Debug for PowerSpotMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PowerSpotMatcher")
            .field("cities", &self.catalog.len())
            .field("source", self.catalog.source())
            .field("parallel", &self.parallel)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "matcher_test.rs"]
mod tests;
