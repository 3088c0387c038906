//! Birth moment → UT time reference.
//!
//! Two entry points: [`TimeNormalizer::from_ut`] for moments already in UT,
//! and [`TimeNormalizer::normalize`] for local wall-clock time at a place,
//! which resolves the zone and applies its historical offset.

use std::sync::Arc;

use astromap_core::{BirthMoment, UtTimeReference};
use chrono::{LocalResult, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

use crate::error::TimeError;
use crate::lookup::TimezoneLookup;

/// Result of normalizing a local birth moment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedTime {
    pub timezone: Tz,
    pub utc: NaiveDateTime,
    pub time: UtTimeReference,
}

#[derive(Clone)]
pub struct TimeNormalizer {
    lookup: Arc<dyn TimezoneLookup>,
}

impl TimeNormalizer {
    #[must_use]
    pub fn new(lookup: Arc<dyn TimezoneLookup>) -> Self {
        Self { lookup }
    }

    /// UT entry point: the clock reading is already Universal Time.
    #[must_use]
    pub fn from_ut(utc: NaiveDateTime) -> UtTimeReference {
        UtTimeReference::from_utc(utc)
    }

    /// Local entry point: resolve the zone at the birth place, interpret the
    /// clock reading there, and convert to UT.
    ///
    /// # Errors
    ///
    /// - [`TimeError::TimezoneResolution`] when no zone covers the place.
    /// - [`TimeError::InvalidTimezone`] when the lookup returns an unknown id.
    /// - [`TimeError::NonexistentLocalTime`] inside a DST gap.
    /// - [`TimeError::Lookup`] when the lookup backend fails.
    pub async fn normalize(&self, moment: &BirthMoment) -> Result<NormalizedTime, TimeError> {
        let tz_id = self
            .lookup
            .resolve(moment.latitude, moment.longitude)
            .await?
            .ok_or(TimeError::TimezoneResolution {
                latitude: moment.latitude,
                longitude: moment.longitude,
            })?;
        let timezone = parse_timezone(&tz_id)?;
        let utc = local_to_utc(moment.local, timezone)?;
        tracing::debug!(
            timezone = timezone.name(),
            local = %moment.local,
            %utc,
            "normalized birth moment"
        );

        Ok(NormalizedTime {
            timezone,
            utc,
            time: UtTimeReference::from_utc(utc),
        })
    }
}

impl std::fmt::Debug for TimeNormalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeNormalizer").finish_non_exhaustive()
    }
}

/// Parse an IANA identifier such as `"America/Chicago"`.
///
/// # Errors
///
/// Returns [`TimeError::InvalidTimezone`] for identifiers the bundled tz
/// database does not contain.
pub fn parse_timezone(id: &str) -> Result<Tz, TimeError> {
    id.parse::<Tz>()
        .map_err(|_| TimeError::InvalidTimezone(id.to_owned()))
}

/// Interpret `local` as wall-clock time in `timezone` and return UTC.
///
/// A repeated hour (fall-back) resolves to the earlier instant. A skipped
/// hour (spring-forward) is rejected.
///
/// # Errors
///
/// Returns [`TimeError::NonexistentLocalTime`] for times inside a DST gap.
pub fn local_to_utc(local: NaiveDateTime, timezone: Tz) -> Result<NaiveDateTime, TimeError> {
    match timezone.from_local_datetime(&local) {
        LocalResult::Single(dt) => Ok(dt.naive_utc()),
        LocalResult::Ambiguous(earliest, latest) => {
            tracing::warn!(
                %local,
                timezone = timezone.name(),
                earliest = %earliest.naive_utc(),
                latest = %latest.naive_utc(),
                "ambiguous local time, using earlier instant"
            );
            Ok(earliest.naive_utc())
        }
        LocalResult::None => Err(TimeError::NonexistentLocalTime {
            local,
            timezone: timezone.name().to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::lookup::StaticTimezoneLookup;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, 0))
            .expect("valid date")
    }

    fn normalizer() -> TimeNormalizer {
        let lookup = StaticTimezoneLookup::new()
            .with_zone(41.8781, -87.6298, 1.0, "America/Chicago")
            .with_zone(51.5074, -0.1278, 1.0, "Europe/London")
            .with_zone(10.0, 10.0, 1.0, "Mars/Olympus_Mons");
        TimeNormalizer::new(Arc::new(lookup))
    }

    #[tokio::test]
    async fn chicago_standard_time_in_november() {
        let moment = BirthMoment::new(at(1992, 11, 3, 14, 45), 41.8781, -87.6298).expect("moment");
        let out = normalizer().normalize(&moment).await.expect("normalize");
        assert_eq!(out.timezone, chrono_tz::America::Chicago);
        assert_eq!(out.utc, at(1992, 11, 3, 20, 45));
        assert!((out.time.julian_day() - 2_448_930.364_583_3).abs() < 1e-6);
    }

    #[tokio::test]
    async fn chicago_daylight_time_in_july() {
        let moment = BirthMoment::new(at(1992, 7, 3, 14, 45), 41.8781, -87.6298).expect("moment");
        let out = normalizer().normalize(&moment).await.expect("normalize");
        assert_eq!(out.utc, at(1992, 7, 3, 19, 45));
    }

    #[tokio::test]
    async fn unresolvable_coordinates_abort() {
        let moment = BirthMoment::new(at(1992, 11, 3, 14, 45), -45.0, -140.0).expect("moment");
        let err = normalizer().normalize(&moment).await.unwrap_err();
        assert!(matches!(err, TimeError::TimezoneResolution { .. }));
    }

    #[tokio::test]
    async fn unknown_zone_identifier_is_rejected() {
        let moment = BirthMoment::new(at(1992, 11, 3, 14, 45), 10.0, 10.0).expect("moment");
        let err = normalizer().normalize(&moment).await.unwrap_err();
        assert!(matches!(err, TimeError::InvalidTimezone(id) if id == "Mars/Olympus_Mons"));
    }

    #[test]
    fn fall_back_overlap_picks_earlier_instant() {
        // 2021-11-07 01:30 happens twice in Chicago: CDT (UTC-5) then CST (UTC-6).
        let utc = local_to_utc(at(2021, 11, 7, 1, 30), chrono_tz::America::Chicago).expect("utc");
        assert_eq!(utc, at(2021, 11, 7, 6, 30));
    }

    #[test]
    fn spring_forward_gap_is_rejected() {
        // 2021-03-14 02:30 never happened in Chicago.
        let err = local_to_utc(at(2021, 3, 14, 2, 30), chrono_tz::America::Chicago).unwrap_err();
        assert!(matches!(err, TimeError::NonexistentLocalTime { .. }));
    }

    #[test]
    fn london_historical_offset_applies() {
        // British Standard Time: the UK stayed on UTC+1 all through 1968-1971.
        let utc = local_to_utc(at(1969, 1, 15, 12, 0), chrono_tz::Europe::London).expect("utc");
        assert_eq!(utc, at(1969, 1, 15, 11, 0));
    }

    #[test]
    fn ut_entry_point_skips_zone_resolution() {
        let time = TimeNormalizer::from_ut(at(2000, 1, 1, 12, 0));
        assert!((time.julian_day() - 2_451_545.0).abs() < 1e-9);
    }
}
