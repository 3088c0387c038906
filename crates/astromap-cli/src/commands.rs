//! Subcommand handlers. Each loads what it needs from `AppConfig` and prints
//! JSON to stdout; logs go to stderr.

use std::sync::Arc;

use anyhow::Context;
use astromap_core::{parse_birth_date, AppConfig, BirthMoment, CelestialBody, OrbTolerance};
use astromap_ephem::{check_epoch, SwissEphOracle};
use astromap_matcher::{CityCatalog, PowerSpotMatcher};
use astromap_store::{NewReading, ResultStore};
use astromap_tz::{HttpTimezoneLookup, TimeNormalizer};
use serde::Serialize;

#[derive(Debug)]
pub(crate) struct MatchArgs {
    pub birth_date: String,
    pub planets: Option<Vec<String>>,
    pub orb: f64,
    pub location: Option<(f64, f64)>,
    pub save: bool,
}

#[derive(Debug, Serialize)]
struct MatchOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    julian_day_ut: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    timezone: Option<String>,
    results: astromap_core::ResultSet,
    skipped: Vec<astromap_matcher::SkippedBody>,
}

#[derive(Debug, Serialize)]
struct CatalogSummary<'a> {
    cities: usize,
    source: &'a astromap_matcher::CatalogSource,
}

pub(crate) async fn run_match(config: &AppConfig, args: MatchArgs) -> anyhow::Result<()> {
    let birth_date = parse_birth_date(&args.birth_date)?;
    let tolerance = OrbTolerance::new(args.orb)?;
    let planets = args.planets.unwrap_or_else(|| {
        CelestialBody::DEFAULT_REQUEST
            .iter()
            .map(|b| b.name().to_owned())
            .collect()
    });

    let (time, timezone) = match args.location {
        None => (TimeNormalizer::from_ut(birth_date), None),
        Some((latitude, longitude)) => {
            let moment = BirthMoment::new(birth_date, latitude, longitude)?;
            let lookup = HttpTimezoneLookup::new(
                &config.tz_lookup_url,
                config.tz_lookup_timeout_secs,
                &config.user_agent,
            )?;
            let normalized = TimeNormalizer::new(Arc::new(lookup))
                .normalize(&moment)
                .await
                .context("failed to convert local birth time to UT")?;
            (normalized.time, Some(normalized.timezone.name().to_owned()))
        }
    };
    check_epoch(time)?;

    let catalog = Arc::new(CityCatalog::load(&config.cities_path));
    let matcher = PowerSpotMatcher::new(Arc::new(SwissEphOracle::new()), catalog)
        .with_parallel(config.match_parallel);
    let report = matcher.run(time, &planets, tolerance)?;

    let id = if args.save {
        let store = ResultStore::new(config.results_dir.clone());
        let stored = store
            .save(NewReading {
                birth_date,
                time,
                orb_tolerance: tolerance,
                results: report.results.clone(),
            })
            .await?;
        Some(stored.id)
    } else {
        None
    };

    let output = MatchOutput {
        id,
        julian_day_ut: time.julian_day(),
        timezone,
        results: report.results,
        skipped: report.skipped,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

pub(crate) fn run_cities(config: &AppConfig) -> anyhow::Result<()> {
    let catalog = CityCatalog::load(&config.cities_path);
    println!("{}", render_catalog_summary(&catalog)?);
    Ok(())
}

pub(crate) fn render_catalog_summary(catalog: &CityCatalog) -> anyhow::Result<String> {
    let summary = CatalogSummary {
        cities: catalog.len(),
        source: catalog.source(),
    };
    serde_json::to_string_pretty(&summary).context("failed to render catalog summary")
}

pub(crate) async fn run_reading(config: &AppConfig, id: &str) -> anyhow::Result<()> {
    let store = ResultStore::new(config.results_dir.clone());
    let reading = store
        .load(id)
        .await
        .with_context(|| format!("cannot load reading '{id}'"))?;
    println!("{}", serde_json::to_string_pretty(&reading)?);
    Ok(())
}
