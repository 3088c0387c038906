//! Read-only set of candidate cities, loaded once at startup.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use astromap_core::CityRecord;
use serde::Serialize;

use crate::error::CatalogError;

const NAME_COLUMNS: &[&str] = &["city", "name"];
const LATITUDE_COLUMNS: &[&str] = &["lat", "latitude"];
const LONGITUDE_COLUMNS: &[&str] = &["lng", "lon", "longitude"];

/// Where the loaded cities came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "path")]
pub enum CatalogSource {
    File(PathBuf),
    Fallback,
}

impl CatalogSource {
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Fallback => "fallback",
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "file {}", path.display()),
            Self::Fallback => f.write_str("built-in fallback"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CityCatalog {
    cities: Vec<CityRecord>,
    source: CatalogSource,
}

impl CityCatalog {
    /// Load from a CSV file, degrading to [`CityCatalog::fallback`] on any
    /// failure. Never fails.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        match Self::load_strict(path) {
            Ok(catalog) => {
                tracing::info!(
                    path = %path.display(),
                    cities = catalog.len(),
                    "city catalog loaded"
                );
                catalog
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "city catalog unavailable, using built-in fallback list"
                );
                Self::fallback()
            }
        }
    }

    /// Load from a CSV file, reporting why it could not be used.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the file cannot be opened, the header
    /// lacks a required column, or no row yields a valid city.
    pub fn load_strict(path: &Path) -> Result<Self, CatalogError> {
        let file = File::open(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cities = read_cities(file)?;
        Ok(Self {
            cities,
            source: CatalogSource::File(path.to_path_buf()),
        })
    }

    /// Parse CSV from any reader.
    ///
    /// # Errors
    ///
    /// Same conditions as [`CityCatalog::load_strict`], minus file opening.
    pub fn from_reader<R: Read>(reader: R, source: CatalogSource) -> Result<Self, CatalogError> {
        Ok(Self {
            cities: read_cities(reader)?,
            source,
        })
    }

    #[must_use]
    pub fn from_records(cities: Vec<CityRecord>, source: CatalogSource) -> Self {
        Self { cities, source }
    }

    /// New York, London, Tokyo.
    #[must_use]
    pub fn fallback() -> Self {
        let cities = vec![
            CityRecord {
                name: "New York".to_owned(),
                latitude: 40.7128,
                longitude: -74.0060,
            },
            CityRecord {
                name: "London".to_owned(),
                latitude: 51.5074,
                longitude: -0.1278,
            },
            CityRecord {
                name: "Tokyo".to_owned(),
                latitude: 35.6762,
                longitude: 139.6503,
            },
        ];
        Self {
            cities,
            source: CatalogSource::Fallback,
        }
    }

    /// Every city, in file order. Borrowing, so it can be walked once per body.
    #[must_use]
    pub fn all(&self) -> &[CityRecord] {
        &self.cities
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    #[must_use]
    pub fn source(&self) -> &CatalogSource {
        &self.source
    }
}

struct Columns {
    name: usize,
    latitude: usize,
    longitude: usize,
}

fn find_column(headers: &csv::StringRecord, aliases: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| aliases.iter().any(|a| h.trim().eq_ignore_ascii_case(a)))
}

fn resolve_columns(headers: &csv::StringRecord) -> Result<Columns, CatalogError> {
    let column = |field: &'static str, aliases: &[&str]| {
        find_column(headers, aliases).ok_or(CatalogError::MissingColumn(field))
    };
    Ok(Columns {
        name: column("city", NAME_COLUMNS)?,
        latitude: column("lat", LATITUDE_COLUMNS)?,
        longitude: column("lng", LONGITUDE_COLUMNS)?,
    })
}

fn parse_row(record: &csv::StringRecord, columns: &Columns) -> Result<CityRecord, String> {
    let field = |idx: usize, label: &str| {
        record
            .get(idx)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| format!("missing {label}"))
    };
    let name = field(columns.name, "city name")?;
    let latitude: f64 = field(columns.latitude, "latitude")?
        .parse()
        .map_err(|e| format!("latitude: {e}"))?;
    let longitude: f64 = field(columns.longitude, "longitude")?
        .parse()
        .map_err(|e| format!("longitude: {e}"))?;
    CityRecord::new(name, latitude, longitude).map_err(|e| e.to_string())
}

fn read_cities<R: Read>(reader: R) -> Result<Vec<CityRecord>, CatalogError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let columns = resolve_columns(reader.headers()?)?;

    let mut cities = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!(line, error = %e, "skipping unreadable city row");
                continue;
            }
        };
        match parse_row(&record, &columns) {
            Ok(city) => cities.push(city),
            Err(reason) => tracing::warn!(line, %reason, "skipping invalid city row"),
        }
    }

    if cities.is_empty() {
        return Err(CatalogError::Empty);
    }
    Ok(cities)
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
