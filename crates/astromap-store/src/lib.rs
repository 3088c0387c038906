//! File-backed persistence of computed readings.
//!
//! Each reading is one pretty-printed JSON file `<id>.json` in the store
//! directory. Ids are generated UUIDv4 strings; any id handed back by a
//! caller is checked against `[A-Za-z0-9-]{1,64}` before it is turned into
//! a path, so traversal-shaped input never reaches the filesystem.

use std::path::{Path, PathBuf};

use astromap_core::{OrbTolerance, ResultSet, UtTimeReference};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

const MAX_ID_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid reading id '{0}'")]
    InvalidId(String),

    #[error("reading '{0}' not found")]
    NotFound(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A persisted matching result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredReading {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// The birth date-time exactly as supplied (local or UT).
    pub birth_date: NaiveDateTime,
    pub julian_day_ut: f64,
    pub orb_tolerance: f64,
    pub results: ResultSet,
}

/// Input for [`ResultStore::save`]; id and timestamp are assigned on save.
#[derive(Debug, Clone)]
pub struct NewReading {
    pub birth_date: NaiveDateTime,
    pub time: UtTimeReference,
    pub orb_tolerance: OrbTolerance,
    pub results: ResultSet,
}

#[derive(Debug, Clone)]
pub struct ResultStore {
    dir: PathBuf,
}

impl ResultStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a reading under a fresh id.
    ///
    /// The file is written next to its final name and renamed into place,
    /// so readers never observe a partial document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the directory or file cannot be written.
    pub async fn save(&self, reading: NewReading) -> Result<StoredReading, StoreError> {
        let stored = StoredReading {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            birth_date: reading.birth_date,
            julian_day_ut: reading.time.julian_day(),
            orb_tolerance: reading.orb_tolerance.degrees(),
            results: reading.results,
        };

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| io_error(&self.dir, source))?;

        let body = serde_json::to_vec_pretty(&stored)?;
        let path = self.path_for(&stored.id);
        let tmp = self.dir.join(format!(".{}.json.tmp", stored.id));
        write_atomically(&tmp, &path, &body).await?;

        tracing::info!(id = %stored.id, path = %path.display(), "reading saved");
        Ok(stored)
    }

    /// Load a reading by id.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidId`] if `id` is not `[A-Za-z0-9-]{1,64}`.
    /// - [`StoreError::NotFound`] if no such reading exists.
    /// - [`StoreError::Io`] / [`StoreError::Serialize`] for unreadable files.
    pub async fn load(&self, id: &str) -> Result<StoredReading, StoreError> {
        validate_id(id)?;
        let path = self.path_for(id);
        let body = match tokio::fs::read(&path).await {
            Ok(body) => body,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(id.to_owned()));
            }
            Err(source) => return Err(io_error(&path, source)),
        };
        Ok(serde_json::from_slice(&body)?)
    }

    fn path_for(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

/// Write `body` to `tmp`, then rename it onto `path`. On failure the
/// temporary file is removed.
async fn write_atomically(tmp: &Path, path: &Path, body: &[u8]) -> Result<(), StoreError> {
    let result = match tokio::fs::write(tmp, body).await {
        Ok(()) => tokio::fs::rename(tmp, path)
            .await
            .map_err(|source| io_error(path, source)),
        Err(source) => Err(io_error(tmp, source)),
    };
    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(tmp).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %tmp.display(), error = %e, "failed to remove temporary file");
            }
        }
    }
    result
}

fn io_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Check that `id` is safe to use as a file stem.
///
/// # Errors
///
/// Returns [`StoreError::InvalidId`] otherwise.
pub fn validate_id(id: &str) -> Result<(), StoreError> {
    let ok = !id.is_empty()
        && id.len() <= MAX_ID_LEN
        && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidId(id.to_owned()))
    }
}
