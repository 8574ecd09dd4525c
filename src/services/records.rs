// Author: Dustin Pilgrim
// License: MIT

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

pub type RecordId = u64;

/// One closed interval. Never rewritten once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRecord {
    pub id: RecordId,
    pub url: String,
    pub duration_millis: u64,
    pub timestamp: String,
}

impl TimeRecord {
    pub fn recorded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record store I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("record encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Durable append-only duration log.
pub trait RecordStore: Send + Sync + 'static {
    fn append(
        &mut self,
        url: &str,
        duration_millis: u64,
    ) -> impl Future<Output = Result<RecordId, StoreError>> + Send;

    fn query_by_url(&self, url: &str)
        -> impl Future<Output = Result<Vec<TimeRecord>, StoreError>> + Send;

    /// Records with `start <= timestamp < end`.
    fn query_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = Result<Vec<TimeRecord>, StoreError>> + Send;
}

/// Records as JSON lines in a single file.
#[derive(Debug)]
pub struct JsonlRecordStore {
    path: PathBuf,
    next_id: RecordId,
}

impl JsonlRecordStore {
    /// Open (or lazily create) the log at `path`, continuing its id sequence.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let existing = read_all(&path).await?;
        let next_id = existing.iter().map(|r| r.id).max().map_or(1, |id| id + 1);

        debug!(path = %path.display(), records = existing.len(), "record store opened");

        Ok(Self { path, next_id })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordStore for JsonlRecordStore {
    async fn append(&mut self, url: &str, duration_millis: u64) -> Result<RecordId, StoreError> {
        let record = TimeRecord {
            id: self.next_id,
            url: url.to_string(),
            duration_millis,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let io_err = |source: std::io::Error| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(io_err)?;
        file.write_all(line.as_bytes()).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;

        self.next_id += 1;
        Ok(record.id)
    }

    async fn query_by_url(&self, url: &str) -> Result<Vec<TimeRecord>, StoreError> {
        let mut records = read_all(&self.path).await?;
        records.retain(|r| r.url == url);
        Ok(records)
    }

    async fn query_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TimeRecord>, StoreError> {
        let mut records = read_all(&self.path).await?;
        records.retain(|r| r.recorded_at().is_some_and(|ts| ts >= start && ts < end));
        Ok(records)
    }
}

async fn read_all(path: &Path) -> Result<Vec<TimeRecord>, StoreError> {
    let text = match fs::read_to_string(path).await {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let mut out = Vec::new();
    for (n, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<TimeRecord>(line) {
            Ok(r) => out.push(r),
            Err(e) => warn!(path = %path.display(), line = n + 1, error = %e, "skipping corrupt record"),
        }
    }

    Ok(out)
}

/// Total milliseconds per url, largest first.
pub fn totals_by_url(records: &[TimeRecord]) -> Vec<(String, u64)> {
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    for r in records {
        *totals.entry(r.url.as_str()).or_default() += r.duration_millis;
    }

    let mut out: Vec<(String, u64)> = totals
        .into_iter()
        .map(|(url, ms)| (url.to_string(), ms))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Total milliseconds per UTC day.
pub fn totals_by_day(records: &[TimeRecord]) -> BTreeMap<NaiveDate, u64> {
    let mut totals = BTreeMap::new();
    for r in records {
        if let Some(ts) = r.recorded_at() {
            *totals.entry(ts.date_naive()).or_default() += r.duration_millis;
        }
    }
    totals
}
