//! Append-only CSV file of discovered postings.
//!
//! One record per line, no header, columns `title, company, link, salary,
//! location`. Missing optional fields are written as empty columns and
//! `fit_score` is not persisted.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// One posting the agent judged relevant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct JobRecord {
    pub title: String,
    pub company: String,
    pub link: String,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// How well the posting fits the résumé, 0.0 to 1.0.
    pub fit_score: f64,
}

/// A row read back from the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredJob {
    pub title: String,
    pub company: String,
    pub link: String,
    pub salary: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Written,
    /// `dedupe_by_link` is on and the link was already stored.
    SkippedDuplicate,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("job store {0} does not exist yet")]
    NotFound(PathBuf),
    #[error("job store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("job store CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("job store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Handle on the store file.
///
/// Appends made through one `JobStore` are serialized; separate processes
/// writing the same file get whatever append-mode writes guarantee.
#[derive(Debug)]
pub struct JobStore {
    path: PathBuf,
    dedupe_by_link: bool,
    write_lock: Mutex<()>,
}

impl JobStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            dedupe_by_link: false,
            write_lock: Mutex::new(()),
        }
    }

    pub fn with_dedupe_by_link(mut self, enabled: bool) -> Self {
        self.dedupe_by_link = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, creating the file on first use.
    pub async fn append(&self, job: &JobRecord) -> Result<AppendOutcome, StoreError> {
        let _guard = self.write_lock.lock().await;

        if self.dedupe_by_link && self.contains_link_unlocked(&job.link).await? {
            info!(target: "jobscout.store", link = %job.link, "job already stored; skipping");
            return Ok(AppendOutcome::SkippedDuplicate);
        }

        let path = self.path.clone();
        let row = [
            job.title.clone(),
            job.company.clone(),
            job.link.clone(),
            job.salary.clone().unwrap_or_default(),
            job.location.clone().unwrap_or_default(),
        ];
        tokio::task::spawn_blocking(move || write_row(&path, &row)).await??;

        info!(
            target: "jobscout.store",
            title = %job.title,
            company = %job.company,
            fit_score = job.fit_score,
            "saved job"
        );
        Ok(AppendOutcome::Written)
    }

    /// The whole file as raw text.
    pub async fn read_all(&self) -> Result<String, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound(self.path.clone())),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether a row with this link exists. A missing file holds nothing.
    pub async fn contains_link(&self, link: &str) -> Result<bool, StoreError> {
        let _guard = self.write_lock.lock().await;
        self.contains_link_unlocked(link).await
    }

    async fn contains_link_unlocked(&self, link: &str) -> Result<bool, StoreError> {
        let text = match self.read_all().await {
            Ok(text) => text,
            Err(StoreError::NotFound(_)) => return Ok(false),
            Err(e) => return Err(e),
        };
        let found = parse_rows(&text)?.iter().any(|row| row.link == link);
        debug!(target: "jobscout.store", %link, found, "dedupe lookup");
        Ok(found)
    }
}

fn write_row(path: &Path, row: &[String; 5]) -> Result<(), StoreError> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(file);
    writer.write_record(row)?;
    writer.flush()?;
    Ok(())
}

/// Parse raw store text back into rows. Short rows get empty trailing fields.
pub fn parse_rows(text: &str) -> Result<Vec<StoredJob>, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |i: usize| record.get(i).unwrap_or_default().to_string();
        let optional = |i: usize| Some(field(i)).filter(|s| !s.is_empty());
        rows.push(StoredJob {
            title: field(0),
            company: field(1),
            link: field(2),
            salary: optional(3),
            location: optional(4),
        });
    }
    Ok(rows)
}
