use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, warn};
use url::Url;

/// A job listing as produced by the monitor step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub company: String,
    #[serde(alias = "url")]
    pub link: String,
    /// ISO datetime as written by the producer. Never validated on read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl JobPosting {
    pub fn from_link(link: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            company: String::new(),
            link: link.into(),
            timestamp: None,
        }
    }

    /// The timestamp parsed as a naive local datetime, if it is one.
    pub fn posted_at(&self) -> Option<NaiveDateTime> {
        let raw = self.timestamp.as_deref()?.trim();
        if let Ok(with_offset) = DateTime::parse_from_rfc3339(raw) {
            return Some(with_offset.naive_local());
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").ok()
    }
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Entries may be full objects or bare link strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum JobEntry {
    Posting(JobPosting),
    Link(String),
}

impl From<JobEntry> for JobPosting {
    fn from(entry: JobEntry) -> Self {
        match entry {
            JobEntry::Posting(posting) => posting,
            JobEntry::Link(link) => JobPosting::from_link(link),
        }
    }
}

#[derive(Deserialize)]
struct JobFile {
    #[serde(default)]
    jobs: Vec<serde_json::Value>,
}

#[derive(Serialize)]
struct JobFileOut<'a> {
    jobs: &'a [JobPosting],
}

#[derive(Debug, Error)]
pub enum JobSourceError {
    #[error("job list not found at {0}")]
    NotFound(PathBuf),
    #[error("failed to read job list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse job list {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse a `{"jobs": [...]}` document. Only an unreadable document is an
/// error; entries that are not a posting are logged and dropped.
pub fn parse_jobs(content: &str) -> Result<Vec<JobPosting>, serde_json::Error> {
    let file: JobFile = serde_json::from_str(content)?;
    let total = file.jobs.len();
    let jobs: Vec<JobPosting> = file
        .jobs
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match serde_json::from_value::<JobEntry>(value) {
            Ok(entry) => Some(entry.into()),
            Err(e) => {
                warn!("Skipping job entry #{}: {}", index + 1, e);
                None
            }
        })
        .collect();
    if jobs.len() < total {
        warn!("Kept {} of {} job entries", jobs.len(), total);
    }
    Ok(jobs)
}

pub async fn load(path: &Path) -> Result<Vec<JobPosting>, JobSourceError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(JobSourceError::NotFound(path.to_path_buf()));
        }
        Err(source) => {
            return Err(JobSourceError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    parse_jobs(&content).map_err(|source| JobSourceError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Like [`load`], but a missing or malformed file is reported and read as
/// an empty list.
pub async fn load_or_empty(path: &Path) -> Vec<JobPosting> {
    match load(path).await {
        Ok(jobs) => jobs,
        Err(e @ JobSourceError::NotFound(_)) => {
            warn!("{}", e);
            Vec::new()
        }
        Err(e) => {
            error!("{}", e);
            Vec::new()
        }
    }
}

/// Write the job list in the same `{"jobs": [...]}` shape [`load`] reads.
pub async fn save(path: &Path, jobs: &[JobPosting]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    let json = serde_json::to_string_pretty(&JobFileOut { jobs })?;
    tokio::fs::write(path, json).await
}

/// Resolve site-relative links (`/jobs/view/..`) against the base URL.
/// Anything else is returned untouched, malformed or not.
pub fn normalize_link(link: &str, base_url: &str) -> String {
    if !link.starts_with('/') {
        return link.to_string();
    }
    match Url::parse(base_url).and_then(|base| base.join(link)) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}{}", base_url.trim_end_matches('/'), link),
    }
}
