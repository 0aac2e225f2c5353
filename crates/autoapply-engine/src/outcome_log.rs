use chrono::{DateTime, Local, SecondsFormat};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Append-only, human-readable logs of viewed and applied jobs.
#[derive(Debug, Clone)]
pub struct OutcomeLogger {
    viewed: PathBuf,
    applied: PathBuf,
}

impl OutcomeLogger {
    pub fn new(viewed: impl Into<PathBuf>, applied: impl Into<PathBuf>) -> Self {
        Self {
            viewed: viewed.into(),
            applied: applied.into(),
        }
    }

    pub fn viewed_path(&self) -> &Path {
        &self.viewed
    }

    pub fn applied_path(&self) -> &Path {
        &self.applied
    }

    pub async fn record_viewed(
        &self,
        title: &str,
        company: &str,
        link: &str,
    ) -> std::io::Result<()> {
        append_line(&self.viewed, &viewed_line(title, company, link)).await
    }

    pub async fn record_applied(
        &self,
        title: &str,
        company: &str,
        link: &str,
        at: DateTime<Local>,
    ) -> std::io::Result<()> {
        append_line(&self.applied, &applied_line(title, company, link, at)).await
    }
}

pub fn viewed_line(title: &str, company: &str, link: &str) -> String {
    format!("{} at {} - {}", title.trim(), company.trim(), link)
}

pub fn applied_line(title: &str, company: &str, link: &str, at: DateTime<Local>) -> String {
    format!(
        "[{}] {}",
        at.to_rfc3339_opts(SecondsFormat::Secs, false),
        viewed_line(title, company, link)
    )
}

async fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.write_all(b"\n").await?;
    file.flush().await
}
