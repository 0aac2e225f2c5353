use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Serialized browser-context state, stored in a single global file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub cookies: Vec<Cookie>,
    /// Per-origin storage captured by drivers that support it. Kept verbatim.
    #[serde(default)]
    pub origins: Vec<serde_json::Value>,
}

impl SessionState {
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty() && self.origins.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    /// Seconds since the epoch; `-1` or absent for session cookies.
    #[serde(default)]
    pub expires: Option<f64>,
    #[serde(default)]
    pub http_only: Option<bool>,
    #[serde(default)]
    pub secure: Option<bool>,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Failed to access session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse session file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// File-backed persistence for [`SessionState`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored state. A missing file is the first-run case and
    /// yields `Ok(None)`.
    pub async fn load(&self) -> Result<Option<SessionState>, SessionError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let state = serde_json::from_str(&content).map_err(|source| SessionError::Parse {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(state))
    }

    /// Overwrite the stored state.
    pub async fn save(&self, state: &SessionState) -> Result<(), SessionError> {
        let io_err = |source| SessionError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
            }
        }

        let json = serde_json::to_string_pretty(state).map_err(|source| SessionError::Parse {
            path: self.path.clone(),
            source,
        })?;
        tokio::fs::write(&self.path, json).await.map_err(io_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_state() -> SessionState {
        SessionState {
            cookies: vec![Cookie {
                name: "li_at".into(),
                value: "token".into(),
                domain: Some(".linkedin.com".into()),
                path: Some("/".into()),
                expires: Some(1_900_000_000.0),
                http_only: Some(true),
                secure: Some(true),
            }],
            origins: vec![],
        }
    }

    #[tokio::test]
    async fn test_missing_file_is_fresh_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("auth.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load_restores_cookies() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::new(dir.path().join("nested").join("auth.json"));

        store.save(&sample_state()).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, sample_state());
    }

    #[tokio::test]
    async fn test_reads_camel_case_storage_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        tokio::fs::write(
            &path,
            r#"{"cookies":[{"name":"JSESSIONID","value":"x","domain":"www.linkedin.com","path":"/","expires":-1,"httpOnly":false,"secure":true,"sameSite":"None"}],"origins":[{"origin":"https://www.linkedin.com","localStorage":[]}]}"#,
        )
        .await
        .unwrap();

        let state = SessionStore::new(&path).load().await.unwrap().unwrap();
        assert_eq!(state.cookies[0].name, "JSESSIONID");
        assert_eq!(state.cookies[0].http_only, Some(false));
        assert_eq!(state.origins.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let err = SessionStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, SessionError::Parse { .. }));
    }
}
