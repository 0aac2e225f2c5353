use super::schema::AppConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Names a config file to use instead of searching for one.
pub const CONFIG_PATH_ENV: &str = "AUTOAPPLY_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Build the process configuration.
    ///
    /// `.env` is read first so it can also name the config file. The file
    /// comes from `explicit`, else [`CONFIG_PATH_ENV`], else the first hit in
    /// [`ConfigLoader::search_paths`]. Environment variables override
    /// whatever the file set.
    pub async fn load(explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
        dotenvy::dotenv().ok();
        let named = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let mut config = match named.or_else(Self::discover) {
            Some(path) => Self::load_from(&path).await?,
            None => {
                info!("No configuration file found, using defaults");
                AppConfig::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Where to look for a config file, in priority order.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("autoapply.yaml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".autoapply").join("config.yaml"));
        }
        paths
    }

    fn discover() -> Option<PathBuf> {
        Self::search_paths().into_iter().find(|path| path.is_file())
    }

    /// Read one YAML file. An empty file means all defaults.
    pub async fn load_from(path: &Path) -> Result<AppConfig, ConfigError> {
        info!("Loading configuration from {}", path.display());
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        if content.trim().is_empty() {
            return Ok(AppConfig::default());
        }
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
