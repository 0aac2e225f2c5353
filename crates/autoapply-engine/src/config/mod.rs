pub mod loader;
pub mod schema;

pub use loader::{ConfigError, ConfigLoader};
pub use schema::{
    AppConfig, BrowserConfig, Credentials, FilesConfig, SearchConfig, SiteConfig, WizardConfig,
};
