use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub app: AppSettings,
    pub drive: DriveSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

/// Google Drive service-account material. All six fields must be present
/// before the first Drive call; `CredentialProvider::new` rejects empty ones.
#[derive(Debug, Deserialize, Clone)]
pub struct DriveSettings {
    pub project_id: String,
    pub private_key_id: String,
    pub private_key: String,
    pub client_email: String,
    pub client_id: String,
    pub folder_id: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheSettings {
    pub metadata_ttl_secs: u64,
    pub listing_ttl_secs: u64,
    pub token_ttl_secs: u64,
    pub compact_threshold: usize,
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::default()
                    .separator("__")
                    .prefix("GALLERY"),
            )
            .set_default("app.host", "0.0.0.0")?
            .set_default("app.port", 3000)?
            .set_default("app.cors_origins", Vec::<String>::new())?
            .set_default("drive.project_id", "")?
            .set_default("drive.private_key_id", "")?
            .set_default("drive.private_key", "")?
            .set_default("drive.client_email", "")?
            .set_default("drive.client_id", "")?
            .set_default("drive.folder_id", "")?
            .set_default("cache.metadata_ttl_secs", 300)?
            .set_default("cache.listing_ttl_secs", 300)?
            // Drive access tokens live for an hour; renew well before that.
            .set_default("cache.token_ttl_secs", 3000)?
            .set_default("cache.compact_threshold", 100)?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::load().expect("Failed to load default settings")
    }
}
