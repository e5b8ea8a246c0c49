use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CorsConfig {
    #[serde(default)]
    pub allow_origins: Vec<String>,
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

fn default_cors_max_age() -> u64 {
    3600
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub cors: CorsConfig,
}

/// Connection details for the hosted backend-as-a-service.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProviderConfig {
    /// Base endpoint, e.g. `https://project.example.co`.
    #[serde(default)]
    pub url: String,
    /// Public (anonymous) API key.
    #[serde(default)]
    pub anon_key: String,
    /// Privileged key used for storage and row writes. Falls back to `anon_key`.
    #[serde(default)]
    pub service_key: Option<String>,
    /// Shared secret for verifying access tokens locally instead of asking the
    /// provider on every request.
    #[serde(default)]
    pub jwt_secret: Option<String>,
}

impl ProviderConfig {
    /// Key used for storage uploads and row writes.
    pub fn write_key(&self) -> &str {
        self.service_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .unwrap_or(&self.anon_key)
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Hosted,
    Filesystem,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilesystemStorageConfig {
    #[serde(default = "default_storage_root")]
    pub root: PathBuf,
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("./media")
}
fn default_public_base_url() -> String {
    "http://127.0.0.1:3000/media".into()
}

impl Default for FilesystemStorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            public_base_url: default_public_base_url(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// Bucket holding video binaries. Default: "videos".
    #[serde(default = "default_video_bucket")]
    pub video_bucket: String,
    /// Bucket holding image binaries (thumbnails). Default: "images".
    #[serde(default = "default_image_bucket")]
    pub image_bucket: String,
    /// Cache-Control max-age for uploaded objects. Default: 3600.
    #[serde(default = "default_cache_control_secs")]
    pub cache_control_secs: u32,
    /// Maximum size of a single uploaded file in bytes. Default: 512 MB.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size: u64,
    #[serde(default)]
    pub filesystem: FilesystemStorageConfig,
}

fn default_video_bucket() -> String {
    "videos".into()
}
fn default_image_bucket() -> String {
    "images".into()
}
fn default_cache_control_secs() -> u32 {
    3600
}
fn default_max_upload_size() -> u64 {
    512 * 1024 * 1024
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            video_bucket: default_video_bucket(),
            image_bucket: default_image_bucket(),
            cache_control_secs: default_cache_control_secs(),
            max_upload_size: default_max_upload_size(),
            filesystem: FilesystemStorageConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RowBackend {
    #[default]
    Hosted,
    Database,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RowsConfig {
    #[serde(default)]
    pub backend: RowBackend,
    /// Direct database URL, required when `backend = "database"`.
    #[serde(default)]
    pub database_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdminConfig {
    /// Where signed-out callers of the admin surface are sent.
    #[serde(default = "default_login_path")]
    pub login_path: String,
    /// Where a successful sign-in sends the caller.
    #[serde(default = "default_home_path")]
    pub home_path: String,
    /// Cookie carrying the access token for browser clients.
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

fn default_login_path() -> String {
    "/admin/login".into()
}
fn default_home_path() -> String {
    "/admin".into()
}
fn default_cookie_name() -> String {
    "studio-access-token".into()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            home_path: default_home_path(),
            cookie_name: default_cookie_name(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub rows: RowsConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., STUDIO__PROVIDER__ANON_KEY)
            .add_source(
                Environment::with_prefix("STUDIO")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = s.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would only fail later, on the first request.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.url.trim().is_empty() {
            return Err(ConfigError::Message(
                "provider.url is required (set STUDIO__PROVIDER__URL)".into(),
            ));
        }
        if !self.provider.url.starts_with("http://") && !self.provider.url.starts_with("https://")
        {
            return Err(ConfigError::Message(format!(
                "provider.url must be an http(s) URL, got '{}'",
                self.provider.url
            )));
        }
        if self.provider.anon_key.trim().is_empty() {
            return Err(ConfigError::Message(
                "provider.anon_key is required (set STUDIO__PROVIDER__ANON_KEY)".into(),
            ));
        }
        if self.rows.backend == RowBackend::Database
            && self
                .rows
                .database_url
                .as_deref()
                .is_none_or(|url| url.trim().is_empty())
        {
            return Err(ConfigError::Message(
                "rows.database_url is required when rows.backend = \"database\"".into(),
            ));
        }
        if self.storage.video_bucket.is_empty() || self.storage.image_bucket.is_empty() {
            return Err(ConfigError::Message("storage bucket names must not be empty".into()));
        }
        Ok(())
    }
}
