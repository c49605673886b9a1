use fest_catalog::EventDetails;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub upload: UploadConfig,
    #[serde(default)]
    pub event: EventDetails,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

fn default_host() -> String { "127.0.0.1".to_string() }

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub export_dir: PathBuf,
    /// Keep bookings in memory only; nothing survives a restart
    #[serde(default)]
    pub ephemeral: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    pub endpoint: String,
    pub cloud_name: String,
    pub upload_preset: String,
    #[serde(default = "default_upload_timeout")]
    pub timeout_seconds: u64,
    /// When set, uploads are not sent anywhere and always resolve to this URL
    pub mock_url: Option<String>,
}

fn default_upload_timeout() -> u64 { 30 }

impl UploadConfig {
    pub fn upload_url(&self) -> String {
        format!(
            "{}/{}/image/upload",
            self.endpoint.trim_end_matches('/'),
            self.cloud_name
        )
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `FEST__SERVER__PORT=8081`
            .add_source(config::Environment::with_prefix("FEST").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
