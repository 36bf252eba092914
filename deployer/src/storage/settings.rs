//! Settings file management

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

use crate::errors::DeployError;
use crate::logs::LogLevel;

/// Service settings
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,

    /// Emit JSON log lines
    #[serde(default)]
    pub log_json: bool,

    /// Also write daily-rolling log files here
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerSettings,

    /// Stage sequencer configuration
    #[serde(default)]
    pub sequencer: SequencerSettings,

    /// Bearer token configuration
    #[serde(default)]
    pub auth: AuthSettings,

    /// Upper bound on graceful shutdown
    #[serde(default = "default_max_shutdown_delay")]
    pub max_shutdown_delay_secs: u64,
}

fn default_max_shutdown_delay() -> u64 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            log_json: false,
            log_dir: None,
            server: ServerSettings::default(),
            sequencer: SequencerSettings::default(),
            auth: AuthSettings::default(),
            max_shutdown_delay_secs: default_max_shutdown_delay(),
        }
    }
}

impl Settings {
    /// Read settings from a JSON file
    pub async fn load(path: &Path) -> Result<Self, DeployError> {
        let contents = tokio::fs::read_to_string(path).await?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, DeployError> {
        let settings: Settings = serde_json::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), DeployError> {
        if self.sequencer.stage_delay_ms == 0 {
            return Err(DeployError::ConfigError(
                "sequencer.stage_delay_ms must be positive".to_string(),
            ));
        }
        if self.auth.token_ttl_secs == 0 {
            return Err(DeployError::ConfigError(
                "auth.token_ttl_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Stage sequencer settings
#[derive(Debug, Clone, Deserialize)]
pub struct SequencerSettings {
    /// Time spent in each stage
    #[serde(default = "default_stage_delay")]
    pub stage_delay_ms: u64,
}

fn default_stage_delay() -> u64 {
    2000
}

impl Default for SequencerSettings {
    fn default() -> Self {
        Self {
            stage_delay_ms: default_stage_delay(),
        }
    }
}

/// Bearer token settings
#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    /// HS256 signing secret
    #[serde(default = "default_jwt_secret", deserialize_with = "deserialize_secret")]
    pub jwt_secret: SecretString,

    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,
}

fn default_jwt_secret() -> SecretString {
    SecretString::from("aluminum-paas-secret-key".to_string())
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

fn default_token_ttl() -> u64 {
    24 * 60 * 60
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_secs: default_token_ttl(),
        }
    }
}
