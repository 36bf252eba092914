//! Application configuration options

use std::time::Duration;

use secrecy::SecretString;

use crate::deploy::sequencer::SequencerOptions;
use crate::storage::settings::Settings;

/// Main application options
#[derive(Debug)]
pub struct AppOptions {
    /// Lifecycle configuration
    pub lifecycle: LifecycleOptions,

    /// Server configuration
    pub server: ServerOptions,

    /// Stage sequencer settings
    pub sequencer: SequencerOptions,

    /// Token signing configuration
    pub auth: AuthOptions,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self::from(Settings::default())
    }
}

impl From<Settings> for AppOptions {
    fn from(settings: Settings) -> Self {
        Self {
            lifecycle: LifecycleOptions {
                max_shutdown_delay: Duration::from_secs(settings.max_shutdown_delay_secs),
            },
            server: ServerOptions {
                host: settings.server.host,
                port: settings.server.port,
            },
            sequencer: SequencerOptions {
                stage_delay: Duration::from_millis(settings.sequencer.stage_delay_ms),
            },
            auth: AuthOptions {
                jwt_secret: settings.auth.jwt_secret,
                token_ttl_secs: settings.auth.token_ttl_secs,
            },
        }
    }
}

/// Lifecycle options for the service
#[derive(Debug, Clone)]
pub struct LifecycleOptions {
    /// Maximum delay for graceful shutdown
    pub max_shutdown_delay: Duration,
}

impl Default for LifecycleOptions {
    fn default() -> Self {
        Self {
            max_shutdown_delay: Duration::from_secs(30),
        }
    }
}

/// Local HTTP server options
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

/// Token signing options
#[derive(Debug)]
pub struct AuthOptions {
    pub jwt_secret: SecretString,
    pub token_ttl_secs: u64,
}
