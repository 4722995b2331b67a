//! Connection configuration from `TIDB_*` environment variables
//!
//! Environment variables:
//!   TIDB_HOST       # default: localhost
//!   TIDB_PORT       # default: 4000
//!   TIDB_USER       # default: root
//!   TIDB_PASSWORD   # default: empty
//!   TIDB_DB_NAME    # default: test
//!   TIDB_SSL_MODE   # "true" enables verified TLS
//!   TIDB_CA_PATH    # CA certificate (PEM) used when TLS is enabled

use std::fmt;
use std::path::PathBuf;

use sqlx::mysql::{MySqlConnectOptions, MySqlSslMode};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_USER: &str = "root";
pub const DEFAULT_PASSWORD: &str = "";
pub const DEFAULT_DATABASE: &str = "test";

/// Load environment variables from .env files
///
/// Priority order (highest to lowest):
/// 1. Environment variables already set
/// 2. Current directory .env
/// 3. ~/.playerctl/.env
pub fn load_dotenv() {
    let mut loaded_from = Vec::new();

    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded .env from current directory: {}", path.display());
        loaded_from.push(path.display().to_string());
    }

    if let Some(env_file) = dirs::home_dir().map(|home| home.join(".playerctl").join(".env")) {
        if env_file.exists() {
            // dotenvy never overwrites variables that are already set
            match dotenvy::from_path(&env_file) {
                Ok(()) => loaded_from.push(env_file.display().to_string()),
                Err(e) => debug!("Failed to load {}: {}", env_file.display(), e),
            }
        }
    }

    if loaded_from.is_empty() {
        debug!("No .env files found, using environment variables only");
    } else {
        info!("Loaded configuration from: {}", loaded_from.join(", "));
    }
}

/// TLS settings for the connection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsConfig {
    pub enabled: bool,
    /// PEM file passed to the TLS layer as raw bytes
    pub ca_path: Option<PathBuf>,
}

/// Parameters for the single database connection
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub tls: TlsConfig,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            user: DEFAULT_USER.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            tls: TlsConfig::default(),
        }
    }
}

// Password stays out of logs.
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("tls", &self.tls)
            .finish()
    }
}

impl ConnectionConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> DbResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup`.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> DbResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());
        let defaults = Self::default();

        let port = match get("TIDB_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                DbError::config(format!("TIDB_PORT must be a port number, got '{}'", raw))
            })?,
            None => defaults.port,
        };

        let enabled = get("TIDB_SSL_MODE")
            .map(|value| value.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self {
            host: get("TIDB_HOST").unwrap_or(defaults.host),
            port,
            user: get("TIDB_USER").unwrap_or(defaults.user),
            password: get("TIDB_PASSWORD").unwrap_or(defaults.password),
            database: get("TIDB_DB_NAME").unwrap_or(defaults.database),
            tls: TlsConfig {
                enabled,
                ca_path: get("TIDB_CA_PATH").map(PathBuf::from),
            },
        })
    }

    /// `host:port/database`, safe to log.
    pub fn display_target(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }

    /// Build driver options, reading the CA certificate if one is configured.
    ///
    /// With TLS enabled the server certificate and hostname are verified.
    /// The rustls backend never negotiates below TLS 1.2.
    pub async fn connect_options(&self) -> DbResult<MySqlConnectOptions> {
        let options = MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database);

        if !self.tls.enabled {
            return Ok(options.ssl_mode(MySqlSslMode::Disabled));
        }

        let options = options.ssl_mode(MySqlSslMode::VerifyIdentity);
        match &self.tls.ca_path {
            Some(path) => {
                let pem = tokio::fs::read(path)
                    .await
                    .map_err(|source| DbError::CaCertificate {
                        path: path.clone(),
                        source,
                    })?;
                debug!(path = %path.display(), bytes = pem.len(), "Loaded CA certificate");
                Ok(options.ssl_ca_from_pem(pem))
            }
            None => Ok(options),
        }
    }
}
