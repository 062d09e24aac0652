//! Service configuration via `healthtrack.toml` and the environment
//!
//! Settings are read from an optional `healthtrack.toml`, then overridden by
//! environment variables. The store location is a URI:
//!
//! - `memory://` keeps every document in memory
//! - `file:///var/lib/healthtrack` journals writes into that directory
//!
//! A query of `authMechanism=X509` (or `MONGODB-X509`) switches on
//! certificate mode; the PEM at `tls_cert` must then hold a certificate and
//! a private key or startup fails.

use healthtrack_storage::SyncMode;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

/// Config file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "healthtrack.toml";

/// Port used when neither the file nor `PORT` sets one.
pub const DEFAULT_PORT: u16 = 5000;

/// Certificate path used when neither the file nor `HEALTHTRACK_TLS_CERT` sets one.
pub const DEFAULT_TLS_CERT: &str = "cert.pem";

/// Environment variable names
pub mod env {
    /// Store URI
    pub const DATABASE_URI: &str = "DATABASE_URI";
    /// Listen port
    pub const PORT: &str = "PORT";
    /// `development` or `production`
    pub const ENVIRONMENT: &str = "HEALTHTRACK_ENV";
    /// PEM bundle for certificate mode
    pub const TLS_CERT: &str = "HEALTHTRACK_TLS_CERT";
    /// `standard` or `always`
    pub const DURABILITY: &str = "HEALTHTRACK_DURABILITY";
}

/// Configuration errors. All of them abort startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No store URI in the file or the environment
    #[error("DATABASE_URI is not set")]
    MissingStoreUri,

    /// Store URI has an unsupported scheme or an empty path
    #[error("unsupported store URI '{uri}': expected memory:// or file:///<dir>")]
    InvalidStoreUri {
        /// The rejected URI
        uri: String,
    },

    /// Unknown durability mode
    #[error("invalid durability mode '{value}', expected \"standard\" or \"always\"")]
    InvalidDurability {
        /// The rejected value
        value: String,
    },

    /// Unknown environment name
    #[error("invalid environment '{value}', expected \"development\" or \"production\"")]
    InvalidEnvironment {
        /// The rejected value
        value: String,
    },

    /// `PORT` is not a valid port number
    #[error("invalid port '{value}'")]
    InvalidPort {
        /// The rejected value
        value: String,
    },

    /// Config file could not be read
    #[error("failed to read config file '{}': {source}", path.display())]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema
    #[error("failed to parse config file '{}': {reason}", path.display())]
    Parse {
        /// File path
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// Certificate mode is on but the PEM bundle is missing or incomplete
    #[error("SSL certificate at '{}' unusable: {reason}", path.display())]
    Certificate {
        /// PEM path
        path: PathBuf,
        /// What is wrong with it
        reason: String,
    },
}

/// Deployment environment. Development mode exposes internal error detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development
    Development,
    /// Anything else
    #[default]
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidEnvironment {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Where documents live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    /// Process memory only
    Memory,
    /// Journaled directory
    Directory(PathBuf),
}

/// Parsed store URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreUri {
    /// Store location
    pub location: StoreLocation,
    /// Certificate mode requested through `authMechanism`
    pub requires_certificate: bool,
}

impl FromStr for StoreUri {
    type Err = ConfigError;

    fn from_str(uri: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidStoreUri {
            uri: uri.to_string(),
        };
        let (base, query) = match uri.trim().split_once('?') {
            Some((base, query)) => (base, query),
            None => (uri.trim(), ""),
        };

        let location = if base == "memory://" || base == "memory:" {
            StoreLocation::Memory
        } else if let Some(path) = base.strip_prefix("file://") {
            if path.is_empty() {
                return Err(invalid());
            }
            StoreLocation::Directory(PathBuf::from(path))
        } else {
            return Err(invalid());
        };

        let requires_certificate = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .any(|(key, value)| {
                key == "authMechanism" && (value == "X509" || value == "MONGODB-X509")
            });

        Ok(StoreUri {
            location,
            requires_certificate,
        })
    }
}

/// A validated certificate bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsIdentity {
    /// PEM path
    pub path: PathBuf,
    /// Hex SHA-256 of the PEM bundle
    pub fingerprint: String,
}

impl TlsIdentity {
    /// Load a PEM bundle that must carry both a certificate and a private key.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let pem = std::fs::read_to_string(path).map_err(|e| ConfigError::Certificate {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if !pem.contains("-----BEGIN CERTIFICATE-----") {
            return Err(ConfigError::Certificate {
                path: path.to_path_buf(),
                reason: "no CERTIFICATE block".to_string(),
            });
        }
        // Accepts PKCS#8 ("PRIVATE KEY") as well as RSA/EC key blocks.
        let has_key = pem
            .lines()
            .any(|l| l.starts_with("-----BEGIN") && l.contains("PRIVATE KEY-----"));
        if !has_key {
            return Err(ConfigError::Certificate {
                path: path.to_path_buf(),
                reason: "no PRIVATE KEY block".to_string(),
            });
        }

        let digest = Sha256::digest(pem.as_bytes());
        let fingerprint = digest.iter().map(|b| format!("{:02x}", b)).collect();
        Ok(TlsIdentity {
            path: path.to_path_buf(),
            fingerprint,
        })
    }
}

/// Service configuration loaded from `healthtrack.toml`.
///
/// # Example
///
/// ```toml
/// database_uri = "file:///var/lib/healthtrack"
/// port = 5000
/// environment = "production"
/// tls_cert = "cert.pem"
/// durability = "standard"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthTrackConfig {
    /// Store URI (`memory://` or `file:///dir`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_uri: Option<String>,
    /// HTTP listen port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Deployment environment
    #[serde(default)]
    pub environment: Environment,
    /// PEM bundle used in certificate mode
    #[serde(default = "default_tls_cert")]
    pub tls_cert: PathBuf,
    /// Journal durability: `"standard"` or `"always"`
    #[serde(default = "default_durability_str")]
    pub durability: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_tls_cert() -> PathBuf {
    PathBuf::from(DEFAULT_TLS_CERT)
}

fn default_durability_str() -> String {
    "standard".to_string()
}

impl Default for HealthTrackConfig {
    fn default() -> Self {
        Self {
            database_uri: None,
            port: default_port(),
            environment: Environment::default(),
            tls_cert: default_tls_cert(),
            durability: default_durability_str(),
        }
    }
}

impl HealthTrackConfig {
    /// In-memory configuration, used by tests and demos.
    pub fn in_memory() -> Self {
        Self {
            database_uri: Some("memory://".to_string()),
            ..Self::default()
        }
    }

    /// Read and parse config from a file path.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Override settings from environment-style lookups.
    ///
    /// Takes the lookup as a function so callers and tests need not touch
    /// the process environment.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(uri) = lookup(env::DATABASE_URI).filter(|v| !v.trim().is_empty()) {
            self.database_uri = Some(uri);
        }
        if let Some(port) = lookup(env::PORT).filter(|v| !v.trim().is_empty()) {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort { value: port })?;
        }
        if let Some(environment) = lookup(env::ENVIRONMENT) {
            self.environment = environment.parse()?;
        }
        if let Some(cert) = lookup(env::TLS_CERT).filter(|v| !v.trim().is_empty()) {
            self.tls_cert = PathBuf::from(cert);
        }
        if let Some(durability) = lookup(env::DURABILITY) {
            self.durability = durability;
        }
        Ok(self)
    }

    /// Load `healthtrack.toml` from `dir` if present, apply the process
    /// environment, and validate the result.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE_NAME);
        let config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        let config = config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Check every setting that can be checked without touching the store.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.store_uri()?;
        self.durability_mode()?;
        Ok(())
    }

    /// Parse the store URI.
    pub fn store_uri(&self) -> Result<StoreUri, ConfigError> {
        self.database_uri
            .as_deref()
            .ok_or(ConfigError::MissingStoreUri)?
            .parse()
    }

    /// Parse the durability string into a `SyncMode`.
    pub fn durability_mode(&self) -> Result<SyncMode, ConfigError> {
        match self.durability.as_str() {
            "standard" => Ok(SyncMode::Standard),
            "always" => Ok(SyncMode::Always),
            other => Err(ConfigError::InvalidDurability {
                value: other.to_string(),
            }),
        }
    }

    /// Certificate bundle, when the store URI asks for certificate mode.
    pub fn tls_identity(&self) -> Result<Option<TlsIdentity>, ConfigError> {
        if !self.store_uri()?.requires_certificate {
            return Ok(None);
        }
        TlsIdentity::load(&self.tls_cert).map(Some)
    }

    /// Should internal error detail reach clients?
    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}
