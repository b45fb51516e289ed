//! Configuration management for flushd.
//!
//! Options use the collectd plugin key names (`URL`, `Authentication`,
//! `FlushIntervalSecs`, ...). They can come from:
//! - a YAML file keyed by those names
//! - individual `key value` pairs handed over by the host agent
//! - CLI argument overrides
//!
//! `ConfigBuilder::build` validates everything and resolves the credential,
//! so a bad configuration fails before the first sample is processed.

use crate::core::{FlushdError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default location of the collectd types database
pub const DEFAULT_TYPES_DB: &str = "/usr/share/collectd/types.db";
/// Default maximum age of buffered data, in seconds
pub const DEFAULT_FLUSH_INTERVAL_SECS: u64 = 30;
/// Default number of buffered records that forces a flush
pub const DEFAULT_FLUSH_MAX_VALUES: usize = 600;
/// Default timeout of a single flush request, in seconds
pub const DEFAULT_FLUSH_TIMEOUT_SECS: u64 = 15;

/// Complete, validated configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Where and how batches are sent
    pub endpoint: EndpointConfig,
    /// When batches are sent
    pub flush: FlushConfig,
    /// Path of the types database
    pub types_db: PathBuf,
}

/// Collector endpoint configuration
#[derive(Debug, Clone)]
pub struct EndpointConfig {
    /// Collector URL
    pub url: reqwest::Url,
    /// Credential applied to every request
    pub auth: AuthCredential,
    /// Verify the collector's TLS certificate
    pub verify_ssl: bool,
    /// Bound on a single flush request
    pub timeout: Duration,
}

/// Flush thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushConfig {
    /// Flush once the oldest unflushed data is this old
    pub interval_secs: u64,
    /// Flush once this many records are buffered
    pub max_values: usize,
}

impl Default for FlushConfig {
    fn default() -> Self {
        FlushConfig {
            interval_secs: DEFAULT_FLUSH_INTERVAL_SECS,
            max_values: DEFAULT_FLUSH_MAX_VALUES,
        }
    }
}

/// A credential that must not end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wraps a secret value
    pub fn new(value: impl Into<String>) -> Self {
        Secret(value.into())
    }

    /// Returns the secret value
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// OAuth 1.0a consumer and token credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    /// Consumer (application) key
    pub app_key: String,
    /// Consumer (application) secret
    pub app_secret: Secret,
    /// Access token
    pub access_token: String,
    /// Access token secret
    pub access_token_secret: Secret,
}

/// Authentication applied to flush requests
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthCredential {
    /// No authentication header
    #[default]
    None,
    /// OAuth 1.0a request signing
    TokenPair(TokenPair),
    /// HTTP Basic authentication
    Basic {
        /// User name
        username: String,
        /// Password
        password: Secret,
    },
}

impl AuthCredential {
    /// Name of the protocol, as accepted by the `Authentication` option
    pub fn protocol(&self) -> &'static str {
        match self {
            AuthCredential::None => "none",
            AuthCredential::TokenPair(_) => "oauth",
            AuthCredential::Basic { .. } => "basic",
        }
    }
}

/// Recognized values of the `Authentication` option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthProtocol {
    /// OAuth 1.0a
    OAuth,
    /// HTTP Basic
    Basic,
}

impl std::str::FromStr for AuthProtocol {
    type Err = FlushdError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "oauth" => Ok(AuthProtocol::OAuth),
            "basic" => Ok(AuthProtocol::Basic),
            _ => Err(FlushdError::config(format!("Invalid authorization protocol '{}'", s))),
        }
    }
}

/// Raw, unvalidated options as the host agent or a config file supplies them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PluginOptions {
    /// `URL`
    #[serde(rename = "URL")]
    pub url: Option<String>,
    /// `Authentication`
    pub authentication: Option<String>,
    /// `ApplicationKey`
    pub application_key: Option<String>,
    /// `ApplicationSecret`
    pub application_secret: Option<String>,
    /// `AccessToken`
    pub access_token: Option<String>,
    /// `AccessTokenSecret`
    pub access_token_secret: Option<String>,
    /// `Username`
    pub username: Option<String>,
    /// `Password`
    pub password: Option<String>,
    /// `VerifySSL`
    #[serde(rename = "VerifySSL")]
    pub verify_ssl: Option<bool>,
    /// `TypesDB`
    #[serde(rename = "TypesDB")]
    pub types_db: Option<PathBuf>,
    /// `FlushIntervalSecs`
    pub flush_interval_secs: Option<f64>,
    /// `FlushMaxValues`
    pub flush_max_values: Option<usize>,
    /// `FlushTimeoutSecs`
    pub flush_timeout_secs: Option<u64>,
}

impl PluginOptions {
    /// Overlay every option set in `other` on top of `self`
    pub fn merge(&mut self, other: PluginOptions) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.url, other.url);
        take(&mut self.authentication, other.authentication);
        take(&mut self.application_key, other.application_key);
        take(&mut self.application_secret, other.application_secret);
        take(&mut self.access_token, other.access_token);
        take(&mut self.access_token_secret, other.access_token_secret);
        take(&mut self.username, other.username);
        take(&mut self.password, other.password);
        take(&mut self.verify_ssl, other.verify_ssl);
        take(&mut self.types_db, other.types_db);
        take(&mut self.flush_interval_secs, other.flush_interval_secs);
        take(&mut self.flush_max_values, other.flush_max_values);
        take(&mut self.flush_timeout_secs, other.flush_timeout_secs);
    }
}

/// Configuration builder
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    options: PluginOptions,
}

impl ConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        ConfigBuilder::default()
    }

    /// Load options from a YAML document, overriding what is already set
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        let options: PluginOptions = serde_yaml::from_str(yaml)
            .map_err(|e| FlushdError::config(format!("Failed to parse YAML config: {}", e)))?;
        self.options.merge(options);
        Ok(self)
    }

    /// Apply a single `key value` option as handed over by the host agent.
    ///
    /// Values that cannot be interpreted fail immediately. Unknown keys are
    /// logged and ignored.
    pub fn option(mut self, key: &str, value: &str) -> Result<Self> {
        let opts = &mut self.options;
        match key {
            "URL" => opts.url = Some(value.to_string()),
            "Authentication" => {
                value.parse::<AuthProtocol>()?;
                opts.authentication = Some(value.to_string());
            },
            "ApplicationKey" => opts.application_key = Some(value.to_string()),
            "ApplicationSecret" => opts.application_secret = Some(value.to_string()),
            "AccessToken" => opts.access_token = Some(value.to_string()),
            "AccessTokenSecret" => opts.access_token_secret = Some(value.to_string()),
            "Username" => opts.username = Some(value.to_string()),
            "Password" => opts.password = Some(value.to_string()),
            "VerifySSL" => opts.verify_ssl = Some(parse_bool(key, value)?),
            "TypesDB" => opts.types_db = Some(PathBuf::from(value)),
            "FlushIntervalSecs" => {
                let secs = value.trim().parse::<f64>().map_err(|_| {
                    FlushdError::config(format!("Invalid value for FlushIntervalSecs: '{}'", value))
                })?;
                opts.flush_interval_secs = Some(secs);
            },
            "FlushMaxValues" => opts.flush_max_values = Some(parse_number(key, value)?),
            "FlushTimeoutSecs" => opts.flush_timeout_secs = Some(parse_number(key, value)?),
            _ => tracing::warn!("Ignoring unknown configuration option '{}'", key),
        }
        Ok(self)
    }

    /// Set the collector URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.options.url = Some(url.into());
        self
    }

    /// Set the types database path
    pub fn types_db(mut self, path: PathBuf) -> Self {
        self.options.types_db = Some(path);
        self
    }

    /// Set the flush interval
    pub fn flush_interval_secs(mut self, secs: u64) -> Self {
        self.options.flush_interval_secs = Some(secs as f64);
        self
    }

    /// Set the record count that forces a flush
    pub fn flush_max_values(mut self, count: usize) -> Self {
        self.options.flush_max_values = Some(count);
        self
    }

    /// Set the flush request timeout
    pub fn flush_timeout_secs(mut self, secs: u64) -> Self {
        self.options.flush_timeout_secs = Some(secs);
        self
    }

    /// Enable or disable TLS certificate verification
    pub fn verify_ssl(mut self, verify: bool) -> Self {
        self.options.verify_ssl = Some(verify);
        self
    }

    /// Options collected so far
    pub fn options(&self) -> &PluginOptions {
        &self.options
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        let opts = self.options;

        let raw_url = opts.url.as_deref().map(str::trim).unwrap_or_default();
        if raw_url.is_empty() {
            return Err(FlushdError::config(format!("Invalid URL: '{}'", raw_url)));
        }
        let url = reqwest::Url::parse(raw_url)
            .map_err(|e| FlushdError::config(format!("Invalid URL '{}': {}", raw_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FlushdError::config(format!(
                "Unsupported URL scheme '{}', expected http or https",
                url.scheme()
            )));
        }

        let auth = match opts.authentication.as_deref() {
            None => AuthCredential::None,
            Some(name) => match name.parse::<AuthProtocol>()? {
                AuthProtocol::OAuth => AuthCredential::TokenPair(TokenPair {
                    app_key: require(&opts.application_key, "ApplicationKey", "oauth")?,
                    app_secret: Secret::new(require(
                        &opts.application_secret,
                        "ApplicationSecret",
                        "oauth",
                    )?),
                    access_token: require(&opts.access_token, "AccessToken", "oauth")?,
                    access_token_secret: Secret::new(require(
                        &opts.access_token_secret,
                        "AccessTokenSecret",
                        "oauth",
                    )?),
                }),
                AuthProtocol::Basic => AuthCredential::Basic {
                    username: require(&opts.username, "Username", "basic")?,
                    password: Secret::new(require(&opts.password, "Password", "basic")?),
                },
            },
        };

        let interval = opts
            .flush_interval_secs
            .unwrap_or(DEFAULT_FLUSH_INTERVAL_SECS as f64);
        if !interval.is_finite() || interval < 0.0 {
            return Err(FlushdError::config(format!(
                "Invalid value for FlushIntervalSecs: '{}'",
                interval
            )));
        }

        let max_values = opts.flush_max_values.unwrap_or(DEFAULT_FLUSH_MAX_VALUES);
        if max_values == 0 {
            return Err(FlushdError::config("FlushMaxValues must be greater than 0"));
        }

        let timeout_secs = opts.flush_timeout_secs.unwrap_or(DEFAULT_FLUSH_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(FlushdError::config("FlushTimeoutSecs must be greater than 0"));
        }

        Ok(Config {
            endpoint: EndpointConfig {
                url,
                auth,
                verify_ssl: opts.verify_ssl.unwrap_or(true),
                timeout: Duration::from_secs(timeout_secs),
            },
            flush: FlushConfig {
                // Fractional seconds are truncated
                interval_secs: interval.trunc() as u64,
                max_values,
            },
            types_db: opts
                .types_db
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TYPES_DB)),
        })
    }
}

fn require(value: &Option<String>, key: &str, protocol: &str) -> Result<String> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(FlushdError::config(format!(
            "{} is required when Authentication is '{}'",
            key, protocol
        ))),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(FlushdError::config(format!("Invalid boolean for {}: '{}'", key, value))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| FlushdError::config(format!("Invalid value for {}: '{}'", key, value)))
}
