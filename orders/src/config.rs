//! Configuration for the storefront server.
//!
//! Loads settings from environment variables with sensible defaults.
//! [`Config::from_lookup`] takes any key lookup so tests can supply values
//! without touching the process environment.

use axum::http::HeaderValue;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use storefront_core::pricing::{MAX_TAX_RATE_BPS, PricingConfig};
use storefront_core::retry::RetryPolicy;
use storefront_core::types::{Money, Principal};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("Invalid value for {key}: {value:?}")]
    Invalid {
        /// Environment variable name
        key: &'static str,
        /// Raw value
        value: String,
    },
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Checkout rules and store limits
    pub checkout: CheckoutConfig,
    /// Static bearer tokens
    pub auth: AuthConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Prometheus exporter port
    pub metrics_port: u16,
    /// Graceful shutdown timeout (seconds)
    pub shutdown_timeout: u64,
    /// Browser origins allowed by CORS; `*` allows any. Empty sends no CORS headers.
    pub cors_origins: Vec<HeaderValue>,
}

/// `PostgreSQL` configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection URL. `None` runs the server on seeded in-memory stores.
    pub url: Option<String>,
    /// Maximum pool connections
    pub max_connections: u32,
    /// Connection timeout (seconds)
    pub connect_timeout: u64,
}

/// Checkout configuration
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Upper bound on every store call (milliseconds)
    pub store_timeout_ms: u64,
    /// Retries after a stock version conflict
    pub stock_retry_attempts: usize,
    /// Tax and shipping rules
    pub pricing: PricingConfig,
}

/// Authentication configuration
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// Bearer token to principal
    pub tokens: HashMap<String, Principal>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a variable is unparseable or out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a variable is unparseable or out of range.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let free_shipping_threshold = match env.get("FREE_SHIPPING_THRESHOLD_CENTS") {
            None => Some(Money::from_cents(10_000)),
            Some(raw) if raw.is_empty() || raw.eq_ignore_ascii_case("none") => None,
            Some(raw) => Some(parse_cents("FREE_SHIPPING_THRESHOLD_CENTS", &raw)?),
        };

        let tax_rate_bps: u32 = env.parse_or("TAX_RATE_BPS", 1500)?;
        if tax_rate_bps > MAX_TAX_RATE_BPS {
            return Err(ConfigError::Invalid {
                key: "TAX_RATE_BPS",
                value: tax_rate_bps.to_string(),
            });
        }
        let flat_shipping = env
            .get("SHIPPING_FLAT_CENTS")
            .map_or(Ok(Money::from_cents(1000)), |raw| {
                parse_cents("SHIPPING_FLAT_CENTS", &raw)
            })?;

        Ok(Self {
            server: ServerConfig {
                host: env.get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: env.parse_or("PORT", 8080)?,
                metrics_port: env.parse_or("METRICS_PORT", 9090)?,
                shutdown_timeout: env.parse_or("SHUTDOWN_TIMEOUT", 30)?,
                cors_origins: env
                    .get("CORS_ALLOWED_ORIGINS")
                    .map_or_else(|| Ok(Vec::new()), |raw| parse_origins(&raw))?,
            },
            database: DatabaseConfig {
                url: env.get("DATABASE_URL").filter(|url| !url.is_empty()),
                max_connections: env.parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
                connect_timeout: env.parse_or("DATABASE_CONNECT_TIMEOUT", 30)?,
            },
            checkout: CheckoutConfig {
                store_timeout_ms: env.parse_or("STORE_TIMEOUT_MS", 5000)?,
                stock_retry_attempts: env.parse_or("STOCK_RETRY_ATTEMPTS", 5)?,
                pricing: PricingConfig {
                    tax_rate_bps,
                    flat_shipping,
                    free_shipping_threshold,
                    shipping_overrides: env
                        .get("SHIPPING_RATES")
                        .map_or_else(|| Ok(HashMap::new()), |raw| parse_shipping_rates(&raw))?,
                },
            },
            auth: AuthConfig {
                tokens: env
                    .get("AUTH_TOKENS")
                    .map_or_else(|| Ok(HashMap::new()), |raw| parse_auth_tokens(&raw))?,
            },
        })
    }

    /// Socket address string for the HTTP server
    #[must_use]
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Socket address string for the metrics exporter
    #[must_use]
    pub fn metrics_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.metrics_port)
    }

    /// Graceful shutdown timeout
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.server.shutdown_timeout)
    }
}

impl CheckoutConfig {
    /// Upper bound on every store call
    #[must_use]
    pub const fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Backoff policy for stock reservation conflicts
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::builder()
            .max_retries(self.stock_retry_attempts)
            .build()
    }
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            store_timeout_ms: 5000,
            stock_retry_attempts: 5,
            pricing: PricingConfig::default(),
        }
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).map(|value| value.trim().to_string())
    }

    fn parse_or<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        self.get(key)
            .map_or(Ok(default), |raw| parse_value(key, &raw))
    }
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}

/// Parses a non-negative amount in cents.
fn parse_cents(key: &'static str, raw: &str) -> Result<Money, ConfigError> {
    let cents: i64 = parse_value(key, raw)?;
    if cents < 0 {
        return Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
        });
    }
    Ok(Money::from_cents(cents))
}

/// Parses `CC=cents,CC=cents` into uppercase country keys.
fn parse_shipping_rates(raw: &str) -> Result<HashMap<String, Money>, ConfigError> {
    entries(raw)
        .map(|entry| {
            let (country, cents) = entry.split_once('=').ok_or_else(|| ConfigError::Invalid {
                key: "SHIPPING_RATES",
                value: entry.to_string(),
            })?;
            let country = country.trim().to_uppercase();
            if country.is_empty() {
                return Err(ConfigError::Invalid {
                    key: "SHIPPING_RATES",
                    value: entry.to_string(),
                });
            }
            Ok((country, parse_cents("SHIPPING_RATES", cents.trim())?))
        })
        .collect()
}

/// Parses `https://a.example,https://b.example` (or `*`).
fn parse_origins(raw: &str) -> Result<Vec<HeaderValue>, ConfigError> {
    entries(raw)
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| ConfigError::Invalid {
                key: "CORS_ALLOWED_ORIGINS",
                value: origin.to_string(),
            })
        })
        .collect()
}

/// Parses `token=user_id[:admin],...`.
fn parse_auth_tokens(raw: &str) -> Result<HashMap<String, Principal>, ConfigError> {
    entries(raw)
        .map(|entry| {
            let invalid = || ConfigError::Invalid {
                key: "AUTH_TOKENS",
                value: entry.to_string(),
            };
            let (token, subject) = entry.split_once('=').ok_or_else(invalid)?;
            let (user_id, is_admin) = match subject.split_once(':') {
                Some((user_id, "admin")) => (user_id, true),
                Some(_) => return Err(invalid()),
                None => (subject, false),
            };
            let (token, user_id) = (token.trim(), user_id.trim());
            if token.is_empty() || user_id.is_empty() {
                return Err(invalid());
            }
            let principal = if is_admin {
                Principal::admin(user_id)
            } else {
                Principal::user(user_id)
            };
            Ok((token.to_string(), principal))
        })
        .collect()
}

fn entries(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|entry| !entry.is_empty())
}
