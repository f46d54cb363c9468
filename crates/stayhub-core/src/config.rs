//! Application configuration
//!
//! This module provides centralized configuration management using the `config` crate.
//! Configuration can be loaded from environment variables and config files.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub paystack: PaystackConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub booking: BookingConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of worker threads
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Comma-separated list of allowed CORS origins
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_workers() -> usize {
    num_cpus::get()
}

fn default_timeout() -> u64 {
    30
}

fn default_cors_origins() -> String {
    "http://localhost:3000,http://127.0.0.1:3000".to_string()
}

/// Database configuration
#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Idle connection timeout in seconds
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    2
}

fn default_acquire_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

/// Authentication configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// JWT signing secret (HS256)
    pub jwt_secret: String,

    /// JWT token expiration in minutes
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_minutes: i64,
}

fn default_jwt_expiration() -> i64 {
    1000
}

/// Paystack payment gateway configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PaystackConfig {
    /// Secret API key, sent as a Bearer token
    #[serde(default)]
    pub secret_key: String,

    /// API base URL
    #[serde(default = "default_paystack_base_url")]
    pub base_url: String,

    /// Where Paystack redirects the guest after checkout
    #[serde(default)]
    pub callback_url: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default = "default_paystack_timeout")]
    pub timeout_secs: u64,

    /// ISO 4217 currency code of booking prices
    #[serde(default = "default_currency")]
    pub currency: String,
}

fn default_paystack_base_url() -> String {
    "https://api.paystack.co".to_string()
}

fn default_paystack_timeout() -> u64 {
    30
}

fn default_currency() -> String {
    "NGN".to_string()
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self {
            secret_key: String::new(),
            base_url: default_paystack_base_url(),
            callback_url: None,
            timeout_secs: default_paystack_timeout(),
            currency: default_currency(),
        }
    }
}

/// Outbound email configuration
#[derive(Debug, Deserialize, Clone)]
pub struct EmailConfig {
    /// Send real mail over SMTP; when false notifications are only logged
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_smtp_server")]
    pub smtp_server: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub smtp_username: String,

    #[serde(default)]
    pub smtp_password: String,

    #[serde(default = "default_from_email")]
    pub from_email: String,

    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// SMTP command timeout in seconds
    #[serde(default = "default_smtp_timeout")]
    pub timeout_secs: u64,
}

fn default_smtp_server() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_email() -> String {
    "no-reply@stayhub.local".to_string()
}

fn default_from_name() -> String {
    "StayHub".to_string()
}

fn default_smtp_timeout() -> u64 {
    15
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            smtp_server: default_smtp_server(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: default_from_email(),
            from_name: default_from_name(),
            timeout_secs: default_smtp_timeout(),
        }
    }
}

/// Booking and search configuration
#[derive(Debug, Deserialize, Clone)]
pub struct BookingConfig {
    /// "Near me" radius when the caller gives none, in meters
    #[serde(default = "default_search_radius")]
    pub default_search_radius_m: f64,

    /// Search page size when the caller gives none
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,
}

fn default_search_radius() -> f64 {
    10_000.0
}

fn default_page_size() -> i64 {
    10
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            default_search_radius_m: default_search_radius(),
            default_page_size: default_page_size(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and optional config file
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.workers", num_cpus::get() as i64)?
            .set_default("server.timeout_secs", 30)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("auth.jwt_expiration_minutes", 1000)?
            .set_default("paystack.base_url", "https://api.paystack.co")?
            .set_default("paystack.timeout_secs", 30)?
            .set_default("paystack.currency", "NGN")?
            .set_default("email.enabled", false)?
            .set_default("email.smtp_server", "smtp.gmail.com")?
            .set_default("email.smtp_port", 587)?
            .set_default("booking.default_search_radius_m", 10_000.0)?
            .set_default("booking.default_page_size", 10)?
            // Load config file if exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Load from environment variables with STAYHUB_ prefix
            .add_source(
                Environment::with_prefix("STAYHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(Environment::with_prefix("STAYHUB").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Get the server bind address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
