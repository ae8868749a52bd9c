use serde::Serialize;
use std::str::FromStr;

/// Application configuration, read from the environment (and `.env` if present)
#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    /// Title shown in the welcome document
    pub project_name: String,

    /// PostgreSQL connection URL; `None` selects the in-memory store
    #[serde(skip_serializing)]
    pub database_url: Option<String>,

    /// Maximum number of pooled connections
    pub pool_max_size: u32,

    /// Address the HTTP server binds to
    pub bind_addr: String,

    /// Allowed CORS origins; empty disables the CORS layer
    pub cors_origins: Vec<String>,

    /// Enables diagnostic endpoints
    pub debug: bool,

    /// Apply embedded migrations at startup
    pub run_migrations: bool,

    /// Insert sample companies into an empty store at startup
    pub seed_sample_data: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            project_name: default_project_name(),
            database_url: None,
            pool_max_size: default_pool_max_size(),
            bind_addr: default_bind_addr(),
            cors_origins: Vec::new(),
            debug: false,
            run_migrations: true,
            seed_sample_data: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from process environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key/value source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            project_name: lookup("PROJECT_NAME").unwrap_or(defaults.project_name),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            pool_max_size: parse_or(&lookup, "DB_POOL_MAX_SIZE", defaults.pool_max_size),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            cors_origins: lookup("BACKEND_CORS_ORIGINS")
                .map(|raw| parse_origins(&raw))
                .unwrap_or_default(),
            debug: flag_or(&lookup, "DEBUG", defaults.debug),
            run_migrations: flag_or(&lookup, "RUN_MIGRATIONS", defaults.run_migrations),
            seed_sample_data: flag_or(&lookup, "SEED_SAMPLE_DATA", defaults.seed_sample_data),
        }
    }
}

/// Split a comma-separated origin list, accepting a JSON-style `["a","b"]` form too
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.trim()
        .trim_start_matches('[')
        .trim_end_matches(']')
        .split(',')
        .map(|origin| origin.trim().trim_matches('"').trim_end_matches('/'))
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Debug,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value {:?} for {}, using {:?}", raw, key, default);
            default
        }),
        None => default,
    }
}

/// Accepts true/false, 1/0, yes/no and on/off in any case
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "y" | "on" => Some(true),
        "false" | "0" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

fn flag_or<F>(lookup: &F, key: &str, default: bool) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => parse_flag(&raw).unwrap_or_else(|| {
            tracing::warn!("Invalid value {:?} for {}, using {}", raw, key, default);
            default
        }),
        None => default,
    }
}

// Default value functions
fn default_project_name() -> String {
    "Investment AI Companion".to_string()
}

fn default_pool_max_size() -> u32 {
    10
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}
