//! Application configuration loaded from environment variables.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;

use crate::api::RateLimitConfig;
use crate::app::WorkerConfig;
use crate::domain::ConfigError;
use crate::infra::{ClientCredentials, JwtConfig, LogFormat, WebSearchConfig};

const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:8080";

/// Everything `main` needs to wire the application together.
#[derive(Debug)]
pub struct AppConfig {
    pub database_url: SecretString,
    pub server_addr: SocketAddr,
    pub run_migrations: bool,
    pub log_format: LogFormat,
    pub web_search: WebSearchConfig,
    pub worker: WorkerConfig,
    pub rate_limit: RateLimitConfig,
    /// `None` disables bearer authentication entirely.
    pub jwt: Option<JwtConfig>,
    /// `None` disables the token endpoint.
    pub client_credentials: Option<ClientCredentials>,
}

impl AppConfig {
    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Blank values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let database_url = get("DATABASE_URL")
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

        let server_addr = parse_or(&get, "SERVER_ADDR", || {
            SocketAddr::from_str(DEFAULT_SERVER_ADDR)
                .map_err(|e| ConfigError::ParseError(e.to_string()))
        })?;
        let run_migrations = parse_bool(&get, "RUN_MIGRATIONS", true)?;
        let log_format = match get("LOG_FORMAT") {
            Some(value) => value.parse()?,
            None => LogFormat::default(),
        };

        let defaults = WebSearchConfig::default();
        let web_search = WebSearchConfig {
            user_agent: get("DUCKAI_USER_AGENT").unwrap_or(defaults.user_agent),
            wikipedia_base_url: get("DUCKAI_WIKIPEDIA_BASE_URL")
                .unwrap_or(defaults.wikipedia_base_url),
            joke_url: get("DUCKAI_JOKE_BASE_URL").unwrap_or(defaults.joke_url),
            openlibrary_search_url: get("DUCKAI_OPENLIBRARY_SEARCH_URL")
                .unwrap_or(defaults.openlibrary_search_url),
            openlibrary_cover_url: get("DUCKAI_OPENLIBRARY_COVER_URL")
                .unwrap_or(defaults.openlibrary_cover_url),
            min_interval: millis(&get, "DUCKAI_RATE_LIMIT_MS", defaults.min_interval)?,
            connect_timeout: millis(
                &get,
                "DUCKAI_HTTP_CONNECT_TIMEOUT_MS",
                defaults.connect_timeout,
            )?,
            read_timeout: millis(&get, "DUCKAI_HTTP_READ_TIMEOUT_MS", defaults.read_timeout)?,
        };

        let reload_secs: u64 = parse_or(&get, "SCENARIO_RELOAD_INTERVAL_SECS", || Ok(300))?;
        if reload_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "SCENARIO_RELOAD_INTERVAL_SECS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        let worker = WorkerConfig {
            reload_interval: Duration::from_secs(reload_secs),
            ..WorkerConfig::default()
        };

        let rate_limit = RateLimitConfig {
            general_rps: positive(&get, "RATE_LIMIT_RPS", 10)?,
            general_burst: positive(&get, "RATE_LIMIT_BURST", 20)?,
            trust_forwarded_headers: parse_bool(&get, "RATE_LIMIT_TRUST_PROXY", false)?,
            ..RateLimitConfig::default()
        };

        let jwt = match get("JWT_SECRET") {
            Some(secret) => {
                let mut jwt = JwtConfig::new(SecretString::from(secret));
                if let Some(issuer) = get("JWT_ISSUER") {
                    jwt.issuer = issuer;
                }
                let expires: u64 = parse_or(&get, "JWT_EXPIRES_SECS", || Ok(3600))?;
                jwt.expires_in = Duration::from_secs(expires);
                Some(jwt)
            }
            None => None,
        };

        let client_credentials = match (get("AUTH_CLIENT_ID"), get("AUTH_CLIENT_SECRET")) {
            (Some(id), Some(secret)) => {
                Some(ClientCredentials::new(id, SecretString::from(secret)))
            }
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::MissingEnvVar("AUTH_CLIENT_SECRET".to_string()));
            }
            (None, Some(_)) => {
                return Err(ConfigError::MissingEnvVar("AUTH_CLIENT_ID".to_string()));
            }
        };

        Ok(Self {
            database_url,
            server_addr,
            run_migrations,
            log_format,
            web_search,
            worker,
            rate_limit,
            jwt,
            client_credentials,
        })
    }
}

fn parse_or<G, T, D>(get: &G, key: &str, default: D) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
    D: FnOnce() -> Result<T, ConfigError>,
{
    match get(key) {
        Some(raw) => raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{raw}': {e}"),
        }),
        None => default(),
    }
}

fn parse_bool<G>(get: &G, key: &str, default: bool) -> Result<bool, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key).map(|v| v.to_ascii_lowercase()).as_deref() {
        None => Ok(default),
        Some("true" | "1" | "yes" | "on") => Ok(true),
        Some("false" | "0" | "no" | "off") => Ok(false),
        Some(other) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got '{other}'"),
        }),
    }
}

fn millis<G>(get: &G, key: &str, default: Duration) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let ms: u64 = parse_or(get, key, || Ok(default.as_millis() as u64))?;
    Ok(Duration::from_millis(ms))
}

fn positive<G>(get: &G, key: &str, default: u32) -> Result<u32, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let value: u32 = parse_or(get, key, || Ok(default))?;
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}
