/// Configuration for the API server
///
/// Loaded from environment variables, with a `.env` file read first when
/// present.
///
/// # Environment Variables
///
/// - `API_HOST`: host to bind to (default: 0.0.0.0)
/// - `API_PORT`: port to bind to (default: 8080)
/// - `DATABASE_URL`: PostgreSQL connection string; when unset the server runs
///   on the in-memory store
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `JWT_SECRET`: token signing key, at least 32 characters (required)
/// - `JWT_TTL_HOURS`: session token lifetime (default: 24)
/// - `CORS_ORIGINS`: comma-separated allowed origins (default: `*`)
/// - `PRODUCTION`: enables HSTS (default: false)
/// - `MAILER_URL`: HTTP mail relay; when unset reset mails are only logged
/// - `MAILER_FROM`: sender address for outgoing mail
/// - `RESET_URL_BASE`: page that receives `?token=` in reset mails
/// - `RUST_LOG`, `LOG_FORMAT`: read by the binary when setting up tracing
///
/// # Example
///
/// ```no_run
/// use freelacrm_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;

use anyhow::Context;
use freelacrm_shared::auth::jwt::DEFAULT_TTL_HOURS;

const MIN_SECRET_LEN: usize = 32;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,

    /// `None` selects the in-memory store
    pub database: Option<DatabaseConfig>,

    pub jwt: JwtConfig,

    pub mail: MailConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Production mode turns on HSTS
    pub production: bool,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Signing secret. Generate with `openssl rand -hex 32`.
    pub secret: String,

    pub ttl_hours: i64,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    /// HTTP relay endpoint; `None` logs messages instead
    pub relay_url: Option<String>,

    pub from: String,

    pub reset_url_base: String,
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Fails if `JWT_SECRET` is missing or short, or a numeric or boolean
    /// variable does not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(var("API_PORT"), 8080u16, "API_PORT")?;

        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let production = parse_bool(var("PRODUCTION"), "PRODUCTION")?;

        let database = match var("DATABASE_URL") {
            Some(url) => Some(DatabaseConfig {
                url,
                max_connections: parse_or(
                    var("DATABASE_MAX_CONNECTIONS"),
                    10u32,
                    "DATABASE_MAX_CONNECTIONS",
                )?,
            }),
            None => None,
        };

        let secret = var("JWT_SECRET").context("JWT_SECRET environment variable is required")?;
        if secret.len() < MIN_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {MIN_SECRET_LEN} characters long");
        }

        let ttl_hours = parse_or(var("JWT_TTL_HOURS"), DEFAULT_TTL_HOURS, "JWT_TTL_HOURS")?;
        if ttl_hours <= 0 {
            anyhow::bail!("JWT_TTL_HOURS must be positive");
        }

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                production,
            },
            database,
            jwt: JwtConfig { secret, ttl_hours },
            mail: MailConfig {
                relay_url: var("MAILER_URL"),
                from: var("MAILER_FROM").unwrap_or_else(|| "no-reply@freelacrm.app".to_string()),
                reset_url_base: var("RESET_URL_BASE")
                    .unwrap_or_else(|| "http://localhost:3000/auth/reset-password".to_string()),
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Whether any origin may call the API
    pub fn allows_any_origin(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }
}

fn parse_or<T>(value: Option<String>, default: T, key: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw}")),
        None => Ok(default),
    }
}

fn parse_bool(value: Option<String>, key: &str) -> anyhow::Result<bool> {
    match value.as_deref().map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(false),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(v) => anyhow::bail!("{key} must be a boolean, got {v}"),
    }
}
