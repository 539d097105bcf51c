//! Storefront configuration loaded from environment variables.

use secrecy::SecretString;
use std::env;
use std::net::SocketAddr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for environment variable {name}: {reason}")]
    InvalidEnvVar { name: String, reason: String },

    #[error("Insecure secret in {name}: {reason}")]
    InsecureSecret { name: String, reason: String },
}

/// Runtime configuration for the storefront server.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Postgres connection string (may embed credentials).
    pub database_url: SecretString,
    /// Host to bind the HTTP server to.
    pub host: String,
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Public base URL of the storefront (used for payment return URLs
    /// and links in account emails).
    pub base_url: String,
    /// Base URL of the admin server, for redirecting staff logins.
    pub admin_base_url: String,
    /// Signing secret for account activation and password reset tokens.
    /// Must match the admin server so both can issue valid links.
    pub token_secret: SecretString,
    /// Mercado Pago API credentials.
    pub mercado_pago: MercadoPagoConfig,
    /// SMTP relay used for account emails.
    pub smtp: SmtpConfig,
    /// Sentry DSN for error tracking (disabled when unset).
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag (e.g. "production", "staging").
    pub sentry_environment: String,
    /// Sentry error sample rate (0.0 to 1.0).
    pub sentry_sample_rate: f32,
    /// Sentry trace sample rate (0.0 to 1.0).
    pub sentry_traces_sample_rate: f32,
}

/// Mercado Pago credentials.
#[derive(Clone)]
pub struct MercadoPagoConfig {
    /// Private access token used for server-side API calls.
    pub access_token: SecretString,
    /// Public key rendered into the checkout page for the JS SDK.
    pub public_key: String,
}

impl std::fmt::Debug for MercadoPagoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MercadoPagoConfig")
            .field("access_token", &"[REDACTED]")
            .field("public_key", &self.public_key)
            .finish()
    }
}

/// SMTP relay configuration for transactional email.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: SecretString,
    /// From address for outgoing mail, e.g. `Liher Fashion <no-reply@liherfashion.co>`.
    pub from_address: String,
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("from_address", &self.from_address)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads `.env` via dotenvy if present (development convenience;
    /// real deployments set the environment directly).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url = get_database_url()?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1");
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar {
                name: "STOREFRONT_PORT".to_string(),
                reason: "must be a valid port number".to_string(),
            })?;
        let base_url = get_env_or_default("STOREFRONT_BASE_URL", "http://localhost:3000");
        let admin_base_url = get_env_or_default("ADMIN_BASE_URL", "http://localhost:3001");
        let token_secret = get_validated_secret("ACCOUNT_TOKEN_SECRET")?;

        let mercado_pago = MercadoPagoConfig {
            access_token: SecretString::from(get_required_env("MP_ACCESS_TOKEN")?),
            public_key: get_required_env("MP_PUBLIC_KEY")?,
        };

        let smtp = SmtpConfig {
            host: get_required_env("SMTP_HOST")?,
            port: get_env_or_default("SMTP_PORT", "587").parse().map_err(|_| {
                ConfigError::InvalidEnvVar {
                    name: "SMTP_PORT".to_string(),
                    reason: "must be a valid port number".to_string(),
                }
            })?,
            username: get_required_env("SMTP_USERNAME")?,
            password: SecretString::from(get_required_env("SMTP_PASSWORD")?),
            from_address: get_env_or_default(
                "SMTP_FROM",
                "Liher Fashion <no-reply@liherfashion.co>",
            ),
        };

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_env_or_default("SENTRY_ENVIRONMENT", "development");
        let sentry_sample_rate = get_env_or_default("SENTRY_SAMPLE_RATE", "1.0")
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar {
                name: "SENTRY_SAMPLE_RATE".to_string(),
                reason: "must be a float between 0.0 and 1.0".to_string(),
            })?;
        let sentry_traces_sample_rate = get_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.1")
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar {
                name: "SENTRY_TRACES_SAMPLE_RATE".to_string(),
                reason: "must be a float between 0.0 and 1.0".to_string(),
            })?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            admin_base_url,
            token_secret,
            mercado_pago,
            smtp,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar {
                name: "STOREFRONT_HOST/STOREFRONT_PORT".to_string(),
                reason: format!("cannot parse '{}:{}' as socket address", self.host, self.port),
            })
    }

    /// Whether the public base URL is served over HTTPS.
    ///
    /// Controls the `Secure` flag on session cookies.
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

/// Database URL with a storefront-specific override.
///
/// `STOREFRONT_DATABASE_URL` wins when set; otherwise the shared
/// `DATABASE_URL` is used. Both servers normally point at one database.
fn get_database_url() -> Result<SecretString, ConfigError> {
    env::var("STOREFRONT_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))
}

fn get_required_env(name: &str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn get_optional_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn get_env_or_default(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// Read a secret from the environment and reject weak or placeholder values.
fn get_validated_secret(name: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(name)?;
    liher_core::secrets::validate_strength(&value).map_err(|e| ConfigError::InsecureSecret {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> StorefrontConfig {
        StorefrontConfig {
            database_url: SecretString::from("postgres://localhost/liher_test"),
            host: "127.0.0.1".to_string(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            admin_base_url: "http://localhost:3001".to_string(),
            token_secret: SecretString::from("kJ8vN2pQ7wX4mR9sT6yU3bC5dF1gH0aZ"),
            mercado_pago: MercadoPagoConfig {
                access_token: SecretString::from("APP_USR-1234"),
                public_key: "APP_USR-pub".to_string(),
            },
            smtp: SmtpConfig {
                host: "smtp.example.com".to_string(),
                port: 587,
                username: "mailer".to_string(),
                password: SecretString::from("hunter2hunter2"),
                from_address: "Liher Fashion <no-reply@liherfashion.co>".to_string(),
            },
            sentry_dsn: None,
            sentry_environment: "test".to_string(),
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.1,
        }
    }

    #[test]
    fn socket_addr_combines_host_and_port() {
        let config = base_config();
        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn socket_addr_rejects_invalid_host() {
        let mut config = base_config();
        config.host = "not a host".to_string();
        assert!(config.socket_addr().is_err());
    }

    #[test]
    fn is_https_detects_scheme() {
        let mut config = base_config();
        assert!(!config.is_https());
        config.base_url = "https://liherfashion.co".to_string();
        assert!(config.is_https());
    }

    #[test]
    fn mercado_pago_debug_redacts_token() {
        let config = base_config();
        let debug = format!("{:?}", config.mercado_pago);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("APP_USR-1234"));
        assert!(debug.contains("APP_USR-pub"));
    }

    #[test]
    fn smtp_debug_redacts_password() {
        let config = base_config();
        let debug = format!("{:?}", config.smtp);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }
}
