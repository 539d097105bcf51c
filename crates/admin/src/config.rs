//! Admin panel configuration loaded from environment variables.
//!
//! ## Required
//! - `DATABASE_URL` (or `ADMIN_DATABASE_URL`) - Postgres connection string
//! - `ACCOUNT_TOKEN_SECRET` - signing secret for activation links; must
//!   match the storefront so the links it emails stay valid there
//! - `SMTP_HOST`, `SMTP_USERNAME`, `SMTP_PASSWORD` - mail relay
//!
//! ## Optional
//! - `ADMIN_HOST` (default `127.0.0.1`), `ADMIN_PORT` (default `3001`)
//! - `ADMIN_BASE_URL` (default `http://localhost:3001`)
//! - `STOREFRONT_BASE_URL` (default `http://localhost:3000`) - where
//!   activation links land
//! - `SMTP_PORT` (default `587`), `SMTP_FROM`
//! - `SENTRY_DSN`, `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`,
//!   `SENTRY_TRACES_SAMPLE_RATE`
//!
//! ## Optional (TLS)
//! - `ADMIN_TLS_CERT` - PEM-encoded certificate chain
//! - `ADMIN_TLS_KEY` - PEM-encoded private key

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

/// Runtime configuration for the admin server.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Postgres connection string (may embed credentials).
    pub database_url: SecretString,
    /// Host to bind the HTTP server to.
    pub host: String,
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Public base URL of this panel.
    pub base_url: String,
    /// Public base URL of the storefront. Activation links in mail sent
    /// from the panel open there.
    pub storefront_base_url: String,
    /// Signing secret for account activation tokens. Must match the
    /// storefront so both can issue valid links.
    pub token_secret: SecretString,
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
    /// TLS configuration for HTTPS (optional).
    pub tls: Option<TlsConfig>,
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

/// TLS configuration for HTTPS.
#[derive(Clone)]
pub struct TlsConfig {
    /// PEM-encoded certificate chain.
    pub cert_pem: String,
    /// PEM-encoded private key.
    pub key_pem: SecretString,
}

impl std::fmt::Debug for TlsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsConfig")
            .field("cert_pem", &"[CERTIFICATE]")
            .field("key_pem", &"[REDACTED]")
            .finish()
    }
}

impl TlsConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let cert_pem = get_optional_env("ADMIN_TLS_CERT");
        let key_pem = get_optional_env("ADMIN_TLS_KEY");

        match (cert_pem, key_pem) {
            (Some(cert), Some(key)) => Ok(Some(Self {
                cert_pem: cert,
                key_pem: SecretString::from(key),
            })),
            (None, None) => Ok(None),
            _ => Err(ConfigError::InvalidEnvVar {
                name: "ADMIN_TLS_*".to_string(),
                reason: "both ADMIN_TLS_CERT and ADMIN_TLS_KEY must be set together".to_string(),
            }),
        }
    }
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads `.env` via dotenvy if present (development convenience;
    /// real deployments set the environment directly).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url = get_database_url()?;
        let host = get_env_or_default("ADMIN_HOST", "127.0.0.1");
        let port = get_env_or_default("ADMIN_PORT", "3001")
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar {
                name: "ADMIN_PORT".to_string(),
                reason: "must be a valid port number".to_string(),
            })?;
        let base_url = get_env_or_default("ADMIN_BASE_URL", "http://localhost:3001");
        let storefront_base_url =
            get_env_or_default("STOREFRONT_BASE_URL", "http://localhost:3000");
        let token_secret = get_validated_secret("ACCOUNT_TOKEN_SECRET")?;

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

        let tls = TlsConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            storefront_base_url,
            token_secret,
            smtp,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
            tls,
        })
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar {
                name: "ADMIN_HOST/ADMIN_PORT".to_string(),
                reason: format!("cannot parse '{}:{}' as socket address", self.host, self.port),
            })
    }

    /// Whether the panel is served over HTTPS.
    ///
    /// Controls the `Secure` flag on session cookies.
    pub fn is_https(&self) -> bool {
        self.base_url.starts_with("https://") || self.tls.is_some()
    }
}

/// Database URL with an admin-specific override.
///
/// `ADMIN_DATABASE_URL` wins when set; otherwise the shared
/// `DATABASE_URL` is used. Both servers normally point at one database.
fn get_database_url() -> Result<SecretString, ConfigError> {
    env::var("ADMIN_DATABASE_URL")
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

    fn base_config() -> AdminConfig {
        AdminConfig {
            database_url: SecretString::from("postgres://localhost/liher_test"),
            host: "127.0.0.1".to_string(),
            port: 3001,
            base_url: "http://localhost:3001".to_string(),
            storefront_base_url: "http://localhost:3000".to_string(),
            token_secret: SecretString::from("kJ8vN2pQ7wX4mR9sT6yU3bC5dF1gH0aZ"),
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
            tls: None,
        }
    }

    #[test]
    fn socket_addr_combines_host_and_port() {
        let config = base_config();
        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "127.0.0.1:3001");
    }

    #[test]
    fn is_https_detects_scheme() {
        let mut config = base_config();
        assert!(!config.is_https());
        config.base_url = "https://admin.liherfashion.co".to_string();
        assert!(config.is_https());
    }

    #[test]
    fn is_https_with_tls_material() {
        let mut config = base_config();
        config.tls = Some(TlsConfig {
            cert_pem: "---".to_string(),
            key_pem: SecretString::from("---"),
        });
        assert!(config.is_https());
    }

    #[test]
    fn smtp_debug_redacts_password() {
        let config = base_config();
        let debug = format!("{:?}", config.smtp);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn tls_debug_redacts_material() {
        let tls = TlsConfig {
            cert_pem: "CERTDATA".to_string(),
            key_pem: SecretString::from("KEYDATA"),
        };
        let debug = format!("{tls:?}");
        assert!(!debug.contains("CERTDATA"));
        assert!(!debug.contains("KEYDATA"));
    }
}
