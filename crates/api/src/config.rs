use std::str::FromStr;

use pymeauth_core::registration::DEFAULT_MIN_PASSWORD_LENGTH;

use crate::auth::jwt::{JwtConfig, DEFAULT_ACCESS_EXPIRY_MINS};
use crate::auth::password::{
    PasswordConfig, DEFAULT_ITERATIONS, DEFAULT_MEMORY_KIB, DEFAULT_PARALLELISM,
};

/// Default maximum size of the database connection pool.
const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 20;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has an invalid value: {value:?}")]
    Invalid { var: &'static str, value: String },
}

/// Settings of the authentication boundary.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Minimum password length in characters (default: 8).
    pub min_password_length: usize,
    /// Append a `REGISTER_FAILURE` entry when a registration is rejected for
    /// a taken email (default: false).
    pub audit_failed_registrations: bool,
    /// Argon2 cost for new password hashes.
    pub password: PasswordConfig,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            min_password_length: DEFAULT_MIN_PASSWORD_LENGTH,
            audit_failed_registrations: false,
            password: PasswordConfig::default(),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields except the database URL and the JWT secret have defaults
/// suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub database_url: String,
    /// Connection pool size (default: `20`).
    pub database_max_connections: u32,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    pub auth: AuthConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `HOST`                       | `0.0.0.0`               |
    /// | `PORT`                       | `3000`                  |
    /// | `CORS_ORIGINS`               | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                    |
    /// | `DATABASE_URL`               | **required**            |
    /// | `DATABASE_MAX_CONNECTIONS`   | `20`                    |
    /// | `JWT_SECRET`                 | **required**            |
    /// | `JWT_ACCESS_EXPIRY_MINS`     | `15`                    |
    /// | `MIN_PASSWORD_LENGTH`        | `8`                     |
    /// | `AUDIT_FAILED_REGISTRATIONS` | `false`                 |
    /// | `ARGON2_MEMORY_KIB`          | `19456`                 |
    /// | `ARGON2_ITERATIONS`          | `2`                     |
    /// | `ARGON2_PARALLELISM`         | `1`                     |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = parse_or(&lookup, "PORT", 3000u16)?;

        let cors_origins: Vec<String> = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", 30u64)?;

        let database_url = required(&lookup, "DATABASE_URL")?;
        let database_max_connections = parse_or(
            &lookup,
            "DATABASE_MAX_CONNECTIONS",
            DEFAULT_DATABASE_MAX_CONNECTIONS,
        )?;

        let jwt = JwtConfig {
            secret: required(&lookup, "JWT_SECRET")?,
            access_token_expiry_mins: parse_or(
                &lookup,
                "JWT_ACCESS_EXPIRY_MINS",
                DEFAULT_ACCESS_EXPIRY_MINS,
            )?,
        };

        let auth = AuthConfig {
            min_password_length: parse_or(
                &lookup,
                "MIN_PASSWORD_LENGTH",
                DEFAULT_MIN_PASSWORD_LENGTH,
            )?,
            audit_failed_registrations: parse_or(&lookup, "AUDIT_FAILED_REGISTRATIONS", false)?,
            password: PasswordConfig {
                memory_kib: parse_or(&lookup, "ARGON2_MEMORY_KIB", DEFAULT_MEMORY_KIB)?,
                iterations: parse_or(&lookup, "ARGON2_ITERATIONS", DEFAULT_ITERATIONS)?,
                parallelism: parse_or(&lookup, "ARGON2_PARALLELISM", DEFAULT_PARALLELISM)?,
            },
        };

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database_url,
            database_max_connections,
            jwt,
            auth,
        })
    }
}

/// A variable that must be present and non-empty.
fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
{
    lookup(var)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(var))
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&'static str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let map: HashMap<&'static str, String> =
            pairs.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |var| map.get(var).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("DATABASE_URL", "postgres://localhost/pymeauth"),
        ("JWT_SECRET", "s3cret"),
    ];

    #[test]
    fn defaults_apply() {
        let config = ServerConfig::from_lookup(lookup_from(&REQUIRED)).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.cors_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.database_max_connections, 20);
        assert_eq!(config.jwt.access_token_expiry_mins, 15);
        assert_eq!(config.auth.min_password_length, 8);
        assert!(!config.auth.audit_failed_registrations);
        assert_eq!(config.auth.password, PasswordConfig::default());
    }

    #[test]
    fn overrides_are_parsed() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("PORT", "8080"),
            ("CORS_ORIGINS", "https://a.example, https://b.example,"),
            ("AUDIT_FAILED_REGISTRATIONS", "true"),
            ("MIN_PASSWORD_LENGTH", "12"),
            ("ARGON2_ITERATIONS", "3"),
        ]);
        let config = ServerConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(
            config.cors_origins,
            vec!["https://a.example", "https://b.example"]
        );
        assert!(config.auth.audit_failed_registrations);
        assert_eq!(config.auth.min_password_length, 12);
        assert_eq!(config.auth.password.iterations, 3);
    }

    #[test]
    fn missing_secret_is_an_error() {
        let lookup = lookup_from(&[("DATABASE_URL", "postgres://localhost/pymeauth")]);
        assert_matches!(
            ServerConfig::from_lookup(lookup),
            Err(ConfigError::Missing("JWT_SECRET"))
        );
    }

    #[test]
    fn empty_database_url_is_missing() {
        let lookup = lookup_from(&[("DATABASE_URL", "  "), ("JWT_SECRET", "x")]);
        assert_matches!(
            ServerConfig::from_lookup(lookup),
            Err(ConfigError::Missing("DATABASE_URL"))
        );
    }

    #[test]
    fn malformed_number_is_invalid() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORT", "eighty"));
        assert_matches!(
            ServerConfig::from_lookup(lookup_from(&pairs)),
            Err(ConfigError::Invalid { var: "PORT", .. })
        );
    }
}
