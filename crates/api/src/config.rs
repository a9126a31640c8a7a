//! Process configuration read from the environment.

use std::net::SocketAddr;
use std::time::Duration as StdDuration;

use thiserror::Error;

use rxconsole_observability::LogFormat;

/// Used when `SESSION_SECRET` is unset. `main` warns loudly about it.
pub const DEV_SESSION_SECRET: &str = "rxconsole-dev-session-secret";

const DEFAULT_SESSION_TTL_SECS: i64 = 86_400;
const DEFAULT_SESSION_SWEEP_SECS: u64 = 300;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
/// Upper bound for `SESSION_TTL_SECS` and `SESSION_SWEEP_SECS` (ten years).
pub const MAX_INTERVAL_SECS: i64 = 10 * 365 * 86_400;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("DATABASE_URL is required (postgres://... or memory://)")]
    MissingDatabaseUrl,

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            reason: reason.into(),
        }
    }
}

/// Where accounts and sessions live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Volatile, single-process store. Selected by `memory://`.
    Memory,
    Postgres { url: String, max_connections: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HasherKind {
    Argon2,
    /// Unsalted SHA-256. Only for compatibility with legacy digests and fast tests.
    Sha256,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub storage: StorageBackend,
    pub session_secret: String,
    pub session_ttl: chrono::Duration,
    pub session_sweep: StdDuration,
    pub bind_addr: SocketAddr,
    pub password_hasher: HasherKind,
    pub log_format: LogFormat,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::MissingDatabaseUrl)?;
        let max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(raw) => parse_positive::<u32>("DATABASE_MAX_CONNECTIONS", &raw)?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        let storage = parse_storage(&database_url, max_connections)?;

        let session_ttl_secs = match get("SESSION_TTL_SECS") {
            Some(raw) => parse_interval("SESSION_TTL_SECS", &raw)?,
            None => DEFAULT_SESSION_TTL_SECS,
        };
        let session_ttl = chrono::Duration::try_seconds(session_ttl_secs)
            .ok_or_else(|| ConfigError::invalid("SESSION_TTL_SECS", "out of range"))?;
        let session_sweep_secs = match get("SESSION_SWEEP_SECS") {
            Some(raw) => parse_interval("SESSION_SWEEP_SECS", &raw)?.unsigned_abs(),
            None => DEFAULT_SESSION_SWEEP_SECS,
        };

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("BIND_ADDR", e.to_string()))?;

        let password_hasher = match get("PASSWORD_HASHER").as_deref().map(str::trim) {
            None | Some("argon2") => HasherKind::Argon2,
            Some("sha256") => HasherKind::Sha256,
            Some(other) => {
                return Err(ConfigError::invalid(
                    "PASSWORD_HASHER",
                    format!("'{other}' (expected argon2 or sha256)"),
                ));
            }
        };

        let log_format = match get("LOG_FORMAT") {
            Some(raw) => raw
                .parse::<LogFormat>()
                .map_err(|reason| ConfigError::invalid("LOG_FORMAT", reason))?,
            None => LogFormat::default(),
        };

        Ok(Self {
            storage,
            session_secret: get("SESSION_SECRET").unwrap_or_else(|| DEV_SESSION_SECRET.to_string()),
            session_ttl,
            session_sweep: StdDuration::from_secs(session_sweep_secs),
            bind_addr,
            password_hasher,
            log_format,
        })
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.session_secret == DEV_SESSION_SECRET
    }
}

fn parse_storage(url: &str, max_connections: u32) -> Result<StorageBackend, ConfigError> {
    let url = url.trim();
    if url == "memory://" {
        return Ok(StorageBackend::Memory);
    }
    if url.starts_with("postgres://") || url.starts_with("postgresql://") {
        return Ok(StorageBackend::Postgres {
            url: url.to_string(),
            max_connections,
        });
    }
    Err(ConfigError::invalid(
        "DATABASE_URL",
        "expected a postgres:// URL or memory://",
    ))
}

fn parse_positive<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: core::str::FromStr + PartialOrd + Default,
{
    match raw.trim().parse::<T>() {
        Ok(v) if v > T::default() => Ok(v),
        _ => Err(ConfigError::invalid(var, format!("'{raw}' is not a positive integer"))),
    }
}

/// A positive number of seconds no larger than [`MAX_INTERVAL_SECS`].
fn parse_interval(var: &'static str, raw: &str) -> Result<i64, ConfigError> {
    let secs = parse_positive::<i64>(var, raw)?;
    if secs > MAX_INTERVAL_SECS {
        return Err(ConfigError::invalid(
            var,
            format!("'{raw}' exceeds the maximum of {MAX_INTERVAL_SECS} seconds"),
        ));
    }
    Ok(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(move |k| map.get(k).cloned())
    }

    #[test]
    fn missing_database_url_is_fatal() {
        assert_eq!(settings(&[]).unwrap_err(), ConfigError::MissingDatabaseUrl);
        assert_eq!(
            settings(&[("DATABASE_URL", "  ")]).unwrap_err(),
            ConfigError::MissingDatabaseUrl
        );
    }

    #[test]
    fn defaults_apply() {
        let s = settings(&[("DATABASE_URL", "memory://")]).unwrap();
        assert_eq!(s.storage, StorageBackend::Memory);
        assert_eq!(s.session_ttl, chrono::Duration::seconds(86_400));
        assert_eq!(s.session_sweep, StdDuration::from_secs(300));
        assert_eq!(s.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(s.password_hasher, HasherKind::Argon2);
        assert_eq!(s.log_format, LogFormat::Json);
        assert!(s.uses_dev_secret());
    }

    #[test]
    fn overrides_are_parsed() {
        let s = settings(&[
            ("DATABASE_URL", "postgres://rx:rx@localhost/rx"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("SESSION_SECRET", "s3cret"),
            ("SESSION_TTL_SECS", "60"),
            ("PASSWORD_HASHER", "sha256"),
            ("LOG_FORMAT", "pretty"),
            ("BIND_ADDR", "127.0.0.1:9000"),
        ])
        .unwrap();
        assert_eq!(
            s.storage,
            StorageBackend::Postgres {
                url: "postgres://rx:rx@localhost/rx".into(),
                max_connections: 4
            }
        );
        assert_eq!(s.session_ttl, chrono::Duration::seconds(60));
        assert_eq!(s.password_hasher, HasherKind::Sha256);
        assert_eq!(s.log_format, LogFormat::Pretty);
        assert!(!s.uses_dev_secret());
    }

    #[test]
    fn longest_allowed_ttl_still_yields_a_usable_expiry() {
        let max = MAX_INTERVAL_SECS.to_string();
        let s = settings(&[("DATABASE_URL", "memory://"), ("SESSION_TTL_SECS", &max)]).unwrap();
        assert_eq!(s.session_ttl, chrono::Duration::seconds(MAX_INTERVAL_SECS));
        assert!(chrono::Utc::now().checked_add_signed(s.session_ttl).is_some());
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = settings(&[("DATABASE_URL", "memory://"), ("SESSION_TTL_SECS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "SESSION_TTL_SECS", .. }));

        for huge in ["100000000000000", "9223372036854775807", "99999999999999999999"] {
            let err = settings(&[("DATABASE_URL", "memory://"), ("SESSION_TTL_SECS", huge)]).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { var: "SESSION_TTL_SECS", .. }));
            let err = settings(&[("DATABASE_URL", "memory://"), ("SESSION_SWEEP_SECS", huge)]).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { var: "SESSION_SWEEP_SECS", .. }));
        }

        let err = settings(&[("DATABASE_URL", "mysql://x")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "DATABASE_URL", .. }));

        let err = settings(&[("DATABASE_URL", "memory://"), ("PASSWORD_HASHER", "md5")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "PASSWORD_HASHER", .. }));
    }
}
