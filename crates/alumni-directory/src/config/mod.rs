use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub directory: DirectoryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let data_file = env::var("APP_DATA_FILE")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        let users = match env::var("APP_USERS") {
            Ok(raw) => parse_users(&raw)?,
            Err(_) => Vec::new(),
        };
        let export_dir = env::var("APP_EXPORT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));
        let session_ttl_minutes = match env::var("APP_SESSION_TTL_MINUTES") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|minutes| *minutes > 0)
                .ok_or(ConfigError::InvalidSessionTtl)?,
            Err(_) => DEFAULT_SESSION_TTL_MINUTES,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            directory: DirectoryConfig {
                data_file,
                users,
                export_dir,
                session_ttl_minutes,
            },
        })
    }
}

/// Sessions older than this are treated as signed out.
pub const DEFAULT_SESSION_TTL_MINUTES: u32 = 12 * 60;

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where alumni records come from, who may sign in, and where exports land.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub data_file: Option<PathBuf>,
    pub users: Vec<UserCredential>,
    pub export_dir: PathBuf,
    pub session_ttl_minutes: u32,
}

/// A sign-in identity. The password is held only as a lowercase blake3 hex digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserCredential {
    pub email: String,
    pub password_digest: String,
}

fn parse_users(raw: &str) -> Result<Vec<UserCredential>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (email, digest) = entry
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidUser(entry.to_string()))?;
            let email = email.trim();
            let digest = digest.trim().to_ascii_lowercase();
            let is_hex_digest =
                digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit());
            if email.is_empty() || !is_hex_digest {
                return Err(ConfigError::InvalidUser(entry.to_string()));
            }
            Ok(UserCredential {
                email: email.to_string(),
                password_digest: digest,
            })
        })
        .collect()
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidUser(String),
    InvalidSessionTtl,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidUser(entry) => write!(
                f,
                "APP_USERS entry '{entry}' must look like email=<64 hex blake3 digest>"
            ),
            ConfigError::InvalidSessionTtl => {
                write!(f, "APP_SESSION_TTL_MINUTES must be a positive whole number")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::InvalidUser(_)
            | ConfigError::InvalidSessionTtl => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_DATA_FILE",
            "APP_USERS",
            "APP_EXPORT_DIR",
            "APP_SESSION_TTL_MINUTES",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.directory.data_file.is_none());
        assert!(config.directory.users.is_empty());
        assert_eq!(config.directory.export_dir, PathBuf::from("."));
        assert_eq!(
            config.directory.session_ttl_minutes,
            DEFAULT_SESSION_TTL_MINUTES
        );
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn parses_user_digests() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let digest = blake3::hash(b"s3cret").to_hex().to_string();
        env::set_var(
            "APP_USERS",
            format!("ops@example.org={} , ", digest.to_uppercase()),
        );
        let config = AppConfig::load().expect("config loads");
        assert_eq!(
            config.directory.users,
            vec![UserCredential {
                email: "ops@example.org".to_string(),
                password_digest: digest,
            }]
        );
    }

    #[test]
    fn rejects_malformed_user_entries() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_USERS", "ops@example.org=plaintext");
        match AppConfig::load() {
            Err(ConfigError::InvalidUser(entry)) => {
                assert_eq!(entry, "ops@example.org=plaintext")
            }
            other => panic!("expected invalid user error, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn session_ttl_must_be_positive() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_SESSION_TTL_MINUTES", "90");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.directory.session_ttl_minutes, 90);

        env::set_var("APP_SESSION_TTL_MINUTES", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidSessionTtl)
        ));
        reset_env();
    }
}
