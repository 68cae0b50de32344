use std::time::Duration;

use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

/// Secrets that ship in sample files and must never sign production tokens.
/// Upper bounds keep `now + ttl` far from chrono's range limits.
pub const MAX_ACCESS_TOKEN_TTL_HOURS: i64 = 8760;
pub const MAX_REFRESH_TOKEN_TTL_DAYS: i64 = 3650;

const PLACEHOLDER_SECRETS: &[&str] = &[
    "your-super-secret-jwt-key-change-this-in-production",
    "dev-secret-change-me",
    "change-me",
];

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
    #[serde(default = "default_auto_migrate")]
    pub auto_migrate: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
            auto_migrate: default_auto_migrate(),
        }
    }
}

fn default_max_connections() -> u32 { 25 }
fn default_min_connections() -> u32 { 5 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 300 }
fn default_max_lifetime() -> u64 { 300 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_auto_migrate() -> bool { true }

/// Token signing settings. `jwt_secret` has no usable default.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_access_ttl_hours")]
    pub access_token_ttl_hours: i64,
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_token_ttl_days: i64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            access_token_ttl_hours: default_access_ttl_hours(),
            refresh_token_ttl_days: default_refresh_ttl_days(),
        }
    }
}

fn default_access_ttl_hours() -> i64 { 24 }
fn default_refresh_ttl_days() -> i64 { 7 }

fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), falling back to a purely
    /// environment-driven config when the file is missing, then validate.
    pub fn load_and_validate() -> Result<Self> {
        let path = config_path();
        let mut cfg = if std::path::Path::new(&path).exists() {
            load_from_file(&path)?
        } else {
            AppConfig::default()
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        self.auth.normalize_from_env();
        self.auth.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("SERVER_HOST") {
            if !host.trim().is_empty() {
                self.host = host;
            }
        }
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if let Some(port) = std::env::var("SERVER_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
        {
            self.port = port;
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(w) if w > 0 => {}
            _ => self.worker_threads = Some(4),
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL").or_else(|_| std::env::var("DB_DSN")) {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0
            || self.acquire_timeout_secs == 0
            || self.idle_timeout_secs == 0
            || self.max_lifetime_secs == 0
        {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration { Duration::from_secs(self.connect_timeout_secs) }
    pub fn acquire_timeout(&self) -> Duration { Duration::from_secs(self.acquire_timeout_secs) }
    pub fn idle_timeout(&self) -> Duration { Duration::from_secs(self.idle_timeout_secs) }
    pub fn max_lifetime(&self) -> Duration { Duration::from_secs(self.max_lifetime_secs) }
}

impl AuthSettings {
    pub fn normalize_from_env(&mut self) {
        if self.jwt_secret.trim().is_empty() {
            if let Ok(secret) = std::env::var("JWT_SECRET") {
                self.jwt_secret = secret;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        let secret = self.jwt_secret.trim();
        if secret.is_empty() {
            return Err(anyhow!("auth.jwt_secret is empty; set it in config.toml or JWT_SECRET"));
        }
        if PLACEHOLDER_SECRETS.contains(&secret) {
            return Err(anyhow!("auth.jwt_secret is a placeholder value; generate a real secret"));
        }
        if !(1..=MAX_ACCESS_TOKEN_TTL_HOURS).contains(&self.access_token_ttl_hours) {
            return Err(anyhow!("auth.access_token_ttl_hours must be within 1..={MAX_ACCESS_TOKEN_TTL_HOURS}"));
        }
        if !(1..=MAX_REFRESH_TOKEN_TTL_DAYS).contains(&self.refresh_token_ttl_days) {
            return Err(anyhow!("auth.refresh_token_ttl_days must be within 1..={MAX_REFRESH_TOKEN_TTL_DAYS}"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db(url: &str) -> DatabaseConfig {
        DatabaseConfig { url: url.into(), ..DatabaseConfig::default() }
    }

    #[test]
    fn parses_toml_with_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [database]
            url = "postgres://u:p@localhost/wound_iq"

            [auth]
            jwt_secret = "s3cr3t-from-vault"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.database.max_connections, 25);
        assert_eq!(cfg.database.min_connections, 5);
        assert_eq!(cfg.database.idle_timeout(), Duration::from_secs(300));
        assert!(cfg.database.auto_migrate);
        assert_eq!(cfg.auth.access_token_ttl_hours, 24);
        assert_eq!(cfg.auth.refresh_token_ttl_days, 7);
    }

    #[test]
    fn database_url_must_be_postgres() {
        assert!(db("mysql://localhost/x").validate().is_err());
        assert!(db("").validate().is_err());
        assert!(db("postgresql://localhost/x").validate().is_ok());
    }

    #[test]
    fn pool_bounds_are_checked() {
        let mut cfg = db("postgres://localhost/x");
        cfg.max_connections = 1;
        cfg.min_connections = 2;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_idle_or_lifetime_is_rejected() {
        let mut cfg = db("postgres://localhost/x");
        cfg.idle_timeout_secs = 0;
        assert!(cfg.validate().is_err());
        let mut cfg = db("postgres://localhost/x");
        cfg.max_lifetime_secs = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn token_lifetimes_are_bounded() {
        let ok = AuthSettings { jwt_secret: "a-real-secret".into(), ..AuthSettings::default() };
        assert!(ok.validate().is_ok());

        let far_refresh = AuthSettings { refresh_token_ttl_days: 100_000_000, ..ok.clone() };
        assert!(far_refresh.validate().is_err());
        let far_access = AuthSettings { access_token_ttl_hours: i64::MAX, ..ok.clone() };
        assert!(far_access.validate().is_err());
        let zero = AuthSettings { access_token_ttl_hours: 0, ..ok.clone() };
        assert!(zero.validate().is_err());

        let edge = AuthSettings {
            access_token_ttl_hours: MAX_ACCESS_TOKEN_TTL_HOURS,
            refresh_token_ttl_days: MAX_REFRESH_TOKEN_TTL_DAYS,
            ..ok
        };
        assert!(edge.validate().is_ok());
    }

    #[test]
    fn empty_or_placeholder_secret_is_rejected() {
        let mut auth = AuthSettings::default();
        assert!(auth.validate().is_err());
        auth.jwt_secret = "your-super-secret-jwt-key-change-this-in-production".into();
        assert!(auth.validate().is_err());
        auth.jwt_secret = "   ".into();
        assert!(auth.validate().is_err());
        auth.jwt_secret = "a-real-secret".into();
        assert!(auth.validate().is_ok());
    }
}
