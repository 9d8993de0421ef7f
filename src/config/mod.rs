use chrono_tz::Tz;
use serde::Deserialize;
use std::env;
use std::fmt;
use std::str::FromStr;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    pub admin: Option<AdminConfig>,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub rust_log: String,
    /// Часовой пояс, в котором считается календарная дата show_time для фильтра `date`
    pub time_zone: String,
}

// Настройки базы данных
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Настройки Redis
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

// Настройки JWT
#[derive(Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
}

// Админ, которого создаем при старте (если заданы оба env)
#[derive(Clone, Deserialize)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
}

// Секреты в логи не попадают
impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("access_ttl_minutes", &self.access_ttl_minutes)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .finish()
    }
}

impl fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value {value:?}")]
    Invalid { var: &'static str, value: String },
}

fn required(var: &'static str) -> Result<String, ConfigError> {
    env::var(var).map_err(|_| ConfigError::Missing(var))
}

fn or_default(var: &'static str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_string())
}

fn parsed<T: FromStr>(var: &'static str, default: &str) -> Result<T, ConfigError> {
    let value = or_default(var, default);
    value
        .parse()
        .map_err(|_| ConfigError::Invalid { var, value })
}

/// Имя пояса из базы IANA; его же понимает `AT TIME ZONE` в Postgres
fn time_zone(value: String) -> Result<String, ConfigError> {
    match value.parse::<Tz>() {
        Ok(tz) => Ok(tz.name().to_string()),
        Err(_) => Err(ConfigError::Invalid { var: "APP_TIME_ZONE", value }),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let admin = match (env::var("ADMIN_USERNAME"), env::var("ADMIN_PASSWORD")) {
            (Ok(username), Ok(password)) => Some(AdminConfig { username, password }),
            _ => None,
        };

        Ok(Config {
            app: AppConfig {
                host: or_default("HOST", "0.0.0.0"),
                port: parsed("PORT", "8000")?,
                rust_log: or_default("RUST_LOG", "theatre_service=debug,tower_http=debug"),
                time_zone: time_zone(or_default("APP_TIME_ZONE", "UTC"))?,
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                pool_size: parsed("DB_POOL_SIZE", "20")?,
            },
            redis: RedisConfig {
                url: required("REDIS_URL")?,
            },
            jwt: JwtConfig {
                secret: required("JWT_SECRET")?,
                access_ttl_minutes: parsed("JWT_ACCESS_TTL_MINUTES", "90")?,
                refresh_ttl_days: parsed("JWT_REFRESH_TTL_DAYS", "7")?,
            },
            admin,
        })
    }
}
