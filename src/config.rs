use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    #[serde(default)]
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// 未配置时直接使用进程内存储
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_redis_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_ms: default_redis_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64, // seconds
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,
    #[serde(default = "default_geocoding_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_geocoding_base_url(),
            timeout_ms: default_geocoding_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default = "default_sender_name")]
    pub sender_name: String,
    #[serde(default)]
    pub sender_address: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            sender_name: default_sender_name(),
            sender_address: String::new(),
        }
    }
}

fn default_redis_timeout_ms() -> u64 {
    1000
}

fn default_geocoding_base_url() -> String {
    "https://maps.googleapis.com/maps/api/geocode/json".to_string()
}

fn default_geocoding_timeout_ms() -> u64 {
    3000
}

fn default_sender_name() -> String {
    "AgriCare".to_string()
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 配置文件不存在时完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => toml::from_str(&config_str)
                .map_err(|e| format!("Failed to parse config file: {e}"))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set and no config.toml was found")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    redis: RedisConfig {
                        url: get_env("REDIS_URL").filter(|v| !v.is_empty()),
                        timeout_ms: get_env_parse("REDIS_TIMEOUT_MS", default_redis_timeout_ms()),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 604_800i64),
                    },
                    geocoding: GeocodingConfig {
                        api_key: get_env("GOOGLE_MAPS_API_KEY").unwrap_or_default(),
                        base_url: get_env("GEOCODING_BASE_URL")
                            .unwrap_or_else(default_geocoding_base_url),
                        timeout_ms: get_env_parse(
                            "GEOCODING_TIMEOUT_MS",
                            default_geocoding_timeout_ms(),
                        ),
                    },
                    email: EmailConfig {
                        sender_name: get_env("EMAIL_NAME").unwrap_or_else(default_sender_name),
                        sender_address: get_env("EMAIL_USERNAME").unwrap_or_default(),
                    },
                }
            }
            Err(e) => {
                return Err(format!("Failed to read config file {config_path}: {e}").into());
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("REDIS_URL") {
            config.redis.url = if v.is_empty() { None } else { Some(v) };
        }
        if let Ok(v) = env::var("REDIS_TIMEOUT_MS")
            && let Ok(ms) = v.parse()
        {
            config.redis.timeout_ms = ms;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("GOOGLE_MAPS_API_KEY") {
            config.geocoding.api_key = v;
        }
        if let Ok(v) = env::var("GEOCODING_BASE_URL") {
            config.geocoding.base_url = v;
        }
        if let Ok(v) = env::var("GEOCODING_TIMEOUT_MS")
            && let Ok(ms) = v.parse()
        {
            config.geocoding.timeout_ms = ms;
        }
        if let Ok(v) = env::var("EMAIL_NAME") {
            config.email.sender_name = v;
        }
        if let Ok(v) = env::var("EMAIL_USERNAME") {
            config.email.sender_address = v;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_toml_uses_section_defaults() {
        let raw = r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [database]
            url = "sqlite::memory:"
            max_connections = 1

            [jwt]
            secret = "secret"
            access_token_expires_in = 3600
        "#;

        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.server.port, 9000);
        assert!(config.redis.url.is_none());
        assert_eq!(config.redis.timeout_ms, 1000);
        assert!(config.geocoding.api_key.is_empty());
        assert_eq!(config.email.sender_name, "AgriCare");
    }

    #[test]
    fn test_parse_redis_section() {
        let raw = r#"
            [server]
            host = "0.0.0.0"
            port = 8080

            [database]
            url = "postgres://localhost/agricare"
            max_connections = 5

            [redis]
            url = "redis://127.0.0.1:6379"

            [jwt]
            secret = "secret"
            access_token_expires_in = 3600
        "#;

        let config: Config = toml::from_str(raw).unwrap();
        assert_eq!(config.redis.url.as_deref(), Some("redis://127.0.0.1:6379"));
        assert_eq!(config.redis.timeout_ms, 1000);
    }
}
