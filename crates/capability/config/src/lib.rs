//! 应用运行配置加载。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    /// 未配置时使用内存存储。
    pub database_url: Option<String>,
    /// 未配置时使用内置点位目录。
    pub patrol_locations_file: Option<String>,
    /// 同一点位重复检查是否计入进度。
    pub patrol_count_repeat_scans: bool,
    pub geolocation_timeout_ms: u64,
    pub evidence_max_bytes: u64,
    /// 内存中保留的已完成会话数（已持久化，超出后淘汰最早完成的）。
    pub patrol_completed_retention: usize,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let http_addr = env::var("FMS_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let database_url = read_optional("FMS_DATABASE_URL");
        let patrol_locations_file = read_optional("FMS_PATROL_LOCATIONS_FILE");
        let patrol_count_repeat_scans =
            read_bool_with_default("FMS_PATROL_COUNT_REPEAT_SCANS", true);
        let geolocation_timeout_ms = read_u64_with_default("FMS_GEOLOCATION_TIMEOUT_MS", 3_000)?;
        let evidence_max_bytes = read_u64_with_default("FMS_EVIDENCE_MAX_BYTES", 5 * 1024 * 1024)?;
        if evidence_max_bytes == 0 {
            return Err(ConfigError::Invalid(
                "FMS_EVIDENCE_MAX_BYTES".to_string(),
                "0".to_string(),
            ));
        }

        let patrol_completed_retention =
            read_u64_with_default("FMS_PATROL_COMPLETED_RETENTION", 1_024)?;
        let patrol_completed_retention = usize::try_from(patrol_completed_retention)
            .map_err(|_| {
                ConfigError::Invalid(
                    "FMS_PATROL_COMPLETED_RETENTION".to_string(),
                    patrol_completed_retention.to_string(),
                )
            })?;

        Ok(Self {
            http_addr,
            database_url,
            patrol_locations_file,
            patrol_count_repeat_scans,
            geolocation_timeout_ms,
            evidence_max_bytes,
            patrol_completed_retention,
        })
    }
}

fn read_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) if value.trim().is_empty() => default,
        Ok(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "on" | "yes"
        ),
        Err(_) => default,
    }
}
