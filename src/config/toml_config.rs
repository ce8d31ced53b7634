use crate::core::codec::DEFAULT_MAX_MESSAGE_BYTES;
use crate::core::HostSettings;
use crate::utils::error::{HostError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_one_of, validate_positive_number, validate_range,
    Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_MAX_ALLOCATION_BYTES: usize = 2 * 1024 * 1024;
// 每個位元組在 JSON 陣列裡最多佔 4 個字元 ("255,")
const JSON_BYTES_PER_ELEMENT: usize = 4;
const RESULT_ENVELOPE_BYTES: usize = 64;
const MAX_WORK_DELAY_MS: u64 = 60_000;
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: [&str; 2] = ["text", "json"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub host: HostSection,
    pub services: ServicesSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSection {
    pub name: String,
    pub max_message_bytes: usize,
    pub max_allocation_bytes: usize,
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            name: "callhost".to_string(),
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
            max_allocation_bytes: DEFAULT_MAX_ALLOCATION_BYTES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesSection {
    pub data_typed: bool,
    pub simultaneous: bool,
    pub work_delay_ms: u64,
}

impl Default for ServicesSection {
    fn default() -> Self {
        Self {
            data_typed: true,
            simultaneous: true,
            work_delay_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    pub format: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl HostConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(HostError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| HostError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${HOST_NAME})，未設定的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| HostError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_non_empty_string("host.name", &self.host.name)?;
        validate_positive_number("host.max_message_bytes", self.host.max_message_bytes, 1)?;
        validate_positive_number(
            "host.max_allocation_bytes",
            self.host.max_allocation_bytes,
            1,
        )?;
        let largest_reply = self
            .host
            .max_allocation_bytes
            .saturating_mul(JSON_BYTES_PER_ELEMENT)
            .saturating_add(RESULT_ENVELOPE_BYTES);
        if largest_reply > self.host.max_message_bytes {
            return Err(HostError::InvalidConfigValueError {
                field: "host.max_allocation_bytes".to_string(),
                value: self.host.max_allocation_bytes.to_string(),
                reason: format!(
                    "An allocation of this size encodes to about {} bytes, above host.max_message_bytes ({})",
                    largest_reply, self.host.max_message_bytes
                ),
            });
        }
        validate_range(
            "services.work_delay_ms",
            self.services.work_delay_ms,
            0,
            MAX_WORK_DELAY_MS,
        )?;
        validate_one_of("logging.level", &self.logging.level, &LOG_LEVELS)?;
        validate_one_of("logging.format", &self.logging.format, &LOG_FORMATS)?;

        if !self.services.data_typed && !self.services.simultaneous {
            return Err(HostError::ConfigError {
                message: "At least one service must be enabled".to_string(),
            });
        }

        Ok(())
    }

    pub fn json_logs(&self) -> bool {
        self.logging.format == "json"
    }

    pub fn log_level(&self) -> &str {
        &self.logging.level
    }
}

impl HostSettings for HostConfig {
    fn max_message_bytes(&self) -> usize {
        self.host.max_message_bytes
    }

    fn max_allocation_bytes(&self) -> usize {
        self.host.max_allocation_bytes
    }

    fn work_delay(&self) -> Duration {
        Duration::from_millis(self.services.work_delay_ms)
    }

    fn data_typed_enabled(&self) -> bool {
        self.services.data_typed
    }

    fn simultaneous_enabled(&self) -> bool {
        self.services.simultaneous
    }
}

impl Validate for HostConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
