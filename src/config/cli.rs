use crate::config::toml_config::HostConfig;
use crate::config::CliConfig;
use crate::utils::error::Result;

impl CliConfig {
    /// 載入設定檔（若有指定），再套用命令列覆蓋設定
    pub fn load(&self) -> Result<HostConfig> {
        let config = match &self.config {
            Some(path) => HostConfig::from_file(path)?,
            None => HostConfig::default(),
        };
        Ok(self.apply_overrides(config))
    }

    pub fn apply_overrides(&self, mut config: HostConfig) -> HostConfig {
        if self.verbose {
            config.logging.level = "debug".to_string();
        }
        if self.json_logs {
            config.logging.format = "json".to_string();
        }
        if let Some(delay) = self.work_delay_ms {
            config.services.work_delay_ms = delay;
        }
        if self.disable_data_typed {
            config.services.data_typed = false;
        }
        if self.disable_simultaneous {
            config.services.simultaneous = false;
        }
        config
    }
}
