//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON (可选) 格式。

use contracts::{ContractError, MonitorBlueprint};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// 解析 TOML 格式配置
pub fn parse_toml(content: &str) -> Result<MonitorBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 解析 JSON 格式配置
pub fn parse_json(content: &str) -> Result<MonitorBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<MonitorBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{NotifierKind, StorageKind};

    #[test]
    fn test_parse_toml_sections() {
        let content = r#"
[device]
port = "COM3"
baud_rate = 115200

[acquisition]
notify_interval_secs = 30

[storage]
kind = "memory"

[notifier]
kind = "discord"
webhook_url = "https://discord.com/api/webhooks/1/abc"

[notifier.thresholds]
temp_high = 32.0
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.device.port, "COM3");
        assert_eq!(bp.device.baud_rate, 115200);
        assert_eq!(bp.acquisition.notify_interval_secs, 30);
        assert_eq!(bp.acquisition.tick_ms, 1000);
        assert_eq!(bp.storage.kind, StorageKind::Memory);
        assert_eq!(bp.notifier.kind, NotifierKind::Discord);
        assert_eq!(bp.notifier.thresholds.temp_high, 32.0);
        assert_eq!(bp.notifier.thresholds.temp_low, 10.0);
    }

    #[test]
    fn test_parse_empty_toml_is_all_defaults() {
        let bp = parse_toml("").unwrap();
        assert_eq!(bp.device.port, "/dev/ttyUSB0");
        assert!(!bp.replicator.enabled);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "device": { "port": "/dev/ttyACM0", "auto_detect": false },
            "replicator": { "enabled": true, "endpoint": "https://monitor.example.com", "api_key": "k" }
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert!(!bp.device.auto_detect);
        assert!(bp.replicator.is_configured());
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_parse_unknown_storage_kind() {
        let result = parse_toml("[storage]\nkind = \"sqlite\"\n");
        assert!(matches!(result, Err(ContractError::ConfigParse { .. })));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
