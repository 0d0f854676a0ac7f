//! MonitorBlueprint - Config Loader 输出
//!
//! 描述完整的监测配置：设备链路、采集循环、模拟数据、存储、通知、远端同步。

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Webhook URL 占位符 (未配置)
pub const PLACEHOLDER_WEBHOOK_URL: &str = "YOUR_WEBHOOK_URL_HERE";

/// 远端 API 地址占位符 (未配置)
pub const PLACEHOLDER_ENDPOINT: &str = "YOUR_CLOUD_API_URL";

/// 远端 API 密钥占位符 (未配置)
pub const PLACEHOLDER_API_KEY: &str = "YOUR_CLOUD_API_KEY";

/// 判断配置值是否为空或占位符
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty()
        || value == PLACEHOLDER_WEBHOOK_URL
        || value == PLACEHOLDER_ENDPOINT
        || value == PLACEHOLDER_API_KEY
}

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的监测配置蓝图
///
/// 所有段落均可省略，省略时使用默认值。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MonitorBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 设备链路
    #[serde(default)]
    pub device: DeviceConfig,

    /// 采集循环
    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    /// 无设备时的模拟数据
    #[serde(default)]
    pub synthetic: SyntheticConfig,

    /// 持久化
    #[serde(default)]
    pub storage: StorageConfig,

    /// 通知
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// 远端同步
    #[serde(default)]
    pub replicator: ReplicatorConfig,
}

/// 设备链路配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// 串口名称 (e.g., "/dev/ttyUSB0", "COM3")
    pub port: String,

    /// 波特率，必须与设备固件一致
    pub baud_rate: u32,

    /// 单次读取超时 (毫秒)
    pub read_timeout_ms: u64,

    /// 打开串口后等待设备重启完成的时间 (毫秒)
    pub settle_delay_ms: u64,

    /// 是否优先使用自动探测到的端口
    pub auto_detect: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".to_string(),
            baud_rate: 9600,
            read_timeout_ms: 2000,
            settle_delay_ms: 2000,
            auto_detect: true,
        }
    }
}

impl DeviceConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// 采集循环配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// 通知节流间隔 (秒)，同时也是模拟数据的生成间隔
    pub notify_interval_secs: u64,

    /// 主循环节拍 (毫秒)
    pub tick_ms: u64,

    /// 单次持久化调用的上限 (毫秒)
    pub persist_timeout_ms: u64,

    /// 读取线程到主循环的通道容量
    pub channel_capacity: usize,

    /// 跳过设备连接，直接使用模拟数据
    pub force_simulation: bool,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            notify_interval_secs: 60,
            tick_ms: 1000,
            persist_timeout_ms: 5000,
            channel_capacity: 64,
            force_simulation: false,
        }
    }
}

impl AcquisitionConfig {
    pub fn notify_interval(&self) -> Duration {
        Duration::from_secs(self.notify_interval_secs)
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn persist_timeout(&self) -> Duration {
        Duration::from_millis(self.persist_timeout_ms)
    }
}

/// 模拟数据配置
///
/// 每个字段围绕基准值做有界的均匀随机扰动。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    /// 基准温度 (°C)
    pub base_temperature: f64,

    /// 温度波动幅度 (°C)
    pub temperature_amplitude: f64,

    /// 基准湿度 (%)
    pub base_humidity: f64,

    /// 湿度波动幅度 (%)
    pub humidity_amplitude: f64,

    /// 体感温度相对温度的最大上浮 (°C)
    pub heat_index_spread: f64,

    /// 是否生成空气质量数据
    pub include_air_quality: bool,

    /// 基准空气质量 (ppm)
    pub base_air_quality: f64,

    /// 空气质量波动幅度 (ppm)
    pub air_quality_amplitude: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            base_temperature: 25.0,
            temperature_amplitude: 5.0,
            base_humidity: 55.0,
            humidity_amplitude: 15.0,
            heat_index_spread: 2.0,
            include_air_quality: false,
            base_air_quality: 350.0,
            air_quality_amplitude: 100.0,
        }
    }
}

/// 存储类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    /// JSON Lines + CSV 文件
    #[default]
    File,
    /// 进程内存 (不持久)
    Memory,
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub kind: StorageKind,

    /// 数据目录
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::File,
            path: PathBuf::from("data"),
        }
    }
}

/// 通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifierKind {
    /// Discord 兼容的 webhook
    Discord,
    /// 仅写日志
    #[default]
    Log,
    /// 关闭通知
    None,
}

/// 通知配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierConfig {
    pub kind: NotifierKind,

    /// Webhook URL
    pub webhook_url: String,

    /// 可选的 webhook 显示名称
    pub username: Option<String>,

    /// 请求超时 (秒)
    pub timeout_secs: u64,

    /// 告警阈值
    pub thresholds: WarningThresholds,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            kind: NotifierKind::Log,
            webhook_url: PLACEHOLDER_WEBHOOK_URL.to_string(),
            username: None,
            timeout_secs: 10,
            thresholds: WarningThresholds::default(),
        }
    }
}

impl NotifierConfig {
    /// Webhook URL 是否已配置 (非占位符)
    pub fn webhook_configured(&self) -> bool {
        !is_placeholder(&self.webhook_url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// 告警阈值
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarningThresholds {
    /// 高温告警 (°C)
    pub temp_high: f64,
    /// 低温告警 (°C)
    pub temp_low: f64,
    /// 高湿告警 (%)
    pub humidity_high: f64,
    /// 低湿告警 (%)
    pub humidity_low: f64,
    /// 空气质量差 (ppm)
    pub air_quality_poor: f64,
}

impl Default for WarningThresholds {
    fn default() -> Self {
        Self {
            temp_high: 35.0,
            temp_low: 10.0,
            humidity_high: 80.0,
            humidity_low: 20.0,
            air_quality_poor: 1000.0,
        }
    }
}

/// 远端同步配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicatorConfig {
    /// 总开关
    pub enabled: bool,

    /// 远端 API 根地址 (e.g., "https://monitor.example.com")
    pub endpoint: String,

    /// Bearer 凭证
    pub api_key: String,

    /// 是否让远端也发送通知 (本地通知器已发送时应关闭)
    pub notify_remote: bool,

    /// 推送超时 (秒)
    pub push_timeout_secs: u64,

    /// 健康检查超时 (秒)
    pub health_timeout_secs: u64,
}

impl Default for ReplicatorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: PLACEHOLDER_ENDPOINT.to_string(),
            api_key: PLACEHOLDER_API_KEY.to_string(),
            notify_remote: false,
            push_timeout_secs: 10,
            health_timeout_secs: 5,
        }
    }
}

impl ReplicatorConfig {
    /// 开关打开且地址与凭证均为真实值
    pub fn is_configured(&self) -> bool {
        self.enabled && !is_placeholder(&self.endpoint) && !is_placeholder(&self.api_key)
    }

    pub fn push_timeout(&self) -> Duration {
        Duration::from_secs(self.push_timeout_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_field_defaults() {
        let bp = MonitorBlueprint::default();
        assert_eq!(bp.device.baud_rate, 9600);
        assert_eq!(bp.acquisition.notify_interval(), Duration::from_secs(60));
        assert_eq!(bp.acquisition.tick(), Duration::from_secs(1));
        assert_eq!(bp.storage.kind, StorageKind::File);
        assert_eq!(bp.notifier.kind, NotifierKind::Log);
        assert!(!bp.notifier.webhook_configured());
        assert!(!bp.replicator.is_configured());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let bp: MonitorBlueprint =
            serde_json::from_str(r#"{ "device": { "port": "COM4" } }"#).unwrap();
        assert_eq!(bp.device.port, "COM4");
        assert_eq!(bp.device.baud_rate, 9600);
        assert_eq!(bp.synthetic.base_temperature, 25.0);
    }

    #[test]
    fn test_replicator_requires_real_endpoint_and_key() {
        let mut config = ReplicatorConfig {
            enabled: true,
            ..Default::default()
        };
        assert!(!config.is_configured());

        config.endpoint = "https://monitor.example.com".to_string();
        assert!(!config.is_configured());

        config.api_key = "secret".to_string();
        assert!(config.is_configured());

        config.enabled = false;
        assert!(!config.is_configured());
    }

    #[test]
    fn test_is_placeholder() {
        assert!(is_placeholder(""));
        assert!(is_placeholder("  "));
        assert!(is_placeholder(PLACEHOLDER_WEBHOOK_URL));
        assert!(!is_placeholder("https://discord.com/api/webhooks/1/abc"));
    }
}
