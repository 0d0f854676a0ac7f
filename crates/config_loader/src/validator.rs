//! 配置校验模块
//!
//! 校验规则：
//! - baud_rate > 0
//! - 各时间间隔与通道容量 > 0
//! - 模拟数据基准值有限，波动幅度在 [0, 1000] 内
//! - 告警阈值 low < high
//! - 文件存储路径非空
//! - 已配置的 URL 必须是 http(s)

use contracts::{
    is_placeholder, ContractError, MonitorBlueprint, NotifierKind, StorageKind,
};
use url::Url;

/// 模拟数据波动幅度上限
const MAX_AMPLITUDE: f64 = 1000.0;

/// 校验 MonitorBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &MonitorBlueprint) -> Result<(), ContractError> {
    validate_device(blueprint)?;
    validate_acquisition(blueprint)?;
    validate_synthetic(blueprint)?;
    validate_storage(blueprint)?;
    validate_notifier(blueprint)?;
    validate_replicator(blueprint)?;
    Ok(())
}

/// 校验设备链路配置
fn validate_device(blueprint: &MonitorBlueprint) -> Result<(), ContractError> {
    let device = &blueprint.device;

    if device.baud_rate == 0 {
        return Err(ContractError::config_validation(
            "device.baud_rate",
            "baud_rate must be > 0",
        ));
    }

    // auto_detect 关闭时只能依赖手动指定的端口
    if !device.auto_detect && device.port.trim().is_empty() {
        return Err(ContractError::config_validation(
            "device.port",
            "port cannot be empty when auto_detect is disabled",
        ));
    }

    Ok(())
}

/// 校验采集循环配置
fn validate_acquisition(blueprint: &MonitorBlueprint) -> Result<(), ContractError> {
    let acq = &blueprint.acquisition;

    let positive = [
        ("acquisition.notify_interval_secs", acq.notify_interval_secs),
        ("acquisition.tick_ms", acq.tick_ms),
        ("acquisition.persist_timeout_ms", acq.persist_timeout_ms),
        ("acquisition.channel_capacity", acq.channel_capacity as u64),
    ];

    for (field, value) in positive {
        if value == 0 {
            return Err(ContractError::config_validation(field, "must be > 0"));
        }
    }

    Ok(())
}

/// 校验模拟数据配置
fn validate_synthetic(blueprint: &MonitorBlueprint) -> Result<(), ContractError> {
    let syn = &blueprint.synthetic;

    let amplitudes = [
        ("synthetic.temperature_amplitude", syn.temperature_amplitude),
        ("synthetic.humidity_amplitude", syn.humidity_amplitude),
        ("synthetic.heat_index_spread", syn.heat_index_spread),
        ("synthetic.air_quality_amplitude", syn.air_quality_amplitude),
    ];

    for (field, value) in amplitudes {
        if !value.is_finite() || !(0.0..=MAX_AMPLITUDE).contains(&value) {
            return Err(ContractError::config_validation(
                field,
                format!("must be within [0, {MAX_AMPLITUDE}], got {value}"),
            ));
        }
    }

    let baselines = [
        ("synthetic.base_temperature", syn.base_temperature),
        ("synthetic.base_humidity", syn.base_humidity),
        ("synthetic.base_air_quality", syn.base_air_quality),
    ];

    for (field, value) in baselines {
        if !value.is_finite() {
            return Err(ContractError::config_validation(
                field,
                format!("must be finite, got {value}"),
            ));
        }
    }

    Ok(())
}

/// 校验存储配置
fn validate_storage(blueprint: &MonitorBlueprint) -> Result<(), ContractError> {
    let storage = &blueprint.storage;

    if storage.kind == StorageKind::File && storage.path.as_os_str().is_empty() {
        return Err(ContractError::config_validation(
            "storage.path",
            "path cannot be empty for file storage",
        ));
    }

    Ok(())
}

/// 校验通知配置
fn validate_notifier(blueprint: &MonitorBlueprint) -> Result<(), ContractError> {
    let notifier = &blueprint.notifier;
    let t = &notifier.thresholds;

    if t.temp_low >= t.temp_high {
        return Err(ContractError::config_validation(
            "notifier.thresholds.temp_low / notifier.thresholds.temp_high",
            format!(
                "temp_low ({}) must be < temp_high ({})",
                t.temp_low, t.temp_high
            ),
        ));
    }

    if t.humidity_low >= t.humidity_high {
        return Err(ContractError::config_validation(
            "notifier.thresholds.humidity_low / notifier.thresholds.humidity_high",
            format!(
                "humidity_low ({}) must be < humidity_high ({})",
                t.humidity_low, t.humidity_high
            ),
        ));
    }

    if notifier.webhook_configured() && !is_http_url(&notifier.webhook_url) {
        return Err(ContractError::config_validation(
            "notifier.webhook_url",
            format!("'{}' is not an http(s) URL", notifier.webhook_url),
        ));
    }

    if notifier.kind == NotifierKind::Discord && notifier.timeout_secs == 0 {
        return Err(ContractError::config_validation(
            "notifier.timeout_secs",
            "must be > 0",
        ));
    }

    Ok(())
}

/// 校验远端同步配置
fn validate_replicator(blueprint: &MonitorBlueprint) -> Result<(), ContractError> {
    let rep = &blueprint.replicator;

    if !rep.enabled {
        return Ok(());
    }

    if !is_placeholder(&rep.endpoint) && !is_http_url(&rep.endpoint) {
        return Err(ContractError::config_validation(
            "replicator.endpoint",
            format!("'{}' is not an http(s) URL", rep.endpoint),
        ));
    }

    if rep.push_timeout_secs == 0 || rep.health_timeout_secs == 0 {
        return Err(ContractError::config_validation(
            "replicator.push_timeout_secs / replicator.health_timeout_secs",
            "timeouts must be > 0",
        ));
    }

    Ok(())
}

fn is_http_url(value: &str) -> bool {
    match Url::parse(value.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}
