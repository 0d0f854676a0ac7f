//! 采集指标模块
//!
//! 通过 `metrics` facade 记录读数、持久化、通知与远端同步的运行指标，
//! 并在内存中聚合读数统计，用于退出时的摘要输出。

use contracts::{Reading, ReadingSource};
use metrics::{counter, gauge, histogram};

/// 记录一条被接受的读数
///
/// 每条读数进入采集循环时调用。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_reading_accepted;
///
/// record_reading_accepted(&reading, ReadingSource::Device);
/// ```
pub fn record_reading_accepted(reading: &Reading, source: ReadingSource) {
    counter!(
        "dht_monitor_readings_total",
        "source" => source.as_str()
    )
    .increment(1);

    gauge!("dht_monitor_temperature_celsius").set(reading.temperature);
    gauge!("dht_monitor_humidity_percent").set(reading.humidity);

    if let Some(heat_index) = reading.heat_index {
        gauge!("dht_monitor_heat_index_celsius").set(heat_index);
    }
    if let Some(air_quality) = reading.air_quality {
        gauge!("dht_monitor_air_quality_ppm").set(air_quality);
    }
}

/// 记录读数处理失败 (单条读数，不影响循环)
pub fn record_acquisition_error() {
    counter!("dht_monitor_acquisition_errors_total").increment(1);
}

/// 记录持久化结果
pub fn record_persist(store: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "dht_monitor_persist_total",
        "store" => store.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 记录通知发送结果
pub fn record_notification(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "dht_monitor_notifications_total",
        "sink" => sink_name.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 记录被节流跳过的通知
pub fn record_notification_suppressed(channel: &str) {
    counter!(
        "dht_monitor_notifications_suppressed_total",
        "channel" => channel.to_string()
    )
    .increment(1);
}

/// 记录远端同步结果
pub fn record_replication(success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("dht_monitor_replication_total", "status" => status).increment(1);
}

/// 记录远端同步耗时
pub fn record_replication_latency_ms(latency_ms: f64) {
    histogram!("dht_monitor_replication_latency_ms").record(latency_ms);
}

/// 记录无法解析的设备行
pub fn record_device_parse_error() {
    counter!("dht_monitor_device_parse_errors_total").increment(1);
}

/// 记录设备读写错误
pub fn record_device_io_error() {
    counter!("dht_monitor_device_io_errors_total").increment(1);
}

/// 记录设备连接状态 (1 = 已连接, 0 = 模拟模式)
pub fn record_device_connected(connected: bool) {
    gauge!("dht_monitor_device_connected").set(if connected { 1.0 } else { 0.0 });
}

/// 读数指标聚合器
///
/// 在内存中聚合读数，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct ReadingMetricsAggregator {
    /// 总读数
    pub total_readings: u64,

    /// 来自设备的读数
    pub device_readings: u64,

    /// 模拟生成的读数
    pub synthetic_readings: u64,

    /// 温度统计
    pub temperature_stats: RunningStats,

    /// 湿度统计
    pub humidity_stats: RunningStats,

    /// 体感温度统计
    pub heat_index_stats: RunningStats,
}

impl ReadingMetricsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, reading: &Reading, source: ReadingSource) {
        self.total_readings += 1;
        match source {
            ReadingSource::Device => self.device_readings += 1,
            ReadingSource::Synthetic => self.synthetic_readings += 1,
        }

        self.temperature_stats.push(reading.temperature);
        self.humidity_stats.push(reading.humidity);

        if let Some(heat_index) = reading.heat_index {
            self.heat_index_stats.push(heat_index);
        }
    }

    /// 生成摘要报告
    pub fn summary(&self) -> ReadingSummary {
        ReadingSummary {
            total_readings: self.total_readings,
            device_readings: self.device_readings,
            synthetic_readings: self.synthetic_readings,
            temperature: StatsSummary::from(&self.temperature_stats),
            humidity: StatsSummary::from(&self.humidity_stats),
            heat_index: StatsSummary::from(&self.heat_index_stats),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 读数摘要
#[derive(Debug, Clone, Default)]
pub struct ReadingSummary {
    pub total_readings: u64,
    pub device_readings: u64,
    pub synthetic_readings: u64,
    pub temperature: StatsSummary,
    pub humidity: StatsSummary,
    pub heat_index: StatsSummary,
}

impl std::fmt::Display for ReadingSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Reading Summary ===")?;
        writeln!(
            f,
            "Readings: {} (device {}, synthetic {})",
            self.total_readings, self.device_readings, self.synthetic_readings
        )?;
        writeln!(f, "Temperature (°C): {}", self.temperature)?;
        writeln!(f, "Humidity (%): {}", self.humidity)?;
        writeln!(f, "Heat index (°C): {}", self.heat_index)?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}
