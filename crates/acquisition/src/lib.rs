//! # Acquisition
//!
//! 采集核心。
//!
//! 负责：
//! - 从设备读取线程接收读数 (有界通道，单生产者，保持顺序)
//! - 更新最新读数缓存
//! - 持久化、远端同步、节流通知
//! - 无设备时生成模拟数据
//!
//! ## 并发模型
//!
//! 缓存与节流状态只由主循环修改；外部只能通过 [`StatusHandle`] 读取。

pub mod cache;
pub mod engine;
pub mod error;
pub mod stats;
pub mod synthetic;
pub mod throttle;

pub use cache::{CacheReader, ReadingCache};
pub use engine::AcquisitionLoop;
pub use error::{AcquisitionError, Result};
pub use stats::{
    AcquisitionCounters, AcquisitionMode, AcquisitionReport, AcquisitionStats, StatusHandle,
};
pub use synthetic::SyntheticGenerator;
pub use throttle::{SinkThrottle, NOTIFICATION_CHANNEL, SYNTHETIC_CHANNEL};
