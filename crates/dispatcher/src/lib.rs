//! # Dispatcher
//!
//! 读数分发模块。
//!
//! 负责：
//! - 远端同步 (`RemoteReplicator`)，热路径上只 spawn，不等待
//! - 通知 sink (Discord webhook / 日志)
//! - 本地存储 (文件 / 内存)

pub mod error;
pub mod metrics;
pub mod notifiers;
pub mod replicator;
pub mod stores;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use contracts::{Notifier, ReadingStore};
pub use error::{DispatcherError, Result};
pub use metrics::{ReplicatorMetrics, ReplicatorStats};
pub use notifiers::{
    air_quality_grade, threshold_warnings, DiscordNotifier, LogNotifier, NotifierSink, Warning,
    WarningKind,
};
pub use replicator::{PushMode, RemoteReplicator};
pub use stores::{FileStore, MemoryStore, StoreSink};
