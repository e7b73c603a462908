//! 守护进程生命周期
//!
//! 启动顺序：校验配置 → 单实例锁 → FIFO → 串口。
//! 锁在任何串口操作之前获取，第二个实例在这一步失败，不会重新配置串口。

use crate::{RelayConfig, RelayError, RelayLoop, RelayStats, SingletonLock};
use heading_transport::{FifoChannel, SerialTransport};
use std::path::Path;
use tracing::info;

/// 正在运行的守护进程
///
/// 持有单实例锁与中继循环，丢弃时关闭两端通道并释放锁。
pub struct Daemon {
    relay: RelayLoop<SerialTransport, FifoChannel>,
    lock: SingletonLock,
}

impl Daemon {
    /// 取得锁并打开 FIFO 与串口
    pub fn start(device: impl AsRef<Path>, config: &RelayConfig) -> Result<Self, RelayError> {
        config.validate()?;

        let lock = SingletonLock::try_lock(config.lock_path())?;

        let fifo =
            FifoChannel::ensure_and_open(&config.fifo_path).map_err(RelayError::FifoUnavailable)?;
        let serial =
            SerialTransport::open(device, config.baud_rate).map_err(RelayError::OpenFailed)?;

        info!(
            device = %serial.path().display(),
            fifo = %fifo.path().display(),
            lock = %lock.path().display(),
            "Heading daemon started"
        );

        Ok(Self {
            relay: RelayLoop::new(serial, fifo, config),
            lock,
        })
    }

    /// 运行中继循环直到收到 `K`，返回运行统计
    pub fn run(mut self) -> RelayStats {
        self.relay.run();
        let stats = self.relay.stats().clone();
        info!(lock = %self.lock.path().display(), "Heading daemon stopped");
        stats
    }
}
