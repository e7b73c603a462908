//! 驱动层错误类型定义

use heading_protocol::ProtocolError;
use heading_transport::TransportError;
use std::path::PathBuf;
use thiserror::Error;

/// 驱动层错误类型
///
/// 启动阶段的错误（串口、FIFO、单实例）是致命的；稳态运行中的单次
/// 传输失败只记录日志，不会以此类型向上传播。
#[derive(Error, Debug)]
pub enum RelayError {
    /// 串口设备无法打开或配置
    #[error("Serial device unavailable: {0}")]
    OpenFailed(#[source] TransportError),

    /// 命名管道无法创建或打开
    #[error("FIFO unavailable: {0}")]
    FifoUnavailable(#[source] TransportError),

    /// 同一 FIFO 上已有守护进程在运行
    #[error(
        "A serial connection is already open (lock held at {}). Use --kill to close it first",
        lock_path.display()
    )]
    AlreadyRunning { lock_path: PathBuf },

    /// 客户端操作时没有守护进程
    #[error("No serial connection is open. Start one with --device <path>")]
    NotRunning,

    /// 互斥的选项同时出现
    #[error("Invalid combination: {0}")]
    InvalidCombination(String),

    /// 出站值不合法
    #[error("Invalid value: {0}")]
    InvalidValue(#[from] ProtocolError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
