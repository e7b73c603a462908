//! 中继驱动层
//!
//! 本模块提供姿态中继守护进程的核心功能，包括：
//! - 姿态状态存储（最近一次的方位角/俯仰角）
//! - 单线程轮询中继循环（FIFO ↔ 串口）
//! - 单实例锁（文件锁，绑定 FIFO 路径）
//! - 客户端操作（发送姿态、读取更新、关闭守护进程）
//!
//! # 使用场景
//!
//! 守护进程由 `heading --device <path>` 启动，之后的短命令行调用
//! 全部通过 FIFO 与它通信，不直接接触串口或状态。

mod client;
mod config;
mod daemon;
mod error;
pub mod relay;
mod singleton;
pub mod state;

pub use client::HeadingClient;
pub use config::RelayConfig;
pub use daemon::Daemon;
pub use error::RelayError;
pub use relay::{LoopState, RelayLoop, RelayStats};
pub use singleton::SingletonLock;
pub use state::HeadingState;

pub use heading_protocol::HeadingMessage;
