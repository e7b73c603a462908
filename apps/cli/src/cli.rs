//! 命令行参数与动作解析

use clap::{ArgGroup, Parser};
use heading_driver::RelayError;
use std::path::PathBuf;

const NOTES: &str = "\
Notes:
  1. Before using any other option the service must be started
     with --device.
  2. Data received by the service can be read from the FIFO
     (default /tmp/headingfifo), or with --read.

Examples (transmit):
  heading --device=/dev/ttyUSB0
  heading --azimuth=170.3 --elevation=45.3
Examples (receive):
  heading --device=/dev/ttyUSB0
  heading -r";

/// Heading - 串口姿态数据中继
#[derive(Parser, Debug)]
#[command(name = "heading")]
#[command(about = "Relay heading data between a serial sensor board and local processes", long_about = None)]
#[command(version)]
#[command(after_help = NOTES)]
#[command(group(
    ArgGroup::new("action")
        .required(true)
        .multiple(true)
        .args(["device", "elevation", "azimuth", "read", "kill"])
))]
pub struct Args {
    /// 启动守护进程并打开指定路径的串口设备
    #[arg(short, long, value_name = "PATH")]
    pub device: Option<PathBuf>,

    /// 发送俯仰角给守护进程转发
    #[arg(short, long, value_name = "ANGLE", allow_hyphen_values = true)]
    pub elevation: Option<String>,

    /// 发送方位角给守护进程转发
    #[arg(short, long, value_name = "ANGLE", allow_hyphen_values = true)]
    pub azimuth: Option<String>,

    /// 持续读取守护进程回写到 FIFO 的姿态数据
    #[arg(short, long)]
    pub read: bool,

    /// 关闭守护进程
    #[arg(short, long)]
    pub kill: bool,

    /// 输出调试日志
    #[arg(short, long)]
    pub verbose: bool,

    /// FIFO 路径（覆盖配置文件）
    #[arg(long, value_name = "PATH")]
    pub fifo: Option<PathBuf>,

    /// 配置文件路径（TOML）
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// 解析后的动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// 启动守护进程
    Daemon {
        device: PathBuf,
        /// 同时给出的其他动作（被忽略，只用于提示）
        ignored_options: bool,
    },
    /// 客户端操作，按 发送 → 读取 → 关闭 的顺序执行
    Client {
        elevation: Option<String>,
        azimuth: Option<String>,
        read: bool,
        kill: bool,
    },
}

impl Args {
    pub fn action(&self) -> Result<Action, RelayError> {
        let sending = self.elevation.is_some() || self.azimuth.is_some();

        if let Some(device) = &self.device {
            return Ok(Action::Daemon {
                device: device.clone(),
                ignored_options: sending || self.read || self.kill,
            });
        }

        if self.read && self.kill {
            return Err(RelayError::InvalidCombination(
                "cannot read and kill in the same operation".to_string(),
            ));
        }

        Ok(Action::Client {
            elevation: self.elevation.clone(),
            azimuth: self.azimuth.clone(),
            read: self.read,
            kill: self.kill,
        })
    }
}
