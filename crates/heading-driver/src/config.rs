//! 中继配置
//!
//! 可从 TOML 文件加载，缺省字段取默认值：
//!
//! ```toml
//! fifo_path = "/tmp/headingfifo"
//! baud_rate = 115200
//! read_chunk_size = 100
//! tick_interval_ms = 10
//! max_line_len = 100
//! ```

use crate::RelayError;
use heading_protocol::{ELEVATION_HEADER, LineFramer};
use heading_transport::{FifoChannel, SerialTransport};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 中继配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RelayConfig {
    /// FIFO 路径
    pub fifo_path: PathBuf,
    /// 单实例锁文件路径（默认：FIFO 路径 + `.lock`）
    pub lock_path: Option<PathBuf>,
    /// 串口波特率
    pub baud_rate: u32,
    /// 每个 tick 单次读取的最大字节数
    pub read_chunk_size: usize,
    /// tick 间隔（毫秒）
    pub tick_interval_ms: u64,
    /// 单行最大长度（字节，不含换行符）
    pub max_line_len: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            fifo_path: PathBuf::from(FifoChannel::DEFAULT_PATH),
            lock_path: None,
            baud_rate: SerialTransport::DEFAULT_BAUD_RATE,
            read_chunk_size: 100,
            tick_interval_ms: 10,
            max_line_len: LineFramer::DEFAULT_MAX_LINE_LEN,
        }
    }
}

impl RelayConfig {
    /// 从 TOML 文本解析
    pub fn from_toml_str(content: &str) -> Result<Self, RelayError> {
        toml::from_str(content).map_err(|e| RelayError::Config(e.to_string()))
    }

    /// 从 TOML 文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RelayError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RelayError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// 实际使用的锁文件路径
    pub fn lock_path(&self) -> PathBuf {
        self.lock_path.clone().unwrap_or_else(|| {
            let mut path: OsString = self.fifo_path.clone().into_os_string();
            path.push(".lock");
            PathBuf::from(path)
        })
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// 单个角度值的最大长度：整行长度减去最长的行头
    pub fn max_value_len(&self) -> usize {
        self.max_line_len.saturating_sub(ELEVATION_HEADER.len())
    }

    pub fn validate(&self) -> Result<(), RelayError> {
        if self.fifo_path.as_os_str().is_empty() {
            return Err(RelayError::Config("fifo_path must not be empty".to_string()));
        }
        if self.read_chunk_size == 0 {
            return Err(RelayError::Config("read_chunk_size must be > 0".to_string()));
        }
        if self.max_value_len() == 0 {
            return Err(RelayError::Config(format!(
                "max_line_len must be > {}",
                ELEVATION_HEADER.len()
            )));
        }
        if !SerialTransport::is_supported_baud_rate(self.baud_rate) {
            return Err(RelayError::Config(format!(
                "unsupported baud rate {}",
                self.baud_rate
            )));
        }
        Ok(())
    }
}
