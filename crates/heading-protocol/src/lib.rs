//! # Heading Protocol
//!
//! 姿态数据中继的线路协议定义（无 I/O 依赖）
//!
//! ## 模块
//!
//! - `framer`: 字节流 → 文本行
//! - `codec`: FIFO/串口共用的关键字行协议（`ELEVATION`、`AZIMUTH`、`SEND`、`K`）
//! - `telemetry`: 遥测发布变体使用的定宽串口帧（`EAI...;`）
//!
//! 两种协议互不共享状态，线路形状完全不同，不做统一。

pub mod codec;
pub mod framer;
pub mod telemetry;

pub use codec::{
    AZIMUTH_HEADER, ELEVATION_HEADER, HeadingMessage, KILL_COMMAND, SEND_COMMAND, format_azimuth,
    format_elevation, format_kill, format_send, validate_value,
};
pub use framer::{LineFramer, split_lines};
pub use telemetry::{TELEMETRY_HEADER, TelemetryFrame};

use thiserror::Error;

/// 协议层错误类型
///
/// 解码失败不是错误（无法识别的行直接丢弃），这里只覆盖出站值校验。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Empty value")]
    EmptyValue,

    #[error("Value contains a line break")]
    LineBreak,

    #[error("Value too long: {len} bytes (max {max})")]
    ValueTooLong { len: usize, max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_display() {
        assert_eq!(ProtocolError::EmptyValue.to_string(), "Empty value");
        let msg = ProtocolError::ValueTooLong { len: 120, max: 99 }.to_string();
        assert!(msg.contains("120") && msg.contains("99"), "{}", msg);
    }
}
