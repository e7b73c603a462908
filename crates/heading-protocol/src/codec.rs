//! 关键字行协议编解码
//!
//! FIFO 控制通道与串口（关键字变体）共用同一套行语法：
//!
//! | 行 | 含义 |
//! |---|---|
//! | `ELEVATION<value>\n` | 设置俯仰角 |
//! | `AZIMUTH<value>\n` | 设置方位角 |
//! | `SEND\n` | 把当前姿态通过串口发出 |
//! | `K\n` | 关闭守护进程 |

use crate::ProtocolError;

/// 俯仰角行头
pub const ELEVATION_HEADER: &str = "ELEVATION";
/// 方位角行头
pub const AZIMUTH_HEADER: &str = "AZIMUTH";
/// 发送请求
pub const SEND_COMMAND: &str = "SEND";
/// 关闭请求
pub const KILL_COMMAND: &str = "K";

/// 解码后的协议消息
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadingMessage {
    SetElevation(String),
    SetAzimuth(String),
    SendRequest,
    KillRequest,
}

impl HeadingMessage {
    /// 解码一行（可带或不带结尾的 `\n`）
    ///
    /// 匹配顺序：`K` → `SEND` → `ELEVATION<value>` → `AZIMUTH<value>`。
    /// 行头后没有内容视为截断，返回 `None`；无法识别的行同样返回 `None`，
    /// 调用方直接丢弃即可。
    pub fn decode(line: &str) -> Option<Self> {
        let line = line.strip_suffix('\n').unwrap_or(line);

        if line == KILL_COMMAND {
            return Some(Self::KillRequest);
        }
        if line == SEND_COMMAND {
            return Some(Self::SendRequest);
        }
        if let Some(value) = line.strip_prefix(ELEVATION_HEADER)
            && !value.is_empty()
        {
            return Some(Self::SetElevation(value.to_string()));
        }
        if let Some(value) = line.strip_prefix(AZIMUTH_HEADER)
            && !value.is_empty()
        {
            return Some(Self::SetAzimuth(value.to_string()));
        }
        None
    }

    /// 编码为一行完整的线路文本（含 `\n`）
    pub fn encode(&self) -> String {
        match self {
            Self::SetElevation(v) => format_elevation(v),
            Self::SetAzimuth(v) => format_azimuth(v),
            Self::SendRequest => format_send(),
            Self::KillRequest => format_kill(),
        }
    }
}

pub fn format_elevation(value: &str) -> String {
    format!("{ELEVATION_HEADER}{value}\n")
}

pub fn format_azimuth(value: &str) -> String {
    format!("{AZIMUTH_HEADER}{value}\n")
}

pub fn format_send() -> String {
    format!("{SEND_COMMAND}\n")
}

pub fn format_kill() -> String {
    format!("{KILL_COMMAND}\n")
}

/// 出站值校验
///
/// 值必须非空、不含换行，并且不超过 `max_len` 字节。
pub fn validate_value(value: &str, max_len: usize) -> Result<(), ProtocolError> {
    if value.is_empty() {
        return Err(ProtocolError::EmptyValue);
    }
    if value.contains(['\n', '\r']) {
        return Err(ProtocolError::LineBreak);
    }
    if value.len() > max_len {
        return Err(ProtocolError::ValueTooLong {
            len: value.len(),
            max: max_len,
        });
    }
    Ok(())
}
