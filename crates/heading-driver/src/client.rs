//! 客户端操作
//!
//! 短命令行调用通过 FIFO 与守护进程通信：发送姿态、请求关闭、轮询更新。
//! 客户端从不直接接触串口或姿态状态。

use crate::{RelayConfig, RelayError, SingletonLock};
use heading_protocol::{
    HeadingMessage, LineFramer, format_azimuth, format_elevation, format_kill, format_send,
    validate_value,
};
use heading_transport::{ByteChannel, FifoChannel};
use tracing::debug;

/// FIFO 客户端
pub struct HeadingClient<C: ByteChannel = FifoChannel> {
    channel: C,
    framer: LineFramer,
    read_buf: Vec<u8>,
    max_value_len: usize,
}

impl HeadingClient<FifoChannel> {
    /// 连接到正在运行的守护进程
    ///
    /// 没有守护进程持有锁时返回 [`RelayError::NotRunning`]。
    pub fn connect(config: &RelayConfig) -> Result<Self, RelayError> {
        if !SingletonLock::is_held(config.lock_path())? {
            return Err(RelayError::NotRunning);
        }

        let fifo =
            FifoChannel::ensure_and_open(&config.fifo_path).map_err(RelayError::FifoUnavailable)?;
        Ok(Self::new(fifo, config))
    }
}

impl<C: ByteChannel> HeadingClient<C> {
    pub fn new(channel: C, config: &RelayConfig) -> Self {
        Self {
            channel,
            framer: LineFramer::new(config.max_line_len),
            read_buf: vec![0u8; config.read_chunk_size],
            max_value_len: config.max_value_len(),
        }
    }

    /// 发送姿态并请求守护进程转发到串口
    ///
    /// 依次写入 `ELEVATION`、`AZIMUTH`（只写提供的字段）和 `SEND`。
    /// 所有值先校验，任何一个不合法都不写入任何内容。
    ///
    /// 整条消息在一次 `write` 中写出（远小于 `PIPE_BUF`），其他客户端的写入
    /// 不会插到本客户端的姿态行与 `SEND` 之间。
    pub fn send_heading(
        &mut self,
        elevation: Option<&str>,
        azimuth: Option<&str>,
    ) -> Result<(), RelayError> {
        for value in [elevation, azimuth].into_iter().flatten() {
            validate_value(value, self.max_value_len)?;
        }

        let mut message = String::new();
        if let Some(value) = elevation {
            message.push_str(&format_elevation(value));
        }
        if let Some(value) = azimuth {
            message.push_str(&format_azimuth(value));
        }
        message.push_str(&format_send());

        debug!(payload = ?message, "Writing to FIFO");
        self.channel.write_line(&message)?;
        Ok(())
    }

    /// 请求守护进程关闭
    pub fn kill(&mut self) -> Result<(), RelayError> {
        debug!("Sending kill request to FIFO");
        self.channel.write_line(&format_kill())?;
        Ok(())
    }

    /// 读取一次 FIFO，返回其中的姿态更新
    ///
    /// 半行保留到下一次调用；非姿态行被忽略。
    pub fn poll_updates(&mut self) -> Result<Vec<HeadingMessage>, RelayError> {
        let n = self.channel.read_nonblocking(&mut self.read_buf)?;
        if n == 0 {
            return Ok(Vec::new());
        }

        let updates = self
            .framer
            .push(&self.read_buf[..n])
            .iter()
            .filter_map(|line| HeadingMessage::decode(line))
            .filter(|msg| {
                matches!(
                    msg,
                    HeadingMessage::SetElevation(_) | HeadingMessage::SetAzimuth(_)
                )
            })
            .collect();
        Ok(updates)
    }
}
