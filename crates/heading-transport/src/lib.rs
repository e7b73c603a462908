//! # Heading Transport
//!
//! 字节通道抽象层：串口设备与命名管道（FIFO）。
//!
//! 两者都以非阻塞方式打开，`read_nonblocking` 在无数据时立即返回 0，
//! 中继循环的唯一挂起点是每个 tick 末尾的固定睡眠。

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use thiserror::Error;

pub mod fifo;
pub mod serial;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use fifo::FifoChannel;
pub use serial::SerialTransport;

#[cfg(any(test, feature = "mock"))]
pub use mock::MockChannel;

/// 传输层统一错误类型
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Failed to open serial device {}: {source}", path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("FIFO unavailable at {}: {source}", path.display())]
    FifoUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unsupported baud rate: {0}")]
    UnsupportedBaudRate(u32),

    #[error("Read failed: {0}")]
    ReadFailed(#[source] io::Error),

    #[error("Write failed: {0}")]
    WriteFailed(#[source] io::Error),

    #[error("Short write: {written} of {expected} bytes")]
    ShortWrite { written: usize, expected: usize },
}

/// 非阻塞字节通道
///
/// 串口、FIFO 与测试用的内存通道都实现此 trait，中继循环对两端一视同仁。
pub trait ByteChannel {
    /// 读取至多 `buf.len()` 字节；没有就绪数据时返回 `Ok(0)`，从不阻塞
    fn read_nonblocking(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// 写入字节，返回实际写入的字节数（可能少于输入长度）
    fn write(&mut self, bytes: &[u8]) -> Result<usize, TransportError>;

    /// 写入一整行，短写视为错误
    fn write_line(&mut self, line: &str) -> Result<(), TransportError> {
        let expected = line.len();
        let written = self.write(line.as_bytes())?;
        if written < expected {
            return Err(TransportError::ShortWrite { written, expected });
        }
        Ok(())
    }
}

/// 对非阻塞文件描述符执行一次读取
///
/// `EAGAIN`/`EINTR` 视为无数据。
pub(crate) fn read_fd(file: &mut File, buf: &mut [u8]) -> Result<usize, TransportError> {
    match file.read(buf) {
        Ok(n) => Ok(n),
        Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {
            Ok(0)
        },
        Err(e) => Err(TransportError::ReadFailed(e)),
    }
}

/// 对非阻塞文件描述符写入，直到写完或内核缓冲区已满
pub(crate) fn write_fd(file: &mut File, bytes: &[u8]) -> Result<usize, TransportError> {
    let mut written = 0;
    while written < bytes.len() {
        match file.write(&bytes[written..]) {
            Ok(0) => break,
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
            Err(e) => return Err(TransportError::WriteFailed(e)),
        }
    }
    Ok(written)
}
