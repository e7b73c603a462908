//! 串口传输
//!
//! 以 `O_RDWR | O_NONBLOCK | O_NOCTTY` 打开设备，并配置为：
//! - 8 数据位、无校验、1 停止位（`CS8 | CREAD | CLOCAL`）
//! - 输入/输出/本地标志全部清零（原始模式）
//! - `VMIN = 1`、`VTIME = 5`（驱动层 0.5s 读超时；句柄本身仍是非阻塞）
//! - 默认 115200 波特率

use crate::{ByteChannel, TransportError, read_fd, write_fd};
use nix::sys::termios::{
    self, BaudRate, ControlFlags, InputFlags, LocalFlags, OutputFlags, SetArg,
    SpecialCharacterIndices,
};
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// 串口设备句柄
#[derive(Debug)]
pub struct SerialTransport {
    file: File,
    path: PathBuf,
}

impl SerialTransport {
    /// 默认波特率
    pub const DEFAULT_BAUD_RATE: u32 = 115_200;

    /// 打开并配置串口
    ///
    /// 设备不存在、无权限或不是终端设备时返回 [`TransportError::OpenFailed`]。
    pub fn open(path: impl AsRef<Path>, baud_rate: u32) -> Result<Self, TransportError> {
        let path = path.as_ref();
        let baud = baud_rate_flag(baud_rate)?;

        let open_failed = |source: io::Error| TransportError::OpenFailed {
            path: path.to_path_buf(),
            source,
        };

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK | libc::O_NOCTTY)
            .open(path)
            .map_err(open_failed)?;

        configure(&file, baud).map_err(|errno| open_failed(io::Error::from(errno)))?;

        info!(device = %path.display(), baud_rate, "Serial device opened");

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 是否为支持的波特率
    pub fn is_supported_baud_rate(baud_rate: u32) -> bool {
        baud_rate_flag(baud_rate).is_ok()
    }
}

impl ByteChannel for SerialTransport {
    fn read_nonblocking(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        read_fd(&mut self.file, buf)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, TransportError> {
        let n = write_fd(&mut self.file, bytes)?;
        debug!(bytes = n, "Serial write");
        Ok(n)
    }
}

fn configure(file: &File, baud: BaudRate) -> nix::Result<()> {
    let mut tio = termios::tcgetattr(file)?;

    tio.input_flags = InputFlags::empty();
    tio.output_flags = OutputFlags::empty();
    tio.local_flags = LocalFlags::empty();
    tio.control_flags = ControlFlags::CS8 | ControlFlags::CREAD | ControlFlags::CLOCAL;
    tio.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
    tio.control_chars[SpecialCharacterIndices::VTIME as usize] = 5;
    termios::cfsetispeed(&mut tio, baud)?;
    termios::cfsetospeed(&mut tio, baud)?;

    termios::tcsetattr(file, SetArg::TCSANOW, &tio)
}

fn baud_rate_flag(baud_rate: u32) -> Result<BaudRate, TransportError> {
    let flag = match baud_rate {
        9_600 => BaudRate::B9600,
        19_200 => BaudRate::B19200,
        38_400 => BaudRate::B38400,
        57_600 => BaudRate::B57600,
        115_200 => BaudRate::B115200,
        230_400 => BaudRate::B230400,
        other => return Err(TransportError::UnsupportedBaudRate(other)),
    };
    Ok(flag)
}
