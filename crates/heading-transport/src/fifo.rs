//! FIFO 控制通道
//!
//! 在约定路径上创建（若不存在）命名管道，并以 `O_RDWR | O_NONBLOCK` 打开。
//! 以读写方式打开的 FIFO 不会因为没有对端而阻塞，也不会读到 EOF。
//!
//! 管道文件在进程退出后仍然保留，守护进程从不删除它，重启后直接复用。

use crate::{ByteChannel, TransportError, read_fd, write_fd};
use nix::errno::Errno;
use nix::sys::stat::Mode;
use nix::unistd;
use std::fs::{self, File, OpenOptions, Permissions};
use std::io;
use std::os::unix::fs::{FileTypeExt, OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 管道权限：所有本地用户可读写
const FIFO_MODE: u32 = 0o666;

/// 命名管道句柄
#[derive(Debug)]
pub struct FifoChannel {
    file: File,
    path: PathBuf,
}

impl FifoChannel {
    /// 约定的默认路径
    pub const DEFAULT_PATH: &'static str = "/tmp/headingfifo";

    /// 确保管道存在并打开
    ///
    /// 幂等：路径已是 FIFO 时直接打开。路径存在但不是 FIFO、
    /// 创建失败或打开失败时返回 [`TransportError::FifoUnavailable`]。
    pub fn ensure_and_open(path: impl AsRef<Path>) -> Result<Self, TransportError> {
        let path = path.as_ref();
        let unavailable = |source: io::Error| TransportError::FifoUnavailable {
            path: path.to_path_buf(),
            source,
        };

        ensure_fifo(path).map_err(unavailable)?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)
            .map_err(unavailable)?;

        debug!(fifo = %path.display(), "FIFO opened");

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ByteChannel for FifoChannel {
    fn read_nonblocking(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        read_fd(&mut self.file, buf)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, TransportError> {
        write_fd(&mut self.file, bytes)
    }
}

fn ensure_fifo(path: &Path) -> io::Result<()> {
    match fs::metadata(path) {
        Ok(meta) if meta.file_type().is_fifo() => return Ok(()),
        Ok(_) => {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "path exists and is not a FIFO",
            ));
        },
        Err(e) if e.kind() == io::ErrorKind::NotFound => {},
        Err(e) => return Err(e),
    }

    match unistd::mkfifo(path, Mode::from_bits_truncate(FIFO_MODE as libc::mode_t)) {
        // 另一个进程抢先创建
        Ok(()) | Err(Errno::EEXIST) => {},
        Err(errno) => return Err(io::Error::from(errno)),
    }

    // umask 会屏蔽 mkfifo 的权限位，这里补齐
    if let Err(e) = fs::set_permissions(path, Permissions::from_mode(FIFO_MODE)) {
        warn!(fifo = %path.display(), error = %e, "Could not widen FIFO permissions");
    }

    info!(fifo = %path.display(), "FIFO created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creates_world_writable_fifo() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headingfifo");

        let _fifo = FifoChannel::ensure_and_open(&path).unwrap();

        let meta = fs::metadata(&path).unwrap();
        assert!(meta.file_type().is_fifo());
        assert_eq!(meta.permissions().mode() & 0o777, 0o666);
    }

    #[test]
    fn test_open_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("headingfifo");

        let first = FifoChannel::ensure_and_open(&path).unwrap();
        drop(first);
        // 管道文件在句柄关闭后保留
        assert!(path.exists());
        let second = FifoChannel::ensure_and_open(&path).unwrap();
        assert_eq!(second.path(), path.as_path());
    }

    #[test]
    fn test_read_empty_does_not_block() {
        let dir = tempfile::tempdir().unwrap();
        let mut fifo = FifoChannel::ensure_and_open(dir.path().join("fifo")).unwrap();
        let mut buf = [0u8; 100];
        assert_eq!(fifo.read_nonblocking(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_writer_to_reader() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fifo");
        let mut reader = FifoChannel::ensure_and_open(&path).unwrap();
        let mut writer = FifoChannel::ensure_and_open(&path).unwrap();

        writer.write_line("AZIMUTH170.3\n").unwrap();
        writer.write_line("SEND\n").unwrap();

        let mut buf = [0u8; 100];
        let n = reader.read_nonblocking(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"AZIMUTH170.3\nSEND\n");
    }

    #[test]
    fn test_regular_file_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = FifoChannel::ensure_and_open(file.path()).unwrap_err();
        assert!(matches!(err, TransportError::FifoUnavailable { .. }), "{:?}", err);
    }

    #[test]
    fn test_missing_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("no-such-dir").join("fifo");
        let err = FifoChannel::ensure_and_open(&path).unwrap_err();
        assert!(matches!(err, TransportError::FifoUnavailable { .. }));
    }
}
