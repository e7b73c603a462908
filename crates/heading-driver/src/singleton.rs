//! 单实例文件锁
//!
//! 锁文件与 FIFO 路径绑定（默认 `<fifo>.lock`），守护进程在打开串口之前
//! 取得排他锁；客户端通过探测同一把锁判断守护进程是否在运行。
//! 进程崩溃时内核自动释放锁，不会留下陈旧状态。

use crate::RelayError;
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// 客户端探测只短暂持有共享锁，取排他锁失败时按此间隔重试
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(10);
const LOCK_RETRIES: u32 = 5;

/// 单例文件锁
///
/// 持有期间其他进程无法获取同一路径的锁；`Drop` 时释放。
#[derive(Debug)]
pub struct SingletonLock {
    file: File,
    path: PathBuf,
}

impl SingletonLock {
    /// 尝试获取单例锁（非阻塞）
    ///
    /// 锁已被持有时返回 [`RelayError::AlreadyRunning`]，不做任何其他操作。
    /// 与客户端探测撞上时短暂重试几次，不会因探测而误判。
    pub fn try_lock(lock_path: impl AsRef<Path>) -> Result<Self, RelayError> {
        let path = lock_path.as_ref();

        // 先不截断：还没拿到锁，文件里可能是正在运行的守护进程的 PID
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .read(true)
            .open(path)?;

        let mut attempts = 0;
        while !FileExt::try_lock_exclusive(&file)? {
            attempts += 1;
            if attempts > LOCK_RETRIES {
                return Err(RelayError::AlreadyRunning {
                    lock_path: path.to_path_buf(),
                });
            }
            thread::sleep(LOCK_RETRY_INTERVAL);
        }

        // 拿到锁后清掉旧内容，写入当前 PID（便于排查）
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        writeln!(&file, "{}", std::process::id())?;
        file.sync_all()?;

        debug!(lock = %path.display(), "Singleton lock acquired");

        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    /// 探测锁是否被其他句柄持有
    ///
    /// 锁文件不存在视为未持有。探测短暂地取得并立即释放共享锁，
    /// 多个客户端同时探测互不影响，守护进程的排他锁仍能被发现。
    pub fn is_held(lock_path: impl AsRef<Path>) -> Result<bool, RelayError> {
        let file = match File::open(lock_path.as_ref()) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        if FileExt::try_lock_shared(&file)? {
            FileExt::unlock(&file)?;
            Ok(false)
        } else {
            Ok(true)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SingletonLock {
    fn drop(&mut self) {
        // 关闭文件同样会释放锁，这里显式解锁
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_singleton_lock_exclusive() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("headingfifo.lock");

        let lock1 = SingletonLock::try_lock(&lock_path).unwrap();

        // flock 作用于打开的文件描述，同一进程内的第二次打开同样被拒绝
        let err = SingletonLock::try_lock(&lock_path).unwrap_err();
        assert!(matches!(err, RelayError::AlreadyRunning { .. }), "{:?}", err);

        drop(lock1);

        let lock2 = SingletonLock::try_lock(&lock_path).unwrap();
        assert_eq!(lock2.path(), lock_path.as_path());
    }

    #[test]
    fn test_singleton_lock_writes_pid() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("heading.lock");

        let lock = SingletonLock::try_lock(&lock_path).unwrap();
        assert!(lock_path.exists());
        drop(lock);

        let content = fs::read_to_string(&lock_path).unwrap();
        assert_eq!(content.trim(), std::process::id().to_string());
    }

    #[test]
    fn test_concurrent_probes_do_not_conflict() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("heading.lock");
        fs::write(&lock_path, b"").unwrap();

        // 另一个客户端正在探测（持有共享锁）
        let other = File::open(&lock_path).unwrap();
        assert!(FileExt::try_lock_shared(&other).unwrap());

        assert!(!SingletonLock::is_held(&lock_path).unwrap());
        FileExt::unlock(&other).unwrap();
    }

    #[test]
    fn test_daemon_start_waits_out_a_probe() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("heading.lock");
        fs::write(&lock_path, b"").unwrap();

        let probe = File::open(&lock_path).unwrap();
        assert!(FileExt::try_lock_shared(&probe).unwrap());
        let releaser = thread::spawn(move || {
            thread::sleep(Duration::from_millis(5));
            FileExt::unlock(&probe).unwrap();
        });

        let lock = SingletonLock::try_lock(&lock_path).unwrap();
        releaser.join().unwrap();
        assert!(SingletonLock::is_held(lock.path()).unwrap());
    }

    #[test]
    fn test_is_held() {
        let dir = tempfile::tempdir().unwrap();
        let lock_path = dir.path().join("heading.lock");

        assert!(!SingletonLock::is_held(&lock_path).unwrap());

        let lock = SingletonLock::try_lock(&lock_path).unwrap();
        assert!(SingletonLock::is_held(&lock_path).unwrap());

        drop(lock);
        // 锁文件残留但无人持有
        assert!(lock_path.exists());
        assert!(!SingletonLock::is_held(&lock_path).unwrap());
    }
}
