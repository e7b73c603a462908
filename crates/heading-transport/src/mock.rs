//! 内存字节通道
//!
//! 用于测试的模拟通道：测试代码通过克隆出的句柄注入待读数据、检查写出内容。
//! 读写两侧相互独立，写出的数据不会回环到读取侧。

use crate::{ByteChannel, TransportError};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

#[derive(Debug, Default)]
struct MockState {
    /// 待读取的数据块，每次读取最多消费一块
    rx_queue: VecDeque<Vec<u8>>,
    /// 每次 `write` 调用写出的数据
    writes: Vec<Vec<u8>>,
    /// 模拟写失败
    fail_writes: bool,
    /// 模拟内核缓冲区：单次写入的上限
    write_limit: Option<usize>,
}

/// 模拟通道（可克隆，克隆体共享同一状态）
#[derive(Debug, Clone, Default)]
pub struct MockChannel {
    state: Arc<Mutex<MockState>>,
}

impl MockChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// 排入一块数据，对应后续某一次 `read_nonblocking` 的返回
    pub fn push_rx(&self, bytes: impl AsRef<[u8]>) {
        self.state.lock().rx_queue.push_back(bytes.as_ref().to_vec());
    }

    /// 尚未被读取的数据块数
    pub fn pending_rx(&self) -> usize {
        self.state.lock().rx_queue.len()
    }

    /// 所有写调用的原始记录
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.state.lock().writes.clone()
    }

    /// 写出字节的拼接结果
    pub fn written_bytes(&self) -> Vec<u8> {
        self.state.lock().writes.concat()
    }

    /// 写出内容按行切分（不含换行符）
    pub fn written_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.written_bytes())
            .lines()
            .map(str::to_string)
            .collect()
    }

    pub fn clear_writes(&self) {
        self.state.lock().writes.clear();
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    pub fn set_write_limit(&self, limit: Option<usize>) {
        self.state.lock().write_limit = limit;
    }
}

impl ByteChannel for MockChannel {
    fn read_nonblocking(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut state = self.state.lock();
        let Some(mut chunk) = state.rx_queue.pop_front() else {
            return Ok(0);
        };

        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            // 一次读不完的部分留给下一次
            state.rx_queue.push_front(chunk.split_off(n));
        }
        Ok(n)
    }

    fn write(&mut self, bytes: &[u8]) -> Result<usize, TransportError> {
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(TransportError::WriteFailed(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "mock write failure",
            )));
        }

        let n = state.write_limit.map_or(bytes.len(), |limit| limit.min(bytes.len()));
        state.writes.push(bytes[..n].to_vec());
        Ok(n)
    }
}
