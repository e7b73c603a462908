//! 中继循环
//!
//! 单线程协作式轮询。每个 tick：
//!
//! 1. `DrainFifo`：非阻塞读 FIFO，分帧、解码，更新姿态 / 发串口 / 关闭
//! 2. `DrainSerial`：非阻塞读串口，解码姿态行并更新状态，有更新则回写 FIFO
//! 3. `Idle`：固定睡眠 `tick_interval`（唯一的挂起点）
//!
//! 同一 tick 内先完整处理 FIFO 再处理串口。因此与串口更新同一 tick 到达的
//! `SEND` 发出的是更新前的姿态。

use crate::{HeadingState, RelayConfig};
use heading_protocol::{HeadingMessage, LineFramer, format_azimuth, format_elevation};
use heading_transport::{ByteChannel, TransportError};
use std::ops::ControlFlow;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// 循环状态机
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// 等待下一个 tick
    Idle,
    /// 正在处理 FIFO 输入
    DrainFifo,
    /// 正在处理串口输入
    DrainSerial,
    /// 收到关闭请求，终态
    Shutdown,
}

/// 运行统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayStats {
    /// 已执行的 tick 数
    pub ticks: u64,
    /// 从 FIFO 收到的完整行
    pub fifo_lines: u64,
    /// 从串口收到的完整行
    pub serial_lines: u64,
    /// 无法识别而丢弃的行
    pub unrecognized_lines: u64,
    /// 超长而丢弃的行
    pub overlong_lines: u64,
    /// 含非 UTF-8 字节而丢弃的行
    pub invalid_lines: u64,
    /// 成功写到串口的行
    pub serial_lines_sent: u64,
    /// 回写 FIFO 的次数
    pub fifo_publishes: u64,
    /// 读写失败次数（非致命）
    pub transport_errors: u64,
}

/// 中继循环上下文
///
/// 持有两端通道、姿态状态与分帧缓存。丢弃即关闭两端通道。
pub struct RelayLoop<S: ByteChannel, F: ByteChannel> {
    serial: S,
    fifo: F,
    heading: HeadingState,
    fifo_framer: LineFramer,
    serial_framer: LineFramer,
    read_buf: Vec<u8>,
    tick_interval: Duration,
    state: LoopState,
    stats: RelayStats,
}

impl<S: ByteChannel, F: ByteChannel> RelayLoop<S, F> {
    pub fn new(serial: S, fifo: F, config: &RelayConfig) -> Self {
        Self {
            serial,
            fifo,
            heading: HeadingState::new(),
            fifo_framer: LineFramer::new(config.max_line_len),
            serial_framer: LineFramer::new(config.max_line_len),
            read_buf: vec![0u8; config.read_chunk_size],
            tick_interval: config.tick_interval(),
            state: LoopState::Idle,
            stats: RelayStats::default(),
        }
    }

    pub fn heading(&self) -> &HeadingState {
        &self.heading
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stats(&self) -> &RelayStats {
        &self.stats
    }

    /// 拆出两端通道
    pub fn into_channels(self) -> (S, F) {
        (self.serial, self.fifo)
    }

    /// 运行直到收到关闭请求
    pub fn run(&mut self) {
        info!(interval_ms = self.tick_interval.as_millis() as u64, "Relay loop started");
        while self.tick() != LoopState::Shutdown {
            thread::sleep(self.tick_interval);
        }
        info!(stats = ?self.stats, "Relay loop stopped");
    }

    /// 执行一个 tick（不含睡眠），返回 tick 结束后的状态
    ///
    /// 进入 `Shutdown` 后不再处理任何输入。
    pub fn tick(&mut self) -> LoopState {
        if self.state == LoopState::Shutdown {
            return LoopState::Shutdown;
        }
        self.stats.ticks += 1;

        self.state = LoopState::DrainFifo;
        if self.drain_fifo().is_break() {
            self.state = LoopState::Shutdown;
            return self.state;
        }

        self.state = LoopState::DrainSerial;
        self.drain_serial();

        self.state = LoopState::Idle;
        self.state
    }

    fn drain_fifo(&mut self) -> ControlFlow<()> {
        let n = match self.fifo.read_nonblocking(&mut self.read_buf) {
            Ok(n) => n,
            Err(e) => {
                self.record_transport_error("FIFO read", &e);
                return ControlFlow::Continue(());
            },
        };
        if n == 0 {
            return ControlFlow::Continue(());
        }

        let lines = self.fifo_framer.push(&self.read_buf[..n]);
        self.check_framer_drops();

        for line in lines {
            self.stats.fifo_lines += 1;
            debug!(line = %line, "FIFO message");

            match HeadingMessage::decode(&line) {
                Some(HeadingMessage::SetElevation(value)) => {
                    debug!(elevation = %value, "Elevation updated from FIFO");
                    self.heading.set_elevation(value);
                },
                Some(HeadingMessage::SetAzimuth(value)) => {
                    debug!(azimuth = %value, "Azimuth updated from FIFO");
                    self.heading.set_azimuth(value);
                },
                Some(HeadingMessage::SendRequest) => self.transmit_heading(),
                Some(HeadingMessage::KillRequest) => {
                    info!("Kill request received");
                    return ControlFlow::Break(());
                },
                None => {
                    self.stats.unrecognized_lines += 1;
                    trace!(line = %line, "Unrecognized FIFO line dropped");
                },
            }
        }
        ControlFlow::Continue(())
    }

    fn drain_serial(&mut self) {
        let n = match self.serial.read_nonblocking(&mut self.read_buf) {
            Ok(n) => n,
            Err(e) => {
                self.record_transport_error("Serial read", &e);
                return;
            },
        };
        if n == 0 {
            return;
        }

        let lines = self.serial_framer.push(&self.read_buf[..n]);
        self.check_framer_drops();

        let mut updated = false;
        for line in lines {
            self.stats.serial_lines += 1;
            debug!(line = %line, "Serial message");

            match HeadingMessage::decode(&line) {
                Some(HeadingMessage::SetElevation(value)) => {
                    debug!(elevation = %value, "Elevation updated from serial");
                    self.heading.set_elevation(value);
                    updated = true;
                },
                Some(HeadingMessage::SetAzimuth(value)) => {
                    debug!(azimuth = %value, "Azimuth updated from serial");
                    self.heading.set_azimuth(value);
                    updated = true;
                },
                // 串口侧只接受姿态数据，控制命令只能来自 FIFO
                Some(other) => {
                    self.stats.unrecognized_lines += 1;
                    debug!(msg = ?other, "Ignoring control message from serial");
                },
                None => {
                    self.stats.unrecognized_lines += 1;
                    trace!(line = %line, "Unrecognized serial line dropped");
                },
            }
        }

        if updated {
            self.publish_heading();
        }
    }

    /// 把当前姿态发到串口：先方位角，后俯仰角
    ///
    /// 任一字段为空时不发送。
    fn transmit_heading(&mut self) {
        if !self.heading.is_complete() {
            debug!("SEND ignored: heading incomplete");
            return;
        }

        let (azimuth, elevation) = self.heading.snapshot();
        let frames = [format_azimuth(azimuth), format_elevation(elevation)];
        for frame in &frames {
            match self.serial.write_line(frame) {
                Ok(()) => {
                    self.stats.serial_lines_sent += 1;
                    debug!(frame = %frame.trim_end(), "Sent over serial");
                },
                Err(e) => self.record_transport_error("Serial write", &e),
            }
        }
    }

    /// 把串口来的新姿态回写 FIFO，供轮询 FIFO 的本地进程读取
    fn publish_heading(&mut self) {
        let (azimuth, elevation) = self.heading.snapshot();
        let mut frames = Vec::with_capacity(2);
        if !elevation.is_empty() {
            frames.push(format_elevation(elevation));
        }
        if !azimuth.is_empty() {
            frames.push(format_azimuth(azimuth));
        }

        self.stats.fifo_publishes += 1;
        for frame in &frames {
            if let Err(e) = self.fifo.write_line(frame) {
                self.record_transport_error("FIFO write", &e);
            }
        }
    }

    fn check_framer_drops(&mut self) {
        let dropped = self.fifo_framer.dropped_lines() + self.serial_framer.dropped_lines();
        if dropped > self.stats.overlong_lines {
            warn!(
                max_line_len = self.fifo_framer.max_line_len(),
                dropped = dropped - self.stats.overlong_lines,
                "Discarded overlong line"
            );
            self.stats.overlong_lines = dropped;
        }

        let invalid = self.fifo_framer.invalid_lines() + self.serial_framer.invalid_lines();
        if invalid > self.stats.invalid_lines {
            warn!(
                dropped = invalid - self.stats.invalid_lines,
                "Discarded line with non UTF-8 bytes"
            );
            self.stats.invalid_lines = invalid;
        }
    }

    fn record_transport_error(&mut self, op: &str, error: &TransportError) {
        self.stats.transport_errors += 1;
        warn!(op, error = %error, "Transport error (continuing)");
    }
}
