//! EAI 遥测帧的接收与发送
//!
//! 接收侧：从串口读取字节，按行切分，解码 `EAI...;` 帧并以 JSON 行写到输出。
//! 发送侧（测试模式）：按固定间隔生成帧写入串口。

use heading_protocol::{LineFramer, TelemetryFrame};
use heading_transport::{ByteChannel, TransportError};
use std::io::{self, Write};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{trace, warn};

/// 单次读取的缓冲区大小
pub const READ_CHUNK_SIZE: usize = 100;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Output error: {0}")]
    Output(#[from] io::Error),

    #[error("JSON encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// 接收统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PublishStats {
    pub frames: u64,
    pub unrecognized_lines: u64,
}

pub struct TelemetryPublisher<C, W> {
    channel: C,
    out: W,
    framer: LineFramer,
    read_buf: Vec<u8>,
    stats: PublishStats,
}

impl<C: ByteChannel, W: Write> TelemetryPublisher<C, W> {
    pub fn new(channel: C, out: W) -> Self {
        Self {
            channel,
            out,
            framer: LineFramer::default(),
            read_buf: vec![0u8; READ_CHUNK_SIZE],
            stats: PublishStats::default(),
        }
    }

    pub fn stats(&self) -> &PublishStats {
        &self.stats
    }

    /// 读取一次串口，发布其中完整的帧，返回本次发布的帧数
    pub fn poll(&mut self) -> Result<usize, PublishError> {
        let n = self.channel.read_nonblocking(&mut self.read_buf)?;
        if n == 0 {
            return Ok(0);
        }

        let mut published = 0;
        for line in self.framer.push(&self.read_buf[..n]) {
            match TelemetryFrame::decode(&line) {
                Some(frame) => {
                    serde_json::to_writer(&mut self.out, &frame)?;
                    self.out.write_all(b"\n")?;
                    published += 1;
                },
                None => {
                    trace!(line = %line, "Ignoring non-telemetry line");
                    self.stats.unrecognized_lines += 1;
                },
            }
        }

        if published > 0 {
            self.out.flush()?;
            self.stats.frames += published as u64;
        }
        Ok(published)
    }
}

/// 测试模式下第 `i` 帧的内容
pub fn test_frame(i: u32) -> TelemetryFrame {
    TelemetryFrame::new(i as f32 + 0.1, 100.0 - i as f32 + 0.2, i)
}

/// 向串口发送 `count` 个测试帧，帧间隔 `interval`
///
/// `keep_going` 返回 false 时提前结束。返回实际发送成功的帧数；
/// 单帧写入失败只记录警告。
pub fn transmit_test_frames<C: ByteChannel>(
    channel: &mut C,
    count: u32,
    interval: Duration,
    mut keep_going: impl FnMut() -> bool,
) -> u32 {
    let mut sent = 0;
    for i in 0..count {
        if !keep_going() {
            break;
        }
        let frame = test_frame(i);
        match channel.write_line(&frame.encode()) {
            Ok(()) => sent += 1,
            Err(e) => warn!(id = i, "Failed to transmit test frame: {}", e),
        }
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }
    sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use heading_transport::MockChannel;

    #[test]
    fn test_publish_frames_as_json_lines() {
        let channel = MockChannel::new();
        channel.push_rx("EAI00045.3,00170.3,0000000007;\nnoise\nEAI000001.0,");
        channel.push_rx("000002.0,0000000008;\n");

        let mut publisher = TelemetryPublisher::new(channel, Vec::new());
        assert_eq!(publisher.poll().unwrap(), 1);
        assert_eq!(publisher.poll().unwrap(), 1);
        assert_eq!(publisher.poll().unwrap(), 0);

        let stats = publisher.stats().clone();
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.unrecognized_lines, 1);

        let out = String::from_utf8(publisher.out).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["id"], 7);
        assert!((first["elevation"].as_f64().unwrap() - 45.3).abs() < 1e-4);
        assert!((first["azimuth"].as_f64().unwrap() - 170.3).abs() < 1e-4);

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["id"], 8);
    }

    #[test]
    fn test_transport_error_is_surfaced() {
        struct Broken;
        impl ByteChannel for Broken {
            fn read_nonblocking(&mut self, _: &mut [u8]) -> Result<usize, TransportError> {
                Err(TransportError::ReadFailed(io::Error::other("gone")))
            }
            fn write(&mut self, _: &[u8]) -> Result<usize, TransportError> {
                Ok(0)
            }
        }

        let mut publisher = TelemetryPublisher::new(Broken, Vec::new());
        assert!(matches!(
            publisher.poll(),
            Err(PublishError::Transport(TransportError::ReadFailed(_)))
        ));
    }

    #[test]
    fn test_frame_sequence() {
        let frame = test_frame(3);
        assert_eq!(frame.id, 3);
        assert!((frame.elevation - 3.1).abs() < 1e-4);
        assert!((frame.azimuth - 97.2).abs() < 1e-4);
    }

    #[test]
    fn test_transmit_test_frames() {
        let mut channel = MockChannel::new();
        let sent = transmit_test_frames(&mut channel, 3, Duration::ZERO, || true);
        assert_eq!(sent, 3);
        assert_eq!(
            channel.written_lines(),
            vec![
                "EAI000000.1,000100.2,0000000000;",
                "EAI000001.1,000099.2,0000000001;",
                "EAI000002.1,000098.2,0000000002;",
            ]
        );
    }

    #[test]
    fn test_transmit_stops_early_and_survives_write_errors() {
        let mut channel = MockChannel::new();
        let mut budget = 2;
        let sent = transmit_test_frames(&mut channel, 10, Duration::ZERO, || {
            budget -= 1;
            budget >= 0
        });
        assert_eq!(sent, 2);

        channel.clear_writes();
        channel.set_fail_writes(true);
        let sent = transmit_test_frames(&mut channel, 2, Duration::ZERO, || true);
        assert_eq!(sent, 0);
    }
}
