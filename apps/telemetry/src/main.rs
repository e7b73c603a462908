//! # Heading Telemetry
//!
//! 遥测发布变体：从传感器板读取定宽 `EAI` 帧，逐帧以 JSON 行输出到 stdout。
//! `--test` 模式反向工作，向串口发送一组测试帧。

use anyhow::{Context, Result};
use clap::Parser;
use heading_transport::SerialTransport;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod publisher;

use publisher::{PublishError, TelemetryPublisher, transmit_test_frames};

/// 轮询与发送间隔
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Heading Telemetry - EAI 遥测帧发布
#[derive(Parser, Debug)]
#[command(name = "heading-telemetry")]
#[command(about = "Publish EAI telemetry frames from the sensor board as JSON lines", long_about = None)]
#[command(version)]
struct Args {
    /// 串口设备路径
    #[arg(short, long, value_name = "PATH")]
    device: PathBuf,

    /// 测试模式：向串口发送测试帧
    #[arg(long)]
    test: bool,

    /// 测试模式发送的帧数
    #[arg(long, default_value_t = 100)]
    count: u32,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,
}

/// 参数解析失败的退出码：--help / --version 为 0，其余为 1
fn parse_exit_code(err: &clap::Error) -> u8 {
    if err.use_stderr() { 1 } else { 0 }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            return ExitCode::from(parse_exit_code(&err));
        },
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(1)
        },
    }
}

fn run(args: Args) -> Result<()> {
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("failed to set signal handler")?;

    let mut serial = SerialTransport::open(&args.device, SerialTransport::DEFAULT_BAUD_RATE)?;
    info!(device = %serial.path().display(), "Serial device opened");

    if args.test {
        let sent = transmit_test_frames(&mut serial, args.count, POLL_INTERVAL, || {
            running.load(Ordering::SeqCst)
        });
        info!(sent, requested = args.count, "Test transmission finished");
        return Ok(());
    }

    let mut publisher = TelemetryPublisher::new(serial, io::stdout().lock());
    while running.load(Ordering::SeqCst) {
        match publisher.poll() {
            Ok(_) => {},
            // stdout 关闭（例如下游管道退出）后无法继续发布
            Err(PublishError::Output(e)) => return Err(e).context("failed to write telemetry"),
            Err(e) => warn!("Telemetry poll failed: {}", e),
        }
        thread::sleep(POLL_INTERVAL);
    }

    let stats = publisher.stats();
    info!(
        frames = stats.frames,
        unrecognized = stats.unrecognized_lines,
        "Telemetry publisher stopped"
    );
    Ok(())
}
