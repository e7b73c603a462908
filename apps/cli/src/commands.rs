//! 动作执行

use anyhow::{Context, Result};
use heading_driver::{Daemon, HeadingClient, HeadingMessage, RelayConfig};
use std::path::Path;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use tracing::{debug, error, info};

/// 前台运行守护进程，直到收到 `K` 或 Ctrl+C
pub fn run_daemon(device: &Path, config: &RelayConfig) -> Result<()> {
    let daemon = Daemon::start(device, config).inspect_err(|e| {
        error!(device = %device.display(), error = %e, "Daemon startup failed");
    })?;

    // Ctrl+C：直接退出，文件锁随进程释放
    ctrlc::set_handler(move || {
        eprintln!("\nReceived interrupt signal. Shutting down...");
        process::exit(0);
    })
    .context("failed to set signal handler")?;

    let stats = daemon.run();
    info!(
        ticks = stats.ticks,
        fifo_lines = stats.fifo_lines,
        serial_lines = stats.serial_lines,
        serial_lines_sent = stats.serial_lines_sent,
        transport_errors = stats.transport_errors,
        "Relay statistics"
    );
    Ok(())
}

/// 客户端：发送 → 读取 → 关闭
pub fn run_client(
    config: &RelayConfig,
    elevation: Option<&str>,
    azimuth: Option<&str>,
    read: bool,
    kill: bool,
) -> Result<()> {
    let mut client = HeadingClient::connect(config)?;

    if elevation.is_some() || azimuth.is_some() {
        client.send_heading(elevation, azimuth)?;
        debug!(?elevation, ?azimuth, "Heading sent");
    }

    if read {
        read_updates(&mut client, config)?;
    }

    if kill {
        client.kill()?;
        println!("Kill request sent.");
    }

    Ok(())
}

/// 持续打印回写到 FIFO 的姿态，直到 Ctrl+C
fn read_updates(client: &mut HeadingClient, config: &RelayConfig) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("failed to set signal handler")?;

    info!(fifo = %config.fifo_path.display(), "Reading heading updates, press Ctrl+C to stop");

    while running.load(Ordering::SeqCst) {
        for update in client.poll_updates()? {
            match update {
                HeadingMessage::SetElevation(value) => println!("Elevation: {value}"),
                HeadingMessage::SetAzimuth(value) => println!("Azimuth: {value}"),
                _ => {},
            }
        }
        thread::sleep(config.tick_interval());
    }

    Ok(())
}
