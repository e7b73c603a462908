//! # Heading CLI
//!
//! 串口姿态中继的命令行入口。
//!
//! ```bash
//! # 启动守护进程（前台运行，直到收到 --kill）
//! heading --device=/dev/ttyUSB0
//!
//! # 发送姿态
//! heading --azimuth=170.3 --elevation=45.3
//!
//! # 读取板卡回传的姿态
//! heading -r
//!
//! # 关闭守护进程
//! heading -k
//! ```

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod settings;

use cli::{Action, Args};

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // --help / --version 属于正常退出，其余解析错误退出码为 1
            let code = if err.use_stderr() { 1 } else { 0 };
            let _ = err.print();
            return ExitCode::from(code);
        },
    };

    init_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(1)
        },
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let action = args.action()?;
    let config = settings::load(args.config.as_deref(), args.fifo.as_deref())?;

    match action {
        Action::Daemon {
            device,
            ignored_options,
        } => {
            if ignored_options {
                println!("All options other than -d are ignored.");
            }
            commands::run_daemon(&device, &config)
        },
        Action::Client {
            elevation,
            azimuth,
            read,
            kill,
        } => commands::run_client(
            &config,
            elevation.as_deref(),
            azimuth.as_deref(),
            read,
            kill,
        ),
    }
}
