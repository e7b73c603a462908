//! 配置加载
//!
//! 优先级：`--config` 指定的文件 > `$XDG_CONFIG_HOME/heading/config.toml` > 默认值。
//! `--fifo` 最后覆盖 FIFO 路径。

use anyhow::{Context, Result};
use heading_driver::RelayConfig;
use std::path::{Path, PathBuf};
use tracing::debug;

/// 默认配置文件路径
fn default_config_file() -> Option<PathBuf> {
    let mut path = dirs::config_dir()?;
    path.push("heading");
    path.push("config.toml");
    Some(path)
}

pub fn load(explicit: Option<&Path>, fifo_override: Option<&Path>) -> Result<RelayConfig> {
    let mut config = match explicit {
        Some(path) => RelayConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => match default_config_file() {
            Some(path) if path.exists() => {
                debug!(config = %path.display(), "Using config file");
                RelayConfig::load(&path)
                    .with_context(|| format!("failed to load config {}", path.display()))?
            },
            _ => RelayConfig::default(),
        },
    };

    if let Some(fifo) = fifo_override {
        config.fifo_path = fifo.to_path_buf();
    }

    config.validate()?;
    Ok(config)
}
