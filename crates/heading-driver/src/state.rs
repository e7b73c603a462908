//! 姿态状态存储
//!
//! 守护进程唯一的可变共享数据：最近一次解码得到的方位角与俯仰角。
//! 只由中继循环在成功解码 `ELEVATION`/`AZIMUTH` 行之后整体赋值，
//! 读者永远看不到半写入的值。单线程访问，无需加锁。

/// 最近一次已知的姿态
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadingState {
    azimuth: String,
    elevation: String,
}

impl HeadingState {
    /// 创建空状态（两个字段均为空）
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_elevation(&mut self, value: impl Into<String>) {
        self.elevation = value.into();
    }

    pub fn set_azimuth(&mut self, value: impl Into<String>) {
        self.azimuth = value.into();
    }

    /// 当前快照：`(azimuth, elevation)`
    pub fn snapshot(&self) -> (&str, &str) {
        (&self.azimuth, &self.elevation)
    }

    pub fn azimuth(&self) -> &str {
        &self.azimuth
    }

    pub fn elevation(&self) -> &str {
        &self.elevation
    }

    /// 两个字段都已有值，可以发送
    pub fn is_complete(&self) -> bool {
        !self.azimuth.is_empty() && !self.elevation.is_empty()
    }
}
