//! 定宽遥测帧
//!
//! 遥测发布变体中传感器板与主机之间的串口帧格式：
//!
//! ```text
//! EAI<elevation:08.1>,<azimuth:08.1>,<id:010>;\n
//! ```
//!
//! 与关键字协议相互独立，只用于串口，不出现在 FIFO 上。

use std::fmt;

/// 遥测帧行头
pub const TELEMETRY_HEADER: &str = "EAI";

/// 一条遥测记录
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TelemetryFrame {
    /// 俯仰角（度）
    pub elevation: f32,
    /// 方位角（度）
    pub azimuth: f32,
    /// 帧序号
    pub id: u32,
}

impl TelemetryFrame {
    pub fn new(elevation: f32, azimuth: f32, id: u32) -> Self {
        Self {
            elevation,
            azimuth,
            id,
        }
    }

    /// 编码为串口线路文本（含 `;\n`）
    ///
    /// 角度字段宽 8、保留 1 位小数并补零，序号字段宽 10 并补零。
    /// 超出宽度的值按实际长度输出，不截断。
    pub fn encode(&self) -> String {
        format!(
            "{TELEMETRY_HEADER}{:08.1},{:08.1},{:010};\n",
            self.elevation, self.azimuth, self.id
        )
    }

    /// 解码一行遥测文本
    ///
    /// 只接受 `EAI` + 角度 + `,` + 角度 + `,` + 序号 + `;` 的形状，
    /// 角度只允许可选负号、数字和一个小数点，序号只允许数字。
    /// 字段宽度不强制（补零位数不同的帧同样接受）。其他内容返回 `None`。
    pub fn decode(line: &str) -> Option<Self> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let body = line.strip_prefix(TELEMETRY_HEADER)?.strip_suffix(';')?;

        let mut fields = body.split(',');
        let elevation = parse_angle(fields.next()?)?;
        let azimuth = parse_angle(fields.next()?)?;
        let id = parse_id(fields.next()?)?;
        if fields.next().is_some() {
            return None;
        }

        Some(Self::new(elevation, azimuth, id))
    }
}

impl fmt::Display for TelemetryFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EAI {},{},{}", self.elevation, self.azimuth, self.id)
    }
}

fn parse_angle(field: &str) -> Option<f32> {
    let digits = field.strip_prefix('-').unwrap_or(field);
    let mut dots = 0;
    for b in digits.bytes() {
        match b {
            b'0'..=b'9' => {},
            b'.' => dots += 1,
            _ => return None,
        }
    }
    if dots > 1 || !digits.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

fn parse_id(field: &str) -> Option<u32> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_fixed_width() {
        let frame = TelemetryFrame::new(45.3, 170.3, 7);
        assert_eq!(frame.encode(), "EAI000045.3,000170.3,0000000007;\n");
    }

    #[test]
    fn test_encode_negative_angle() {
        let frame = TelemetryFrame::new(-5.0, 0.0, 12);
        assert_eq!(frame.encode(), "EAI-00005.0,000000.0,0000000012;\n");
    }

    #[test]
    fn test_decode_sensor_line() {
        let frame = TelemetryFrame::decode("EAI00045.3,00170.3,0000000007;\n").unwrap();
        assert_eq!(frame, TelemetryFrame::new(45.3, 170.3, 7));
    }

    #[test]
    fn test_decode_own_encoding() {
        let frame = TelemetryFrame::new(12.5, -33.0, 4_000_000_000);
        assert_eq!(TelemetryFrame::decode(&frame.encode()), Some(frame));
    }

    #[test]
    fn test_decode_rejects_other_content() {
        assert_eq!(TelemetryFrame::decode("ELEVATION45.3\n"), None);
        assert_eq!(TelemetryFrame::decode("EAI00045.3,00170.3,0000000007\n"), None);
        assert_eq!(TelemetryFrame::decode("EAI00045.3,00170.3;\n"), None);
        assert_eq!(TelemetryFrame::decode("EAI00045.3,00170.3,7,8;\n"), None);
        assert_eq!(TelemetryFrame::decode("EAI 45.3,170.3,7;\n"), None);
        assert_eq!(TelemetryFrame::decode("EAI4.5.3,170.3,7;\n"), None);
        assert_eq!(TelemetryFrame::decode("EAI45.3,170.3,-7;\n"), None);
        assert_eq!(TelemetryFrame::decode("EAI.,170.3,7;\n"), None);
        assert_eq!(TelemetryFrame::decode(""), None);
    }

    #[test]
    fn test_display() {
        let frame = TelemetryFrame::new(45.5, 170.25, 7);
        assert_eq!(frame.to_string(), "EAI 45.5,170.25,7");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_json() {
        let frame = TelemetryFrame::new(1.5, 2.5, 3);
        let json = serde_json::to_string(&frame).unwrap();
        assert_eq!(json, r#"{"elevation":1.5,"azimuth":2.5,"id":3}"#);
    }
}
