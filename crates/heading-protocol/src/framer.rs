//! 行分帧
//!
//! 把任意字节缓冲区切分为以 `\n` 结尾的文本行。
//!
//! 提供两种形式：
//! - [`split_lines`]：无状态，单次读取末尾的半行直接丢弃
//! - [`LineFramer`]：有状态，半行保留到下一次读取再拼接（守护进程使用）

/// 无状态切分
///
/// 按 `\n` 切分，最后一个换行之后的残余被丢弃（不跨调用缓存）。
/// 含非 UTF-8 字节的行被整行跳过（不做替换字符改写）；空字节原样保留，由解析器处理。
///
/// # Example
///
/// ```
/// use heading_protocol::split_lines;
///
/// let lines = split_lines(b"AZIMUTH170.3\nSEND\nELEVA");
/// assert_eq!(lines, vec!["AZIMUTH170.3", "SEND"]);
/// ```
pub fn split_lines(buf: &[u8]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut rest = buf;
    while let Some(pos) = rest.iter().position(|&b| b == b'\n') {
        if let Ok(line) = std::str::from_utf8(&rest[..pos]) {
            lines.push(line.to_owned());
        }
        rest = &rest[pos + 1..];
    }
    lines
}

/// 有状态行分帧器
///
/// 跨多次 `push` 保留未完成的半行。单行长度（不含换行符）超过
/// `max_line_len` 时，整行被丢弃直到下一个换行符，不会被截断成一个值。
/// 含非 UTF-8 字节的行同样整行丢弃并计数，转发出去的值与收到的字节一致。
#[derive(Debug, Clone)]
pub struct LineFramer {
    pending: Vec<u8>,
    max_line_len: usize,
    /// 正在丢弃超长行的剩余部分
    discarding: bool,
    /// 累计丢弃的超长行数
    dropped: u64,
    /// 累计丢弃的非 UTF-8 行数
    invalid: u64,
}

impl LineFramer {
    /// 默认最大行长度（字节）
    pub const DEFAULT_MAX_LINE_LEN: usize = 100;

    pub fn new(max_line_len: usize) -> Self {
        Self {
            pending: Vec::with_capacity(max_line_len.min(1024)),
            max_line_len,
            discarding: false,
            dropped: 0,
            invalid: 0,
        }
    }

    /// 输入一段字节，返回本次拼出的完整行
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut lines = Vec::new();
        for &b in bytes {
            if b == b'\n' {
                if self.discarding {
                    self.discarding = false;
                } else {
                    match std::str::from_utf8(&self.pending) {
                        Ok(line) => lines.push(line.to_owned()),
                        Err(_) => self.invalid += 1,
                    }
                }
                self.pending.clear();
                continue;
            }

            if self.discarding {
                continue;
            }

            if self.pending.len() >= self.max_line_len {
                self.pending.clear();
                self.discarding = true;
                self.dropped += 1;
                continue;
            }

            self.pending.push(b);
        }
        lines
    }

    /// 尚未遇到换行符的半行
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// 累计丢弃的超长行数
    pub fn dropped_lines(&self) -> u64 {
        self.dropped
    }

    /// 累计丢弃的非 UTF-8 行数
    pub fn invalid_lines(&self) -> u64 {
        self.invalid
    }

    pub fn max_line_len(&self) -> usize {
        self.max_line_len
    }

    /// 清空半行缓存
    pub fn clear(&mut self) {
        self.pending.clear();
        self.discarding = false;
    }
}

impl Default for LineFramer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_LINE_LEN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines_multiple_per_buffer() {
        let lines = split_lines(b"AZIMUTH170.3\nELEVATION45.3\nSEND\n");
        assert_eq!(lines, vec!["AZIMUTH170.3", "ELEVATION45.3", "SEND"]);
    }

    #[test]
    fn test_split_lines_drops_trailing_partial_line() {
        // 无状态切分：末尾半行丢失，下一次调用也拿不回来
        let first = split_lines(b"AZIMUTH170.3\nELEVAT");
        assert_eq!(first, vec!["AZIMUTH170.3"]);
        let second = split_lines(b"ION45.3\n");
        assert_eq!(second, vec!["ION45.3"]);
    }

    #[test]
    fn test_split_lines_without_newline() {
        assert!(split_lines(b"K").is_empty());
        assert!(split_lines(b"").is_empty());
    }

    #[test]
    fn test_split_lines_keeps_empty_and_nul_skips_invalid_utf8() {
        let lines = split_lines(b"\nK\0\nAZIMUTH1\xff2\nSEND\n");
        assert_eq!(lines, vec!["", "K\0", "SEND"]);
    }

    #[test]
    fn test_framer_carries_partial_line() {
        let mut framer = LineFramer::default();
        assert_eq!(framer.push(b"AZIMUTH170.3\nELEVAT"), vec!["AZIMUTH170.3"]);
        assert_eq!(framer.pending(), b"ELEVAT");
        assert_eq!(framer.push(b"ION45.3\n"), vec!["ELEVATION45.3"]);
        assert!(framer.pending().is_empty());
    }

    #[test]
    fn test_framer_byte_by_byte() {
        let mut framer = LineFramer::default();
        let mut out = Vec::new();
        for b in b"SEND\nK\n" {
            out.extend(framer.push(std::slice::from_ref(b)));
        }
        assert_eq!(out, vec!["SEND", "K"]);
    }

    #[test]
    fn test_framer_discards_overlong_line() {
        let mut framer = LineFramer::new(8);
        let lines = framer.push(b"ELEVATION123456789\nSEND\n");
        assert_eq!(lines, vec!["SEND"]);
        assert_eq!(framer.dropped_lines(), 1);
    }

    #[test]
    fn test_framer_overlong_across_reads() {
        let mut framer = LineFramer::new(8);
        assert!(framer.push(b"AZIMUTH12").is_empty());
        assert!(framer.push(b"3456").is_empty());
        assert_eq!(framer.push(b"78\nK\n"), vec!["K"]);
        assert_eq!(framer.dropped_lines(), 1);
    }

    #[test]
    fn test_framer_drops_invalid_utf8_line() {
        let mut framer = LineFramer::default();
        assert_eq!(framer.push(b"AZIMUTH1\xff"), Vec::<String>::new());
        assert_eq!(framer.push(b"2\nELEVATION45.3\n"), vec!["ELEVATION45.3"]);
        assert_eq!(framer.invalid_lines(), 1);
        assert_eq!(framer.dropped_lines(), 0);
        assert!(framer.pending().is_empty());
    }

    #[test]
    fn test_framer_exact_max_len_is_kept() {
        let mut framer = LineFramer::new(4);
        assert_eq!(framer.push(b"SEND\n"), vec!["SEND"]);
        assert_eq!(framer.dropped_lines(), 0);
    }

    #[test]
    fn test_framer_clear() {
        let mut framer = LineFramer::default();
        framer.push(b"AZIM");
        framer.clear();
        assert_eq!(framer.push(b"K\n"), vec!["K"]);
    }
}
