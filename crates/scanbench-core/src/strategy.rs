//! 八种命名扫描策略
//!
//! 每种策略只是 `ScanPlan` 的一个固定组合；扫描循环本身只有 `scanner` 中的一份。
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::ScanError;
use crate::options::{Addressing, Decode, ScanConfig};
use crate::scanner::{scan_with, ScanPlan};
use crate::source::SourceKind;

/// 基准中参与比较的策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// 最朴素的实现：缓冲流 + 每个 token 新分配字符串
    Filestream,
    /// 缓冲流 + 复用解码缓冲
    Filestream2,
    FixedFilestream,
    /// 先整块解码再按字符切分
    Streamreader,
    FixedStreamreader,
    FixedStreamreader2,
    /// 直接 OS 读取 + 复用解码缓冲
    Win32,
    Win32Safe,
}

/// `fixed-*`/`win32` 这类“指针推进”风格的策略所用的寻址方式
#[cfg(feature = "unchecked")]
const FAST_ADDRESSING: Addressing = Addressing::Unchecked;
#[cfg(not(feature = "unchecked"))]
const FAST_ADDRESSING: Addressing = Addressing::Window;

impl Strategy {
    /// 默认执行顺序
    pub const ALL: [Strategy; 8] = [
        Strategy::Filestream,
        Strategy::Filestream2,
        Strategy::FixedFilestream,
        Strategy::Streamreader,
        Strategy::FixedStreamreader,
        Strategy::FixedStreamreader2,
        Strategy::Win32,
        Strategy::Win32Safe,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Strategy::Filestream => "filestream",
            Strategy::Filestream2 => "filestream2",
            Strategy::FixedFilestream => "fixed-filestream",
            Strategy::Streamreader => "streamreader",
            Strategy::FixedStreamreader => "fixed-streamreader",
            Strategy::FixedStreamreader2 => "fixed-streamreader2",
            Strategy::Win32 => "win32",
            Strategy::Win32Safe => "win32-safe",
        }
    }

    pub fn plan(self) -> ScanPlan {
        let (source, decode, addressing) = match self {
            Strategy::Filestream => (SourceKind::Buffered, Decode::Fresh, Addressing::Indexed),
            Strategy::Filestream2 => (SourceKind::Buffered, Decode::Scratch, Addressing::Indexed),
            Strategy::FixedFilestream => (SourceKind::Buffered, Decode::Scratch, FAST_ADDRESSING),
            Strategy::Streamreader => (SourceKind::Buffered, Decode::CharStream, Addressing::Indexed),
            Strategy::FixedStreamreader => (SourceKind::Buffered, Decode::CharStream, FAST_ADDRESSING),
            Strategy::FixedStreamreader2 => (SourceKind::Buffered, Decode::CharStream, Addressing::Window),
            Strategy::Win32 => (SourceKind::Direct, Decode::Scratch, FAST_ADDRESSING),
            Strategy::Win32Safe => (SourceKind::Direct, Decode::Scratch, Addressing::Indexed),
        };
        ScanPlan { source, decode, addressing }
    }

    /// 扫描 `path`，每个 token 回调一次 `on_token`
    pub fn scan<F: FnMut(&str)>(self, path: &Path, config: &ScanConfig, on_token: F) -> Result<u64, ScanError> {
        scan_with(path, self.plan(), config, on_token)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = ScanError;

    /// 名称不区分大小写，`_` 与 `-` 等价
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Strategy::ALL
            .into_iter()
            .find(|st| st.name() == wanted)
            .ok_or_else(|| ScanError::Config(format!("unknown strategy: {s}")))
    }
}

/// 收集全部 token（测试与 `tokens` 子命令使用）
pub fn tokenize(strategy: Strategy, path: &Path, config: &ScanConfig) -> Result<Vec<String>, ScanError> {
    let mut out = Vec::new();
    strategy.scan(path, config, |t| out.push(t.to_owned()))?;
    Ok(out)
}
