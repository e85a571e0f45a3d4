//! 分词扫描引擎
//!
//! 只有一套扫描循环：读一块原始字节 → 逐个单元判定分隔符 → 非分隔符追加到
//! token 缓冲，遇到分隔符时解码并回调，然后清空缓冲。各策略之间的差异只体现在
//! 三个参数上：字节来源（`SourceKind`）、解码方式（`Decode`）、寻址方式（`Addressing`）。
//!
//! 语义约定（所有组合一致）：
//! - 分隔符为空格、`\n`、`\r`，从不出现在 token 中；
//! - 连续分隔符之间产生空 token；
//! - 文件结束时若 token 缓冲非空，则作为最后一个 token 输出；空缓冲不输出。
use std::path::Path;

use tracing::debug;

use crate::codepage;
use crate::error::ScanError;
use crate::options::{Addressing, Decode, OverflowPolicy, ScanConfig};
use crate::source::{BufferedFile, ByteSource, DirectFile, SourceKind};

pub const SPACE: u8 = b' ';
pub const NEWLINE: u8 = b'\n';
pub const CARRIAGE_RETURN: u8 = b'\r';

/// 可被扫描的单元：原始字节或已解码字符
pub(crate) trait ScanUnit: Copy {
    fn is_delimiter(self) -> bool;
}

impl ScanUnit for u8 {
    #[inline]
    fn is_delimiter(self) -> bool {
        matches!(self, SPACE | NEWLINE | CARRIAGE_RETURN)
    }
}

impl ScanUnit for char {
    #[inline]
    fn is_delimiter(self) -> bool {
        matches!(self, ' ' | '\n' | '\r')
    }
}

/// 一种扫描组合
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPlan {
    pub source: SourceKind,
    pub decode: Decode,
    pub addressing: Addressing,
}

/// 当前 token 的累积缓冲，按 `OverflowPolicy` 处理超长
struct TokenBuffer<T> {
    units: Vec<T>,
    limit: usize,
    policy: OverflowPolicy,
}

impl<T: ScanUnit> TokenBuffer<T> {
    fn new(config: &ScanConfig) -> Self {
        Self { units: Vec::with_capacity(config.token_capacity()), limit: config.max_token_len, policy: config.overflow }
    }

    #[inline]
    fn room(&self) -> usize {
        match self.policy {
            OverflowPolicy::Grow => usize::MAX,
            _ => self.limit.saturating_sub(self.units.len()),
        }
    }

    /// `offset` 为该单元在文件中的字节偏移
    #[inline]
    fn push(&mut self, unit: T, offset: u64) -> Result<(), ScanError> {
        if self.room() > 0 {
            self.units.push(unit);
            return Ok(());
        }
        self.overflow(offset)
    }

    /// `offset` 为 `run[0]` 在文件中的字节偏移
    fn extend(&mut self, run: &[T], offset: u64) -> Result<(), ScanError> {
        let room = self.room();
        if run.len() <= room {
            self.units.extend_from_slice(run);
            return Ok(());
        }
        self.units.extend_from_slice(&run[..room]);
        self.overflow(offset + room as u64)
    }

    fn overflow(&self, offset: u64) -> Result<(), ScanError> {
        match self.policy {
            OverflowPolicy::Fail => Err(ScanError::TokenOverflow { limit: self.limit, offset }),
            // 截断：超出部分直接丢弃，直到下一个分隔符
            OverflowPolicy::Truncate | OverflowPolicy::Grow => Ok(()),
        }
    }

    #[inline]
    fn as_slice(&self) -> &[T] {
        &self.units
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    #[inline]
    fn clear(&mut self) {
        self.units.clear();
    }
}

/// 按下标逐个访问
#[allow(clippy::needless_range_loop)]
fn scan_indexed<T: ScanUnit, E: FnMut(&[T])>(
    block: &[T],
    base: u64,
    token: &mut TokenBuffer<T>,
    emit: &mut E,
) -> Result<(), ScanError> {
    for i in 0..block.len() {
        let unit = block[i];
        if unit.is_delimiter() {
            emit(token.as_slice());
            token.clear();
        } else {
            token.push(unit, base + i as u64)?;
        }
    }
    Ok(())
}

/// 查找下一个分隔符，整段追加
fn scan_window<T: ScanUnit, E: FnMut(&[T])>(
    block: &[T],
    base: u64,
    token: &mut TokenBuffer<T>,
    emit: &mut E,
) -> Result<(), ScanError> {
    let mut rest = block;
    let mut offset = base;
    while let Some(at) = rest.iter().position(|&u| u.is_delimiter()) {
        token.extend(&rest[..at], offset)?;
        emit(token.as_slice());
        token.clear();
        rest = &rest[at + 1..];
        offset += at as u64 + 1;
    }
    // 块尾未结束的 token 留到下一块（或文件结束时冲刷）
    token.extend(rest, offset)
}

#[cfg(feature = "unchecked")]
#[allow(unsafe_code)]
fn scan_unchecked<T: ScanUnit, E: FnMut(&[T])>(
    block: &[T],
    base: u64,
    token: &mut TokenBuffer<T>,
    emit: &mut E,
) -> Result<(), ScanError> {
    let len = block.len();
    let mut i = 0;
    while i < len {
        // SAFETY: 循环条件保证 `i < len == block.len()`
        let unit = unsafe { *block.get_unchecked(i) };
        if unit.is_delimiter() {
            emit(token.as_slice());
            token.clear();
        } else {
            token.push(unit, base + i as u64)?;
        }
        i += 1;
    }
    Ok(())
}

#[inline]
fn scan_block<T: ScanUnit, E: FnMut(&[T])>(
    addressing: Addressing,
    block: &[T],
    base: u64,
    token: &mut TokenBuffer<T>,
    emit: &mut E,
) -> Result<(), ScanError> {
    match addressing {
        Addressing::Indexed => scan_indexed(block, base, token, emit),
        Addressing::Window => scan_window(block, base, token, emit),
        #[cfg(feature = "unchecked")]
        Addressing::Unchecked => scan_unchecked(block, base, token, emit),
    }
}

/// 直接在原始字节上切分，`emit` 负责解码
fn pump_bytes<S, E>(source: &mut S, addressing: Addressing, config: &ScanConfig, mut emit: E) -> Result<u64, ScanError>
where
    S: ByteSource + ?Sized,
    E: FnMut(&[u8]),
{
    let mut raw = vec![0u8; config.read_buffer_size];
    let mut token = TokenBuffer::<u8>::new(config);
    let mut base = 0u64;
    loop {
        let n = source.read_block(&mut raw)?;
        if n == 0 {
            break;
        }
        scan_block(addressing, &raw[..n], base, &mut token, &mut emit)?;
        base += n as u64;
    }
    if !token.is_empty() {
        emit(token.as_slice());
    }
    Ok(base)
}

/// 先整块解码为字符，再在字符上切分
fn pump_chars<S, E>(source: &mut S, addressing: Addressing, config: &ScanConfig, mut emit: E) -> Result<u64, ScanError>
where
    S: ByteSource + ?Sized,
    E: FnMut(&[char]),
{
    let mut raw = vec![0u8; config.read_buffer_size];
    let mut chars: Vec<char> = Vec::with_capacity(codepage::max_char_count(config.read_buffer_size));
    let mut token = TokenBuffer::<char>::new(config);
    let mut base = 0u64;
    loop {
        let n = source.read_block(&mut raw)?;
        if n == 0 {
            break;
        }
        codepage::decode_chars_into(&raw[..n], &mut chars);
        // 单字节代码页：字符下标与字节偏移一一对应
        scan_block(addressing, chars.as_slice(), base, &mut token, &mut emit)?;
        base += n as u64;
    }
    if !token.is_empty() {
        emit(token.as_slice());
    }
    Ok(base)
}

/// 在已打开的字节来源上执行扫描，返回读取的总字节数
pub fn scan_source<S, F>(
    source: &mut S,
    decode: Decode,
    addressing: Addressing,
    config: &ScanConfig,
    mut on_token: F,
) -> Result<u64, ScanError>
where
    S: ByteSource + ?Sized,
    F: FnMut(&str),
{
    config.validate()?;
    match decode {
        Decode::Fresh => pump_bytes(source, addressing, config, |bytes| on_token(codepage::decode(bytes).as_str())),
        Decode::Scratch => {
            let cap = config.token_capacity();
            let mut scratch = String::with_capacity(codepage::max_utf8_len(cap).unwrap_or(cap));
            pump_bytes(source, addressing, config, |bytes| {
                scratch.clear();
                codepage::decode_into(bytes, &mut scratch);
                on_token(scratch.as_str());
            })
        }
        Decode::CharStream => pump_chars(source, addressing, config, |units| {
            let text: String = units.iter().collect();
            on_token(text.as_str());
        }),
    }
}

/// 打开 `path` 并按 `plan` 扫描；句柄在返回前（包括出错时）关闭
pub fn scan_with<F: FnMut(&str)>(
    path: &Path,
    plan: ScanPlan,
    config: &ScanConfig,
    on_token: F,
) -> Result<u64, ScanError> {
    config.validate()?;
    let bytes = match plan.source {
        SourceKind::Buffered => {
            let mut src = BufferedFile::open(path)?;
            scan_source(&mut src, plan.decode, plan.addressing, config, on_token)?
        }
        SourceKind::Direct => {
            let mut src = DirectFile::open(path)?;
            scan_source(&mut src, plan.decode, plan.addressing, config, on_token)?
        }
    };
    debug!(path = %path.display(), ?plan, bytes, "scan finished");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 内存来源：每次最多返回 `step` 个字节，用于制造块边界
    struct Trickle<'a> {
        data: &'a [u8],
        step: usize,
    }

    impl ByteSource for Trickle<'_> {
        fn read_block(&mut self, buf: &mut [u8]) -> Result<usize, ScanError> {
            let n = self.step.min(buf.len()).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    fn all_combos() -> Vec<(Decode, Addressing)> {
        #[cfg_attr(not(feature = "unchecked"), allow(unused_mut))]
        let mut addressing = vec![Addressing::Indexed, Addressing::Window];
        #[cfg(feature = "unchecked")]
        addressing.push(Addressing::Unchecked);
        let mut out = Vec::new();
        for d in [Decode::Fresh, Decode::Scratch, Decode::CharStream] {
            for &a in &addressing {
                out.push((d, a));
            }
        }
        out
    }

    fn tokens(data: &[u8], step: usize, cfg: &ScanConfig, d: Decode, a: Addressing) -> Result<Vec<String>, ScanError> {
        let mut src = Trickle { data, step };
        let mut out = Vec::new();
        scan_source(&mut src, d, a, cfg, |t| out.push(t.to_string()))?;
        Ok(out)
    }

    fn expect_all(data: &[u8], cfg: &ScanConfig, expected: &[&str]) {
        for (d, a) in all_combos() {
            for step in [1, 3, 7, 4096] {
                let got = tokens(data, step, cfg, d, a).expect("scan");
                assert_eq!(got, expected, "decode={d:?} addressing={a:?} step={step}");
            }
        }
    }

    #[test]
    fn trailing_run_is_flushed() {
        expect_all(b"abc def\nghi", &ScanConfig::default(), &["abc", "def", "ghi"]);
    }

    #[test]
    fn consecutive_delimiters_emit_empty_tokens() {
        expect_all(b"a  b", &ScanConfig::default(), &["a", "", "b"]);
        expect_all(b"a\r\nb", &ScanConfig::default(), &["a", "", "b"]);
        expect_all(b" x", &ScanConfig::default(), &["", "x"]);
    }

    #[test]
    fn empty_input_emits_nothing() {
        expect_all(b"", &ScanConfig::default(), &[]);
    }

    #[test]
    fn trailing_delimiter_emits_no_extra_token() {
        expect_all(b"a\n", &ScanConfig::default(), &["a"]);
        expect_all(b"\n", &ScanConfig::default(), &[""]);
    }

    #[test]
    fn high_bytes_decode_through_code_page() {
        expect_all(b"\x80uro caf\xe9\t\x99", &ScanConfig::default(), &["€uro", "café\t™"]);
    }

    #[test]
    fn token_spanning_small_read_buffer() {
        let cfg = ScanConfig { read_buffer_size: 2, ..ScanConfig::default() };
        expect_all(b"hello world", &cfg, &["hello", "world"]);
    }

    fn run_of(len: usize) -> Vec<u8> {
        let mut v = vec![b'x'; len];
        v.extend_from_slice(b" y");
        v
    }

    #[test]
    fn fail_policy_accepts_limit_and_rejects_limit_plus_one() {
        let cfg = ScanConfig::default();
        for len in [255, 256] {
            let x = "x".repeat(len);
            expect_all(&run_of(len), &cfg, &[x.as_str(), "y"]);
        }
        for (d, a) in all_combos() {
            let err = tokens(&run_of(257), 4096, &cfg, d, a).expect_err("overflow");
            assert!(
                matches!(err, ScanError::TokenOverflow { limit: 256, offset: 256 }),
                "decode={d:?} addressing={a:?}: {err:?}"
            );
        }
    }

    #[test]
    fn truncate_policy_keeps_prefix_and_continues() {
        let cfg = ScanConfig { overflow: OverflowPolicy::Truncate, ..ScanConfig::default() };
        let x256 = "x".repeat(256);
        expect_all(&run_of(257), &cfg, &[x256.as_str(), "y"]);
        expect_all(&run_of(1000), &cfg, &[x256.as_str(), "y"]);
    }

    #[test]
    fn grow_policy_keeps_whole_token() {
        let cfg = ScanConfig { overflow: OverflowPolicy::Grow, ..ScanConfig::default() };
        let x257 = "x".repeat(257);
        expect_all(&run_of(257), &cfg, &[x257.as_str(), "y"]);
    }

    #[test]
    fn overflow_offset_is_absolute_across_blocks() {
        let cfg = ScanConfig { max_token_len: 4, read_buffer_size: 3, ..ScanConfig::default() };
        for (d, a) in all_combos() {
            let err = tokens(b"ab abcdefg", 3, &cfg, d, a).expect_err("overflow");
            assert!(matches!(err, ScanError::TokenOverflow { limit: 4, offset: 7 }), "{d:?}/{a:?}: {err:?}");
        }
    }

    #[test]
    fn grow_with_huge_limit_scans_normally() {
        let cfg = ScanConfig { max_token_len: usize::MAX / 2, overflow: OverflowPolicy::Grow, ..ScanConfig::default() };
        let long = "w".repeat(1000);
        let mut input = long.clone().into_bytes();
        input.extend_from_slice(b" z");
        expect_all(&input, &cfg, &[long.as_str(), "z"]);
    }

    #[test]
    fn oversized_config_fails_before_allocating() {
        let cfg = ScanConfig { read_buffer_size: usize::MAX, ..ScanConfig::default() };
        for (d, a) in all_combos() {
            let err = tokens(b"a b", 1, &cfg, d, a).expect_err("config");
            assert!(matches!(err, ScanError::Config(_)), "{d:?}/{a:?}: {err:?}");
        }
    }

    #[test]
    fn scan_source_reports_bytes_read() {
        let mut src = Trickle { data: b"one two", step: 2 };
        let n = scan_source(&mut src, Decode::Scratch, Addressing::Window, &ScanConfig::default(), |_| {})
            .expect("scan");
        assert_eq!(n, 7);
    }
}
