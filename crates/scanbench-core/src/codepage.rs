//! Windows-1252 单字节代码页解码
//!
//! 每个字节恰好对应一个字符，解码不会失败，也不存在跨块的多字节序列。
//! 0x80..=0x9F 之外的字节与 Latin-1 一致（码点等于字节值）。

/// 每个源字节最多产生的字符数
pub const MAX_CHARS_PER_BYTE: usize = 1;

/// 单个字符编码为 UTF-8 后的最大字节数（€ = U+20AC 需要 3 字节）
const MAX_UTF8_PER_CHAR: usize = 3;

/// 0x80..=0x9F 区间映射表；未定义的 5 个位置（0x81/0x8D/0x8F/0x90/0x9D）
/// 沿用同值 C1 控制字符，保证映射是全函数。
const HIGH_CONTROL: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

/// 解码单个字节
#[inline]
pub fn decode_byte(b: u8) -> char {
    match b {
        0x80..=0x9F => HIGH_CONTROL[(b - 0x80) as usize],
        _ => b as char,
    }
}

/// `bytes` 个源字节最多解码出的字符数
pub const fn max_char_count(bytes: usize) -> usize {
    bytes * MAX_CHARS_PER_BYTE
}

/// 解码 `bytes` 个源字节所需的 `String` 容量上限（UTF-8 字节数）；溢出时为 `None`
pub const fn max_utf8_len(bytes: usize) -> Option<usize> {
    max_char_count(bytes).checked_mul(MAX_UTF8_PER_CHAR)
}

/// 每次调用分配新的 `String`
pub fn decode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    decode_into(bytes, &mut out);
    out
}

/// 追加到已有缓冲区（调用方负责 clear），用于复用临时字符缓冲
#[inline]
pub fn decode_into(bytes: &[u8], out: &mut String) {
    out.extend(bytes.iter().map(|&b| decode_byte(b)));
}

/// 整块解码为字符序列，覆盖 `out` 原有内容
pub fn decode_chars_into(bytes: &[u8], out: &mut Vec<char>) {
    out.clear();
    out.extend(bytes.iter().map(|&b| decode_byte(b)));
}
