//! 扫描参数与基准选项（模块）
use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// 原始读缓冲大小（32 KiB）
pub const DEFAULT_READ_BUFFER_SIZE: usize = 0x8000;
/// 单个 token 的最大字节数
pub const DEFAULT_MAX_TOKEN_LEN: usize = 256;
/// 读缓冲上限（16 MiB），超过视为配置错误
pub const MAX_READ_BUFFER_SIZE: usize = 16 * 1024 * 1024;
/// `Fail`/`Truncate` 下 token 上限的最大取值（1 MiB）
pub const MAX_TOKEN_LEN_LIMIT: usize = 1024 * 1024;

/// token 超过 `max_token_len` 时的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// 终止本次扫描，返回 `ScanError::TokenOverflow`
    #[default]
    Fail,
    /// 保留前 `max_token_len` 个字节，丢弃该 token 余下部分
    Truncate,
    /// token 缓冲按需增长，不设上限
    Grow,
}

/// 解码方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Decode {
    /// 每个 token 解码到新分配的 `String`
    Fresh,
    /// 解码到复用的临时缓冲，再交给回调
    Scratch,
    /// 先把整块原始字节解码为字符，再按字符切分
    CharStream,
}

/// 扫描原始块时的寻址方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Addressing {
    /// 逐个下标访问（带边界检查）
    Indexed,
    /// 在切片中查找下一个分隔符，整段拷贝
    Window,
    /// `get_unchecked` 逐字节访问（需启用 `unchecked` 特性）
    #[cfg(feature = "unchecked")]
    Unchecked,
}

/// 单次扫描的配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    pub read_buffer_size: usize,
    pub max_token_len: usize,
    pub overflow: OverflowPolicy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            max_token_len: DEFAULT_MAX_TOKEN_LEN,
            overflow: OverflowPolicy::Fail,
        }
    }
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.read_buffer_size == 0 {
            return Err(ScanError::Config("read_buffer_size must be at least 1".into()));
        }
        if self.read_buffer_size > MAX_READ_BUFFER_SIZE {
            return Err(ScanError::Config(format!("read_buffer_size must be at most {MAX_READ_BUFFER_SIZE}")));
        }
        // Grow 下 max_token_len 不参与截断，也不用于预分配
        if self.overflow != OverflowPolicy::Grow {
            if self.max_token_len == 0 {
                return Err(ScanError::Config("max_token_len must be at least 1".into()));
            }
            if self.max_token_len > MAX_TOKEN_LEN_LIMIT {
                return Err(ScanError::Config(format!("max_token_len must be at most {MAX_TOKEN_LEN_LIMIT}")));
            }
        }
        Ok(())
    }

    /// token 缓冲的初始容量；Grow 下按默认上限预分配，之后按需增长
    pub(crate) fn token_capacity(&self) -> usize {
        match self.overflow {
            OverflowPolicy::Grow => self.max_token_len.min(DEFAULT_MAX_TOKEN_LEN),
            _ => self.max_token_len,
        }
    }
}

/// 基准运行选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchOptions {
    /// 每个策略计时的轮数；多轮时按轮交错执行所有策略
    pub rounds: u32,
    /// 计时前先不计时地把每个策略跑一遍（预热文件缓存）
    pub warmup: bool,
}

impl Default for BenchOptions {
    fn default() -> Self {
        Self { rounds: 1, warmup: false }
    }
}

impl BenchOptions {
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.rounds == 0 {
            return Err(ScanError::Config("rounds must be at least 1".into()));
        }
        Ok(())
    }
}
