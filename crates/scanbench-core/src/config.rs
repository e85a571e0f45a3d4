//! 基准配置文件加载（TOML）
use std::path::Path;

use serde::Deserialize;

use crate::error::ScanError;
use crate::options::{BenchOptions, OverflowPolicy, ScanConfig};
use crate::strategy::Strategy;

/// 配置文件结构；所有字段可省略，省略时取默认值
///
/// ```toml
/// strategies = ["filestream", "win32"]
/// rounds = 3
/// warmup = true
/// read_buffer_size = 32768
/// max_token_len = 256
/// overflow = "truncate"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BenchConfig {
    /// 为空表示全部策略（按默认顺序）
    pub strategies: Vec<String>,
    pub rounds: Option<u32>,
    pub warmup: Option<bool>,
    pub read_buffer_size: Option<usize>,
    pub max_token_len: Option<usize>,
    pub overflow: Option<OverflowPolicy>,
}

/// 归一化、校验后的运行参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub strategies: Vec<Strategy>,
    pub scan: ScanConfig,
    pub bench: BenchOptions,
}

impl BenchConfig {
    pub fn load(path: &Path) -> Result<Self, ScanError> {
        let txt = std::fs::read_to_string(path).map_err(|e| ScanError::from_open(path, e))?;
        Self::parse(&txt)
    }

    pub fn parse(txt: &str) -> Result<Self, ScanError> {
        toml::from_str(txt).map_err(|e| ScanError::Config(e.to_string()))
    }

    pub fn resolve(&self) -> Result<Settings, ScanError> {
        let strategies = if self.strategies.is_empty() {
            Strategy::ALL.to_vec()
        } else {
            self.strategies.iter().map(|s| s.parse()).collect::<Result<Vec<_>, _>>()?
        };

        let defaults = ScanConfig::default();
        let scan = ScanConfig {
            read_buffer_size: self.read_buffer_size.unwrap_or(defaults.read_buffer_size),
            max_token_len: self.max_token_len.unwrap_or(defaults.max_token_len),
            overflow: self.overflow.unwrap_or(defaults.overflow),
        };
        scan.validate()?;

        let bench = BenchOptions {
            rounds: self.rounds.unwrap_or(1),
            warmup: self.warmup.unwrap_or(false),
        };
        bench.validate()?;

        Ok(Settings { strategies, scan, bench })
    }
}
