//! 分词 I/O 基准核心库
//!
//! 设计要点：
//! - 所有策略共享同一套扫描循环（`scanner`），差异只在字节来源、解码方式与寻址方式；
//! - 解码固定为 Windows-1252 单字节代码页，一字节对应一个字符；
//! - 文件句柄是显式传递的值，作用域结束即关闭；
//! - harness 串行执行策略，单个策略失败不影响其余策略。

mod codepage;
mod config;
mod error;
mod harness;
mod options;
mod report;
mod scanner;
mod source;
mod strategy;

pub use codepage::{decode, decode_byte, max_char_count};
pub use config::{BenchConfig, Settings};
pub use error::ScanError;
pub use harness::{run, verify, Divergence, Measurement, Report, Verification};
pub use options::{
    Addressing, BenchOptions, Decode, OverflowPolicy, ScanConfig, DEFAULT_MAX_TOKEN_LEN, DEFAULT_READ_BUFFER_SIZE,
    MAX_READ_BUFFER_SIZE, MAX_TOKEN_LEN_LIMIT,
};
pub use report::{write_reports, ReportFormat, ReportRecord};
pub use scanner::{scan_source, scan_with, ScanPlan};
pub use source::{BufferedFile, ByteSource, DirectFile, SourceKind};
pub use strategy::{tokenize, Strategy};
