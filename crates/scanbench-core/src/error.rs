//! 错误分类（打开失败 / 读失败 / 超长 token / 配置问题）
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 扫描与基准运行期间可能出现的全部错误
///
/// 单个策略的失败只终止该策略，harness 会继续执行后续策略。
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("access denied: {}", path.display())]
    AccessDenied { path: PathBuf },

    #[error("read failed on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// 单个 token 超过 `max_token_len`（仅在 `OverflowPolicy::Fail` 下出现）
    #[error("token longer than {limit} bytes at byte offset {offset}")]
    TokenOverflow { limit: usize, offset: u64 },

    /// 同一策略多轮运行得到不同的校验和
    #[error("checksum of {strategy} changed between rounds: {first} -> {current}")]
    Unstable { strategy: &'static str, first: u64, current: u64 },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ScanError {
    /// 打开文件失败时按 `io::ErrorKind` 归类
    pub(crate) fn from_open(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => ScanError::FileNotFound { path: path.to_path_buf() },
            io::ErrorKind::PermissionDenied => ScanError::AccessDenied { path: path.to_path_buf() },
            _ => ScanError::Io { path: path.to_path_buf(), source: err },
        }
    }

    pub(crate) fn from_read(path: &Path, err: io::Error) -> Self {
        ScanError::Io { path: path.to_path_buf(), source: err }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_errors_are_classified_by_kind() {
        let p = Path::new("missing.txt");
        let e = ScanError::from_open(p, io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(e, ScanError::FileNotFound { .. }));
        let e = ScanError::from_open(p, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(e, ScanError::AccessDenied { .. }));
        let e = ScanError::from_open(p, io::Error::from(io::ErrorKind::Other));
        assert!(matches!(e, ScanError::Io { .. }));
    }

    #[test]
    fn overflow_message_names_limit_and_offset() {
        let e = ScanError::TokenOverflow { limit: 256, offset: 300 };
        assert_eq!(e.to_string(), "token longer than 256 bytes at byte offset 300");
    }
}
