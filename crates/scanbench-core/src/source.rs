//! 原始文件读取（库缓冲流 / 直接 OS 读取）
//!
//! 句柄是 `open` 返回的值，随后显式传给 `read_block`；关闭由 `Drop` 完成，
//! 因此任何提前返回（包括 `?`）都会释放句柄。
//!
//! `BufferedFile` 总是经由 `fill_buf`/`consume` 取数据：`BufReader::read` 在请求
//! 不小于内部缓冲时会绕过缓冲直接读，那样与 `DirectFile` 的系统调用完全相同。
//! 因此缓冲流每次 `read_block` 最多返回 `STREAM_BUFFER_SIZE` 字节。
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ScanError;

/// 库缓冲流的内部缓冲大小（与常见平台流默认值一致）
pub const STREAM_BUFFER_SIZE: usize = 4 * 1024;

/// 一次读取若干字节到调用方提供的缓冲区；返回 0 表示文件结束
pub trait ByteSource {
    fn read_block(&mut self, buf: &mut [u8]) -> Result<usize, ScanError>;
}

/// 原始字节来源类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// `BufReader<File>`：经过库层缓冲
    Buffered,
    /// 裸 `File`：每次 read 对应一次系统调用
    Direct,
}

/// 只读打开，并允许其他进程同时持有读/写访问
fn open_shared(path: &Path) -> Result<File, ScanError> {
    let mut opts = OpenOptions::new();
    opts.read(true);
    #[cfg(windows)]
    {
        use std::os::windows::fs::OpenOptionsExt;
        const FILE_SHARE_READ: u32 = 0x1;
        const FILE_SHARE_WRITE: u32 = 0x2;
        opts.share_mode(FILE_SHARE_READ | FILE_SHARE_WRITE);
    }
    opts.open(path).map_err(|e| ScanError::from_open(path, e))
}

/// 读取直到得到结果；`Interrupted` 不视为失败
fn read_retrying<R: Read>(reader: &mut R, buf: &mut [u8], path: &Path) -> Result<usize, ScanError> {
    loop {
        match reader.read(buf) {
            Ok(n) => return Ok(n),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ScanError::from_read(path, e)),
        }
    }
}

/// 库缓冲流
pub struct BufferedFile {
    reader: BufReader<File>,
    path: PathBuf,
}

impl BufferedFile {
    pub fn open(path: &Path) -> Result<Self, ScanError> {
        let file = open_shared(path)?;
        Ok(Self { reader: BufReader::with_capacity(STREAM_BUFFER_SIZE, file), path: path.to_path_buf() })
    }
}

impl ByteSource for BufferedFile {
    fn read_block(&mut self, buf: &mut [u8]) -> Result<usize, ScanError> {
        loop {
            match self.reader.fill_buf() {
                Ok(_) => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ScanError::from_read(&self.path, e)),
            }
        }
        let available = self.reader.buffer();
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.reader.consume(n);
        Ok(n)
    }
}

/// 直接读取：不经过任何用户态缓冲
pub struct DirectFile {
    file: File,
    path: PathBuf,
}

impl DirectFile {
    pub fn open(path: &Path) -> Result<Self, ScanError> {
        let file = open_shared(path)?;
        Ok(Self { file, path: path.to_path_buf() })
    }
}

impl ByteSource for DirectFile {
    fn read_block(&mut self, buf: &mut [u8]) -> Result<usize, ScanError> {
        read_retrying(&mut self.file, buf, &self.path)
    }
}
