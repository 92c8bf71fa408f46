//! 任意文件的字节读写
//!
//! UI / 文件层通过 `ByteStore` 读写明文与密文文件。
//! 写入总是原子替换，读失败时把 "文件不存在" 与其他 I/O 错误区分开。

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{PantherError, Result};
use crate::fs::atomic::write_bytes_atomic;
use crate::worker::{self, JobHandle};

pub trait ByteStore: Send + Sync {
    fn read_all(&self, path: &Path) -> Result<Vec<u8>>;

    fn write_all(&self, path: &Path, bytes: &[u8]) -> Result<()>;

    /// 文件不存在时创建空文件；返回是否新建
    fn create_if_absent(&self, path: &Path) -> Result<bool>;
}

/// 基于本地文件系统的实现
#[derive(Debug, Default, Clone, Copy)]
pub struct FsByteStore;

impl ByteStore for FsByteStore {
    fn read_all(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| map_not_found(e, path))
    }

    fn write_all(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        write_bytes_atomic(path, bytes)?;
        Ok(())
    }

    fn create_if_absent(&self, path: &Path) -> Result<bool> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

pub(crate) fn map_not_found(err: io::Error, path: &Path) -> PantherError {
    if err.kind() == io::ErrorKind::NotFound {
        PantherError::NotFound(path.to_path_buf())
    } else {
        PantherError::Io(err)
    }
}

/// 在后台线程读取整个文件
pub fn read_in_background<S>(store: S, path: PathBuf) -> Result<JobHandle<Result<Vec<u8>>>>
where
    S: ByteStore + 'static,
{
    worker::dispatch("file-read", move || store.read_all(&path))
}

/// 在后台线程写入整个文件
pub fn write_in_background<S>(
    store: S,
    path: PathBuf,
    bytes: Vec<u8>,
) -> Result<JobHandle<Result<()>>>
where
    S: ByteStore + 'static,
{
    worker::dispatch("file-write", move || store.write_all(&path, &bytes))
}
