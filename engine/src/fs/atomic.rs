//! 原子写入工具。
//!
//! 提供「先写临时文件，成功后再替换目标文件」的写出语义，
//! 调用方永远不会观察到写了一半的目标文件。

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// 原子写入一段完整内容。
pub fn write_bytes_atomic(target: &Path, bytes: &[u8]) -> io::Result<()> {
    write_atomic(target, |file| file.write_all(bytes))
}

/// 原子写文件。
///
/// 流程：
/// 1. 在目标目录创建临时文件（Unix 下权限为 0600）；
/// 2. 调用 `write_fn` 写入完整内容并 fsync；
/// 3. 使用 rename 原子替换目标文件。
pub fn write_atomic<F>(target: &Path, write_fn: F) -> io::Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    fs::create_dir_all(parent)?;

    let tmp_path = build_tmp_path(parent, target.file_name());
    let mut tmp_file = open_private(&tmp_path)?;

    let result = write_fn(&mut tmp_file).and_then(|_| tmp_file.sync_all());
    if let Err(err) = result {
        discard(&tmp_path);
        return Err(err);
    }
    drop(tmp_file);

    // Windows 上 rename 不会覆盖已存在的文件
    #[cfg(windows)]
    if target.exists() {
        fs::remove_file(target)?;
    }

    if let Err(err) = fs::rename(&tmp_path, target) {
        discard(&tmp_path);
        return Err(err);
    }

    debug!(path = %target.display(), "atomic write complete");
    Ok(())
}

fn open_private(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options.open(path)
}

// 清理失败只记录日志，不覆盖原始错误
fn discard(tmp_path: &Path) {
    if let Err(err) = fs::remove_file(tmp_path) {
        warn!(path = %tmp_path.display(), error = %err, "failed to remove temp file");
    }
}

fn build_tmp_path(parent: &Path, file_name: Option<&std::ffi::OsStr>) -> PathBuf {
    let base_name = file_name
        .and_then(|n| n.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("panther-output");

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();

    let counter = TMP_COUNTER.fetch_add(1, Ordering::Relaxed);

    parent.join(format!(
        ".{base_name}.tmp-{}-{timestamp}-{counter}",
        std::process::id()
    ))
}
