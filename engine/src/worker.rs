//! 一次性后台任务
//!
//! 每个加解密或文件读写操作各占一个命名线程，调用线程（UI / 控制线程）
//! 通过 `JobHandle` 等待结果，永远不在调用线程上执行耗时变换。

use std::thread::{self, JoinHandle};

use tracing::debug;

use crate::error::{PantherError, Result};

/// 已派发任务的句柄
#[must_use = "a dispatched job should be awaited"]
pub struct JobHandle<T> {
    label: String,
    inner: JoinHandle<T>,
}

impl<T> JobHandle<T> {
    /// 阻塞等待任务完成
    ///
    /// 任务线程 panic 时返回 `Worker` 错误，而不是把 panic 传给调用方。
    pub fn wait(self) -> Result<T> {
        self.inner
            .join()
            .map_err(|_| PantherError::Worker(format!("{} panicked", self.label)))
    }
}

/// 在独立线程上运行 `job`
pub fn dispatch<T, F>(label: &str, job: F) -> Result<JobHandle<T>>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let inner = thread::Builder::new()
        .name(format!("panther-{label}"))
        .spawn(job)?;

    debug!(job = label, "dispatched worker");
    Ok(JobHandle {
        label: label.to_string(),
        inner,
    })
}
