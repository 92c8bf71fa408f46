//! 加解密引擎
//!
//! 状态机：
//! `Configured`（构造后）→ `Initialized`（init 后）→ `Completed`（run 后，无论成败）
//! → 再次 init 回到 `Initialized`。
//!
//! 约束：
//! - 每次 init + run 恰好向 `ResultSink` 投递一次结果
//! - init 派生密钥后立即清零口令缓冲区，成功与失败路径都一样
//! - `spawn` 按值取走引擎，在后台线程执行后再交还，
//!   因此同一个引擎不可能被并发 run

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};

use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::crypto::block::Transformation;
use crate::crypto::kdf;
use crate::error::{PantherError, Result};
use crate::keystore::Key;
use crate::password::Password;
use crate::worker::{self, JobHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Encrypt,
    Decrypt,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Encrypt => f.write_str("encrypt"),
            Mode::Decrypt => f.write_str("decrypt"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Configured,
    Initialized,
    Completed,
}

/// 结果接收方（通常是 UI）
pub trait ResultSink: Send + Sync {
    fn on_complete(&self, bytes: Vec<u8>);

    /// 可恢复错误；`error.kind()` 与 `error.user_message()` 供 UI 展示
    fn on_error(&self, error: PantherError);
}

/// 把结果转发到 channel 的接收方
pub struct ChannelSink {
    tx: Sender<Result<Vec<u8>>>,
}

impl ChannelSink {
    pub fn new() -> (Arc<Self>, Receiver<Result<Vec<u8>>>) {
        let (tx, rx) = mpsc::channel();
        (Arc::new(Self { tx }), rx)
    }
}

impl ResultSink for ChannelSink {
    fn on_complete(&self, bytes: Vec<u8>) {
        if self.tx.send(Ok(bytes)).is_err() {
            warn!("cipher result dropped: receiver gone");
        }
    }

    fn on_error(&self, error: PantherError) {
        if self.tx.send(Err(error)).is_err() {
            warn!("cipher error dropped: receiver gone");
        }
    }
}

struct PendingJob {
    data: Vec<u8>,
    key: Zeroizing<Vec<u8>>,
    sink: Arc<dyn ResultSink>,
}

pub struct CipherEngine {
    algorithm: String,
    transformation: Transformation,
    mode: Option<Mode>,
    state: EngineState,
    job: Option<PendingJob>,
}

impl CipherEngine {
    /// 按变换名称配置引擎
    ///
    /// # 错误
    /// - `UnknownAlgorithm` / `UnknownPadding`
    pub fn new(algorithm: &str) -> Result<Self> {
        let transformation = Transformation::parse(algorithm)?;
        Ok(Self {
            algorithm: algorithm.to_string(),
            transformation,
            mode: None,
            state: EngineState::Configured,
            job: None,
        })
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// 最近一次 init 设定的模式
    pub fn current_mode(&self) -> Option<Mode> {
        self.mode
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// 以口令派生密钥并准备任务
    ///
    /// 返回前口令缓冲区的每个字符都已被覆写为 0。
    pub fn init(
        &mut self,
        data: Vec<u8>,
        mode: Mode,
        password: &mut Password,
        sink: Arc<dyn ResultSink>,
    ) -> Result<()> {
        let derived = kdf::derive_key(password, &self.algorithm);
        password.wipe();

        let key = derived?;
        self.prepare(data, mode, key, sink)
    }

    /// 使用密钥库中的命名密钥准备任务
    pub fn init_with_key(
        &mut self,
        data: Vec<u8>,
        mode: Mode,
        key: &Key,
        sink: Arc<dyn ResultSink>,
    ) -> Result<()> {
        self.prepare(data, mode, Zeroizing::new(key.material().to_vec()), sink)
    }

    fn prepare(
        &mut self,
        data: Vec<u8>,
        mode: Mode,
        key: Zeroizing<Vec<u8>>,
        sink: Arc<dyn ResultSink>,
    ) -> Result<()> {
        self.transformation.check_key(&key)?;

        // 重新 init 会替换尚未执行的任务
        self.job = Some(PendingJob { data, key, sink });
        self.mode = Some(mode);
        self.state = EngineState::Initialized;

        debug!(algorithm = %self.algorithm, %mode, "cipher engine initialized");
        Ok(())
    }

    /// 在当前线程执行已配置的变换，并把结果投递给接收方
    ///
    /// 变换失败（BadPadding / IllegalBlockSize 等）通过 `on_error` 投递，
    /// 只有在没有待执行任务时才返回 `NotInitialized`。
    pub fn run(&mut self) -> Result<()> {
        let job = self.job.take().ok_or(PantherError::NotInitialized)?;
        let mode = self.mode.ok_or(PantherError::NotInitialized)?;

        let result = match mode {
            Mode::Encrypt => self.transformation.encrypt(&job.key, &job.data),
            Mode::Decrypt => self.transformation.decrypt(&job.key, &job.data),
        };
        self.state = EngineState::Completed;

        match result {
            Ok(bytes) => {
                debug!(%mode, out_len = bytes.len(), "cipher job complete");
                job.sink.on_complete(bytes);
            }
            Err(err) => {
                warn!(%mode, error = %err, "cipher job failed");
                job.sink.on_error(err);
            }
        }

        Ok(())
    }

    /// 在后台线程执行 run，完成后交还引擎以便复用
    pub fn spawn(mut self) -> Result<JobHandle<Result<CipherEngine>>> {
        if self.job.is_none() {
            return Err(PantherError::NotInitialized);
        }

        worker::dispatch("cipher", move || {
            self.run()?;
            Ok(self)
        })
    }
}

/// 以口令执行一次完整的加/解密，阻塞等待后台线程结果
pub fn transform_with_password(
    algorithm: &str,
    mode: Mode,
    data: Vec<u8>,
    password: &mut Password,
) -> Result<Vec<u8>> {
    let prepared = CipherEngine::new(algorithm);
    let mut engine = match prepared {
        Ok(engine) => engine,
        Err(err) => {
            password.wipe();
            return Err(err);
        }
    };

    let (sink, rx) = ChannelSink::new();
    engine.init(data, mode, password, sink)?;
    finish(engine, rx)
}

/// 以命名密钥执行一次完整的加/解密
pub fn transform_with_key(mode: Mode, data: Vec<u8>, key: &Key) -> Result<Vec<u8>> {
    let mut engine = CipherEngine::new(key.algorithm())?;
    let (sink, rx) = ChannelSink::new();
    engine.init_with_key(data, mode, key, sink)?;
    finish(engine, rx)
}

fn finish(engine: CipherEngine, rx: Receiver<Result<Vec<u8>>>) -> Result<Vec<u8>> {
    engine.spawn()?.wait()??;
    rx.recv()
        .map_err(|_| PantherError::Worker("cipher job finished without a result".into()))?
}
