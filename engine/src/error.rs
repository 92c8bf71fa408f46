//! Panther 错误类型
//!
//! 所有加解密与 I/O 失败都属于可恢复错误，由调用方决定如何提示用户。
//! 库内部绝不终止进程。

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PantherError>;

#[derive(Debug, Error)]
pub enum PantherError {
    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("unknown padding scheme: {0}")]
    UnknownPadding(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid key spec: {0}")]
    InvalidKeySpec(String),

    /// 输入长度不是分组长度的整数倍（密文被截断或损坏）
    #[error("illegal block size: {len} bytes is not a multiple of {block}")]
    IllegalBlockSize { len: usize, block: usize },

    /// 解密后的填充非法（密钥错误或数据损坏）
    #[error("bad padding")]
    BadPadding,

    #[error("wrong master password or tampered key store")]
    Authentication,

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("corrupt key store: {0}")]
    CorruptStore(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cryptographic failure: {0}")]
    Crypto(String),

    #[error("a key named {0:?} already exists")]
    DuplicateName(String),

    #[error("no key named {0:?}")]
    UnknownKey(String),

    #[error("cipher engine has no pending job")]
    NotInitialized,

    #[error("operation cancelled")]
    Cancelled,

    #[error("invalid preference: {0}")]
    Config(String),

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("worker failed: {0}")]
    Worker(String),
}

/// 错误分类，供 UI 层按类型选择提示方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnknownAlgorithm,
    UnknownPadding,
    InvalidKey,
    InvalidKeySpec,
    IllegalBlockSize,
    BadPadding,
    Authentication,
    NotFound,
    CorruptStore,
    Io,
    Crypto,
    DuplicateName,
    UnknownKey,
    NotInitialized,
    Cancelled,
    Config,
    PasswordMismatch,
    Worker,
}

impl PantherError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownAlgorithm(_) => ErrorKind::UnknownAlgorithm,
            Self::UnknownPadding(_) => ErrorKind::UnknownPadding,
            Self::InvalidKey(_) => ErrorKind::InvalidKey,
            Self::InvalidKeySpec(_) => ErrorKind::InvalidKeySpec,
            Self::IllegalBlockSize { .. } => ErrorKind::IllegalBlockSize,
            Self::BadPadding => ErrorKind::BadPadding,
            Self::Authentication => ErrorKind::Authentication,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::CorruptStore(_) => ErrorKind::CorruptStore,
            Self::Io(_) => ErrorKind::Io,
            Self::Crypto(_) => ErrorKind::Crypto,
            Self::DuplicateName(_) => ErrorKind::DuplicateName,
            Self::UnknownKey(_) => ErrorKind::UnknownKey,
            Self::NotInitialized => ErrorKind::NotInitialized,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Config(_) => ErrorKind::Config,
            Self::PasswordMismatch => ErrorKind::PasswordMismatch,
            Self::Worker(_) => ErrorKind::Worker,
        }
    }

    /// 面向最终用户的提示文案
    ///
    /// "密钥错误 / 数据损坏" 与 "算法不支持" 必须能被区分；
    /// 主密码错误、密钥库缺失、密钥库损坏三者也必须能被区分。
    pub fn user_message(&self) -> String {
        match self {
            Self::BadPadding => "Decryption failed: wrong key or corrupted data.".to_string(),
            Self::IllegalBlockSize { .. } => {
                "This data is not valid ciphertext (illegal block size); it may be truncated."
                    .to_string()
            }
            Self::UnknownAlgorithm(name) => {
                format!("The algorithm \"{name}\" is not supported on this system.")
            }
            Self::UnknownPadding(name) => {
                format!("The padding scheme \"{name}\" is not supported on this system.")
            }
            Self::InvalidKey(_) | Self::InvalidKeySpec(_) => {
                "The key is not usable with the selected algorithm.".to_string()
            }
            Self::Authentication => "The master password is incorrect.".to_string(),
            Self::NotFound(path) => format!("The file {} does not exist.", path.display()),
            Self::CorruptStore(_) => "The key store is damaged and cannot be read.".to_string(),
            Self::DuplicateName(name) => format!("A key named \"{name}\" already exists."),
            Self::UnknownKey(name) => format!("There is no key named \"{name}\"."),
            Self::PasswordMismatch => "The provided passwords do not match.".to_string(),
            Self::Cancelled => "The operation was cancelled.".to_string(),
            other => other.to_string(),
        }
    }
}
