//! Panther：对称加解密工具
//!
//! - 以口令或命名密钥对任意字节做 AES 加/解密
//! - 命名密钥保存在主密码保护的密钥库中
//! - 摘要指纹、偏好设置与文件读写辅助

pub mod algorithm;
pub mod algorithms;
pub mod config;
pub mod crypto;
pub mod engine;
pub mod error;
pub mod format;
pub mod fs;
pub mod keystore;
pub mod logging;
pub mod password;
pub mod session;
pub mod worker;

pub use config::Preferences;
pub use engine::{CipherEngine, EngineState, Mode, ResultSink};
pub use error::{ErrorKind, PantherError, Result};
pub use keystore::{Key, KeyStore, StoreSettings};
pub use password::{Password, PasswordPrompt};
pub use session::{DefaultPlatform, PlatformIntegration, Session};
