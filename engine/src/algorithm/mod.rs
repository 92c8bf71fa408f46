//! 密钥库容器 AEAD 算法模块。
//!
//! 统一管理可选算法与算法标识，具体实现见 `algorithms` 子模块。

use std::fmt;
use std::str::FromStr;

use crate::error::PantherError;

/// 支持的 AEAD 算法。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AeadAlgorithm {
    XChaCha20Poly1305,
    Aes256Gcm,
}

impl AeadAlgorithm {
    pub const XCHACHA20_POLY1305_ID: u8 = 1;
    pub const AES_256_GCM_ID: u8 = 2;

    pub fn to_u8(self) -> u8 {
        match self {
            Self::XChaCha20Poly1305 => Self::XCHACHA20_POLY1305_ID,
            Self::Aes256Gcm => Self::AES_256_GCM_ID,
        }
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            Self::XCHACHA20_POLY1305_ID => Some(Self::XChaCha20Poly1305),
            Self::AES_256_GCM_ID => Some(Self::Aes256Gcm),
            _ => None,
        }
    }

    /// 该算法实际使用的 nonce 长度
    pub fn nonce_len(self) -> usize {
        match self {
            Self::XChaCha20Poly1305 => crate::algorithms::xchacha20_poly1305::NONCE_SIZE,
            Self::Aes256Gcm => crate::algorithms::aes_256_gcm::NONCE_SIZE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::XChaCha20Poly1305 => "xchacha20-poly1305",
            Self::Aes256Gcm => "aes-256-gcm",
        }
    }
}

impl Default for AeadAlgorithm {
    fn default() -> Self {
        DEFAULT_AEAD_ALGORITHM
    }
}

impl FromStr for AeadAlgorithm {
    type Err = PantherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aes-256-gcm" | "aes256gcm" => Ok(Self::Aes256Gcm),
            "xchacha20-poly1305" | "xchacha20poly1305" => Ok(Self::XChaCha20Poly1305),
            _ => Err(PantherError::UnknownAlgorithm(s.to_string())),
        }
    }
}

impl fmt::Display for AeadAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 默认算法：AES-256-GCM。
pub const DEFAULT_AEAD_ALGORITHM: AeadAlgorithm = AeadAlgorithm::Aes256Gcm;
