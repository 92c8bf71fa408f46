//! Panther 密钥库 v1 Header 实现
//!
//! Header 的职责：
//! - 标识文件类型（magic）
//! - 指明版本号
//! - 指明容器 AEAD 算法
//! - 保存 Argon2id 参数与 salt
//! - 保存本次保存使用的 nonce
//!
//! Header 的原始字节同时作为 AEAD 的 AAD，任何改动都会导致认证失败。
//! Header 解析失败一律视为密钥库损坏（CorruptStore）。

use crate::algorithm::AeadAlgorithm;
use crate::crypto::aead::NONCE_FIELD_LEN;
use crate::crypto::kdf::{SALT_LEN, StoreKdfParams};
use crate::error::{PantherError, Result};

/// 密钥库文件魔数（ASCII）
pub const MAGIC: &[u8; 8] = b"PANTHER\0";

/// 当前支持的版本号
pub const VERSION: u8 = 1;

/// Header 固定大小
///
/// 8  (magic)
/// 1  (version)
/// 1  (algorithm)
/// 12 (argon2: memory / iterations / parallelism)
/// 16 (salt)
/// 24 (nonce)
pub const HEADER_SIZE: usize = 8 + 1 + 1 + 12 + SALT_LEN + NONCE_FIELD_LEN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub version: u8,
    pub algorithm: AeadAlgorithm,
    pub kdf: StoreKdfParams,
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_FIELD_LEN],
}

impl Header {
    pub fn new(
        algorithm: AeadAlgorithm,
        kdf: StoreKdfParams,
        salt: [u8; SALT_LEN],
        nonce: [u8; NONCE_FIELD_LEN],
    ) -> Self {
        Self {
            version: VERSION,
            algorithm,
            kdf,
            salt,
            nonce,
        }
    }

    /// 序列化为固定布局（整数均为大端）
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        let mut w = Cursor::new(&mut out);

        w.put(MAGIC);
        w.put(&[self.version]);
        w.put(&[self.algorithm.to_u8()]);
        w.put(&self.kdf.memory_kib.to_be_bytes());
        w.put(&self.kdf.iterations.to_be_bytes());
        w.put(&self.kdf.parallelism.to_be_bytes());
        w.put(&self.salt);
        w.put(&self.nonce);

        out
    }

    /// 从文件开头解析 Header
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(corrupt("file is shorter than the header"));
        }

        if &bytes[..8] != MAGIC {
            return Err(corrupt("invalid magic"));
        }

        let version = bytes[8];
        if version != VERSION {
            return Err(corrupt(&format!("unsupported version {version}")));
        }

        let algorithm = AeadAlgorithm::from_u8(bytes[9])
            .ok_or_else(|| corrupt(&format!("unsupported algorithm id {}", bytes[9])))?;

        let kdf = StoreKdfParams::new(
            read_u32(&bytes[10..14]),
            read_u32(&bytes[14..18]),
            read_u32(&bytes[18..22]),
        );
        if !kdf.is_sane() {
            return Err(corrupt("key derivation parameters out of range"));
        }

        let mut salt = [0u8; SALT_LEN];
        salt.copy_from_slice(&bytes[22..22 + SALT_LEN]);

        let nonce_start = 22 + SALT_LEN;
        let mut nonce = [0u8; NONCE_FIELD_LEN];
        nonce.copy_from_slice(&bytes[nonce_start..nonce_start + NONCE_FIELD_LEN]);

        Ok(Self {
            version,
            algorithm,
            kdf,
            salt,
            nonce,
        })
    }
}

struct Cursor<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn put(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_be_bytes(buf)
}

fn corrupt(reason: &str) -> PantherError {
    PantherError::CorruptStore(reason.to_string())
}
