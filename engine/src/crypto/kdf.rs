//! Panther 密钥派生函数（KDF）模块
//!
//! 两条派生路径：
//! - `derive_key`：快速加密路径。口令逐字符截断为单字节后做一次 MD5，
//!   得到 16 字节 AES-128 密钥。无 salt、无迭代，强度很弱；
//!   保留它只是为了能解开旧版本产生的密文。
//! - `derive_store_key`：密钥库路径。Argon2id + 随机 salt，
//!   输出 32 字节密钥，用于 AES-256-GCM / XChaCha20-Poly1305。

use argon2::{Algorithm, Argon2, Params, Version};
use md5::{Digest, Md5};
use rand::{RngCore, rngs::OsRng};
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::block::Transformation;
use crate::error::{PantherError, Result};
use crate::password::Password;

/// 密钥库派生密钥长度（256-bit）
pub const STORE_KEY_LEN: usize = 32;

/// 密钥库 salt 长度
pub const SALT_LEN: usize = 16;

/// Argon2id 参数
///
/// 参数随密钥库头部一起保存，读取时按头部参数派生。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreKdfParams {
    /// 内存成本（KiB）
    pub memory_kib: u32,
    /// 时间成本：迭代次数
    pub iterations: u32,
    /// 并行度
    pub parallelism: u32,
}

impl StoreKdfParams {
    /// 读取头部时允许的内存上限：1 GiB
    ///
    /// 头部参数在认证之前就被使用，上限决定了伪造文件能迫使加载方分配的内存。
    pub const MAX_MEMORY_KIB: u32 = 1024 * 1024;
    pub const MAX_ITERATIONS: u32 = 64;
    pub const MAX_PARALLELISM: u32 = 16;

    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            memory_kib,
            iterations,
            parallelism,
        }
    }

    /// 参数是否落在 Argon2 合法且可承受的范围内
    pub fn is_sane(&self) -> bool {
        self.parallelism >= 1
            && self.parallelism <= Self::MAX_PARALLELISM
            && self.iterations >= 1
            && self.iterations <= Self::MAX_ITERATIONS
            && self.memory_kib >= 8 * self.parallelism
            && self.memory_kib <= Self::MAX_MEMORY_KIB
    }

    fn to_argon2(self) -> Result<Params> {
        Params::new(
            self.memory_kib,
            self.iterations,
            self.parallelism,
            Some(STORE_KEY_LEN),
        )
        .map_err(|e| PantherError::InvalidKeySpec(format!("argon2 parameters: {e}")))
    }
}

impl Default for StoreKdfParams {
    /// 64 MB 内存、3 次迭代、单线程
    fn default() -> Self {
        Self::new(64 * 1024, 3, 1)
    }
}

pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// 快速加密：口令 → 确定性密钥
///
/// 每个字符只取低 8 位（与旧版本一致），随后做一次 MD5。
/// DES 取摘要前 8 字节，DESede 以 16 字节作为双密钥 EDE，其余算法使用完整 16 字节。
/// 调用方必须在返回后立即清零口令缓冲区，无论成功与否。
///
/// #### 错误
/// - 变换名称不受支持时返回 `UnknownAlgorithm` / `UnknownPadding`
pub fn derive_key(password: &Password, algorithm: &str) -> Result<Zeroizing<Vec<u8>>> {
    let transformation = Transformation::parse(algorithm)?;

    let mut hasher = Md5::new();
    for c in password.as_chars() {
        hasher.update([*c as u32 as u8]);
    }

    let mut digest = hasher.finalize();
    let key = Zeroizing::new(digest[..transformation.algorithm.legacy_key_len()].to_vec());
    digest.as_mut_slice().zeroize();

    transformation
        .check_key(&key)
        .map_err(|e| PantherError::InvalidKeySpec(e.to_string()))?;

    Ok(key)
}

/// 根据主密码和 salt 派生密钥库加密密钥
///
/// #### 返回
/// - 32 字节派生密钥（自动 zeroize）
pub fn derive_store_key(
    password: &Password,
    salt: &[u8],
    params: StoreKdfParams,
) -> Result<Zeroizing<[u8; STORE_KEY_LEN]>> {
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params.to_argon2()?);

    let secret = password.to_utf8();
    let mut key = Zeroizing::new([0u8; STORE_KEY_LEN]);

    argon2
        .hash_password_into(&secret, salt, &mut key[..])
        .map_err(|e| PantherError::InvalidKeySpec(format!("argon2: {e}")))?;

    Ok(key)
}
