//! Panther 密钥库容器 AEAD 模块
//!
//! 按头部记录的算法分派到 `algorithms` 下的具体实现。
//!
//! 安全约束：
//! - 每次保存都使用全新的随机 nonce
//! - 认证失败时不输出任何明文，统一报告为 `Authentication`

use rand::{RngCore, rngs::OsRng};

use crate::algorithm::AeadAlgorithm;
use crate::algorithms::{aes_256_gcm, xchacha20_poly1305};
use crate::error::Result;

/// 头部预留的 nonce 长度；AES-256-GCM 只使用前 12 字节
pub const NONCE_FIELD_LEN: usize = 24;

pub fn generate_nonce() -> [u8; NONCE_FIELD_LEN] {
    let mut nonce = [0u8; NONCE_FIELD_LEN];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// 加密并认证 `plaintext`，`aad` 同时受认证保护
///
/// 头部的 nonce 字段按算法截取实际使用的长度。
pub fn seal(
    algorithm: AeadAlgorithm,
    key: &[u8; 32],
    nonce: &[u8; NONCE_FIELD_LEN],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let nonce = &nonce[..algorithm.nonce_len()];
    match algorithm {
        AeadAlgorithm::XChaCha20Poly1305 => xchacha20_poly1305::seal(key, nonce, plaintext, aad),
        AeadAlgorithm::Aes256Gcm => aes_256_gcm::seal(key, nonce, plaintext, aad),
    }
}

/// 校验并解密
///
/// # 错误
/// - 密码错误或数据被篡改时返回 `Authentication`
pub fn open(
    algorithm: AeadAlgorithm,
    key: &[u8; 32],
    nonce: &[u8; NONCE_FIELD_LEN],
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let nonce = &nonce[..algorithm.nonce_len()];
    match algorithm {
        AeadAlgorithm::XChaCha20Poly1305 => xchacha20_poly1305::open(key, nonce, ciphertext, aad),
        AeadAlgorithm::Aes256Gcm => aes_256_gcm::open(key, nonce, ciphertext, aad),
    }
}
