//! 命名对称密钥

use std::fmt;

use rand::{RngCore, rngs::OsRng};
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::block::Transformation;
use crate::error::{PantherError, Result};
use crate::logging::RedactedBytes;

/// 一把对称密钥及其元数据
///
/// - `id`：单调分配的数字标识，仅用于默认命名
/// - `name`：展示名，在所属密钥库内唯一
/// - 密钥字节永不出现在日志或 Debug 输出中
pub struct Key {
    id: u32,
    name: String,
    algorithm: String,
    material: Zeroizing<Vec<u8>>,
}

impl Key {
    /// 包装已有的密钥字节
    ///
    /// #### 错误
    /// - 算法不受支持：`UnknownAlgorithm` / `UnknownPadding`
    /// - 字节长度与算法不符：`InvalidKeySpec`
    pub fn new(id: u32, name: &str, algorithm: &str, material: Vec<u8>) -> Result<Self> {
        let material = Zeroizing::new(material);
        Transformation::parse(algorithm)?
            .check_key(&material)
            .map_err(|e| PantherError::InvalidKeySpec(e.to_string()))?;

        Ok(Self {
            id,
            name: name.to_string(),
            algorithm: algorithm.to_string(),
            material,
        })
    }

    /// 使用系统随机数生成新密钥，长度取算法的默认值（AES-128、DES 8 字节、DESede 24 字节等）
    pub fn generate(id: u32, name: &str, algorithm: &str) -> Result<Self> {
        Self::generate_with_seed(id, name, algorithm, None)
    }

    /// 生成新密钥，可混入用户提供的种子
    ///
    /// 种子与系统随机数一起经过 SHA-256，种子只能增加熵，不能替代系统随机数。
    pub fn generate_with_seed(
        id: u32,
        name: &str,
        algorithm: &str,
        seed: Option<&[u8]>,
    ) -> Result<Self> {
        let len = Transformation::parse(algorithm)?.algorithm.default_key_len();

        let mut random = Zeroizing::new([0u8; 32]);
        OsRng.fill_bytes(&mut random[..]);

        let material = match seed {
            Some(seed) => {
                let mut hasher = Sha256::new();
                hasher.update(&random[..]);
                hasher.update(seed);
                let mut mixed = hasher.finalize();
                let key = mixed[..len].to_vec();
                mixed.as_mut_slice().zeroize();
                key
            }
            None => random[..len].to_vec(),
        };

        Self::new(id, name, algorithm, material)
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// 原始密钥字节；调用方不得记录或另存
    pub fn material(&self) -> &[u8] {
        &self.material
    }

    pub fn bits(&self) -> usize {
        self.material.len() * 8
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.name == other.name
            && self.algorithm == other.algorithm
            && self.material[..] == other.material[..]
    }
}

impl Eq for Key {}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Key")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("algorithm", &self.algorithm)
            .field("material", &RedactedBytes(&self.material))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_never_contains_key_bytes() {
        let key = Key::new(1, "k", "AES", vec![0xAB; 16]).unwrap();
        let text = format!("{key:?}");
        assert!(text.contains("[16 bytes]"));
        assert!(!text.to_lowercase().contains("ab, "));
        assert!(!text.contains("171"));
    }

    #[test]
    fn generated_keys_are_aes_128_and_distinct() {
        let a = Key::generate(1, "a", "AES").unwrap();
        let b = Key::generate_with_seed(2, "b", "AES", Some(b"mouse wiggles")).unwrap();
        assert_eq!(a.bits(), 128);
        assert_eq!(b.material().len(), 16);
        assert_ne!(a.material(), b.material());
    }

    #[test]
    fn wrong_length_material_is_invalid_key_spec() {
        let err = Key::new(1, "k", "AES", vec![1u8; 10]).unwrap_err();
        assert!(matches!(err, PantherError::InvalidKeySpec(_)));
        assert!(Key::new(1, "k", "AES", vec![1u8; 24]).is_ok());
        assert!(Key::new(1, "k", "DES", vec![1u8; 16]).is_err());
    }

    #[test]
    fn generated_length_follows_the_cipher() {
        for (algorithm, len) in [
            ("DES", 8),
            ("DESede/CBC/PKCS5Padding", 24),
            ("Blowfish", 16),
        ] {
            let key = Key::generate_with_seed(1, "k", algorithm, Some(b"seed")).unwrap();
            assert_eq!(key.material().len(), len, "{algorithm}");
            assert_eq!(Key::generate(2, "k", algorithm).unwrap().material().len(), len);
        }
    }
}
