//! 分组密码变换
//!
//! 算法名称沿用 "算法/模式/填充" 的写法：
//! - 单独的算法名（如 `AES`、`Blowfish`）等价于 `<算法>/ECB/PKCS5Padding`
//! - CBC 模式在密文前附加一个分组长度的随机 IV
//!
//! 支持的算法与密钥长度：
//! - AES：16 / 24 / 32 字节（AES-128 / 192 / 256），分组 16 字节
//! - DES：8 字节，分组 8 字节
//! - DESede：16 字节（双密钥 EDE）或 24 字节（三密钥 EDE），分组 8 字节
//! - Blowfish：4 到 56 字节，分组 8 字节
//!
//! 本模块不做完整性校验：错误密钥通常表现为填充非法（BadPadding）。

use std::fmt;

use aes::{Aes128, Aes192, Aes256};
use blowfish::Blowfish;
use cipher::block_padding::Pkcs7;
use cipher::{BlockCipher, BlockDecryptMut, BlockEncryptMut, KeyInit, KeyIvInit};
use des::{Des, TdesEde2, TdesEde3};
use rand::{RngCore, rngs::OsRng};

use crate::error::{PantherError, Result};

/// 任一受支持算法的最大分组长度
pub const MAX_BLOCK_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockAlgorithm {
    Aes,
    Des,
    DesEde,
    Blowfish,
}

impl BlockAlgorithm {
    pub const ALL: [BlockAlgorithm; 4] = [Self::Aes, Self::Des, Self::DesEde, Self::Blowfish];

    pub fn name(self) -> &'static str {
        match self {
            Self::Aes => "AES",
            Self::Des => "DES",
            Self::DesEde => "DESede",
            Self::Blowfish => "Blowfish",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "AES" => Some(Self::Aes),
            "DES" => Some(Self::Des),
            "DESEDE" | "TRIPLEDES" => Some(Self::DesEde),
            "BLOWFISH" => Some(Self::Blowfish),
            _ => None,
        }
    }

    pub fn block_size(self) -> usize {
        match self {
            Self::Aes => 16,
            Self::Des | Self::DesEde | Self::Blowfish => 8,
        }
    }

    pub fn is_valid_key_len(self, len: usize) -> bool {
        match self {
            Self::Aes => matches!(len, 16 | 24 | 32),
            Self::Des => len == 8,
            Self::DesEde => matches!(len, 16 | 24),
            Self::Blowfish => (4..=56).contains(&len),
        }
    }

    /// 新生成密钥的长度
    pub fn default_key_len(self) -> usize {
        match self {
            Self::Aes | Self::Blowfish => 16,
            Self::Des => 8,
            Self::DesEde => 24,
        }
    }

    /// 口令派生路径使用的密钥长度（取 16 字节 MD5 输出的前 N 字节）
    pub fn legacy_key_len(self) -> usize {
        match self {
            Self::Des => 8,
            Self::Aes | Self::DesEde | Self::Blowfish => 16,
        }
    }
}

impl fmt::Display for BlockAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockMode {
    Ecb,
    Cbc,
}

/// 解析后的变换描述
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transformation {
    pub algorithm: BlockAlgorithm,
    pub mode: BlockMode,
}

// 按 (算法, 密钥长度) 选择具体分组密码类型
macro_rules! dispatch {
    ($alg:expr, $key:expr, $func:ident($($arg:expr),*)) => {
        match ($alg, $key.len()) {
            (BlockAlgorithm::Aes, 16) => $func::<Aes128>($($arg),*),
            (BlockAlgorithm::Aes, 24) => $func::<Aes192>($($arg),*),
            (BlockAlgorithm::Aes, _) => $func::<Aes256>($($arg),*),
            (BlockAlgorithm::Des, _) => $func::<Des>($($arg),*),
            (BlockAlgorithm::DesEde, 16) => $func::<TdesEde2>($($arg),*),
            (BlockAlgorithm::DesEde, _) => $func::<TdesEde3>($($arg),*),
            (BlockAlgorithm::Blowfish, _) => $func::<Blowfish>($($arg),*),
        }
    };
}

impl Transformation {
    /// 解析变换名称（大小写不敏感）
    pub fn parse(name: &str) -> Result<Self> {
        let parts: Vec<&str> = name.trim().split('/').map(str::trim).collect();

        let (algorithm, mode, padding) = match parts.as_slice() {
            [alg] => (*alg, "ECB", "PKCS5Padding"),
            [alg, mode, padding] => (*alg, *mode, *padding),
            _ => return Err(PantherError::UnknownAlgorithm(name.to_string())),
        };

        let algorithm = BlockAlgorithm::from_name(algorithm)
            .ok_or_else(|| PantherError::UnknownAlgorithm(name.to_string()))?;

        let mode = if mode.eq_ignore_ascii_case("ECB") {
            BlockMode::Ecb
        } else if mode.eq_ignore_ascii_case("CBC") {
            BlockMode::Cbc
        } else {
            return Err(PantherError::UnknownAlgorithm(name.to_string()));
        };

        // PKCS#5 与 PKCS#7 在 8 / 16 字节分组上完全一致
        if !padding.eq_ignore_ascii_case("PKCS5Padding")
            && !padding.eq_ignore_ascii_case("PKCS7Padding")
        {
            return Err(PantherError::UnknownPadding(padding.to_string()));
        }

        Ok(Self { algorithm, mode })
    }

    pub fn block_size(&self) -> usize {
        self.algorithm.block_size()
    }

    pub fn check_key(&self, key: &[u8]) -> Result<()> {
        if self.algorithm.is_valid_key_len(key.len()) {
            Ok(())
        } else {
            Err(PantherError::InvalidKey(format!(
                "{} byte key is not a valid {} key",
                key.len(),
                self.algorithm
            )))
        }
    }

    pub fn encrypt(&self, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        self.check_key(key)?;
        match self.mode {
            BlockMode::Ecb => dispatch!(self.algorithm, key, ecb_encrypt(key, plaintext)),
            BlockMode::Cbc => {
                let block = self.block_size();
                let mut iv_buf = [0u8; MAX_BLOCK_SIZE];
                OsRng.fill_bytes(&mut iv_buf[..block]);
                let iv = &iv_buf[..block];

                let body = dispatch!(self.algorithm, key, cbc_encrypt(key, iv, plaintext))?;

                let mut out = Vec::with_capacity(block + body.len());
                out.extend_from_slice(iv);
                out.extend_from_slice(&body);
                Ok(out)
            }
        }
    }

    pub fn decrypt(&self, key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.check_key(key)?;
        let block = self.block_size();

        // 空输入或非整块输入一律视为非法分组长度
        if ciphertext.is_empty() || ciphertext.len() % block != 0 {
            return Err(PantherError::IllegalBlockSize {
                len: ciphertext.len(),
                block,
            });
        }

        match self.mode {
            BlockMode::Ecb => dispatch!(self.algorithm, key, ecb_decrypt(key, ciphertext)),
            BlockMode::Cbc => {
                if ciphertext.len() < 2 * block {
                    return Err(PantherError::IllegalBlockSize {
                        len: ciphertext.len(),
                        block,
                    });
                }
                let (iv, body) = ciphertext.split_at(block);
                dispatch!(self.algorithm, key, cbc_decrypt(key, iv, body))
            }
        }
    }
}

fn ecb_encrypt<C>(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>
where
    C: BlockEncryptMut + BlockCipher + KeyInit,
{
    let encryptor = ecb::Encryptor::<C>::new_from_slice(key)
        .map_err(|_| PantherError::InvalidKey("invalid key length".into()))?;
    Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn ecb_decrypt<C>(key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>
where
    C: BlockDecryptMut + BlockCipher + KeyInit,
{
    let decryptor = ecb::Decryptor::<C>::new_from_slice(key)
        .map_err(|_| PantherError::InvalidKey("invalid key length".into()))?;
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| PantherError::BadPadding)
}

fn cbc_encrypt<C>(key: &[u8], iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>
where
    C: BlockEncryptMut + BlockCipher + KeyInit,
{
    let encryptor = cbc::Encryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| PantherError::InvalidKey("invalid key or IV length".into()))?;
    Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn cbc_decrypt<C>(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>
where
    C: BlockDecryptMut + BlockCipher + KeyInit,
{
    let decryptor = cbc::Decryptor::<C>::new_from_slices(key, iv)
        .map_err(|_| PantherError::InvalidKey("invalid key or IV length".into()))?;
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| PantherError::BadPadding)
}
