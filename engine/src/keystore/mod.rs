//! 口令保护的命名密钥库
//!
//! 磁盘格式：`Header || AEAD(payload)`，Header 原始字节作为 AAD。
//! - 主密码经 Argon2id（随机 salt）派生容器密钥
//! - 每次保存都重新生成 salt 与 nonce，并原子替换文件
//! - 内存中的增删不会自动落盘，保存由上层在约定时机显式调用
//!
//! 密钥库不支持并发修改：所有变更都需要 `&mut self`。

pub mod key;

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::algorithm::AeadAlgorithm;
use crate::crypto::{aead, kdf};
use crate::error::{PantherError, Result};
use crate::format::header::{HEADER_SIZE, Header};
use crate::format::payload;
use crate::fs::atomic::write_bytes_atomic;
use crate::fs::bytes::map_not_found;
use crate::password::Password;

pub use key::Key;

/// 首次运行时生成的默认密钥名
pub const DEFAULT_KEY_NAME: &str = "default-key";

/// 容器加密设置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreSettings {
    pub cipher: AeadAlgorithm,
    pub kdf: kdf::StoreKdfParams,
}

#[derive(Debug)]
pub struct KeyStore {
    keys: Vec<Key>,
    next_id: u32,
    settings: StoreSettings,
}

impl KeyStore {
    pub fn new(settings: StoreSettings) -> Self {
        Self {
            keys: Vec::new(),
            next_id: 1,
            settings,
        }
    }

    /// 创建新密钥库：生成一把默认密钥并立即写盘
    ///
    /// # 错误
    /// - 父目录无法创建或文件无法写入时返回 `Io`
    pub fn create(
        master: &Password,
        path: &Path,
        key_algorithm: &str,
        settings: StoreSettings,
    ) -> Result<Self> {
        let mut store = Self::new(settings);
        store.new_key(DEFAULT_KEY_NAME, key_algorithm, None)?;
        store.save(master, path)?;

        info!(path = %path.display(), "created key store");
        Ok(store)
    }

    /// 读取并解密密钥库
    ///
    /// # 错误
    /// - 文件不存在：`NotFound`
    /// - 结构错误：`CorruptStore`
    /// - 主密码错误或内容被篡改：`Authentication`
    pub fn load(path: &Path, master: &Password) -> Result<Self> {
        let bytes = fs::read(path).map_err(|e| map_not_found(e, path))?;

        let header = Header::parse(&bytes)?;
        let aad = &bytes[..HEADER_SIZE];
        let ciphertext = &bytes[HEADER_SIZE..];

        let key = kdf::derive_store_key(master, &header.salt, header.kdf)?;
        let plaintext = zeroize::Zeroizing::new(aead::open(
            header.algorithm,
            &key,
            &header.nonce,
            ciphertext,
            aad,
        )?);

        let (keys, stored_next_id) = payload::decode(&plaintext)?;
        let next_id = next_free_id(&keys, stored_next_id);

        debug!(path = %path.display(), count = keys.len(), "loaded key store");
        Ok(Self {
            keys,
            next_id,
            settings: StoreSettings {
                cipher: header.algorithm,
                kdf: header.kdf,
            },
        })
    }

    /// 序列化、加密并原子写入完整密钥集合
    pub fn save(&self, master: &Password, path: &Path) -> Result<()> {
        let salt = kdf::generate_salt();
        let nonce = aead::generate_nonce();
        let header = Header::new(self.settings.cipher, self.settings.kdf, salt, nonce);
        let header_bytes = header.to_bytes();

        let key = kdf::derive_store_key(master, &salt, self.settings.kdf)?;
        let plaintext = payload::encode(&self.keys, self.next_id)?;
        let sealed = aead::seal(self.settings.cipher, &key, &nonce, &plaintext, &header_bytes)?;

        let mut file = Vec::with_capacity(HEADER_SIZE + sealed.len());
        file.extend_from_slice(&header_bytes);
        file.extend_from_slice(&sealed);

        write_bytes_atomic(path, &file)?;
        debug!(path = %path.display(), count = self.keys.len(), "saved key store");
        Ok(())
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn settings(&self) -> StoreSettings {
        self.settings
    }

    /// 修改容器设置，下次 save 生效
    pub fn set_settings(&mut self, settings: StoreSettings) {
        self.settings = settings;
    }

    pub fn get(&self, name: &str) -> Option<&Key> {
        self.keys.iter().find(|k| k.name() == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// 下一把新密钥将获得的数字标识
    pub fn next_id(&self) -> u32 {
        next_free_id(&self.keys, self.next_id)
    }

    /// 未被占用的默认展示名，形如 `key-3`
    pub fn suggest_name(&self) -> String {
        let mut id = self.next_id();
        loop {
            let candidate = format!("key-{id}");
            if !self.contains(&candidate) {
                return candidate;
            }
            id += 1;
        }
    }

    /// 加入一把密钥；展示名重复时拒绝
    pub fn add_key(&mut self, key: Key) -> Result<()> {
        if self.contains(key.name()) {
            return Err(PantherError::DuplicateName(key.name().to_string()));
        }

        self.next_id = self.next_id.max(key.id().saturating_add(1));
        debug!(name = key.name(), id = key.id(), "key added");
        self.keys.push(key);
        Ok(())
    }

    /// 生成并加入一把新密钥，可混入用户种子
    pub fn new_key(&mut self, name: &str, algorithm: &str, seed: Option<&[u8]>) -> Result<&Key> {
        if self.contains(name) {
            return Err(PantherError::DuplicateName(name.to_string()));
        }

        let key = Key::generate_with_seed(self.next_id(), name, algorithm, seed)?;
        self.add_key(key)?;
        Ok(self.last())
    }

    /// 按展示名删除；返回是否确实删除
    pub fn remove_key(&mut self, name: &str) -> bool {
        let before = self.keys.len();
        self.keys.retain(|k| k.name() != name);
        let removed = self.keys.len() != before;
        if removed {
            debug!(name, "key removed");
        }
        removed
    }

    /// 把原始密钥字节（未加密）写到 `target`
    ///
    /// 导出文件不受保护，由调用方负责其安全。
    pub fn export_key(&self, name: &str, target: &Path) -> Result<()> {
        let key = self
            .get(name)
            .ok_or_else(|| PantherError::UnknownKey(name.to_string()))?;

        write_bytes_atomic(target, key.material())?;
        info!(name, path = %target.display(), "exported raw key");
        Ok(())
    }

    /// 从原始密钥文件导入
    ///
    /// # 错误
    /// - 展示名已存在：`DuplicateName`（不覆盖）
    /// - 文件不存在：`NotFound`
    /// - 字节长度与算法不符：`InvalidKeySpec`
    pub fn import_key(&mut self, source: &Path, name: &str, algorithm: &str) -> Result<&Key> {
        if self.contains(name) {
            return Err(PantherError::DuplicateName(name.to_string()));
        }

        let bytes = fs::read(source).map_err(|e| map_not_found(e, source))?;
        let key = Key::new(self.next_id(), name, algorithm, bytes)?;
        self.add_key(key)?;

        info!(name, path = %source.display(), "imported raw key");
        Ok(self.last())
    }

    fn last(&self) -> &Key {
        &self.keys[self.keys.len() - 1]
    }
}

/// 新标识至少为 "当前数量 + 1"，且永不复用已分配过的标识
fn next_free_id(keys: &[Key], stored: u32) -> u32 {
    let count_based = u32::try_from(keys.len()).unwrap_or(u32::MAX).saturating_add(1);
    let max_based = keys
        .iter()
        .map(|k| k.id().saturating_add(1))
        .max()
        .unwrap_or(1);
    stored.max(count_based).max(max_based)
}
