//! 应用会话
//!
//! `Session` 持有偏好设置、密钥库与主密码，由调用方显式传递，
//! 不存在任何全局可变状态。主密码随 `Session` 一起销毁并清零。

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::{self, Preferences};
use crate::crypto::digest;
use crate::engine::{self, Mode};
use crate::error::{PantherError, Result};
use crate::fs::bytes::{self, FsByteStore};
use crate::keystore::{Key, KeyStore};
use crate::password::{self, Password, PasswordPrompt};

/// 平台集成能力
///
/// 默认实现全部为空操作；特定平台可在启动时替换。
pub trait PlatformIntegration: Send {
    fn name(&self) -> &str {
        "generic"
    }

    /// 会话打开完成
    fn on_ready(&self, _session: &SessionInfo) {}

    /// 会话即将关闭（密钥库已保存）
    fn on_quit(&self) {}
}

/// 无平台特定行为
#[derive(Debug, Default)]
pub struct DefaultPlatform;

impl PlatformIntegration for DefaultPlatform {}

/// 暴露给平台层的只读会话信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub config_dir: PathBuf,
    pub key_count: usize,
    pub first_run: bool,
}

pub struct Session {
    config_dir: PathBuf,
    prefs: Preferences,
    store: KeyStore,
    master: Password,
    platform: Box<dyn PlatformIntegration>,
}

impl Session {
    /// 打开会话
    ///
    /// 密钥库文件是否存在决定是否首次运行（与其中的密钥数量无关）：
    /// - 首次运行：要求设置主密码（输入两次），创建带默认密钥的密钥库
    /// - 否则：要求输入主密码并解密密钥库
    pub fn open(
        config_dir: &Path,
        prompt: &dyn PasswordPrompt,
        platform: Box<dyn PlatformIntegration>,
    ) -> Result<Self> {
        let prefs = Preferences::load_or_create(&config::properties_path(config_dir))?;
        let store_path = config::keystore_path(config_dir);
        let first_run = !store_path.exists();

        let (store, master) = if first_run {
            let master = password::prompt_new_password(prompt, "Choose a master password")?;
            let store = KeyStore::create(
                &master,
                &store_path,
                &prefs.encryption_algorithm,
                prefs.keystore,
            )?;
            (store, master)
        } else {
            let master = prompt
                .prompt("Master password")?
                .ok_or(PantherError::Cancelled)?;
            let mut store = KeyStore::load(&store_path, &master)?;
            store.set_settings(prefs.keystore);
            (store, master)
        };

        let session = Self {
            config_dir: config_dir.to_path_buf(),
            prefs,
            store,
            master,
            platform,
        };

        info!(
            platform = session.platform.name(),
            keys = session.store.len(),
            first_run,
            "session opened"
        );
        session.platform.on_ready(&SessionInfo {
            config_dir: session.config_dir.clone(),
            key_count: session.store.len(),
            first_run,
        });
        Ok(session)
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn keystore(&self) -> &KeyStore {
        &self.store
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn keystore_path(&self) -> PathBuf {
        config::keystore_path(&self.config_dir)
    }

    /// 修改偏好并写回 properties 文件
    pub fn update_preferences(&mut self, prefs: Preferences) -> Result<()> {
        prefs.save(&config::properties_path(&self.config_dir))?;
        self.store.set_settings(prefs.keystore);
        self.prefs = prefs;
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        self.store.save(&self.master, &self.keystore_path())
    }

    fn persist_change(&self) -> Result<()> {
        if self.prefs.save_on_change {
            self.save()?;
        }
        Ok(())
    }

    fn key(&self, name: &str) -> Result<&Key> {
        self.store
            .get(name)
            .ok_or_else(|| PantherError::UnknownKey(name.to_string()))
    }

    pub fn create_key(&mut self, name: &str, seed: Option<&[u8]>) -> Result<()> {
        let algorithm = self.prefs.encryption_algorithm.clone();
        self.store.new_key(name, &algorithm, seed)?;
        self.persist_change()
    }

    /// 删除命名密钥；返回是否确实删除
    pub fn delete_key(&mut self, name: &str) -> Result<bool> {
        let removed = self.store.remove_key(name);
        if removed {
            self.persist_change()?;
        }
        Ok(removed)
    }

    pub fn import_key(&mut self, source: &Path, name: &str) -> Result<()> {
        let algorithm = self.prefs.encryption_algorithm.clone();
        self.store.import_key(source, name, &algorithm)?;
        self.persist_change()
    }

    pub fn export_key(&self, name: &str, target: &Path) -> Result<()> {
        self.store.export_key(name, target)
    }

    /// 更换主密码并立即重新加密密钥库
    ///
    /// 只有用新密码写盘成功后才替换会话中的主密码；写盘失败时会话仍使用旧密码。
    pub fn change_password(&mut self, new: Password, confirm: Password) -> Result<()> {
        if !new.matches(&confirm) {
            return Err(PantherError::PasswordMismatch);
        }
        self.store.save(&new, &self.keystore_path())?;
        self.master = new;
        info!("master password changed");
        Ok(())
    }

    pub fn encrypt_with_key(&self, name: &str, data: Vec<u8>) -> Result<Vec<u8>> {
        engine::transform_with_key(Mode::Encrypt, data, self.key(name)?)
    }

    pub fn decrypt_with_key(&self, name: &str, data: Vec<u8>) -> Result<Vec<u8>> {
        engine::transform_with_key(Mode::Decrypt, data, self.key(name)?)
    }

    /// 快速加密：使用一次性口令，与密钥库无关
    pub fn transform_with_password(
        &self,
        mode: Mode,
        data: Vec<u8>,
        password: &mut Password,
    ) -> Result<Vec<u8>> {
        engine::transform_with_password(&self.prefs.encryption_algorithm, mode, data, password)
    }

    /// 读文件 → 后台变换 → 原子写出
    pub fn transform_file(
        &self,
        mode: Mode,
        key_name: &str,
        input: &Path,
        output: &Path,
    ) -> Result<()> {
        let data = bytes::read_in_background(FsByteStore, input.to_path_buf())?.wait()??;
        let result = engine::transform_with_key(mode, data, self.key(key_name)?)?;
        bytes::write_in_background(FsByteStore, output.to_path_buf(), result)?.wait()??;
        Ok(())
    }

    /// 按偏好中的摘要算法计算指纹
    pub fn fingerprint(&self, data: &[u8]) -> Result<String> {
        digest::fingerprint(data, &self.prefs.digest_algorithm)
    }

    /// 命名密钥自身的指纹
    pub fn key_fingerprint(&self, name: &str) -> Result<String> {
        self.fingerprint(self.key(name)?.material())
    }

    /// 保存并关闭会话；主密码随之清零
    pub fn close(self) -> Result<()> {
        let saved = self.save();
        if let Err(err) = &saved {
            warn!(error = %err, "failed to save key store on exit");
        }
        self.platform.on_quit();
        saved
    }
}
