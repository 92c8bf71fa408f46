//! 偏好设置（properties 文件）
//!
//! 文件为 Java properties 风格的纯文本键值对：
//! `key=value` 或 `key: value`，`#` / `!` 开头为注释。
//! 未识别的键原样保留，保存时写回。

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::{debug, info};

use crate::algorithm::AeadAlgorithm;
use crate::crypto::block::Transformation;
use crate::crypto::digest::DigestAlgorithm;
use crate::error::{PantherError, Result};
use crate::fs::atomic::write_bytes_atomic;
use crate::fs::bytes::map_not_found;
use crate::keystore::StoreSettings;

/// 配置目录名（位于用户主目录下）
pub const CONFIG_DIR_NAME: &str = ".panthersleek";

/// 覆盖配置目录的环境变量
pub const HOME_ENV: &str = "PANTHER_HOME";

pub const PROPERTIES_FILE: &str = "properties.properties";
pub const KEYSTORE_FILE: &str = "keys";

const HEADER_COMMENT: &str =
    "# This is a properties file, do not modify it unless you know what you are doing!";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferences {
    pub encryption_algorithm: String,
    pub digest_algorithm: String,
    pub lang: String,
    pub show_digest: bool,
    pub use_native_look_and_feel: bool,
    pub save_on_change: bool,
    pub keystore: StoreSettings,
    extra: BTreeMap<String, String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            encryption_algorithm: "AES".to_string(),
            digest_algorithm: "SHA-1".to_string(),
            lang: "en".to_string(),
            show_digest: false,
            use_native_look_and_feel: true,
            save_on_change: true,
            keystore: StoreSettings::default(),
            extra: BTreeMap::new(),
        }
    }
}

impl Preferences {
    /// 读取偏好文件
    ///
    /// # 错误
    /// - 文件不存在：`NotFound`
    /// - 值无法解析或算法不受支持：`Config`
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| map_not_found(e, path))?;
        let prefs = Self::parse(&text)?;
        debug!(path = %path.display(), "loaded preferences");
        Ok(prefs)
    }

    /// 文件不存在时写入默认值
    pub fn load_or_create(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Err(PantherError::NotFound(_)) => {
                let prefs = Self::default();
                prefs.save(path)?;
                info!(path = %path.display(), "created default preferences");
                Ok(prefs)
            }
            other => other,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        write_bytes_atomic(path, self.render().as_bytes())?;
        Ok(())
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut prefs = Self::default();
        let mut kdf = prefs.keystore.kdf;

        for (key, value) in parse_properties(text) {
            match key.as_str() {
                "encryption_algorithm" => {
                    Transformation::parse(&value).map_err(config_err)?;
                    prefs.encryption_algorithm = value;
                }
                "digest_algorithm" => {
                    DigestAlgorithm::from_str(&value).map_err(config_err)?;
                    prefs.digest_algorithm = value;
                }
                "lang" => prefs.lang = value,
                "showDigest" => prefs.show_digest = parse_bool(&key, &value)?,
                "useNativeLookAndFeel" => {
                    prefs.use_native_look_and_feel = parse_bool(&key, &value)?
                }
                "save_on_change" => prefs.save_on_change = parse_bool(&key, &value)?,
                "keystore_cipher" => {
                    prefs.keystore.cipher = AeadAlgorithm::from_str(&value).map_err(config_err)?
                }
                "keystore_kdf_memory_kib" => kdf.memory_kib = parse_u32(&key, &value)?,
                "keystore_kdf_iterations" => kdf.iterations = parse_u32(&key, &value)?,
                "keystore_kdf_parallelism" => kdf.parallelism = parse_u32(&key, &value)?,
                _ => {
                    prefs.extra.insert(key, value);
                }
            }
        }

        if !kdf.is_sane() {
            return Err(PantherError::Config(
                "key store KDF parameters out of range".into(),
            ));
        }
        prefs.keystore.kdf = kdf;

        Ok(prefs)
    }

    pub fn render(&self) -> String {
        let mut entries: BTreeMap<&str, String> = BTreeMap::new();
        entries.insert("encryption_algorithm", self.encryption_algorithm.clone());
        entries.insert("digest_algorithm", self.digest_algorithm.clone());
        entries.insert("lang", self.lang.clone());
        entries.insert("showDigest", self.show_digest.to_string());
        entries.insert(
            "useNativeLookAndFeel",
            self.use_native_look_and_feel.to_string(),
        );
        entries.insert("save_on_change", self.save_on_change.to_string());
        entries.insert("keystore_cipher", self.keystore.cipher.name().to_string());
        entries.insert(
            "keystore_kdf_memory_kib",
            self.keystore.kdf.memory_kib.to_string(),
        );
        entries.insert(
            "keystore_kdf_iterations",
            self.keystore.kdf.iterations.to_string(),
        );
        entries.insert(
            "keystore_kdf_parallelism",
            self.keystore.kdf.parallelism.to_string(),
        );
        for (k, v) in &self.extra {
            entries.entry(k.as_str()).or_insert_with(|| v.clone());
        }

        let mut out = String::from(HEADER_COMMENT);
        out.push('\n');
        for (k, v) in entries {
            out.push_str(k);
            out.push('=');
            out.push_str(&v);
            out.push('\n');
        }
        out
    }

    /// 未识别键的原始值
    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(String::as_str)
    }
}

/// 配置目录：`PANTHER_HOME` 优先，否则 `~/.panthersleek`
pub fn default_config_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    dirs::home_dir()
        .map(|home| home.join(CONFIG_DIR_NAME))
        .ok_or_else(|| PantherError::Config("could not determine home directory".into()))
}

pub fn properties_path(config_dir: &Path) -> PathBuf {
    config_dir.join(PROPERTIES_FILE)
}

pub fn keystore_path(config_dir: &Path) -> PathBuf {
    config_dir.join(KEYSTORE_FILE)
}

fn parse_properties(text: &str) -> Vec<(String, String)> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
        .filter_map(|line| {
            let split = line.find(['=', ':'])?;
            let key = line[..split].trim();
            let value = line[split + 1..].trim();
            (!key.is_empty()).then(|| (key.to_string(), value.to_string()))
        })
        .collect()
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(PantherError::Config(format!("{key}: expected true/false, got {value:?}"))),
    }
}

fn parse_u32(key: &str, value: &str) -> Result<u32> {
    value
        .parse()
        .map_err(|_| PantherError::Config(format!("{key}: expected a number, got {value:?}")))
}

fn config_err(err: PantherError) -> PantherError {
    PantherError::Config(err.to_string())
}
