//! 密钥库明文载荷
//!
//! 解密后的载荷为 JSON：
//! `{ "next_id": 4, "keys": [{ "id", "name", "algorithm", "material": "<hex>" }] }`
//! 数组顺序即插入顺序（展示顺序）。
//! 载荷缓冲区全部使用 Zeroizing 包装，离开作用域即清零。

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, Zeroizing};

use crate::error::{PantherError, Result};
use crate::keystore::key::Key;

#[derive(Serialize, Deserialize)]
struct StoredKey {
    id: u32,
    name: String,
    algorithm: String,
    #[serde(with = "hex::serde")]
    material: Vec<u8>,
}

impl Drop for StoredKey {
    fn drop(&mut self) {
        self.material.zeroize();
    }
}

#[derive(Serialize, Deserialize)]
struct StorePayload {
    next_id: u32,
    keys: Vec<StoredKey>,
}

/// 将密钥集合编码为明文载荷
pub fn encode(keys: &[Key], next_id: u32) -> Result<Zeroizing<Vec<u8>>> {
    let payload = StorePayload {
        next_id,
        keys: keys
            .iter()
            .map(|k| StoredKey {
                id: k.id(),
                name: k.name().to_string(),
                algorithm: k.algorithm().to_string(),
                material: k.material().to_vec(),
            })
            .collect(),
    };

    serde_json::to_vec(&payload)
        .map(Zeroizing::new)
        .map_err(|e| PantherError::Crypto(format!("serialize key store: {e}")))
}

/// 解析明文载荷，返回 (密钥集合, next_id)
///
/// 结构错误、重名、密钥字节与算法不符，均视为密钥库损坏。
pub fn decode(bytes: &[u8]) -> Result<(Vec<Key>, u32)> {
    let payload: StorePayload = serde_json::from_slice(bytes)
        .map_err(|e| PantherError::CorruptStore(format!("payload: {e}")))?;

    let mut keys: Vec<Key> = Vec::with_capacity(payload.keys.len());
    for stored in &payload.keys {
        if keys.iter().any(|k| k.name() == stored.name) {
            return Err(PantherError::CorruptStore(format!(
                "duplicate key name {:?}",
                stored.name
            )));
        }

        let key = Key::new(
            stored.id,
            &stored.name,
            &stored.algorithm,
            stored.material.clone(),
        )
        .map_err(|e| PantherError::CorruptStore(format!("key {:?}: {e}", stored.name)))?;
        keys.push(key);
    }

    Ok((keys, payload.next_id))
}
