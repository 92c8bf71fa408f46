//! 密钥库容器 AEAD 的具体实现

pub mod aes_256_gcm;
pub mod xchacha20_poly1305;
