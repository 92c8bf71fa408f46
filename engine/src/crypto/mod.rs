pub mod aead;
pub mod block;
pub mod digest;
pub mod kdf;
