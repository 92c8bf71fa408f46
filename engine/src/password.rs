//! 口令缓冲区
//!
//! 口令以字符数组形式保存，使用后必须整体覆写为 0。
//! `Password` 不实现 Clone，避免口令被复制到无人追踪的缓冲区。

use zeroize::{Zeroize, Zeroizing};

use crate::error::{PantherError, Result};

pub struct Password {
    chars: Vec<char>,
}

impl Password {
    /// 从 String 构造，并清零原 String
    pub fn from_string(mut text: String) -> Self {
        let chars = text.chars().collect();
        text.zeroize();
        Self { chars }
    }

    pub fn as_chars(&self) -> &[char] {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// 原地覆写为 `'\0'`，长度保持不变
    pub fn wipe(&mut self) {
        self.chars.as_mut_slice().zeroize();
    }

    pub fn is_wiped(&self) -> bool {
        self.chars.iter().all(|c| *c == '\0')
    }

    pub fn matches(&self, other: &Password) -> bool {
        self.chars == other.chars
    }

    /// UTF-8 编码的口令字节（密钥库 KDF 使用）
    pub fn to_utf8(&self) -> Zeroizing<Vec<u8>> {
        let mut out = Zeroizing::new(Vec::with_capacity(self.chars.len() * 4));
        let mut buf = [0u8; 4];
        for c in &self.chars {
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
        }
        buf.zeroize();
        out
    }
}

impl From<&str> for Password {
    fn from(text: &str) -> Self {
        Self {
            chars: text.chars().collect(),
        }
    }
}

impl Drop for Password {
    fn drop(&mut self) {
        self.chars.zeroize();
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Password([{} chars])", self.chars.len())
    }
}

/// 口令输入能力
///
/// 返回 `Ok(None)` 表示用户取消。
pub trait PasswordPrompt {
    fn prompt(&self, message: &str) -> Result<Option<Password>>;
}

/// 终端口令输入（不回显）
pub struct TerminalPrompt;

impl PasswordPrompt for TerminalPrompt {
    fn prompt(&self, message: &str) -> Result<Option<Password>> {
        let text = rpassword::prompt_password(format!("{message}: "))?;
        if text.is_empty() {
            return Ok(None);
        }
        Ok(Some(Password::from_string(text)))
    }
}

/// 要求输入两次并比对，用于设置新口令
pub fn prompt_new_password(prompt: &dyn PasswordPrompt, message: &str) -> Result<Password> {
    let first = prompt.prompt(message)?.ok_or(PantherError::Cancelled)?;
    let confirm = prompt
        .prompt("Confirm password")?
        .ok_or(PantherError::Cancelled)?;

    if !first.matches(&confirm) {
        return Err(PantherError::PasswordMismatch);
    }
    Ok(first)
}
