use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CookieCryptoError {
    #[error("Unsupported token version: {0}")]
    UnsupportedVersion(String),

    #[error("Token encoding invalid: {0}")]
    Encoding(String),

    #[error("Token truncated ({0} bytes)")]
    Truncated(usize),

    #[error("AEAD decryption failed (wrong key or tampered value)")]
    Authentication,

    #[error("Decrypted value is not valid UTF-8")]
    Utf8,

    #[error("AEAD encryption failed")]
    Encrypt,

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),
}

impl From<base64::DecodeError> for CookieCryptoError {
    fn from(e: base64::DecodeError) -> Self {
        Self::Encoding(e.to_string())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SdkError {
    #[error("SDK rejected configuration: {0}")]
    Rejected(String),
}
