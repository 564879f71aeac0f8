//! Cookie value cipher
//!
//! Uses XChaCha20-Poly1305 (192-bit nonce) with the cookie name as associated
//! data, so a token only opens under the cookie it was sealed for.
//!
//! Token wire format:
//!   `v1.` base64url-nopad( nonce (24 bytes) | ciphertext + tag )

use argon2::{Argon2, Params, Version};
use base64::{engine::general_purpose, Engine as _};
use chacha20poly1305::aead::{Aead, AeadCore, KeyInit, OsRng, Payload};
use chacha20poly1305::{Key, XChaCha20Poly1305, XNonce};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::error::CookieCryptoError;

pub const TOKEN_VERSION: &str = "v1";
pub const KEY_LEN: usize = 32;
pub const NONCE_LEN: usize = 24;
pub const TAG_LEN: usize = 16;
pub const SALT_LEN: usize = 16;

pub const KDF_TIME_COST: u32 = 3;
pub const KDF_MEMORY_COST: u32 = 65536; // 64MB
pub const KDF_PARALLELISM: u32 = 1;

/// 32-byte symmetric key shared with whatever issued the cookies. Zeroized on drop.
#[derive(Clone, ZeroizeOnDrop)]
pub struct CookieKey([u8; KEY_LEN]);

impl CookieKey {
    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn generate() -> Self {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        OsRng.fill_bytes(key.as_mut_slice());
        Self(*key)
    }

    pub fn from_base64(encoded: &str) -> Result<Self, CookieCryptoError> {
        let decoded = Zeroizing::new(
            general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|e| CookieCryptoError::InvalidKey(e.to_string()))?,
        );
        if decoded.len() != KEY_LEN {
            return Err(CookieCryptoError::InvalidKey(format!(
                "expected {KEY_LEN} bytes, got {}",
                decoded.len()
            )));
        }
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        key.copy_from_slice(&decoded);
        Ok(Self(*key))
    }

    /// Argon2id derivation for deployments that distribute a passphrase instead of a raw key.
    pub fn from_passphrase(passphrase: &str, salt: &[u8]) -> Result<Self, CookieCryptoError> {
        if salt.len() < 8 {
            return Err(CookieCryptoError::KeyDerivation("salt too short".into()));
        }
        let params = Params::new(
            KDF_MEMORY_COST,
            KDF_TIME_COST,
            KDF_PARALLELISM,
            Some(KEY_LEN),
        )
        .map_err(|e| CookieCryptoError::KeyDerivation(format!("argon2 params: {e}")))?;
        let argon = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        argon
            .hash_password_into(passphrase.as_bytes(), salt, key.as_mut_slice())
            .map_err(|e| CookieCryptoError::KeyDerivation(format!("argon2 derive: {e}")))?;
        Ok(Self(*key))
    }

    pub fn to_base64(&self) -> Zeroizing<String> {
        Zeroizing::new(general_purpose::STANDARD.encode(&self.0))
    }

    /// Short public identifier, safe to log.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(&self.0);
        hex::encode(&digest[..8])
    }

    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for CookieKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CookieKey").field(&self.fingerprint()).finish()
    }
}

pub fn generate_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Seals and opens cookie tokens under a single key.
#[derive(Clone)]
pub struct CookieCipher {
    cipher: XChaCha20Poly1305,
    key_id: String,
}

impl CookieCipher {
    pub fn new(key: &CookieKey) -> Self {
        let cipher = XChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
        Self {
            cipher,
            key_id: key.fingerprint(),
        }
    }

    pub fn key_id(&self) -> &str {
        &self.key_id
    }

    pub fn seal(&self, cookie_name: &str, plaintext: &str) -> Result<String, CookieCryptoError> {
        self.seal_bytes(cookie_name, plaintext.as_bytes())
    }

    pub(crate) fn seal_bytes(
        &self,
        cookie_name: &str,
        plaintext: &[u8],
    ) -> Result<String, CookieCryptoError> {
        let nonce = XChaCha20Poly1305::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(
                &nonce,
                Payload {
                    msg: plaintext,
                    aad: cookie_name.as_bytes(),
                },
            )
            .map_err(|_| CookieCryptoError::Encrypt)?;

        let mut raw = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        raw.extend_from_slice(&nonce);
        raw.extend_from_slice(&ciphertext);
        Ok(format!(
            "{TOKEN_VERSION}.{}",
            general_purpose::URL_SAFE_NO_PAD.encode(raw)
        ))
    }

    pub fn open(&self, cookie_name: &str, token: &str) -> Result<String, CookieCryptoError> {
        let (version, body) = token
            .split_once('.')
            .ok_or_else(|| CookieCryptoError::UnsupportedVersion("missing".into()))?;
        if version != TOKEN_VERSION {
            return Err(CookieCryptoError::UnsupportedVersion(version.to_string()));
        }
        let raw = general_purpose::URL_SAFE_NO_PAD.decode(body)?;
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(CookieCryptoError::Truncated(raw.len()));
        }
        let (nonce_bytes, ct) = raw.split_at(NONCE_LEN);
        let nonce = XNonce::from_slice(nonce_bytes);
        let plaintext = self
            .cipher
            .decrypt(
                nonce,
                Payload {
                    msg: ct,
                    aad: cookie_name.as_bytes(),
                },
            )
            .map_err(|_| CookieCryptoError::Authentication)?;
        String::from_utf8(plaintext).map_err(|_| CookieCryptoError::Utf8)
    }
}

impl std::fmt::Debug for CookieCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieCipher")
            .field("key_id", &self.key_id)
            .finish()
    }
}
