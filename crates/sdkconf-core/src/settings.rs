use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

use crate::crypto::CookieKey;
use crate::paths::{default_diagnostics_log, settings_path};
use crate::sdk::AssemblyMode;
use crate::secure_storage::get_cookie_key;

pub const DEFAULT_KEY_ENV: &str = "SDKCONF_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KeySource {
    /// Base64 key in an environment variable.
    Env {
        #[serde(default = "default_key_env")]
        var: String,
    },
    /// Base64 key in the OS keyring.
    Keyring { account: String },
    /// Argon2id-derived from a passphrase held in an environment variable.
    Passphrase { var: String, salt: String },
}

fn default_key_env() -> String {
    DEFAULT_KEY_ENV.to_string()
}

impl Default for KeySource {
    fn default() -> Self {
        KeySource::Env {
            var: default_key_env(),
        }
    }
}

impl KeySource {
    pub fn resolve(&self) -> Result<CookieKey> {
        match self {
            KeySource::Env { var } => {
                let encoded = Zeroizing::new(
                    std::env::var(var).map_err(|_| anyhow!("environment variable {var} not set"))?,
                );
                CookieKey::from_base64(&encoded).map_err(|e| anyhow!("{var}: {e}"))
            }
            KeySource::Keyring { account } => get_cookie_key(account),
            KeySource::Passphrase { var, salt } => {
                let passphrase = Zeroizing::new(
                    std::env::var(var).map_err(|_| anyhow!("environment variable {var} not set"))?,
                );
                let salt = general_purpose::STANDARD
                    .decode(salt)
                    .map_err(|e| anyhow!("passphrase salt: {e}"))?;
                CookieKey::from_passphrase(&passphrase, &salt)
                    .map_err(|e| anyhow!("derive cookie key: {e}"))
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub key_source: KeySource,
    #[serde(default)]
    pub parallel: bool,
    #[serde(default)]
    pub diagnostics_log: Option<PathBuf>,
    /// Append diagnostics to the per-user data directory when no
    /// `diagnostics_log` is set.
    #[serde(default)]
    pub persist_diagnostics: bool,
}

impl Settings {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file; using defaults");
            return Ok(Self::default());
        }
        let bytes =
            std::fs::read(path).with_context(|| format!("read settings {}", path.display()))?;
        let settings = serde_json::from_slice(&bytes)
            .with_context(|| format!("parse settings {}", path.display()))?;
        Ok(settings)
    }

    pub fn load_default() -> Result<Self> {
        Self::load(settings_path()?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    /// Where diagnostics records are appended, if anywhere.
    pub fn diagnostics_path(&self) -> Result<Option<PathBuf>> {
        match (&self.diagnostics_log, self.persist_diagnostics) {
            (Some(path), _) => Ok(Some(path.clone())),
            (None, true) => Ok(Some(default_diagnostics_log()?)),
            (None, false) => Ok(None),
        }
    }

    pub fn assembly_mode(&self) -> AssemblyMode {
        if self.parallel {
            AssemblyMode::Parallel
        } else {
            AssemblyMode::Sequential
        }
    }
}
