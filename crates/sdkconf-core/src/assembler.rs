//! Decrypted config assembly
//!
//! Every field is looked up and decrypted on its own. A field that is missing
//! or fails to decrypt comes back as `None`; it never aborts the rest of the
//! assembly and never surfaces as an error to the caller.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cookies::CookieStore;
use crate::crypto::CookieCipher;
use crate::diagnostics::{Diagnostic, DiagnosticsSink};
use crate::error::CookieCryptoError;
use crate::fields::{ConfigField, REQUIRED_FIELDS};

/// The decryption capability shared by every field lookup.
pub trait Decryptor: Send + Sync {
    fn decrypt(&self, cookie_name: &str, ciphertext: &str) -> Result<String, CookieCryptoError>;
}

impl Decryptor for CookieCipher {
    fn decrypt(&self, cookie_name: &str, ciphertext: &str) -> Result<String, CookieCryptoError> {
        self.open(cookie_name, ciphertext)
    }
}

impl<D: Decryptor + ?Sized> Decryptor for &D {
    fn decrypt(&self, cookie_name: &str, ciphertext: &str) -> Result<String, CookieCryptoError> {
        (**self).decrypt(cookie_name, ciphertext)
    }
}

/// Plaintext SDK configuration. Serializes with the SDK's property names;
/// absent fields serialize as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledConfig {
    pub api_key: Option<String>,
    pub auth_domain: Option<String>,
    #[serde(rename = "databaseURL")]
    pub database_url: Option<String>,
    pub project_id: Option<String>,
    pub storage_bucket: Option<String>,
    pub messaging_sender_id: Option<String>,
    pub app_id: Option<String>,
    pub measurement_id: Option<String>,
}

impl AssembledConfig {
    pub fn get(&self, field: ConfigField) -> Option<&str> {
        self.slot(field).as_deref()
    }

    pub fn set(&mut self, field: ConfigField, value: Option<String>) {
        *self.slot_mut(field) = value;
    }

    fn slot(&self, field: ConfigField) -> &Option<String> {
        match field {
            ConfigField::ApiKey => &self.api_key,
            ConfigField::AuthDomain => &self.auth_domain,
            ConfigField::DatabaseUrl => &self.database_url,
            ConfigField::ProjectId => &self.project_id,
            ConfigField::StorageBucket => &self.storage_bucket,
            ConfigField::MessagingSenderId => &self.messaging_sender_id,
            ConfigField::AppId => &self.app_id,
            ConfigField::MeasurementId => &self.measurement_id,
        }
    }

    fn slot_mut(&mut self, field: ConfigField) -> &mut Option<String> {
        match field {
            ConfigField::ApiKey => &mut self.api_key,
            ConfigField::AuthDomain => &mut self.auth_domain,
            ConfigField::DatabaseUrl => &mut self.database_url,
            ConfigField::ProjectId => &mut self.project_id,
            ConfigField::StorageBucket => &mut self.storage_bucket,
            ConfigField::MessagingSenderId => &mut self.messaging_sender_id,
            ConfigField::AppId => &mut self.app_id,
            ConfigField::MeasurementId => &mut self.measurement_id,
        }
    }

    /// Present and non-empty.
    pub fn has(&self, field: ConfigField) -> bool {
        self.get(field).is_some_and(|v| !v.is_empty())
    }

    pub fn missing_required(&self) -> Vec<ConfigField> {
        REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|f| !self.has(*f))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_required().is_empty()
    }

    pub fn present_count(&self) -> usize {
        ConfigField::ALL.iter().filter(|f| self.has(**f)).count()
    }
}

impl FromIterator<(ConfigField, Option<String>)> for AssembledConfig {
    fn from_iter<I: IntoIterator<Item = (ConfigField, Option<String>)>>(iter: I) -> Self {
        let mut config = Self::default();
        for (field, value) in iter {
            config.set(field, value);
        }
        config
    }
}

/// Looks up and decrypts one cookie. Total: absent, empty, or undecryptable
/// values all yield `None`; only decryption failures emit a diagnostic.
pub fn get_decrypted_value(
    store: &dyn CookieStore,
    decryptor: &dyn Decryptor,
    sink: &dyn DiagnosticsSink,
    cookie_name: &str,
) -> Option<String> {
    let raw = store.get(cookie_name)?;
    if raw.is_empty() {
        return None;
    }
    match decryptor.decrypt(cookie_name, raw) {
        Ok(plaintext) => Some(plaintext),
        Err(e) => {
            sink.emit(Diagnostic::field_decryption_failure(cookie_name, e));
            None
        }
    }
}

pub fn assemble_config(
    store: &dyn CookieStore,
    decryptor: &dyn Decryptor,
    sink: &dyn DiagnosticsSink,
) -> AssembledConfig {
    let config: AssembledConfig = ConfigField::ALL
        .iter()
        .map(|field| {
            let value = get_decrypted_value(store, decryptor, sink, field.cookie_name());
            (*field, value)
        })
        .collect();
    tracing::debug!(present = config.present_count(), "assembled config");
    config
}

/// Same as [`assemble_config`], with field lookups spread over the rayon pool.
pub fn assemble_config_parallel(
    store: &dyn CookieStore,
    decryptor: &dyn Decryptor,
    sink: &dyn DiagnosticsSink,
) -> AssembledConfig {
    let values: Vec<(ConfigField, Option<String>)> = ConfigField::ALL
        .par_iter()
        .map(|field| {
            let value = get_decrypted_value(store, decryptor, sink, field.cookie_name());
            (*field, value)
        })
        .collect();
    let config: AssembledConfig = values.into_iter().collect();
    tracing::debug!(present = config.present_count(), "assembled config (parallel)");
    config
}
