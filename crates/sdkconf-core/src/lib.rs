//! sdkconf-core — fail-safe assembly of SDK configuration from encrypted cookies
//!
//! # Module layout
//! - `fields`          — static field ↔ cookie ↔ SDK property table
//! - `cookies`         — read-only cookie store trait + header-parsed jar
//! - `crypto`          — XChaCha20-Poly1305 cookie cipher and key handling
//! - `assembler`       — per-field decryption and config assembly
//! - `sdk`             — completeness gate and SDK hand-off state machine
//! - `diagnostics`     — diagnostics sinks (tracing, memory, JSON lines)
//! - `settings`        — JSON settings and key sources
//! - `paths`           — platform config/data directories
//! - `secure_storage`  — cookie key in the OS keyring
//! - `error`           — error types

pub mod assembler;
pub mod cookies;
pub mod crypto;
pub mod diagnostics;
pub mod error;
pub mod fields;
pub mod paths;
pub mod sdk;
pub mod secure_storage;
pub mod settings;

pub use assembler::{AssembledConfig, Decryptor};
pub use cookies::{CookieJar, CookieStore};
pub use crypto::{CookieCipher, CookieKey};
pub use diagnostics::{Diagnostic, DiagnosticsSink};
pub use error::{CookieCryptoError, SdkError};
pub use fields::ConfigField;
pub use sdk::{
    assemble_and_initialize, bootstrap, initialize_if_complete, preflight, AssemblyMode, Outcome,
    SdkHost,
};
