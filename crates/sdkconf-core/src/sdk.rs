//! SDK hand-off
//!
//! State machine, all outcomes terminal:
//!
//! ```text
//! Start ─┬─ SDK unavailable ────────────────────────────▶ SkippedUnavailable
//!        ├─ app already initialized ────────────────────▶ Skipped
//!        └─ assemble ─ validate ─┬─ required missing ───▶ SkippedIncomplete
//!                                └─ initialize_app ─┬───▶ Initialized
//!                                                   └───▶ InitFailed
//! ```

use serde::{Deserialize, Serialize};

use crate::assembler::{assemble_config, assemble_config_parallel, AssembledConfig, Decryptor};
use crate::cookies::CookieStore;
use crate::diagnostics::{Diagnostic, DiagnosticsSink};
use crate::error::SdkError;

/// The host environment's view of the third-party SDK.
pub trait SdkHost {
    /// Whether the SDK client library is loaded at all.
    fn is_available(&self) -> bool;

    /// Number of app instances the SDK already holds.
    fn app_count(&self) -> usize;

    fn initialize_app(&self, config: &AssembledConfig) -> Result<(), SdkError>;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Initialized,
    Skipped,
    SkippedIncomplete,
    SkippedUnavailable,
    InitFailed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AssemblyMode {
    #[default]
    Sequential,
    Parallel,
}

pub fn initialize_if_complete(
    config: &AssembledConfig,
    sdk_already_initialized: bool,
    sdk: &dyn SdkHost,
    sink: &dyn DiagnosticsSink,
) -> Outcome {
    if sdk_already_initialized {
        tracing::debug!("SDK already initialized; skipping");
        return Outcome::Skipped;
    }
    let missing = config.missing_required();
    if !missing.is_empty() {
        let names: Vec<&str> = missing.iter().map(|f| f.property()).collect();
        sink.emit(Diagnostic::config_incomplete(&names));
        return Outcome::SkippedIncomplete;
    }
    match sdk.initialize_app(config) {
        Ok(()) => {
            tracing::info!(fields = config.present_count(), "SDK initialized");
            Outcome::Initialized
        }
        Err(e) => {
            sink.emit(Diagnostic::sdk_init_failure(e));
            Outcome::InitFailed
        }
    }
}

/// Checks the host before any cookie is touched. Returns the terminal outcome
/// when the SDK is missing or already holds an app, `None` when assembly should go ahead.
pub fn preflight(sdk: &dyn SdkHost, sink: &dyn DiagnosticsSink) -> Option<Outcome> {
    if !sdk.is_available() {
        sink.emit(Diagnostic::sdk_unavailable());
        return Some(Outcome::SkippedUnavailable);
    }
    if sdk.app_count() > 0 {
        return Some(initialize_if_complete(
            &AssembledConfig::default(),
            true,
            sdk,
            sink,
        ));
    }
    None
}

/// Assembles from `store` and hands the result to the SDK. Callers run
/// [`preflight`] first.
pub fn assemble_and_initialize(
    store: &dyn CookieStore,
    decryptor: &dyn Decryptor,
    sdk: &dyn SdkHost,
    sink: &dyn DiagnosticsSink,
    mode: AssemblyMode,
) -> Outcome {
    let config = match mode {
        AssemblyMode::Sequential => assemble_config(store, decryptor, sink),
        AssemblyMode::Parallel => assemble_config_parallel(store, decryptor, sink),
    };
    initialize_if_complete(&config, false, sdk, sink)
}

/// Runs the full flow against a cookie store. Never fails; every failure is
/// reported through `sink` and folded into the returned outcome.
pub fn bootstrap(
    store: &dyn CookieStore,
    decryptor: &dyn Decryptor,
    sdk: &dyn SdkHost,
    sink: &dyn DiagnosticsSink,
    mode: AssemblyMode,
) -> Outcome {
    preflight(sdk, sink)
        .unwrap_or_else(|| assemble_and_initialize(store, decryptor, sdk, sink, mode))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{DiagnosticKind, MemorySink, Severity};
    use crate::fields::ConfigField;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct FakeSdk {
        fail: bool,
        received: Mutex<Vec<AssembledConfig>>,
    }

    impl SdkHost for FakeSdk {
        fn is_available(&self) -> bool {
            true
        }

        fn app_count(&self) -> usize {
            self.received.lock().len()
        }

        fn initialize_app(&self, config: &AssembledConfig) -> Result<(), SdkError> {
            if self.fail {
                return Err(SdkError::Rejected("invalid-api-key".into()));
            }
            self.received.lock().push(config.clone());
            Ok(())
        }
    }

    fn complete() -> AssembledConfig {
        [
            (ConfigField::ApiKey, Some("key".to_string())),
            (ConfigField::AuthDomain, Some("demo.example.com".to_string())),
            (ConfigField::ProjectId, Some("demo".to_string())),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn already_initialized_always_skips() {
        let sdk = FakeSdk::default();
        let sink = MemorySink::new();
        for config in [complete(), AssembledConfig::default()] {
            assert_eq!(
                initialize_if_complete(&config, true, &sdk, &sink),
                Outcome::Skipped
            );
        }
        assert!(sdk.received.lock().is_empty());
        assert!(sink.is_empty());
    }

    #[test]
    fn each_required_field_gates_initialization() {
        for field in crate::fields::REQUIRED_FIELDS {
            let mut config = complete();
            config.set(ConfigField::StorageBucket, Some("bucket".into()));
            config.set(field, None);
            let sdk = FakeSdk::default();
            let sink = MemorySink::new();
            assert_eq!(
                initialize_if_complete(&config, false, &sdk, &sink),
                Outcome::SkippedIncomplete
            );
            let entries = sink.entries();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].severity, Severity::Warn);
            assert!(entries[0].message.contains(field.property()));
            assert!(sdk.received.lock().is_empty());
        }
    }

    #[test]
    fn complete_config_reaches_sdk() {
        let sdk = FakeSdk::default();
        let sink = MemorySink::new();
        assert_eq!(
            initialize_if_complete(&complete(), false, &sdk, &sink),
            Outcome::Initialized
        );
        assert_eq!(sdk.received.lock()[0], complete());
        assert!(sink.is_empty());
    }

    #[test]
    fn sdk_failure_is_contained() {
        let sdk = FakeSdk {
            fail: true,
            ..Default::default()
        };
        let sink = MemorySink::new();
        assert_eq!(
            initialize_if_complete(&complete(), false, &sdk, &sink),
            Outcome::InitFailed
        );
        assert_eq!(sink.count(DiagnosticKind::SdkInitFailure), 1);
    }

    #[test]
    fn preflight_passes_a_fresh_host() {
        let sdk = FakeSdk::default();
        let sink = MemorySink::new();
        assert_eq!(preflight(&sdk, &sink), None);
        sdk.initialize_app(&complete()).unwrap();
        assert_eq!(preflight(&sdk, &sink), Some(Outcome::Skipped));
        assert!(sink.is_empty());
    }

    #[test]
    fn outcome_serializes_screaming_snake() {
        assert_eq!(
            serde_json::to_string(&Outcome::SkippedIncomplete).unwrap(),
            "\"SKIPPED_INCOMPLETE\""
        );
    }
}
