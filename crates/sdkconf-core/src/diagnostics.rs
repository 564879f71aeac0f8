use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Warn,
    Error,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticKind {
    FieldDecryptionFailure,
    ConfigIncomplete,
    SdkUnavailable,
    SdkInitFailure,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub kind: DiagnosticKind,
    /// Cookie the diagnostic is about, when it concerns a single field.
    pub cookie: Option<String>,
    pub message: String,
}

impl Diagnostic {
    pub fn field_decryption_failure(cookie: &str, reason: impl std::fmt::Display) -> Self {
        Self {
            severity: Severity::Error,
            kind: DiagnosticKind::FieldDecryptionFailure,
            cookie: Some(cookie.to_string()),
            message: format!("error decrypting cookie {cookie}: {reason}"),
        }
    }

    pub fn config_incomplete(missing: &[&str]) -> Self {
        Self {
            severity: Severity::Warn,
            kind: DiagnosticKind::ConfigIncomplete,
            cookie: None,
            message: format!(
                "configuration incomplete, check credential source (missing: {})",
                missing.join(", ")
            ),
        }
    }

    pub fn sdk_unavailable() -> Self {
        Self {
            severity: Severity::Error,
            kind: DiagnosticKind::SdkUnavailable,
            cookie: None,
            message: "SDK client library not loaded; skipping initialization".into(),
        }
    }

    pub fn sdk_init_failure(reason: impl std::fmt::Display) -> Self {
        Self {
            severity: Severity::Error,
            kind: DiagnosticKind::SdkInitFailure,
            cookie: None,
            message: format!("error initializing SDK: {reason}"),
        }
    }
}

/// Receives diagnostics. Emission must never fail from the caller's point of view.
pub trait DiagnosticsSink: Send + Sync {
    fn emit(&self, diagnostic: Diagnostic);
}

impl<T: DiagnosticsSink + ?Sized> DiagnosticsSink for &T {
    fn emit(&self, diagnostic: Diagnostic) {
        (**self).emit(diagnostic)
    }
}

impl<T: DiagnosticsSink + ?Sized> DiagnosticsSink for Box<T> {
    fn emit(&self, diagnostic: Diagnostic) {
        (**self).emit(diagnostic)
    }
}

impl<T: DiagnosticsSink + ?Sized> DiagnosticsSink for Arc<T> {
    fn emit(&self, diagnostic: Diagnostic) {
        (**self).emit(diagnostic)
    }
}

/// Forwards to `tracing` at the matching level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn emit(&self, d: Diagnostic) {
        let cookie = d.cookie.as_deref().unwrap_or("-");
        match d.severity {
            Severity::Error => tracing::error!(kind = ?d.kind, cookie, "{}", d.message),
            Severity::Warn => tracing::warn!(kind = ?d.kind, cookie, "{}", d.message),
        }
    }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries.lock().iter().filter(|d| d.kind == kind).count()
    }
}

impl DiagnosticsSink for MemorySink {
    fn emit(&self, diagnostic: Diagnostic) {
        self.entries.lock().push(diagnostic);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub diagnostic: Diagnostic,
}

/// Appends diagnostics as JSON lines.
pub struct JsonlSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_record(&self, record: &DiagnosticRecord) -> anyhow::Result<()> {
        let _guard = self.lock.lock();
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let line = serde_json::to_string(record)?;
        writeln!(file, "{}", line)?;
        file.flush()?;
        Ok(())
    }

    pub fn read_all(&self) -> anyhow::Result<Vec<DiagnosticRecord>> {
        if !self.path.exists() {
            return Ok(vec![]);
        }
        let reader = BufReader::new(File::open(&self.path)?);
        let mut records = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}

impl DiagnosticsSink for JsonlSink {
    fn emit(&self, diagnostic: Diagnostic) {
        let record = DiagnosticRecord {
            timestamp: Utc::now(),
            diagnostic,
        };
        if let Err(e) = self.write_record(&record) {
            tracing::warn!(path = %self.path.display(), "diagnostics log write failed: {e}");
        }
    }
}

/// Sends every diagnostic to each inner sink.
#[derive(Default)]
pub struct TeeSink {
    sinks: Vec<Box<dyn DiagnosticsSink>>,
}

impl TeeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl DiagnosticsSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl DiagnosticsSink for TeeSink {
    fn emit(&self, diagnostic: Diagnostic) {
        for sink in &self.sinks {
            sink.emit(diagnostic.clone());
        }
    }
}
