use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Note,
}

/// A single message emitted by a node, an AddOn or the runtime itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    /// Fully formatted message, node and asset context appended.
    pub message: String,
    pub node_name: Option<String>,
    pub asset_path: String,
}

/// Receiver for diagnostics, the "message log" of the host.
pub trait DiagnosticsSink: Send + Sync {
    fn record(&self, diagnostic: Diagnostic);
    fn flush(&self) {}
}

/// Simple in-memory collector for diagnostics.
#[derive(Default)]
pub struct MemoryDiagnostics {
    entries: Mutex<Vec<Diagnostic>>,
}

impl MemoryDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Diagnostic> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn with_severity(&self, severity: Severity) -> Vec<Diagnostic> {
        self.entries()
            .into_iter()
            .filter(|d| d.severity == severity)
            .collect()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl DiagnosticsSink for MemoryDiagnostics {
    fn record(&self, diagnostic: Diagnostic) {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(diagnostic);
    }
}

pub fn format_message(message: &str, node_name: Option<&str>, asset_path: &str) -> String {
    match node_name {
        Some(node) => format!("{message} --- node {node}, asset {asset_path}"),
        None => format!("{message} --- asset {asset_path}"),
    }
}

/// Formats messages with their origin and forwards them to the `log` facade
/// and the optional sink. Compiled to a no-op without the `diagnostics` feature.
#[derive(Clone, Default)]
pub struct Diagnostics {
    asset_path: String,
    sink: Option<Arc<dyn DiagnosticsSink>>,
}

impl Diagnostics {
    pub fn new(asset_path: impl Into<String>, sink: Option<Arc<dyn DiagnosticsSink>>) -> Self {
        Self {
            asset_path: asset_path.into(),
            sink,
        }
    }

    pub fn asset_path(&self) -> &str {
        &self.asset_path
    }

    pub fn error(&self, node_name: Option<&str>, message: &str) {
        self.emit(Severity::Error, node_name, message);
    }

    pub fn warning(&self, node_name: Option<&str>, message: &str) {
        self.emit(Severity::Warning, node_name, message);
    }

    pub fn note(&self, node_name: Option<&str>, message: &str) {
        self.emit(Severity::Note, node_name, message);
    }

    #[cfg(feature = "diagnostics")]
    pub fn emit(&self, severity: Severity, node_name: Option<&str>, message: &str) {
        let message = format_message(message, node_name, &self.asset_path);
        match severity {
            Severity::Error => log::error!("{}", message),
            Severity::Warning => log::warn!("{}", message),
            Severity::Note => log::info!("{}", message),
        }

        if let Some(sink) = &self.sink {
            sink.record(Diagnostic {
                timestamp: Utc::now(),
                severity,
                message,
                node_name: node_name.map(str::to_string),
                asset_path: self.asset_path.clone(),
            });
        }
    }

    #[cfg(not(feature = "diagnostics"))]
    pub fn emit(&self, _severity: Severity, _node_name: Option<&str>, _message: &str) {}
}
