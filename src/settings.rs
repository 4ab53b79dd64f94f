//! Instance-wide configuration.

use crate::core::types::FinishPolicy;
use crate::error::FlowResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Runtime settings shared by every node of a graph instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowSettings {
    /// Maximum nesting of synchronous input triggers in one propagation chain.
    pub max_signal_depth: usize,
    /// Finish policy a freshly spawned instance starts with.
    pub default_finish_policy: FinishPolicy,
    /// Keep per-pin activation records (requires the `diagnostics` feature).
    pub record_pin_activations: bool,
    /// Warn when an input reaches a node that already finished.
    pub warn_on_finished_input: bool,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            max_signal_depth: 256,
            default_finish_policy: FinishPolicy::Keep,
            record_pin_activations: true,
            warn_on_finished_input: true,
        }
    }
}

impl FlowSettings {
    pub fn from_json_str(json: &str) -> FlowResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> FlowResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}
