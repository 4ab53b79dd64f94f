//! Pins, connections and the supported-pin filter.

use crate::core::NodeGuid;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::RangeInclusive;

/// Name of the built-in input pin used by nodes that declare no inputs.
pub const DEFAULT_INPUT_PIN: &str = "In";
/// Name of the built-in output pin used by nodes that declare no outputs.
pub const DEFAULT_OUTPUT_PIN: &str = "Out";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinDirection {
    Input,
    Output,
}

/// A named attachment point. Direction and declaration index come from the
/// pin list it is declared in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pin {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_tip: Option<String>,
}

impl Pin {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            friendly_name: None,
            tool_tip: None,
        }
    }

    pub fn with_friendly_name(mut self, friendly_name: impl Into<String>) -> Self {
        self.friendly_name = Some(friendly_name.into());
        self
    }

    pub fn with_tool_tip(mut self, tool_tip: impl Into<String>) -> Self {
        self.tool_tip = Some(tool_tip.into());
        self
    }

    pub fn default_input() -> Self {
        Pin::new(DEFAULT_INPUT_PIN)
    }

    pub fn default_output() -> Self {
        Pin::new(DEFAULT_OUTPUT_PIN)
    }

    /// Numbered pins ("0", "1", ...), used by nodes with user-extendable pin ranges.
    pub fn numbered(range: RangeInclusive<u8>) -> Vec<Pin> {
        range.map(|index| Pin::new(index.to_string())).collect()
    }

    pub fn display_name(&self) -> &str {
        self.friendly_name.as_deref().unwrap_or(&self.name)
    }
}

impl From<&str> for Pin {
    fn from(name: &str) -> Self {
        Pin::new(name)
    }
}

impl From<String> for Pin {
    fn from(name: String) -> Self {
        Pin::new(name)
    }
}

/// The downstream end of a connection: which node, which of its input pins.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectedPin {
    pub node_guid: NodeGuid,
    pub pin_name: String,
}

impl ConnectedPin {
    pub fn new(node_guid: NodeGuid, pin_name: impl Into<String>) -> Self {
        Self {
            node_guid,
            pin_name: pin_name.into(),
        }
    }
}

/// Output pin name -> downstream input. One record per output pin.
pub type Connections = HashMap<String, ConnectedPin>;

pub fn find_pin_by_name<'a>(pin_name: &str, pins: &'a [Pin]) -> Option<&'a Pin> {
    pins.iter().find(|pin| pin.name == pin_name)
}

/// A unit reacts to a pin name when it declares no inputs at all, or declares
/// an input with exactly that name.
pub fn is_supported_input_pin_name(declared_inputs: &[Pin], pin_name: &str) -> bool {
    declared_inputs.is_empty() || find_pin_by_name(pin_name, declared_inputs).is_some()
}

/// Appends `extra` to `pins`, skipping names already present.
pub fn merge_unique_pins(pins: &mut Vec<Pin>, extra: impl IntoIterator<Item = Pin>) {
    for pin in extra {
        if find_pin_by_name(&pin.name, pins).is_none() {
            pins.push(pin);
        }
    }
}
