use crate::core::logic::{ExecutableLogic, NodeLogic};
use crate::core::pin::{Connections, Pin, find_pin_by_name};
use crate::core::runtime::{AddOnId, ExecutableUnit};
use crate::core::template::{AddOnTemplate, NodeTemplate};
use crate::core::types::{ActivationState, PinActivationType, SignalMode};
use crate::core::NodeGuid;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// One activation of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinRecord {
    pub time: DateTime<Utc>,
    pub activation_type: PinActivationType,
}

impl PinRecord {
    pub fn now(activation_type: PinActivationType) -> Self {
        Self {
            time: Utc::now(),
            activation_type,
        }
    }
}

/// A node inside a running graph instance: a deep copy of its template's logic
/// plus the per-run state.
pub struct Node {
    pub(crate) guid: NodeGuid,
    pub(crate) name: String,
    pub(crate) logic: Box<dyn NodeLogic>,
    pub(crate) input_pins: Vec<Pin>,
    pub(crate) output_pins: Vec<Pin>,
    pub(crate) context_input_pins: Vec<Pin>,
    pub(crate) context_output_pins: Vec<Pin>,
    pub(crate) connections: Connections,
    pub(crate) activation_state: ActivationState,
    pub(crate) signal_mode: SignalMode,
    pub(crate) add_on_templates: Arc<Vec<AddOnTemplate>>,
    pub(crate) add_ons: Vec<AddOnId>,
    pub(crate) initialized: bool,
    pub(crate) preloaded: bool,
    pub(crate) input_records: HashMap<String, Vec<PinRecord>>,
    pub(crate) output_records: HashMap<String, Vec<PinRecord>>,
}

impl Node {
    pub(crate) fn from_template(template: &NodeTemplate) -> Self {
        Self {
            guid: template.guid(),
            name: template.name().to_string(),
            logic: template.logic().clone_box(),
            input_pins: template.input_pins(),
            output_pins: template.output_pins(),
            context_input_pins: template.context_input_pins(),
            context_output_pins: template.context_output_pins(),
            connections: template.connections().clone(),
            activation_state: ActivationState::NeverActivated,
            signal_mode: template.signal_mode(),
            add_on_templates: template.shared_add_ons(),
            add_ons: Vec::new(),
            initialized: false,
            preloaded: false,
            input_records: HashMap::new(),
            output_records: HashMap::new(),
        }
    }

    pub fn guid(&self) -> NodeGuid {
        self.guid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn logic(&self) -> &dyn NodeLogic {
        self.logic.as_ref()
    }

    pub fn logic_as<T: NodeLogic>(&self) -> Option<&T> {
        (*self.logic).as_any().downcast_ref::<T>()
    }

    pub fn logic_as_mut<T: NodeLogic>(&mut self) -> Option<&mut T> {
        (*self.logic).as_any_mut().downcast_mut::<T>()
    }

    pub fn class_name(&self) -> &'static str {
        (*self.logic).class_name()
    }

    pub fn input_pins(&self) -> &[Pin] {
        &self.input_pins
    }

    pub fn output_pins(&self) -> &[Pin] {
        &self.output_pins
    }

    /// Inputs contributed by the AddOn tree.
    pub fn context_input_pins(&self) -> &[Pin] {
        &self.context_input_pins
    }

    pub fn context_output_pins(&self) -> &[Pin] {
        &self.context_output_pins
    }

    pub fn has_input_pin(&self, pin_name: &str) -> bool {
        find_pin_by_name(pin_name, &self.input_pins).is_some()
            || find_pin_by_name(pin_name, &self.context_input_pins).is_some()
    }

    pub fn has_output_pin(&self, pin_name: &str) -> bool {
        find_pin_by_name(pin_name, &self.output_pins).is_some()
            || find_pin_by_name(pin_name, &self.context_output_pins).is_some()
    }

    pub fn connections(&self) -> &Connections {
        &self.connections
    }

    pub fn is_output_connected(&self, pin_name: &str) -> bool {
        self.connections.contains_key(pin_name)
    }

    /// Every node this one has an outgoing connection to.
    pub fn connected_nodes(&self) -> Vec<NodeGuid> {
        let mut guids: Vec<NodeGuid> = Vec::new();
        for connection in self.connections.values() {
            if !guids.contains(&connection.node_guid) {
                guids.push(connection.node_guid);
            }
        }
        guids
    }

    /// Name of an output pin connected to `other`, if any.
    pub fn pin_connected_to_node(&self, other: NodeGuid) -> Option<&str> {
        self.connections
            .iter()
            .find(|(_, connection)| connection.node_guid == other)
            .map(|(pin_name, _)| pin_name.as_str())
    }

    pub fn activation_state(&self) -> ActivationState {
        self.activation_state
    }

    pub fn signal_mode(&self) -> SignalMode {
        self.signal_mode
    }

    pub fn add_ons(&self) -> &[AddOnId] {
        &self.add_ons
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn is_preloaded(&self) -> bool {
        self.preloaded
    }

    pub fn input_records(&self, pin_name: &str) -> &[PinRecord] {
        self.input_records.get(pin_name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn output_records(&self, pin_name: &str) -> &[PinRecord] {
        self.output_records.get(pin_name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn first_output_pin(&self) -> Option<&str> {
        self.output_pins.first().map(|pin| pin.name.as_str())
    }

    /// Connected outputs in declaration order, own pins before AddOn pins.
    pub(crate) fn connected_output_pins(&self) -> Vec<String> {
        self.output_pins
            .iter()
            .chain(self.context_output_pins.iter())
            .filter(|pin| self.is_output_connected(&pin.name))
            .map(|pin| pin.name.clone())
            .collect()
    }

    #[cfg(feature = "diagnostics")]
    pub(crate) fn record_input(&mut self, pin_name: &str, activation_type: PinActivationType) {
        self.input_records
            .entry(pin_name.to_string())
            .or_default()
            .push(PinRecord::now(activation_type));
    }

    #[cfg(not(feature = "diagnostics"))]
    pub(crate) fn record_input(&mut self, _pin_name: &str, _activation_type: PinActivationType) {}

    #[cfg(feature = "diagnostics")]
    pub(crate) fn record_output(&mut self, pin_name: &str, activation_type: PinActivationType) {
        self.output_records
            .entry(pin_name.to_string())
            .or_default()
            .push(PinRecord::now(activation_type));
    }

    #[cfg(not(feature = "diagnostics"))]
    pub(crate) fn record_output(&mut self, _pin_name: &str, _activation_type: PinActivationType) {}

    pub(crate) fn clear_records(&mut self) {
        self.input_records.clear();
        self.output_records.clear();
    }
}

impl ExecutableUnit for Node {
    fn logic(&self) -> &dyn ExecutableLogic {
        (*self.logic).as_executable()
    }

    fn logic_mut(&mut self) -> &mut dyn ExecutableLogic {
        (*self.logic).as_executable_mut()
    }

    fn add_on_ids(&self) -> &[AddOnId] {
        &self.add_ons
    }

    fn declared_input_pins(&self) -> &[Pin] {
        &self.input_pins
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pin::is_supported_input_pin_name;

    #[derive(Clone)]
    struct Branch;

    impl ExecutableLogic for Branch {
        fn input_pins(&self) -> Vec<Pin> {
            vec![Pin::new("Evaluate")]
        }

        fn output_pins(&self) -> Vec<Pin> {
            vec![Pin::new("True"), Pin::new("False")]
        }
    }

    impl NodeLogic for Branch {
        fn clone_box(&self) -> Box<dyn NodeLogic> {
            Box::new(self.clone())
        }
    }

    #[test]
    fn test_node_copies_template() {
        let target = NodeGuid::new_v4();
        let template = NodeTemplate::new(Branch)
            .with_name("Check")
            .connect("True", target, "In")
            .connect("False", target, "Other");
        let node = Node::from_template(&template);

        assert_eq!(node.guid(), template.guid());
        assert_eq!(node.name(), "Check");
        assert_eq!(node.activation_state(), ActivationState::NeverActivated);
        assert_eq!(node.first_output_pin(), Some("True"));
        assert_eq!(node.connected_nodes(), vec![target]);
        assert!(node.pin_connected_to_node(target).is_some());
        assert_eq!(node.connected_output_pins(), vec!["True", "False"]);
        assert!(node.logic_as::<Branch>().is_some());
    }

    #[test]
    fn test_node_pin_filter_uses_own_inputs() {
        let node = Node::from_template(&NodeTemplate::new(Branch));
        assert!(is_supported_input_pin_name(node.declared_input_pins(), "Evaluate"));
        assert!(!is_supported_input_pin_name(node.declared_input_pins(), "In"));
        assert!(node.has_output_pin("False"));
        assert!(!node.has_input_pin("True"));
    }

    #[cfg(feature = "diagnostics")]
    #[test]
    fn test_records_accumulate_per_pin() {
        let mut node = Node::from_template(&NodeTemplate::new(Branch));
        node.record_input("Evaluate", PinActivationType::Default);
        node.record_input("Evaluate", PinActivationType::Forced);
        node.record_output("True", PinActivationType::Default);

        assert_eq!(node.input_records("Evaluate").len(), 2);
        assert_eq!(node.input_records("Evaluate")[1].activation_type, PinActivationType::Forced);
        assert_eq!(node.output_records("True").len(), 1);
        assert!(node.output_records("False").is_empty());

        node.clear_records();
        assert!(node.input_records("Evaluate").is_empty());
    }
}
