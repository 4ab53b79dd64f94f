//! Design-time class descriptions.
//!
//! Templates are read-only once a graph instance is spawned from them: every
//! instance deep-copies the logic objects it needs, so the AddOn lists below
//! can be shared between assets with `Arc` and only get copied on edit.

use crate::core::NodeGuid;
use crate::core::logic::{AddOnLogic, ExecutableLogic, NodeLogic};
use crate::core::pin::{ConnectedPin, Connections, Pin, find_pin_by_name, merge_unique_pins};
use crate::core::types::{SignalMode, UnitKind};
use crate::error::{FlowError, FlowResult};
use std::sync::Arc;

/// An AddOn as designed on a node (or on another AddOn), with its own nested
/// AddOn templates.
#[derive(Clone)]
pub struct AddOnTemplate {
    logic: Box<dyn AddOnLogic>,
    add_ons: Arc<Vec<AddOnTemplate>>,
}

impl AddOnTemplate {
    pub fn new(logic: impl AddOnLogic) -> Self {
        Self::from_boxed(Box::new(logic))
    }

    pub fn from_boxed(logic: Box<dyn AddOnLogic>) -> Self {
        Self {
            logic,
            add_ons: Arc::new(Vec::new()),
        }
    }

    pub fn with_add_on(mut self, add_on: AddOnTemplate) -> Self {
        self.add_ons_mut().push(add_on);
        self
    }

    pub fn logic(&self) -> &dyn AddOnLogic {
        self.logic.as_ref()
    }

    pub fn logic_as<T: AddOnLogic>(&self) -> Option<&T> {
        (*self.logic).as_any().downcast_ref::<T>()
    }

    pub fn class_name(&self) -> &'static str {
        (*self.logic).class_name()
    }

    pub fn add_ons(&self) -> &[AddOnTemplate] {
        &self.add_ons
    }

    pub fn add_ons_mut(&mut self) -> &mut Vec<AddOnTemplate> {
        Arc::make_mut(&mut self.add_ons)
    }

    pub(crate) fn shared_add_ons(&self) -> Arc<Vec<AddOnTemplate>> {
        Arc::clone(&self.add_ons)
    }
}

/// A node as placed in an asset: identity, class logic, user-edited pins,
/// outgoing connections, signal mode and AddOn templates.
#[derive(Clone)]
pub struct NodeTemplate {
    guid: NodeGuid,
    name: String,
    logic: Box<dyn NodeLogic>,
    user_input_pins: Vec<Pin>,
    user_output_pins: Vec<Pin>,
    connections: Connections,
    signal_mode: SignalMode,
    add_ons: Arc<Vec<AddOnTemplate>>,
}

impl NodeTemplate {
    /// A fresh node with a random guid, named after its logic class.
    pub fn new(logic: impl NodeLogic) -> Self {
        Self::from_boxed(Box::new(logic))
    }

    pub fn from_boxed(logic: Box<dyn NodeLogic>) -> Self {
        let name = (*logic).class_name().to_string();
        Self {
            guid: NodeGuid::new_v4(),
            name,
            logic,
            user_input_pins: Vec::new(),
            user_output_pins: Vec::new(),
            connections: Connections::new(),
            signal_mode: SignalMode::Enabled,
            add_ons: Arc::new(Vec::new()),
        }
    }

    pub fn with_guid(mut self, guid: NodeGuid) -> Self {
        self.guid = guid;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_signal_mode(mut self, mode: SignalMode) -> Self {
        self.set_signal_mode(mode);
        self
    }

    pub fn with_add_on(mut self, add_on: AddOnTemplate) -> Self {
        self.add_ons_mut().push(add_on);
        self
    }

    /// Connects `output_pin` of this node to `input_pin` of `target`,
    /// replacing whatever the output was connected to.
    pub fn connect(
        mut self,
        output_pin: impl Into<String>,
        target: NodeGuid,
        input_pin: impl Into<String>,
    ) -> Self {
        self.connections
            .insert(output_pin.into(), ConnectedPin::new(target, input_pin));
        self
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

    pub fn class_name(&self) -> &'static str {
        (*self.logic).class_name()
    }

    pub fn signal_mode(&self) -> SignalMode {
        self.signal_mode
    }

    /// Refused (with a warning) when the node class does not allow `mode`.
    pub fn set_signal_mode(&mut self, mode: SignalMode) -> bool {
        if !self.logic.allowed_signal_modes().contains(&mode) {
            log::warn!(
                "Signal mode {:?} is not allowed on node {} ({})",
                mode,
                self.name,
                self.class_name()
            );
            return false;
        }
        self.signal_mode = mode;
        true
    }

    pub fn connections(&self) -> &Connections {
        &self.connections
    }

    pub fn set_connections(&mut self, connections: Connections) {
        self.connections = connections;
    }

    pub fn add_ons(&self) -> &[AddOnTemplate] {
        &self.add_ons
    }

    pub fn add_ons_mut(&mut self) -> &mut Vec<AddOnTemplate> {
        Arc::make_mut(&mut self.add_ons)
    }

    pub(crate) fn shared_add_ons(&self) -> Arc<Vec<AddOnTemplate>> {
        Arc::clone(&self.add_ons)
    }

    pub fn user_input_pins(&self) -> &[Pin] {
        &self.user_input_pins
    }

    pub fn user_output_pins(&self) -> &[Pin] {
        &self.user_output_pins
    }

    pub fn add_user_input_pin(&mut self, pin: impl Into<Pin>) -> FlowResult<()> {
        if !self.logic.can_user_add_input() {
            return Err(FlowError::UserPinsNotAllowed(self.name.clone()));
        }
        let pin = pin.into();
        if find_pin_by_name(&pin.name, &self.input_pins()).is_none() {
            self.user_input_pins.push(pin);
        }
        Ok(())
    }

    pub fn add_user_output_pin(&mut self, pin: impl Into<Pin>) -> FlowResult<()> {
        if !self.logic.can_user_add_output() {
            return Err(FlowError::UserPinsNotAllowed(self.name.clone()));
        }
        let pin = pin.into();
        if find_pin_by_name(&pin.name, &self.output_pins()).is_none() {
            self.user_output_pins.push(pin);
        }
        Ok(())
    }

    pub fn remove_user_input_pin(&mut self, pin_name: &str) -> bool {
        let before = self.user_input_pins.len();
        self.user_input_pins.retain(|pin| pin.name != pin_name);
        before != self.user_input_pins.len()
    }

    /// Also drops the connection leaving the removed pin.
    pub fn remove_user_output_pin(&mut self, pin_name: &str) -> bool {
        let before = self.user_output_pins.len();
        self.user_output_pins.retain(|pin| pin.name != pin_name);
        let removed = before != self.user_output_pins.len();
        if removed {
            self.connections.remove(pin_name);
        }
        removed
    }

    /// Class-declared inputs (the default "In" when the class declares none)
    /// followed by user-added inputs.
    pub fn input_pins(&self) -> Vec<Pin> {
        let mut pins = self.logic.input_pins();
        if pins.is_empty() {
            pins.push(Pin::default_input());
        }
        merge_unique_pins(&mut pins, self.user_input_pins.iter().cloned());
        pins
    }

    /// Class-declared outputs (the default "Out" when the class declares none)
    /// followed by user-added outputs.
    pub fn output_pins(&self) -> Vec<Pin> {
        let mut pins = self.logic.output_pins();
        if pins.is_empty() {
            pins.push(Pin::default_output());
        }
        merge_unique_pins(&mut pins, self.user_output_pins.iter().cloned());
        pins
    }

    /// Input pins contributed by the AddOn tree, in pre-order.
    pub fn context_input_pins(&self) -> Vec<Pin> {
        let mut pins = Vec::new();
        collect_context_pins(&self.add_ons, &mut pins, |logic| logic.input_pins());
        pins
    }

    pub fn context_output_pins(&self) -> Vec<Pin> {
        let mut pins = Vec::new();
        collect_context_pins(&self.add_ons, &mut pins, |logic| logic.output_pins());
        pins
    }

    /// The externally visible input surface: own pins, then AddOn pins,
    /// duplicates removed by name.
    pub fn all_input_pins(&self) -> Vec<Pin> {
        let mut pins = self.input_pins();
        merge_unique_pins(&mut pins, self.context_input_pins());
        pins
    }

    pub fn all_output_pins(&self) -> Vec<Pin> {
        let mut pins = self.output_pins();
        merge_unique_pins(&mut pins, self.context_output_pins());
        pins
    }
}

fn collect_context_pins(
    add_ons: &[AddOnTemplate],
    pins: &mut Vec<Pin>,
    declared: fn(&dyn ExecutableLogic) -> Vec<Pin>,
) {
    for add_on in add_ons {
        merge_unique_pins(pins, declared((*add_on.logic).as_executable()));
        collect_context_pins(add_on.add_ons(), pins, declared);
    }
}

/// A template that may be offered as an AddOn candidate. The variant is the
/// runtime type tag: a `Node` candidate can never be attached as an AddOn.
#[derive(Clone)]
pub enum UnitTemplate {
    Node(NodeTemplate),
    AddOn(AddOnTemplate),
}

impl UnitTemplate {
    pub fn kind(&self) -> UnitKind {
        match self {
            UnitTemplate::Node(_) => UnitKind::Node,
            UnitTemplate::AddOn(_) => UnitKind::AddOn,
        }
    }

    pub fn logic(&self) -> &dyn ExecutableLogic {
        match self {
            UnitTemplate::Node(node) => (*node.logic).as_executable(),
            UnitTemplate::AddOn(add_on) => (*add_on.logic).as_executable(),
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            UnitTemplate::Node(node) => node.class_name(),
            UnitTemplate::AddOn(add_on) => add_on.class_name(),
        }
    }
}

impl From<NodeTemplate> for UnitTemplate {
    fn from(node: NodeTemplate) -> Self {
        UnitTemplate::Node(node)
    }
}

impl From<AddOnTemplate> for UnitTemplate {
    fn from(add_on: AddOnTemplate) -> Self {
        UnitTemplate::AddOn(add_on)
    }
}
