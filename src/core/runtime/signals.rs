//! Pin signal propagation, activation and finishing.

use crate::core::context::Signal;
use crate::core::pin::DEFAULT_INPUT_PIN;
use crate::core::runtime::lifecycle::{Hook, Order};
use crate::core::runtime::{FlowInstance, NodeHandle, UnitId};
use crate::core::types::{ActivationState, FinishPolicy, PinActivationType, SignalMode};
use crate::core::NodeGuid;

impl FlowInstance {
    /// Triggers the entry node: its default input if it has one, otherwise its
    /// first declared input.
    pub fn start(&mut self) {
        let Some(entry) = self.asset().entry_node() else {
            self.env.diagnostics.warning(None, "Cannot start: no entry node");
            return;
        };
        let Some(node) = self.node(entry) else {
            self.env
                .diagnostics
                .error(None, &format!("Cannot start: entry node {entry} is missing"));
            return;
        };

        let pin_name = if node.has_input_pin(DEFAULT_INPUT_PIN) {
            Some(DEFAULT_INPUT_PIN.to_string())
        } else {
            node.input_pins().first().map(|pin| pin.name.clone())
        };
        match pin_name {
            Some(pin_name) => self.trigger_input(entry, &pin_name),
            None => self
                .env
                .diagnostics
                .error(Some(&node.name), "Cannot start: entry node has no input pins"),
        }
    }

    pub fn trigger_input(&mut self, guid: NodeGuid, pin_name: &str) {
        self.trigger_input_with(guid, pin_name, PinActivationType::Default);
    }

    /// Delivers an input signal to a node. Never fails: unknown nodes or pins
    /// are reported to diagnostics and dropped.
    pub fn trigger_input_with(&mut self, guid: NodeGuid, pin_name: &str, activation_type: PinActivationType) {
        let Some(handle) = self.node_handle(guid) else {
            self.env
                .diagnostics
                .error(None, &format!("Input {pin_name} triggered on unknown node {guid}"));
            return;
        };

        if self.signal_depth >= self.env.settings.max_signal_depth {
            self.env.diagnostics.error(
                Some(&self.node_name(handle)),
                &format!(
                    "Signal depth limit of {} reached, dropping input {pin_name}",
                    self.env.settings.max_signal_depth
                ),
            );
            return;
        }

        self.signal_depth += 1;
        self.route_input(handle, pin_name, activation_type);
        self.signal_depth -= 1;
    }

    fn route_input(&mut self, handle: NodeHandle, pin_name: &str, activation_type: PinActivationType) {
        let Some(node) = self.nodes.get(handle) else {
            return;
        };
        let diagnostics = &self.env.diagnostics;

        if self.finished {
            diagnostics.note(Some(&node.name), &format!("Flow already finished, input {pin_name} ignored"));
            return;
        }
        if !node.initialized {
            diagnostics.error(Some(&node.name), &format!("Input {pin_name} triggered before initialization"));
            return;
        }
        if !node.has_input_pin(pin_name) {
            diagnostics.error(Some(&node.name), &format!("Input Pin name {pin_name} invalid"));
            return;
        }

        let signal_mode = node.signal_mode;
        if signal_mode == SignalMode::Disabled {
            diagnostics.note(Some(&node.name), &format!("Node disabled while triggering input {pin_name}"));
            return;
        }
        if node.activation_state.is_finished() {
            if self.env.settings.warn_on_finished_input {
                diagnostics.warning(
                    Some(&node.name),
                    &format!("Input {pin_name} ignored, node already {:?}", node.activation_state),
                );
            }
            return;
        }

        let record = self.env.settings.record_pin_activations;
        if let Some(node) = self.nodes.get_mut(handle) {
            if record {
                node.record_input(pin_name, activation_type);
            }
        }

        match signal_mode {
            SignalMode::Enabled => {
                self.activate_node(handle);
                let still_active = self
                    .nodes
                    .get(handle)
                    .is_some_and(|node| node.activation_state == ActivationState::Active);
                if still_active {
                    self.execute_input(UnitId::Node(handle), pin_name);
                }
            }
            SignalMode::PassThrough => self.pass_through(handle),
            SignalMode::Disabled => {}
        }
    }

    /// First input of the run: the node becomes active and `on_activate`
    /// runs on it, then on its AddOns.
    fn activate_node(&mut self, handle: NodeHandle) {
        if !self.mark_active(handle) {
            return;
        }
        self.dispatch(UnitId::Node(handle), Hook::Activate, Order::SelfFirst);
    }

    fn mark_active(&mut self, handle: NodeHandle) -> bool {
        let Some(node) = self.nodes.get_mut(handle) else {
            return false;
        };
        if node.activation_state != ActivationState::NeverActivated {
            return false;
        }
        node.activation_state = ActivationState::Active;
        if !self.active_nodes.contains(&handle) {
            self.active_nodes.push(handle);
        }
        true
    }

    /// Skips the node's logic: every connected output fires, then the node finishes.
    fn pass_through(&mut self, handle: NodeHandle) {
        self.mark_active(handle);
        let outputs = self
            .nodes
            .get(handle)
            .map(|node| node.connected_output_pins())
            .unwrap_or_default();
        for pin_name in outputs {
            self.trigger_output_at(handle, &pin_name, false, PinActivationType::PassThrough);
        }
        self.finish_at(handle);
    }

    pub fn trigger_output(&mut self, guid: NodeGuid, pin_name: &str, finish: bool) {
        self.trigger_output_with(guid, pin_name, finish, PinActivationType::Default);
    }

    /// Fires an output of a node from outside the graph, e.g. a host event.
    pub fn trigger_output_with(
        &mut self,
        guid: NodeGuid,
        pin_name: &str,
        finish: bool,
        activation_type: PinActivationType,
    ) {
        match self.node_handle(guid) {
            Some(handle) => self.trigger_output_at(handle, pin_name, finish, activation_type),
            None => self
                .env
                .diagnostics
                .error(None, &format!("Output {pin_name} triggered on unknown node {guid}")),
        }
    }

    /// Routes the signal along the pin's connection, then finishes the node if
    /// asked to. An unconnected output is a no-op.
    pub(crate) fn trigger_output_at(
        &mut self,
        handle: NodeHandle,
        pin_name: &str,
        finish: bool,
        activation_type: PinActivationType,
    ) {
        let Some(node) = self.nodes.get_mut(handle) else {
            return;
        };

        let mut target = None;
        if node.has_output_pin(pin_name) {
            if self.env.settings.record_pin_activations {
                node.record_output(pin_name, activation_type);
            }
            target = node.connections.get(pin_name).cloned();
        } else {
            self.env
                .diagnostics
                .error(Some(&node.name), &format!("Output Pin name {pin_name} invalid"));
        }

        if let Some(target) = target {
            self.trigger_input_with(target.node_guid, &target.pin_name, activation_type);
        }
        if finish {
            self.finish_at(handle);
        }
    }

    fn trigger_first_output_at(&mut self, handle: NodeHandle, finish: bool) {
        let Some(node) = self.nodes.get(handle) else {
            return;
        };
        match node.first_output_pin().map(str::to_string) {
            Some(pin_name) => self.trigger_output_at(handle, &pin_name, finish, PinActivationType::Default),
            None => {
                self.env
                    .diagnostics
                    .error(Some(&node.name), "Cannot trigger first output: node has no output pins");
                if finish {
                    self.finish_at(handle);
                }
            }
        }
    }

    pub(crate) fn apply_signals(&mut self, handle: NodeHandle, signals: Vec<Signal>) {
        for signal in signals {
            match signal {
                Signal::TriggerOutput {
                    pin_name,
                    finish,
                    activation_type,
                } => self.trigger_output_at(handle, &pin_name, finish, activation_type),
                Signal::TriggerFirstOutput { finish } => self.trigger_first_output_at(handle, finish),
                Signal::Finish => self.finish_at(handle),
            }
        }
    }

    /// Finishes an active node: it lands in the terminal state of the current
    /// finish policy and cleanup runs on its AddOns, then on itself.
    pub fn finish_node(&mut self, guid: NodeGuid) {
        if let Some(handle) = self.node_handle(guid) {
            self.finish_at(handle);
        }
    }

    pub(crate) fn finish_at(&mut self, handle: NodeHandle) {
        if !self.is_active(handle) {
            return;
        }
        self.deactivate(handle);

        let finishes_graph = self
            .nodes
            .get(handle)
            .is_some_and(|node| node.logic.can_finish_graph());
        if finishes_graph {
            self.finish_flow(FinishPolicy::Keep);
        }
    }

    /// Interrupts an active node: `force_finish_node` runs on its AddOns, then
    /// on itself, followed by the regular deactivation.
    pub fn force_finish_node(&mut self, guid: NodeGuid) {
        if let Some(handle) = self.node_handle(guid) {
            self.force_finish_at(handle);
        }
    }

    pub(crate) fn force_finish_at(&mut self, handle: NodeHandle) {
        if !self.is_active(handle) {
            return;
        }
        self.dispatch(UnitId::Node(handle), Hook::ForceFinish, Order::ChildrenFirst);
        self.deactivate(handle);
    }

    fn deactivate(&mut self, handle: NodeHandle) {
        let terminal = self.env.finish_policy.terminal_state();
        let Some(node) = self.nodes.get_mut(handle) else {
            return;
        };
        if node.activation_state != ActivationState::Active {
            return;
        }
        node.activation_state = terminal;
        self.active_nodes.retain(|active| *active != handle);
        self.dispatch(UnitId::Node(handle), Hook::Cleanup, Order::ChildrenFirst);
    }

    fn is_active(&self, handle: NodeHandle) -> bool {
        self.nodes
            .get(handle)
            .is_some_and(|node| node.activation_state == ActivationState::Active)
    }

    /// Stops the whole graph: every active node is force-finished under `policy`.
    /// Inputs are ignored afterwards until [`reset`](Self::reset).
    pub fn finish_flow(&mut self, policy: FinishPolicy) {
        self.env.finish_policy = policy;
        for handle in self.active_nodes.clone() {
            self.force_finish_at(handle);
        }
        self.finished = true;
    }

    /// Back to a fresh run: every node is `NeverActivated` again and all pin
    /// records are gone. Initialization is kept.
    pub fn reset(&mut self) {
        for handle in self.node_order() {
            if let Some(node) = self.nodes.get_mut(handle) {
                node.activation_state = ActivationState::NeverActivated;
                node.clear_records();
            }
        }
        self.active_nodes.clear();
        self.signal_depth = 0;
        self.finished = false;
        self.env.finish_policy = self.env.settings.default_finish_policy;
    }
}
