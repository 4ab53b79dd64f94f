//! Graph instances: the runtime node and AddOn tables, lifecycle dispatch,
//! signal propagation and save/load.
//!
//! Nodes and AddOns live in two generational arenas owned by the
//! [`FlowInstance`]. Each unit keeps an ordered list of its child AddOn
//! handles, and every AddOn caches a handle to its anchor node while it is
//! initialized.

pub mod add_on;
mod lifecycle;
pub mod node;
pub mod save;
mod signals;

use crate::core::arena::{Arena, Handle};
use crate::core::asset::FlowAsset;
use crate::core::diagnostics::{Diagnostics, DiagnosticsSink};
use crate::core::logic::{AddOnLogic, ExecutableLogic, NodeLogic};
use crate::core::owner::{FlowOwner, resolve_owner};
use crate::core::pin::{Connections, Pin, is_supported_input_pin_name};
use crate::core::types::{ActivationState, FinishPolicy, SignalMode};
use crate::core::NodeGuid;
use crate::error::{FlowError, FlowResult};
use crate::settings::FlowSettings;
use std::collections::HashMap;
use std::sync::Arc;

pub use add_on::AddOn;
pub use node::{Node, PinRecord};
pub use save::{FlowSaveData, NodeSaveData};

pub type NodeHandle = Handle<Node>;
pub type AddOnId = Handle<AddOn>;

/// Either kind of executable unit inside an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitId {
    Node(NodeHandle),
    AddOn(AddOnId),
}

/// What lifecycle dispatch needs from both kinds of unit.
pub(crate) trait ExecutableUnit {
    fn logic(&self) -> &dyn ExecutableLogic;
    fn logic_mut(&mut self) -> &mut dyn ExecutableLogic;
    fn add_on_ids(&self) -> &[AddOnId];
    fn declared_input_pins(&self) -> &[Pin];

    fn is_supported_input_pin_name(&self, pin_name: &str) -> bool {
        is_supported_input_pin_name(self.declared_input_pins(), pin_name)
    }
}

/// Instance-wide state every hook can observe through its context.
pub(crate) struct InstanceEnv {
    pub(crate) owner: Option<Arc<dyn FlowOwner>>,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) settings: FlowSettings,
    pub(crate) finish_policy: FinishPolicy,
}

pub struct FlowInstanceBuilder {
    asset: Arc<FlowAsset>,
    owner: Option<Arc<dyn FlowOwner>>,
    sink: Option<Arc<dyn DiagnosticsSink>>,
    settings: FlowSettings,
}

impl FlowInstanceBuilder {
    pub fn owner(mut self, owner: Arc<dyn FlowOwner>) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn settings(mut self, settings: FlowSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Spawns the runtime nodes. They still need [`FlowInstance::initialize`].
    pub fn build(self) -> FlowInstance {
        let diagnostics = Diagnostics::new(self.asset.path(), self.sink);
        let finish_policy = self.settings.default_finish_policy;

        let mut nodes = Arena::new();
        let mut node_lookup = HashMap::new();
        let mut node_order = Vec::new();
        for template in self.asset.nodes() {
            let handle = nodes.insert(Node::from_template(template));
            node_lookup.insert(template.guid(), handle);
            node_order.push(handle);
        }

        FlowInstance {
            asset: self.asset,
            env: InstanceEnv {
                owner: self.owner,
                diagnostics,
                settings: self.settings,
                finish_policy,
            },
            nodes,
            node_lookup,
            node_order,
            add_ons: Arena::new(),
            active_nodes: Vec::new(),
            signal_depth: 0,
            finished: false,
        }
    }
}

/// One running copy of a [`FlowAsset`].
pub struct FlowInstance {
    asset: Arc<FlowAsset>,
    pub(crate) env: InstanceEnv,
    pub(crate) nodes: Arena<Node>,
    node_lookup: HashMap<NodeGuid, NodeHandle>,
    node_order: Vec<NodeHandle>,
    pub(crate) add_ons: Arena<AddOn>,
    pub(crate) active_nodes: Vec<NodeHandle>,
    pub(crate) signal_depth: usize,
    pub(crate) finished: bool,
}

impl FlowInstance {
    pub fn builder(asset: Arc<FlowAsset>) -> FlowInstanceBuilder {
        FlowInstanceBuilder {
            asset,
            owner: None,
            sink: None,
            settings: FlowSettings::default(),
        }
    }

    /// An instance with default settings, no owner and no diagnostics sink.
    pub fn new(asset: Arc<FlowAsset>) -> Self {
        Self::builder(asset).build()
    }

    pub fn asset(&self) -> &FlowAsset {
        &self.asset
    }

    pub fn asset_path(&self) -> &str {
        self.asset.path()
    }

    pub fn settings(&self) -> &FlowSettings {
        &self.env.settings
    }

    pub fn finish_policy(&self) -> FinishPolicy {
        self.env.finish_policy
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn root_owner(&self) -> Option<&dyn FlowOwner> {
        self.env.owner.as_deref()
    }

    /// The expected owner capability, looked up on the root owner or its container.
    pub fn resolve_owner<T: FlowOwner + 'static>(&self) -> Option<&T> {
        resolve_owner::<T>(self.root_owner()?)
    }

    pub fn node_handle(&self, guid: NodeGuid) -> Option<NodeHandle> {
        self.node_lookup.get(&guid).copied()
    }

    pub fn node_unit(&self, guid: NodeGuid) -> Option<UnitId> {
        self.node_handle(guid).map(UnitId::Node)
    }

    pub fn node(&self, guid: NodeGuid) -> Option<&Node> {
        self.nodes.get(self.node_handle(guid)?)
    }

    pub fn node_by_handle(&self, handle: NodeHandle) -> Option<&Node> {
        self.nodes.get(handle)
    }

    pub fn find_node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes().find(|node| node.name() == name)
    }

    /// Nodes in asset order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.node_order.iter().filter_map(|handle| self.nodes.get(*handle))
    }

    pub fn add_on(&self, id: AddOnId) -> Option<&AddOn> {
        self.add_ons.get(id)
    }

    pub fn node_logic<T: NodeLogic>(&self, guid: NodeGuid) -> Option<&T> {
        self.node(guid)?.logic_as::<T>()
    }

    pub fn node_logic_mut<T: NodeLogic>(&mut self, guid: NodeGuid) -> Option<&mut T> {
        let handle = self.node_handle(guid)?;
        self.nodes.get_mut(handle)?.logic_as_mut::<T>()
    }

    pub fn add_on_logic<T: AddOnLogic>(&self, id: AddOnId) -> Option<&T> {
        self.add_ons.get(id)?.logic_as::<T>()
    }

    pub fn activation_state(&self, guid: NodeGuid) -> Option<ActivationState> {
        self.node(guid).map(Node::activation_state)
    }

    /// Active nodes, in activation order.
    pub fn active_nodes(&self) -> Vec<NodeGuid> {
        self.active_nodes
            .iter()
            .filter_map(|handle| self.nodes.get(*handle))
            .map(Node::guid)
            .collect()
    }

    /// Refused (with a warning) for modes the node class does not allow.
    pub fn set_signal_mode(&mut self, guid: NodeGuid, mode: SignalMode) -> bool {
        let Some(node) = self.node_handle(guid).and_then(|handle| self.nodes.get_mut(handle)) else {
            self.env
                .diagnostics
                .error(None, &format!("Cannot set signal mode, node {guid} not found"));
            return false;
        };

        if !node.logic.allowed_signal_modes().contains(&mode) {
            self.env.diagnostics.warning(
                Some(&node.name),
                &format!("Signal mode {mode:?} is not allowed on {}", node.class_name()),
            );
            return false;
        }
        node.signal_mode = mode;
        true
    }

    pub fn connections(&self, guid: NodeGuid) -> Option<&Connections> {
        self.node(guid).map(Node::connections)
    }

    /// Bulk replacement of a node's connections.
    pub fn set_connections(&mut self, guid: NodeGuid, connections: Connections) -> FlowResult<()> {
        let node = self
            .node_handle(guid)
            .and_then(|handle| self.nodes.get_mut(handle))
            .ok_or(FlowError::NodeNotFound(guid))?;
        node.connections = connections;
        Ok(())
    }

    /// Whether any other node has an output connected to this input.
    pub fn is_input_connected(&self, guid: NodeGuid, pin_name: &str) -> bool {
        self.nodes().any(|node| {
            node.guid() != guid
                && node
                    .connections()
                    .values()
                    .any(|connection| connection.node_guid == guid && connection.pin_name == pin_name)
        })
    }

    pub(crate) fn unit(&self, unit: UnitId) -> Option<&dyn ExecutableUnit> {
        match unit {
            UnitId::Node(handle) => self.nodes.get(handle).map(|node| node as &dyn ExecutableUnit),
            UnitId::AddOn(id) => self.add_ons.get(id).map(|add_on| add_on as &dyn ExecutableUnit),
        }
    }

    /// Logic of either kind of unit, through the shared hook contract.
    pub fn unit_logic(&self, unit: UnitId) -> Option<&dyn ExecutableLogic> {
        self.unit(unit).map(|unit| unit.logic())
    }

    /// Direct AddOn children of a unit, in declaration order.
    pub fn child_add_ons(&self, unit: UnitId) -> Vec<AddOnId> {
        self.unit(unit)
            .map(|unit| unit.add_on_ids().to_vec())
            .unwrap_or_default()
    }

    /// The pin filter of a unit: does its own input logic react to `pin_name`?
    pub fn is_supported_input_pin_name(&self, unit: UnitId, pin_name: &str) -> bool {
        self.unit(unit)
            .is_some_and(|unit| unit.is_supported_input_pin_name(pin_name))
    }

    /// Every AddOn below `unit`, pre-order, in declaration order.
    pub fn add_on_ids(&self, unit: UnitId) -> Vec<AddOnId> {
        let mut ids = Vec::new();
        self.collect_add_on_ids(unit, &mut ids);
        ids
    }

    fn collect_add_on_ids(&self, unit: UnitId, ids: &mut Vec<AddOnId>) {
        for child in self.child_add_ons(unit) {
            ids.push(child);
            self.collect_add_on_ids(UnitId::AddOn(child), ids);
        }
    }

    pub fn for_each_add_on(&self, unit: UnitId, mut visit: impl FnMut(AddOnId, &AddOn)) {
        for id in self.add_on_ids(unit) {
            if let Some(add_on) = self.add_ons.get(id) {
                visit(id, add_on);
            }
        }
    }

    /// Visits only the AddOns whose logic is a `T`.
    pub fn for_each_add_on_of<T: AddOnLogic>(&self, unit: UnitId, mut visit: impl FnMut(&T)) {
        self.for_each_add_on(unit, |_, add_on| {
            if let Some(logic) = add_on.logic_as::<T>() {
                visit(logic);
            }
        });
    }

    pub fn for_each_add_on_of_mut<T: AddOnLogic>(&mut self, unit: UnitId, mut visit: impl FnMut(&mut T)) {
        for id in self.add_on_ids(unit) {
            if let Some(logic) = self.add_ons.get_mut(id).and_then(|a| a.logic_as_mut::<T>()) {
                visit(logic);
            }
        }
    }

    pub(crate) fn node_order(&self) -> Vec<NodeHandle> {
        self.node_order.clone()
    }

    pub(crate) fn node_name(&self, handle: NodeHandle) -> String {
        self.nodes
            .get(handle)
            .map(|node| node.name.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::logic::AddOnLogic;
    use crate::core::pin::ConnectedPin;
    use crate::core::template::{AddOnTemplate, NodeTemplate};

    #[derive(Clone)]
    struct Plain;

    impl ExecutableLogic for Plain {}

    impl NodeLogic for Plain {
        fn clone_box(&self) -> Box<dyn NodeLogic> {
            Box::new(self.clone())
        }

        fn allowed_signal_modes(&self) -> Vec<SignalMode> {
            vec![SignalMode::Enabled, SignalMode::Disabled]
        }
    }

    #[derive(Clone, Default)]
    struct Counter {
        hits: u32,
    }

    impl ExecutableLogic for Counter {}

    impl AddOnLogic for Counter {
        fn clone_box(&self) -> Box<dyn AddOnLogic> {
            Box::new(self.clone())
        }
    }

    #[derive(Clone)]
    struct Marker;

    impl ExecutableLogic for Marker {}

    impl AddOnLogic for Marker {
        fn clone_box(&self) -> Box<dyn AddOnLogic> {
            Box::new(self.clone())
        }
    }

    fn two_node_asset() -> (Arc<FlowAsset>, NodeGuid, NodeGuid) {
        let second = NodeTemplate::new(Plain).with_name("Second");
        let first = NodeTemplate::new(Plain)
            .with_name("First")
            .connect("Out", second.guid(), "In")
            .with_add_on(
                AddOnTemplate::new(Counter::default())
                    .with_add_on(AddOnTemplate::new(Marker))
                    .with_add_on(AddOnTemplate::new(Counter::default())),
            )
            .with_add_on(AddOnTemplate::new(Marker));
        let (a, b) = (first.guid(), second.guid());
        let asset = FlowAsset::new("/Game/Test")
            .with_node(first)
            .and_then(|asset| asset.with_node(second))
            .unwrap();
        (Arc::new(asset), a, b)
    }

    #[test]
    fn test_builder_spawns_nodes_in_asset_order() {
        let (asset, first, second) = two_node_asset();
        let instance = FlowInstance::new(asset);

        let names: Vec<_> = instance.nodes().map(Node::name).collect();
        assert_eq!(names, vec!["First", "Second"]);
        assert_eq!(instance.activation_state(first), Some(ActivationState::NeverActivated));
        assert!(instance.node(second).is_some_and(|n| !n.is_initialized()));
        assert_eq!(instance.asset_path(), "/Game/Test");
    }

    #[test]
    fn test_connection_queries() {
        let (asset, first, second) = two_node_asset();
        let mut instance = FlowInstance::new(asset);

        assert!(instance.is_input_connected(second, "In"));
        assert!(!instance.is_input_connected(first, "In"));

        instance.set_connections(first, Connections::new()).unwrap();
        assert!(!instance.is_input_connected(second, "In"));

        let mut connections = Connections::new();
        connections.insert("Out".into(), ConnectedPin::new(first, "In"));
        assert!(matches!(
            instance.set_connections(NodeGuid::new_v4(), connections),
            Err(FlowError::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_signal_mode_respects_allowed_modes() {
        let (asset, first, _) = two_node_asset();
        let mut instance = FlowInstance::new(asset);

        assert!(!instance.set_signal_mode(first, SignalMode::PassThrough));
        assert!(instance.set_signal_mode(first, SignalMode::Disabled));
        assert_eq!(instance.node(first).map(Node::signal_mode), Some(SignalMode::Disabled));
        assert!(!instance.set_signal_mode(NodeGuid::new_v4(), SignalMode::Enabled));
    }

    #[test]
    fn test_add_on_traversal_is_pre_order() {
        let (asset, first, _) = two_node_asset();
        let mut instance = FlowInstance::new(asset);
        instance.initialize();
        let unit = instance.node_unit(first).unwrap();

        let mut classes = Vec::new();
        instance.for_each_add_on(unit, |_, add_on| classes.push(add_on.class_name()));
        assert_eq!(classes, vec!["Counter", "Marker", "Counter", "Marker"]);

        instance.for_each_add_on_of_mut::<Counter>(unit, |counter| counter.hits += 1);
        let mut hits = Vec::new();
        instance.for_each_add_on_of::<Counter>(unit, |counter| hits.push(counter.hits));
        assert_eq!(hits, vec![1, 1]);

        assert_eq!(instance.child_add_ons(unit).len(), 2);
    }
}
