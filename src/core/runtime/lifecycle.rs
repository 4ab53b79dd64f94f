//! Hook dispatch over the node/AddOn tree and the initialize, preload, flush
//! and deinitialize passes.

use crate::core::arena::Arena;
use crate::core::context::UnitContext;
use crate::core::logic::ExecutableLogic;
use crate::core::runtime::{AddOn, AddOnId, ExecutableUnit, FlowInstance, Node, NodeHandle, UnitId};
use crate::core::types::UnitKind;
use crate::core::NodeGuid;
use std::mem;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Hook<'p> {
    Initialize,
    Deinitialize,
    Preload,
    Flush,
    Activate,
    ExecuteInput(&'p str),
    ForceFinish,
    Cleanup,
}

/// Whether a unit runs its own hook before or after its AddOns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Order {
    SelfFirst,
    ChildrenFirst,
}

fn logic_mut<'a>(
    nodes: &'a mut Arena<Node>,
    add_ons: &'a mut Arena<AddOn>,
    unit: UnitId,
) -> Option<&'a mut dyn ExecutableLogic> {
    match unit {
        UnitId::Node(handle) => nodes.get_mut(handle).map(|node| node.logic_mut()),
        UnitId::AddOn(id) => add_ons.get_mut(id).map(|add_on| add_on.logic_mut()),
    }
}

impl FlowInstance {
    /// Initializes every node (and its AddOn tree) in asset order.
    pub fn initialize(&mut self) {
        for handle in self.node_order() {
            self.initialize_node_handle(handle);
        }
    }

    /// Deinitializes every node; AddOn instances are destroyed.
    pub fn deinitialize(&mut self) {
        for handle in self.node_order() {
            self.deinitialize_node_handle(handle);
        }
    }

    pub fn initialize_node(&mut self, guid: NodeGuid) {
        match self.node_handle(guid) {
            Some(handle) => self.initialize_node_handle(handle),
            None => self
                .env
                .diagnostics
                .error(None, &format!("Cannot initialize node {guid}: not in this instance")),
        }
    }

    pub fn deinitialize_node(&mut self, guid: NodeGuid) {
        match self.node_handle(guid) {
            Some(handle) => self.deinitialize_node_handle(handle),
            None => self
                .env
                .diagnostics
                .error(None, &format!("Cannot deinitialize node {guid}: not in this instance")),
        }
    }

    pub fn is_initialized(&self) -> bool {
        !self.node_order().is_empty() && self.nodes().all(Node::is_initialized)
    }

    fn initialize_node_handle(&mut self, handle: NodeHandle) {
        match self.nodes.get(handle) {
            Some(node) if !node.initialized => {}
            _ => return,
        }
        self.initialize_unit(UnitId::Node(handle));
        if let Some(node) = self.nodes.get_mut(handle) {
            node.initialized = true;
        }
    }

    fn deinitialize_node_handle(&mut self, handle: NodeHandle) {
        match self.nodes.get(handle) {
            Some(node) if node.initialized => {}
            _ => return,
        }
        // Active nodes are force-finished while their AddOns still exist
        self.force_finish_at(handle);
        self.deinitialize_unit(UnitId::Node(handle));
        if let Some(node) = self.nodes.get_mut(handle) {
            node.initialized = false;
            node.preloaded = false;
        }
    }

    /// Own hook first, then fresh copies of every AddOn template, all created
    /// before any of them is initialized.
    fn initialize_unit(&mut self, unit: UnitId) {
        if let UnitId::AddOn(id) = unit {
            self.cache_flow_node(id);
        }
        self.run_hook(unit, Hook::Initialize);

        let templates = match unit {
            UnitId::Node(handle) => self.nodes.get(handle).map(|node| node.add_on_templates.clone()),
            UnitId::AddOn(id) => self.add_ons.get(id).map(|add_on| add_on.add_on_templates.clone()),
        };
        let Some(templates) = templates else {
            return;
        };

        let children: Vec<AddOnId> = templates
            .iter()
            .map(|template| self.add_ons.insert(AddOn::from_template(template, unit)))
            .collect();
        match unit {
            UnitId::Node(handle) => {
                if let Some(node) = self.nodes.get_mut(handle) {
                    node.add_ons = children.clone();
                }
            }
            UnitId::AddOn(id) => {
                if let Some(add_on) = self.add_ons.get_mut(id) {
                    add_on.add_ons = children.clone();
                }
            }
        }

        for child in children {
            self.initialize_unit(UnitId::AddOn(child));
        }
    }

    /// AddOns first (each destroyed after its own deinitialization), then the
    /// unit itself. An AddOn loses its anchor last.
    fn deinitialize_unit(&mut self, unit: UnitId) {
        let children = match unit {
            UnitId::Node(handle) => self.nodes.get_mut(handle).map(|node| mem::take(&mut node.add_ons)),
            UnitId::AddOn(id) => self.add_ons.get_mut(id).map(|add_on| mem::take(&mut add_on.add_ons)),
        }
        .unwrap_or_default();

        for child in children {
            self.deinitialize_unit(UnitId::AddOn(child));
            self.add_ons.remove(child);
        }

        self.run_hook(unit, Hook::Deinitialize);

        if let UnitId::AddOn(id) = unit {
            if let Some(add_on) = self.add_ons.get_mut(id) {
                add_on.flow_node = None;
            }
        }
    }

    /// Walks up the parent chain until it reaches a node.
    fn cache_flow_node(&mut self, id: AddOnId) {
        let mut current = self.add_ons.get(id).map(AddOn::parent);
        let anchor = loop {
            match current {
                Some(UnitId::Node(handle)) if self.nodes.contains(handle) => break Some(handle),
                Some(UnitId::AddOn(parent)) => current = self.add_ons.get(parent).map(AddOn::parent),
                _ => break None,
            }
        };

        match (anchor, self.add_ons.get_mut(id)) {
            (Some(handle), Some(add_on)) => add_on.flow_node = Some(handle),
            (None, Some(add_on)) => {
                log::warn!("AddOn {} has no node in its parent chain", add_on.class_name());
            }
            _ => {}
        }
    }

    pub fn trigger_preload(&mut self, guid: NodeGuid) {
        let Some(handle) = self.node_handle(guid) else {
            return;
        };
        self.dispatch(UnitId::Node(handle), Hook::Preload, Order::SelfFirst);
        if let Some(node) = self.nodes.get_mut(handle) {
            node.preloaded = true;
        }
    }

    /// Only acts on a preloaded node.
    pub fn trigger_flush(&mut self, guid: NodeGuid) {
        let Some(handle) = self.node_handle(guid) else {
            return;
        };
        if !self.nodes.get(handle).is_some_and(|node| node.preloaded) {
            return;
        }
        self.dispatch(UnitId::Node(handle), Hook::Flush, Order::ChildrenFirst);
        if let Some(node) = self.nodes.get_mut(handle) {
            node.preloaded = false;
        }
    }

    pub fn preload_all(&mut self) {
        for guid in self.nodes().map(Node::guid).collect::<Vec<_>>() {
            self.trigger_preload(guid);
        }
    }

    pub fn flush_all(&mut self) {
        for guid in self.nodes().map(Node::guid).collect::<Vec<_>>() {
            self.trigger_flush(guid);
        }
    }

    pub(crate) fn dispatch(&mut self, unit: UnitId, hook: Hook<'_>, order: Order) {
        if order == Order::SelfFirst {
            self.run_hook(unit, hook);
        }
        for child in self.child_add_ons(unit) {
            self.dispatch(UnitId::AddOn(child), hook, order);
        }
        if order == Order::ChildrenFirst {
            self.run_hook(unit, hook);
        }
    }

    /// The unit's own logic if it supports the pin, then every AddOn
    /// regardless: each AddOn filters on its own declared inputs.
    pub(crate) fn execute_input(&mut self, unit: UnitId, pin_name: &str) {
        if self.is_supported_input_pin_name(unit, pin_name) {
            self.run_hook(unit, Hook::ExecuteInput(pin_name));
        }
        for child in self.child_add_ons(unit) {
            self.execute_input(UnitId::AddOn(child), pin_name);
        }
    }

    /// Runs one hook on one unit, then applies what it asked for.
    pub(crate) fn run_hook(&mut self, unit: UnitId, hook: Hook<'_>) {
        let (anchor, unit_name, kind) = match unit {
            UnitId::Node(handle) => {
                let Some(node) = self.nodes.get(handle) else {
                    return;
                };
                (handle, node.name.clone(), UnitKind::Node)
            }
            UnitId::AddOn(id) => {
                let Some(add_on) = self.add_ons.get(id) else {
                    return;
                };
                let anchor = add_on.flow_node();
                let name = format!("{}.{}", self.node_name(anchor), add_on.class_name());
                (anchor, name, UnitKind::AddOn)
            }
        };
        let Some((guid, state)) = self
            .nodes
            .get(anchor)
            .map(|node| (node.guid, node.activation_state))
        else {
            return;
        };

        let env = &self.env;
        let Some(logic) = logic_mut(&mut self.nodes, &mut self.add_ons, unit) else {
            return;
        };
        let mut ctx = UnitContext::new(
            &env.diagnostics,
            env.owner.as_deref(),
            env.finish_policy,
            kind,
            guid,
            &unit_name,
            state,
        );

        match hook {
            Hook::Initialize => logic.initialize_instance(&mut ctx),
            Hook::Deinitialize => logic.deinitialize_instance(&mut ctx),
            Hook::Preload => logic.preload_content(&mut ctx),
            Hook::Flush => logic.flush_content(&mut ctx),
            Hook::Activate => logic.on_activate(&mut ctx),
            Hook::ExecuteInput(pin_name) => logic.execute_input(&mut ctx, pin_name),
            Hook::ForceFinish => logic.force_finish_node(&mut ctx),
            Hook::Cleanup => logic.cleanup(&mut ctx),
        }

        let signals = ctx.into_signals();
        self.apply_signals(anchor, signals);
    }
}
