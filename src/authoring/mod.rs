//! Editor-side composition bridge.
//!
//! A [`FlowGraph`] edits a [`FlowAsset`] together with its visual edge list:
//! nodes and pins, connections, AddOn attachment through the acceptance
//! protocol. The runtime only ever sees the harvested asset.

pub mod message_log;

pub use message_log::{LogMessage, MessageLog};

use crate::core::NodeGuid;
use crate::core::accept::{check_accept_add_on_child, is_add_on_allowed_for_parents};
use crate::core::asset::FlowAsset;
use crate::core::diagnostics::format_message;
use crate::core::logic::ExecutableLogic;
use crate::core::pin::{ConnectedPin, Connections, Pin, find_pin_by_name};
use crate::core::template::{AddOnTemplate, NodeTemplate, UnitTemplate};
use crate::core::types::{AcceptResult, UnitKind};
use crate::error::{FlowError, FlowResult};
use serde::{Deserialize, Serialize};

/// A visual wire from an output pin to an input pin.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphEdge {
    pub from_node: NodeGuid,
    pub from_pin: String,
    pub to_node: NodeGuid,
    pub to_pin: String,
}

/// Addresses a node, or an AddOn inside its tree by child indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitPath {
    pub node: NodeGuid,
    pub add_ons: Vec<usize>,
}

impl UnitPath {
    pub fn of_node(node: NodeGuid) -> Self {
        Self {
            node,
            add_ons: Vec::new(),
        }
    }

    /// The `index`-th AddOn of the unit this path points at.
    pub fn child(mut self, index: usize) -> Self {
        self.add_ons.push(index);
        self
    }

    pub fn is_node(&self) -> bool {
        self.add_ons.is_empty()
    }
}

pub struct FlowGraph {
    asset: FlowAsset,
    edges: Vec<GraphEdge>,
    message_log: MessageLog,
}

impl FlowGraph {
    pub fn new(path: impl Into<String>) -> Self {
        Self::from_asset(FlowAsset::new(path))
    }

    /// Opens an asset for editing; its connections become edges.
    pub fn from_asset(asset: FlowAsset) -> Self {
        let edges = asset.nodes().iter().flat_map(edges_of).collect();
        Self {
            asset,
            edges,
            message_log: MessageLog::new(),
        }
    }

    pub fn asset(&self) -> &FlowAsset {
        &self.asset
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn message_log(&self) -> &MessageLog {
        &self.message_log
    }

    pub fn message_log_mut(&mut self) -> &mut MessageLog {
        &mut self.message_log
    }

    pub fn add_node(&mut self, node: NodeTemplate) -> FlowResult<NodeGuid> {
        let edges = edges_of(&node);
        let guid = self.asset.add_node(node)?;
        self.edges.extend(edges);
        Ok(guid)
    }

    /// Also drops every edge touching the node.
    pub fn remove_node(&mut self, guid: NodeGuid) -> FlowResult<NodeTemplate> {
        let node = self.asset.remove_node(guid).ok_or(FlowError::NodeNotFound(guid))?;
        self.edges
            .retain(|edge| edge.from_node != guid && edge.to_node != guid);
        Ok(node)
    }

    pub fn set_entry_node(&mut self, guid: NodeGuid) -> FlowResult<()> {
        self.asset.set_entry_node(guid)
    }

    /// Wires `from_pin` to `to_pin`. An output drives a single input, so an
    /// existing edge from the same output is replaced.
    pub fn connect(
        &mut self,
        from_node: NodeGuid,
        from_pin: &str,
        to_node: NodeGuid,
        to_pin: &str,
    ) -> FlowResult<()> {
        let source = self.asset.node(from_node).ok_or(FlowError::NodeNotFound(from_node))?;
        if find_pin_by_name(from_pin, &source.all_output_pins()).is_none() {
            return Err(FlowError::PinNotFound {
                node: from_node,
                pin: from_pin.to_string(),
            });
        }
        let target = self.asset.node(to_node).ok_or(FlowError::NodeNotFound(to_node))?;
        if find_pin_by_name(to_pin, &target.all_input_pins()).is_none() {
            return Err(FlowError::PinNotFound {
                node: to_node,
                pin: to_pin.to_string(),
            });
        }

        self.disconnect(from_node, from_pin);
        self.edges.push(GraphEdge {
            from_node,
            from_pin: from_pin.to_string(),
            to_node,
            to_pin: to_pin.to_string(),
        });
        Ok(())
    }

    pub fn disconnect(&mut self, from_node: NodeGuid, from_pin: &str) -> bool {
        let before = self.edges.len();
        self.edges
            .retain(|edge| !(edge.from_node == from_node && edge.from_pin == from_pin));
        before != self.edges.len()
    }

    pub fn add_user_input(&mut self, guid: NodeGuid, pin: impl Into<Pin>) -> FlowResult<()> {
        self.node_mut(guid)?.add_user_input_pin(pin)
    }

    pub fn add_user_output(&mut self, guid: NodeGuid, pin: impl Into<Pin>) -> FlowResult<()> {
        self.node_mut(guid)?.add_user_output_pin(pin)
    }

    pub fn remove_user_input(&mut self, guid: NodeGuid, pin_name: &str) -> FlowResult<bool> {
        let removed = self.node_mut(guid)?.remove_user_input_pin(pin_name);
        if removed {
            self.prune_edges_of(guid);
        }
        Ok(removed)
    }

    pub fn remove_user_output(&mut self, guid: NodeGuid, pin_name: &str) -> FlowResult<bool> {
        let removed = self.node_mut(guid)?.remove_user_output_pin(pin_name);
        if removed {
            self.prune_edges_of(guid);
        }
        Ok(removed)
    }

    fn node_mut(&mut self, guid: NodeGuid) -> FlowResult<&mut NodeTemplate> {
        self.asset.node_mut(guid).ok_or(FlowError::NodeNotFound(guid))
    }

    /// Verdict of the acceptance protocol for attaching `candidate` under `parent`.
    pub fn check_attach_add_on(&self, parent: &UnitPath, candidate: &UnitTemplate) -> FlowResult<AcceptResult> {
        let parent_logic = self
            .unit_logic(parent)
            .ok_or_else(|| FlowError::InvalidParent(format!("{parent:?}")))?;
        Ok(check_accept_add_on_child(parent_logic, Some(candidate)))
    }

    /// Attaches a copy of `candidate` as the last AddOn of `parent`. Every
    /// refusal is also written to the message log.
    pub fn attach_add_on(&mut self, parent: &UnitPath, candidate: UnitTemplate) -> FlowResult<()> {
        if let Err(err) = self.check_attachable(parent, &candidate) {
            self.report(parent.node, &err.to_string());
            return Err(err);
        }

        let add_on = match candidate {
            UnitTemplate::AddOn(add_on) => add_on,
            UnitTemplate::Node(node) => return Err(FlowError::NodeAsAddOn(node.class_name().to_string())),
        };
        let list = self
            .add_ons_mut_at(parent)
            .ok_or_else(|| FlowError::InvalidParent(format!("{parent:?}")))?;
        list.push(add_on);
        Ok(())
    }

    fn check_attachable(&self, parent: &UnitPath, candidate: &UnitTemplate) -> FlowResult<()> {
        if candidate.kind() == UnitKind::Node {
            return Err(FlowError::NodeAsAddOn(candidate.class_name().to_string()));
        }
        if !self.check_attach_add_on(parent, candidate)?.allows_attachment() {
            return Err(FlowError::AddOnRejected {
                add_on: candidate.class_name().to_string(),
                parent: self.unit_name(parent),
            });
        }
        Ok(())
    }

    /// Multi-select: every selected parent has to accept the candidate.
    pub fn is_add_on_allowed_for_selection(&self, parents: &[UnitPath], candidate: &UnitTemplate) -> bool {
        is_add_on_allowed_for_parents(parents.iter().map(|path| self.unit_logic(path)), Some(candidate))
    }

    /// Attaches one copy per selected parent, or nothing at all.
    pub fn attach_add_on_to_selection(&mut self, parents: &[UnitPath], candidate: UnitTemplate) -> FlowResult<()> {
        if !self.is_add_on_allowed_for_selection(parents, &candidate) {
            let err = match candidate.kind() {
                UnitKind::Node => FlowError::NodeAsAddOn(candidate.class_name().to_string()),
                UnitKind::AddOn => FlowError::AddOnRejected {
                    add_on: candidate.class_name().to_string(),
                    parent: parents
                        .iter()
                        .map(|path| self.unit_name(path))
                        .collect::<Vec<_>>()
                        .join(", "),
                },
            };
            let node = parents.first().map(|path| path.node);
            match node {
                Some(node) => self.report(node, &err.to_string()),
                None => self.message_log.add_error(format_message(&err.to_string(), None, self.asset.path())),
            }
            return Err(err);
        }

        for parent in parents {
            self.attach_add_on(parent, candidate.clone())?;
        }
        Ok(())
    }

    /// Removes the AddOn at `path` with its subtree. Edges to pins it
    /// contributed are dropped.
    pub fn detach_add_on(&mut self, path: &UnitPath) -> FlowResult<AddOnTemplate> {
        let Some((&index, parent_indices)) = path.add_ons.split_last() else {
            return Err(FlowError::InvalidParent(format!("{path:?} is a node, not an AddOn")));
        };
        let parent = UnitPath {
            node: path.node,
            add_ons: parent_indices.to_vec(),
        };
        let list = self
            .add_ons_mut_at(&parent)
            .filter(|list| index < list.len())
            .ok_or_else(|| FlowError::InvalidParent(format!("{path:?}")))?;
        let removed = list.remove(index);
        self.prune_edges_of(path.node);
        Ok(removed)
    }

    /// Drops (and reports) edges whose nodes or pins no longer exist, then
    /// harvests connections. Returns the number of dropped edges.
    pub fn refresh_graph(&mut self) -> usize {
        let (valid, invalid): (Vec<_>, Vec<_>) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|edge| self.edge_problem(edge).is_none());

        for edge in &invalid {
            if let Some(problem) = self.edge_problem(edge) {
                let node_name = self.asset.node(edge.from_node).map(|node| node.name().to_string());
                self.message_log.add_error(format_message(
                    &format!("Dropping connection {} -> {}: {problem}", edge.from_pin, edge.to_pin),
                    node_name.as_deref(),
                    self.asset.path(),
                ));
            }
        }

        self.edges = valid;
        self.harvest_connections();
        invalid.len()
    }

    /// Rewrites every node's connections from the edge list.
    pub fn harvest_connections(&mut self) {
        let guids: Vec<NodeGuid> = self.asset.nodes().iter().map(NodeTemplate::guid).collect();
        for guid in guids {
            let connections: Connections = self
                .edges
                .iter()
                .filter(|edge| edge.from_node == guid)
                .map(|edge| (edge.from_pin.clone(), ConnectedPin::new(edge.to_node, edge.to_pin.clone())))
                .collect();
            if let Some(node) = self.asset.node_mut(guid) {
                node.set_connections(connections);
            }
        }
    }

    /// The edited asset, connections harvested, ready to be instanced.
    pub fn into_asset(mut self) -> FlowAsset {
        self.harvest_connections();
        self.asset
    }

    fn edge_problem(&self, edge: &GraphEdge) -> Option<String> {
        let Some(source) = self.asset.node(edge.from_node) else {
            return Some(format!("source node {} is missing", edge.from_node));
        };
        let Some(target) = self.asset.node(edge.to_node) else {
            return Some(format!("target node {} is missing", edge.to_node));
        };
        if find_pin_by_name(&edge.from_pin, &source.all_output_pins()).is_none() {
            return Some(format!("{} has no output {}", source.name(), edge.from_pin));
        }
        if find_pin_by_name(&edge.to_pin, &target.all_input_pins()).is_none() {
            return Some(format!("{} has no input {}", target.name(), edge.to_pin));
        }
        None
    }

    /// Removes edges from or into `guid` that no longer land on an existing pin.
    fn prune_edges_of(&mut self, guid: NodeGuid) {
        let Some(node) = self.asset.node(guid) else {
            return;
        };
        let outputs = node.all_output_pins();
        let inputs = node.all_input_pins();
        self.edges.retain(|edge| {
            let output_ok = edge.from_node != guid || find_pin_by_name(&edge.from_pin, &outputs).is_some();
            let input_ok = edge.to_node != guid || find_pin_by_name(&edge.to_pin, &inputs).is_some();
            output_ok && input_ok
        });
    }

    fn unit_logic(&self, path: &UnitPath) -> Option<&dyn ExecutableLogic> {
        let node = self.asset.node(path.node)?;
        let Some((first, rest)) = path.add_ons.split_first() else {
            return Some(node.logic().as_executable());
        };
        let mut add_on = node.add_ons().get(*first)?;
        for index in rest {
            add_on = add_on.add_ons().get(*index)?;
        }
        Some(add_on.logic().as_executable())
    }

    fn add_ons_mut_at(&mut self, path: &UnitPath) -> Option<&mut Vec<AddOnTemplate>> {
        let mut list = self.asset.node_mut(path.node)?.add_ons_mut();
        for index in &path.add_ons {
            list = list.get_mut(*index)?.add_ons_mut();
        }
        Some(list)
    }

    fn unit_name(&self, path: &UnitPath) -> String {
        let node_name = self
            .asset
            .node(path.node)
            .map(|node| node.name().to_string())
            .unwrap_or_else(|| path.node.to_string());
        match self.unit_logic(path) {
            Some(logic) if !path.is_node() => format!("{node_name}.{}", logic.class_name()),
            _ => node_name,
        }
    }

    fn report(&mut self, node: NodeGuid, message: &str) {
        let node_name = self.asset.node(node).map(|node| node.name().to_string());
        self.message_log
            .add_error(format_message(message, node_name.as_deref(), self.asset.path()));
    }
}

fn edges_of(node: &NodeTemplate) -> Vec<GraphEdge> {
    node.connections()
        .iter()
        .map(|(pin_name, connected)| GraphEdge {
            from_node: node.guid(),
            from_pin: pin_name.clone(),
            to_node: connected.node_guid,
            to_pin: connected.pin_name.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::logic::{AddOnLogic, NodeLogic};

    #[derive(Clone)]
    struct Dialogue;

    impl ExecutableLogic for Dialogue {
        fn output_pins(&self) -> Vec<Pin> {
            vec![Pin::new("Finished")]
        }

        fn accept_add_on_child(&self, _add_on: &dyn ExecutableLogic) -> AcceptResult {
            AcceptResult::TentativeAccept
        }
    }

    impl NodeLogic for Dialogue {
        fn clone_box(&self) -> Box<dyn NodeLogic> {
            Box::new(self.clone())
        }
    }

    #[derive(Clone)]
    struct Choice;

    impl ExecutableLogic for Choice {
        fn output_pins(&self) -> Vec<Pin> {
            vec![Pin::new("Chosen")]
        }
    }

    impl AddOnLogic for Choice {
        fn clone_box(&self) -> Box<dyn AddOnLogic> {
            Box::new(self.clone())
        }
    }

    fn graph_with_two_nodes() -> (FlowGraph, NodeGuid, NodeGuid) {
        let mut graph = FlowGraph::new("/Game/Dialogue");
        let a = graph.add_node(NodeTemplate::new(Dialogue).with_name("Intro")).unwrap();
        let b = graph.add_node(NodeTemplate::new(Dialogue).with_name("Outro")).unwrap();
        (graph, a, b)
    }

    #[test]
    fn test_connect_validates_pins_and_replaces_edges() {
        let (mut graph, a, b) = graph_with_two_nodes();

        assert!(matches!(
            graph.connect(a, "Nope", b, "In"),
            Err(FlowError::PinNotFound { .. })
        ));
        graph.connect(a, "Finished", b, "In").unwrap();
        graph.connect(a, "Finished", a, "In").unwrap();
        assert_eq!(graph.edges().len(), 1);
        assert_eq!(graph.edges()[0].to_node, a);

        let asset = graph.into_asset();
        let connection = asset.node(a).and_then(|node| node.connections().get("Finished")).cloned();
        assert_eq!(connection, Some(ConnectedPin::new(a, "In")));
    }

    #[test]
    fn test_attach_and_detach_add_on_pins() {
        let (mut graph, a, b) = graph_with_two_nodes();
        graph
            .attach_add_on(&UnitPath::of_node(a), AddOnTemplate::new(Choice).into())
            .unwrap();
        graph.connect(a, "Chosen", b, "In").unwrap();

        let detached = graph.detach_add_on(&UnitPath::of_node(a).child(0)).unwrap();
        assert_eq!(detached.class_name(), "Choice");
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn test_refused_attachments_are_logged() {
        let (mut graph, a, _) = graph_with_two_nodes();

        let as_node = graph.attach_add_on(&UnitPath::of_node(a), NodeTemplate::new(Dialogue).into());
        assert!(matches!(as_node, Err(FlowError::NodeAsAddOn(_))));

        // Choice never opts in and neither does an AddOn parent by default.
        graph
            .attach_add_on(&UnitPath::of_node(a), AddOnTemplate::new(Choice).into())
            .unwrap();
        let nested = graph.attach_add_on(&UnitPath::of_node(a).child(0), AddOnTemplate::new(Choice).into());
        assert!(matches!(nested, Err(FlowError::AddOnRejected { .. })));

        let missing = graph.attach_add_on(&UnitPath::of_node(a).child(7), AddOnTemplate::new(Choice).into());
        assert!(matches!(missing, Err(FlowError::InvalidParent(_))));

        assert_eq!(graph.message_log().errors().count(), 3);
        assert!(graph.message_log().errors().all(|msg| msg.contains("node Intro")));
    }

    #[test]
    fn test_refresh_drops_broken_edges() {
        let (mut graph, a, b) = graph_with_two_nodes();
        graph.connect(a, "Finished", b, "In").unwrap();
        graph.connect(b, "Finished", a, "In").unwrap();
        graph.remove_node(b).unwrap();
        assert!(graph.edges().is_empty());

        graph.edges.push(GraphEdge {
            from_node: a,
            from_pin: "Finished".into(),
            to_node: NodeGuid::new_v4(),
            to_pin: "In".into(),
        });
        assert_eq!(graph.refresh_graph(), 1);
        assert!(graph.message_log().has_errors());
        assert!(graph.asset().node(a).is_some_and(|node| node.connections().is_empty()));
    }
}
