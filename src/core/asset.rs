use crate::core::NodeGuid;
use crate::core::template::NodeTemplate;
use crate::error::{FlowError, FlowResult};

/// A graph as authored: node templates in placement order, an optional entry
/// node and the asset path used in diagnostics and save records.
#[derive(Clone)]
pub struct FlowAsset {
    path: String,
    nodes: Vec<NodeTemplate>,
    entry_node: Option<NodeGuid>,
}

impl FlowAsset {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            nodes: Vec::new(),
            entry_node: None,
        }
    }

    /// Builder form of [`FlowAsset::add_node`].
    pub fn with_node(mut self, node: NodeTemplate) -> FlowResult<Self> {
        self.add_node(node)?;
        Ok(self)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn add_node(&mut self, node: NodeTemplate) -> FlowResult<NodeGuid> {
        let guid = node.guid();
        if self.node(guid).is_some() {
            return Err(FlowError::DuplicateNode(guid));
        }
        self.nodes.push(node);
        Ok(guid)
    }

    /// Removes the node; the entry node is cleared if it was this one.
    /// Connections pointing at it are left for the caller to prune.
    pub fn remove_node(&mut self, guid: NodeGuid) -> Option<NodeTemplate> {
        let index = self.nodes.iter().position(|node| node.guid() == guid)?;
        if self.entry_node == Some(guid) {
            self.entry_node = None;
        }
        Some(self.nodes.remove(index))
    }

    pub fn node(&self, guid: NodeGuid) -> Option<&NodeTemplate> {
        self.nodes.iter().find(|node| node.guid() == guid)
    }

    pub fn node_mut(&mut self, guid: NodeGuid) -> Option<&mut NodeTemplate> {
        self.nodes.iter_mut().find(|node| node.guid() == guid)
    }

    pub fn find_node_by_name(&self, name: &str) -> Option<&NodeTemplate> {
        self.nodes.iter().find(|node| node.name() == name)
    }

    pub fn nodes(&self) -> &[NodeTemplate] {
        &self.nodes
    }

    pub fn entry_node(&self) -> Option<NodeGuid> {
        self.entry_node
    }

    pub fn set_entry_node(&mut self, guid: NodeGuid) -> FlowResult<()> {
        if self.node(guid).is_none() {
            return Err(FlowError::NodeNotFound(guid));
        }
        self.entry_node = Some(guid);
        Ok(())
    }

    pub fn with_entry_node(mut self, guid: NodeGuid) -> FlowResult<Self> {
        self.set_entry_node(guid)?;
        Ok(self)
    }
}
