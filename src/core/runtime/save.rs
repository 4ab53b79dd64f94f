//! Save records for node and instance state.
//!
//! The layout is plain serde data; a node's own state travels as an opaque
//! [`NodeValue`] produced by its logic.

use crate::core::runtime::FlowInstance;
use crate::core::types::{ActivationState, FinishPolicy};
use crate::core::{NodeGuid, NodeValue};
use crate::error::{FlowError, FlowResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSaveData {
    pub node_guid: NodeGuid,
    pub activation_state: ActivationState,
    #[serde(default)]
    pub node_data: NodeValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSaveData {
    pub asset_path: String,
    pub finish_policy: FinishPolicy,
    pub saved_at: DateTime<Utc>,
    pub nodes: Vec<NodeSaveData>,
}

impl FlowSaveData {
    pub fn to_json_string(&self) -> FlowResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json_str(json: &str) -> FlowResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl FlowInstance {
    /// `on_save` runs first, then the node state is captured.
    pub fn save_instance(&mut self, guid: NodeGuid) -> Option<NodeSaveData> {
        let handle = self.node_handle(guid)?;
        let node = self.nodes.get_mut(handle)?;
        node.logic.on_save();
        Some(NodeSaveData {
            node_guid: node.guid,
            activation_state: node.activation_state,
            node_data: node.logic.save_state(),
        })
    }

    /// Restores a node from its record; `on_load` runs once the state is back.
    pub fn load_instance(&mut self, record: &NodeSaveData) -> FlowResult<()> {
        let handle = self
            .node_handle(record.node_guid)
            .ok_or(FlowError::NodeNotFound(record.node_guid))?;
        let node = self
            .nodes
            .get_mut(handle)
            .ok_or(FlowError::NodeNotFound(record.node_guid))?;

        node.logic.load_state(record.node_data.clone())?;
        node.activation_state = record.activation_state;
        if record.activation_state == ActivationState::Active {
            if !self.active_nodes.contains(&handle) {
                self.active_nodes.push(handle);
            }
        } else {
            self.active_nodes.retain(|active| *active != handle);
        }
        node.logic.on_load();
        Ok(())
    }

    pub fn save_flow(&mut self) -> FlowSaveData {
        let guids: Vec<NodeGuid> = self.nodes().map(|node| node.guid()).collect();
        let nodes = guids
            .into_iter()
            .filter_map(|guid| self.save_instance(guid))
            .collect();
        FlowSaveData {
            asset_path: self.asset_path().to_string(),
            finish_policy: self.finish_policy(),
            saved_at: Utc::now(),
            nodes,
        }
    }

    /// Refuses records of another asset. Broken node records are reported and
    /// skipped; the rest still load.
    pub fn load_flow(&mut self, data: &FlowSaveData) -> FlowResult<()> {
        if data.asset_path != self.asset_path() {
            return Err(FlowError::AssetMismatch {
                expected: self.asset_path().to_string(),
                found: data.asset_path.clone(),
            });
        }

        self.env.finish_policy = data.finish_policy;
        for record in &data.nodes {
            if let Err(err) = self.load_instance(record) {
                self.env.diagnostics.error(
                    None,
                    &format!("Skipping save record of node {}: {err}", record.node_guid),
                );
            }
        }
        Ok(())
    }
}
