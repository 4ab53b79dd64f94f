use crate::core::NodeGuid;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Node not found: {0}")]
    NodeNotFound(NodeGuid),

    #[error("Node already exists in the graph: {0}")]
    DuplicateNode(NodeGuid),

    #[error("Pin '{pin}' not found on node {node}")]
    PinNotFound { node: NodeGuid, pin: String },

    #[error("AddOn {add_on} is not attachable to {parent}")]
    AddOnRejected { add_on: String, parent: String },

    #[error("{0} is a node class and can never be attached as an AddOn")]
    NodeAsAddOn(String),

    #[error("Invalid AddOn parent: {0}")]
    InvalidParent(String),

    #[error("User-added pins are not allowed on {0}")]
    UserPinsNotAllowed(String),

    #[error("Save data belongs to asset '{found}', expected '{expected}'")]
    AssetMismatch { expected: String, found: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type FlowResult<T> = Result<T, FlowError>;
