//! # flowgraph
//!
//! Execution and composition core for Flow node graphs: nodes with named pins,
//! AddOns that attach to nodes (and to each other), pin signal propagation and
//! the acceptance protocol that decides which AddOn may attach where.
//!
//! ## Features
//!
//! - **Composable units**: a node and its AddOn tree run as one executable unit
//! - **Signal modes**: disable or pass a node through without rewiring the graph
//! - **Acceptance protocol**: both sides opt in, either side can veto
//! - **Save/load hooks**: opaque per-node state in serde save records
//! - **Feature-gated extras**: `authoring` (editor bridge), `diagnostics` (messages and pin records)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flowgraph::prelude::*;
//! use std::sync::Arc;
//!
//! #[derive(Clone)]
//! struct Greet;
//!
//! impl ExecutableLogic for Greet {
//!     fn execute_input(&mut self, ctx: &mut UnitContext<'_>, _pin_name: &str) {
//!         ctx.log_note("hello");
//!         ctx.trigger_first_output(true);
//!     }
//! }
//!
//! impl NodeLogic for Greet {
//!     fn clone_box(&self) -> Box<dyn NodeLogic> {
//!         Box::new(self.clone())
//!     }
//! }
//!
//! let greet = NodeTemplate::new(Greet);
//! let entry = greet.guid();
//! let asset = FlowAsset::new("/Game/Hello")
//!     .with_node(greet)?
//!     .with_entry_node(entry)?;
//!
//! let mut instance = FlowInstance::new(Arc::new(asset));
//! instance.initialize();
//! instance.start();
//! assert_eq!(instance.activation_state(entry), Some(ActivationState::Completed));
//! # Ok::<(), FlowError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`core`]: pins, logic contracts, templates, assets and graph instances
//! - [`authoring`]: editing a graph, attaching AddOns, harvesting connections
//! - [`settings`]: instance configuration
//! - [`prelude`]: commonly used types and traits (`use flowgraph::prelude::*`)

// ============================================================================
// Core Module
// ============================================================================

pub mod core;
pub mod error;
pub mod settings;

// ============================================================================
// Public Re-exports - Granular Imports
// ============================================================================

// Core types
pub use crate::core::types::{AcceptResult, ActivationState, FinishPolicy, PinActivationType, SignalMode, UnitKind};
pub use crate::core::{AsAny, NodeGuid, NodeValue};

// Pins and connections
pub use crate::core::pin::{ConnectedPin, Connections, DEFAULT_INPUT_PIN, DEFAULT_OUTPUT_PIN, Pin, PinDirection};

// Logic contracts
pub use crate::core::context::UnitContext;
pub use crate::core::logic::{AddOnLogic, AsExecutable, ClassInfo, ExecutableLogic, NodeLogic};
pub use crate::core::owner::{FlowOwner, resolve_owner};

// Design time
pub use crate::core::accept::{check_accept_add_on_child, is_add_on_allowed_for_parents};
pub use crate::core::asset::FlowAsset;
pub use crate::core::template::{AddOnTemplate, NodeTemplate, UnitTemplate};

// Runtime
pub use crate::core::runtime::{
    AddOn, AddOnId, FlowInstance, FlowInstanceBuilder, FlowSaveData, Node, NodeHandle, NodeSaveData, PinRecord,
    UnitId,
};

// Diagnostics, errors, configuration
pub use crate::core::diagnostics::{Diagnostic, DiagnosticsSink, MemoryDiagnostics, Severity};
pub use error::{FlowError, FlowResult};
pub use settings::FlowSettings;

// ============================================================================
// Prelude Modules - Convenient Bulk Imports
// ============================================================================

/// The main prelude: everything needed to write node and AddOn logic and to
/// run graph instances.
///
/// # Example
/// ```rust
/// use flowgraph::prelude::*;
/// ```
pub mod prelude {
    pub use super::{
        AcceptResult,
        ActivationState,
        AddOnLogic,
        AddOnTemplate,
        ClassInfo,
        ConnectedPin,
        Connections,
        ExecutableLogic,
        FinishPolicy,
        FlowAsset,
        FlowError,
        FlowInstance,
        FlowOwner,
        FlowResult,
        FlowSettings,
        NodeGuid,
        NodeLogic,
        NodeTemplate,
        NodeValue,
        Pin,
        PinActivationType,
        SignalMode,
        UnitContext,
        UnitId,
        UnitTemplate,
    };
}

// ============================================================================
// Authoring Feature
// ============================================================================

#[cfg(feature = "authoring")]
pub mod authoring;

#[cfg(feature = "authoring")]
pub use authoring::{FlowGraph, GraphEdge, MessageLog, UnitPath};

// ============================================================================
// Library Metadata
// ============================================================================

/// The version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The name of this crate.
pub const NAME: &str = env!("CARGO_PKG_NAME");
