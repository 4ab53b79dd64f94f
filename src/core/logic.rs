//! Behaviour contracts implemented by user node and AddOn types.
//!
//! [`ExecutableLogic`] is the lifecycle contract shared by both kinds of
//! executable unit. [`NodeLogic`] and [`AddOnLogic`] add what only that kind
//! needs (cloning into the right box, save hooks, graph finishing).

use crate::core::context::UnitContext;
use crate::core::pin::Pin;
use crate::core::types::{AcceptResult, SignalMode};
use crate::core::{AsAny, NodeValue};

/// Reflection-lite: the short type name of a logic object, used in diagnostics.
pub trait ClassInfo {
    fn class_name(&self) -> &'static str;
}

impl<T: 'static> ClassInfo for T {
    fn class_name(&self) -> &'static str {
        short_type_name(std::any::type_name::<T>())
    }
}

fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Lifecycle and signal hooks shared by nodes and AddOns.
///
/// Every hook has an empty default. The runtime takes care of forwarding to
/// attached AddOns, so implementations only handle their own concerns.
pub trait ExecutableLogic: AsAny + ClassInfo + Send + Sync + 'static {
    /// Class-declared input pins.
    fn input_pins(&self) -> Vec<Pin> {
        Vec::new()
    }

    /// Class-declared output pins.
    fn output_pins(&self) -> Vec<Pin> {
        Vec::new()
    }

    fn initialize_instance(&mut self, _ctx: &mut UnitContext<'_>) {}

    fn deinitialize_instance(&mut self, _ctx: &mut UnitContext<'_>) {}

    fn preload_content(&mut self, _ctx: &mut UnitContext<'_>) {}

    fn flush_content(&mut self, _ctx: &mut UnitContext<'_>) {}

    fn on_activate(&mut self, _ctx: &mut UnitContext<'_>) {}

    /// Called only for pin names this unit supports.
    fn execute_input(&mut self, _ctx: &mut UnitContext<'_>, _pin_name: &str) {}

    fn force_finish_node(&mut self, _ctx: &mut UnitContext<'_>) {}

    fn cleanup(&mut self, _ctx: &mut UnitContext<'_>) {}

    /// Parent-side opt-in: may this unit host `add_on` as a child?
    fn accept_add_on_child(&self, _add_on: &dyn ExecutableLogic) -> AcceptResult {
        AcceptResult::Undetermined
    }

    /// Child-side opt-in: may this unit be attached under `parent`?
    /// Node types must always answer `Reject`.
    fn accept_add_on_parent(&self, _parent: &dyn ExecutableLogic) -> AcceptResult {
        AcceptResult::Undetermined
    }
}

/// Upcast helper so node and AddOn boxes can be driven through the shared contract.
pub trait AsExecutable {
    fn as_executable(&self) -> &dyn ExecutableLogic;
    fn as_executable_mut(&mut self) -> &mut dyn ExecutableLogic;
}

impl<T: ExecutableLogic> AsExecutable for T {
    fn as_executable(&self) -> &dyn ExecutableLogic {
        self
    }
    fn as_executable_mut(&mut self) -> &mut dyn ExecutableLogic {
        self
    }
}

/// Defines the behavior of a top-level graph node.
pub trait NodeLogic: ExecutableLogic + AsExecutable {
    /// Create a boxed clone of this trait object.
    fn clone_box(&self) -> Box<dyn NodeLogic>;

    /// Finishing this node finishes the whole graph instance.
    fn can_finish_graph(&self) -> bool {
        false
    }

    fn allowed_signal_modes(&self) -> Vec<SignalMode> {
        SignalMode::ALL.to_vec()
    }

    fn can_user_add_input(&self) -> bool {
        false
    }

    fn can_user_add_output(&self) -> bool {
        false
    }

    /// Runs before the node state is captured into a save record.
    fn on_save(&mut self) {}

    /// Runs after the node state was restored from a save record.
    fn on_load(&mut self) {}

    /// Opaque instance state stored in the save record.
    fn save_state(&self) -> NodeValue {
        NodeValue::Null
    }

    fn load_state(&mut self, _state: NodeValue) -> Result<(), serde_json::Error> {
        Ok(())
    }
}

impl Clone for Box<dyn NodeLogic> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Defines the behavior of an AddOn attached to a node (or to another AddOn).
pub trait AddOnLogic: ExecutableLogic + AsExecutable {
    /// Create a boxed clone of this trait object.
    fn clone_box(&self) -> Box<dyn AddOnLogic>;
}

impl Clone for Box<dyn AddOnLogic> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
