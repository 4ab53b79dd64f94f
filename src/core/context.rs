use crate::core::NodeGuid;
use crate::core::diagnostics::{Diagnostics, Severity};
use crate::core::owner::{FlowOwner, resolve_owner};
use crate::core::types::{ActivationState, FinishPolicy, PinActivationType, UnitKind};

/// Output and finish requests made by a hook. Applied to the anchor node, in
/// order, as soon as the hook returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Signal {
    TriggerOutput {
        pin_name: String,
        finish: bool,
        activation_type: PinActivationType,
    },
    TriggerFirstOutput {
        finish: bool,
    },
    Finish,
}

/// What a node or AddOn hook can see and do while it runs.
///
/// AddOns have no connections of their own: everything they trigger is routed
/// through their anchor node.
pub struct UnitContext<'a> {
    diagnostics: &'a Diagnostics,
    owner: Option<&'a dyn FlowOwner>,
    finish_policy: FinishPolicy,
    unit_kind: UnitKind,
    node_guid: NodeGuid,
    unit_name: &'a str,
    activation_state: ActivationState,
    signals: Vec<Signal>,
}

impl<'a> UnitContext<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        diagnostics: &'a Diagnostics,
        owner: Option<&'a dyn FlowOwner>,
        finish_policy: FinishPolicy,
        unit_kind: UnitKind,
        node_guid: NodeGuid,
        unit_name: &'a str,
        activation_state: ActivationState,
    ) -> Self {
        Self {
            diagnostics,
            owner,
            finish_policy,
            unit_kind,
            node_guid,
            unit_name,
            activation_state,
            signals: Vec::new(),
        }
    }

    pub(crate) fn into_signals(self) -> Vec<Signal> {
        self.signals
    }

    /// Guid of the node itself, or of the anchor node for an AddOn.
    pub fn node_guid(&self) -> NodeGuid {
        self.node_guid
    }

    pub fn unit_name(&self) -> &str {
        self.unit_name
    }

    pub fn unit_kind(&self) -> UnitKind {
        self.unit_kind
    }

    /// Activation state of the (anchor) node when the hook started.
    pub fn activation_state(&self) -> ActivationState {
        self.activation_state
    }

    pub fn finish_policy(&self) -> FinishPolicy {
        self.finish_policy
    }

    pub fn asset_path(&self) -> &str {
        self.diagnostics.asset_path()
    }

    pub fn trigger_output(&mut self, pin_name: impl Into<String>, finish: bool) {
        self.trigger_output_with(pin_name, finish, PinActivationType::Default);
    }

    pub fn trigger_output_with(
        &mut self,
        pin_name: impl Into<String>,
        finish: bool,
        activation_type: PinActivationType,
    ) {
        self.signals.push(Signal::TriggerOutput {
            pin_name: pin_name.into(),
            finish,
            activation_type,
        });
    }

    /// Triggers the first declared output of the (anchor) node.
    pub fn trigger_first_output(&mut self, finish: bool) {
        self.signals.push(Signal::TriggerFirstOutput { finish });
    }

    /// Finishes the (anchor) node: cleanup runs and it stops accepting input.
    pub fn finish(&mut self) {
        self.signals.push(Signal::Finish);
    }

    pub fn root_owner(&self) -> Option<&'a dyn FlowOwner> {
        self.owner
    }

    /// Looks up the expected owner type on the root owner (or its container).
    pub fn owner_as<T: FlowOwner + 'static>(&self) -> Option<&'a T> {
        resolve_owner::<T>(self.owner?)
    }

    pub fn log_error(&self, message: impl AsRef<str>) {
        self.diagnostics
            .emit(Severity::Error, Some(self.unit_name), message.as_ref());
    }

    pub fn log_warning(&self, message: impl AsRef<str>) {
        self.diagnostics
            .emit(Severity::Warning, Some(self.unit_name), message.as_ref());
    }

    pub fn log_note(&self, message: impl AsRef<str>) {
        self.diagnostics
            .emit(Severity::Note, Some(self.unit_name), message.as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_are_buffered_in_order() {
        let diagnostics = Diagnostics::default();
        let mut ctx = UnitContext::new(
            &diagnostics,
            None,
            FinishPolicy::Keep,
            UnitKind::Node,
            NodeGuid::nil(),
            "Node",
            ActivationState::Active,
        );

        ctx.trigger_output("Success", false);
        ctx.trigger_first_output(true);
        ctx.finish();

        assert_eq!(
            ctx.into_signals(),
            vec![
                Signal::TriggerOutput {
                    pin_name: "Success".into(),
                    finish: false,
                    activation_type: PinActivationType::Default,
                },
                Signal::TriggerFirstOutput { finish: true },
                Signal::Finish,
            ]
        );
    }

    #[test]
    fn test_missing_owner_resolves_to_none() {
        struct Anything;
        impl FlowOwner for Anything {}

        let diagnostics = Diagnostics::default();
        let ctx = UnitContext::new(
            &diagnostics,
            None,
            FinishPolicy::Keep,
            UnitKind::AddOn,
            NodeGuid::nil(),
            "Node/AddOn",
            ActivationState::NeverActivated,
        );
        assert!(ctx.root_owner().is_none());
        assert!(ctx.owner_as::<Anything>().is_none());
    }
}
