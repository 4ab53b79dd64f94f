use serde::{Deserialize, Serialize};

/// Coarse lifecycle status of a node within one graph run.
///
/// Only ever advances `NeverActivated -> Active -> {Completed | Aborted}`;
/// a graph restart is the only way back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationState {
    #[default]
    NeverActivated,
    Active,
    Completed,
    Aborted,
}

impl ActivationState {
    pub fn is_finished(self) -> bool {
        matches!(self, ActivationState::Completed | ActivationState::Aborted)
    }
}

/// Per-node override of input dispatch, independent of graph topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalMode {
    /// Node is fully executed.
    #[default]
    Enabled,
    /// Any input activation is ignored.
    Disabled,
    /// Own logic is skipped, connected outputs fire and the node finishes.
    PassThrough,
}

impl SignalMode {
    pub const ALL: [SignalMode; 3] = [SignalMode::Enabled, SignalMode::Disabled, SignalMode::PassThrough];
}

/// How nodes terminate when they (or the whole graph) finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishPolicy {
    #[default]
    Keep,
    Abort,
}

impl FinishPolicy {
    /// The terminal state a node lands in when it finishes under this policy.
    pub fn terminal_state(self) -> ActivationState {
        match self {
            FinishPolicy::Keep => ActivationState::Completed,
            FinishPolicy::Abort => ActivationState::Aborted,
        }
    }
}

/// Why a pin fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinActivationType {
    #[default]
    Default,
    /// Triggered by the host, outside of the regular signal flow.
    Forced,
    /// Forwarded by a node in `SignalMode::PassThrough`.
    PassThrough,
}

/// Verdict of the AddOn acceptance negotiation.
///
/// Variants are ordered by priority: `Undetermined < TentativeAccept < Reject`.
/// Combining keeps the higher priority (more restrictive) value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptResult {
    /// Nobody has an opinion yet.
    #[default]
    Undetermined,
    /// Accept, if all other conditions are met.
    TentativeAccept,
    /// Reject outright, regardless of any earlier TentativeAccept.
    Reject,
}

impl AcceptResult {
    pub fn combine(self, other: AcceptResult) -> AcceptResult {
        self.max(other)
    }

    /// Only an explicit opt-in with no veto authorizes an attachment.
    pub fn allows_attachment(self) -> bool {
        self == AcceptResult::TentativeAccept
    }
}

/// Runtime tag distinguishing full nodes from AddOns on template descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Node,
    AddOn,
}
