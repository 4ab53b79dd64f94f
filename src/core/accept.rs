//! AddOn acceptance negotiation.
//!
//! Both sides get a say: the prospective parent (node or AddOn) and the
//! candidate AddOn. Results combine by priority, so a single `Reject` vetoes,
//! and only an explicit `TentativeAccept` authorizes the attachment.

use crate::core::logic::ExecutableLogic;
use crate::core::template::UnitTemplate;
use crate::core::types::{AcceptResult, UnitKind};

/// Combined verdict for attaching `candidate` under `parent`.
///
/// A missing candidate is rejected, and so is any candidate that is a full
/// node, whatever either side answers.
pub fn check_accept_add_on_child(
    parent: &dyn ExecutableLogic,
    candidate: Option<&UnitTemplate>,
) -> AcceptResult {
    let Some(candidate) = candidate else {
        return AcceptResult::Reject;
    };

    let as_child = AcceptResult::Undetermined.combine(parent.accept_add_on_child(candidate.logic()));
    if as_child == AcceptResult::Reject {
        return AcceptResult::Reject;
    }

    let as_parent = candidate.logic().accept_add_on_parent(parent);
    if candidate.kind() == UnitKind::Node {
        if as_parent != AcceptResult::Reject {
            log::error!(
                "{} is a node type and must always Reject when offered as an AddOn (answered {:?} for parent {})",
                candidate.class_name(),
                as_parent,
                parent.class_name()
            );
        }
        return AcceptResult::Reject;
    }

    as_child.combine(as_parent)
}

/// Whether `candidate` may be attached to every parent of a multi-selection.
///
/// Every parent has to resolve to `TentativeAccept` on its own; an invalid
/// parent, a single `Reject` or an empty selection blocks the whole batch.
pub fn is_add_on_allowed_for_parents<'a>(
    parents: impl IntoIterator<Item = Option<&'a dyn ExecutableLogic>>,
    candidate: Option<&UnitTemplate>,
) -> bool {
    let mut any_parent = false;
    for parent in parents {
        let Some(parent) = parent else {
            return false;
        };
        if !check_accept_add_on_child(parent, candidate).allows_attachment() {
            return false;
        }
        any_parent = true;
    }
    any_parent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::logic::{AddOnLogic, NodeLogic};
    use crate::core::template::{AddOnTemplate, NodeTemplate};

    /// Parent whose answer to any child is fixed.
    #[derive(Clone)]
    struct Host(AcceptResult);

    impl ExecutableLogic for Host {
        fn accept_add_on_child(&self, _add_on: &dyn ExecutableLogic) -> AcceptResult {
            self.0
        }
    }

    impl NodeLogic for Host {
        fn clone_box(&self) -> Box<dyn NodeLogic> {
            Box::new(self.clone())
        }
    }

    /// AddOn whose answer to any parent is fixed.
    #[derive(Clone)]
    struct Guest(AcceptResult);

    impl ExecutableLogic for Guest {
        fn accept_add_on_parent(&self, _parent: &dyn ExecutableLogic) -> AcceptResult {
            self.0
        }
    }

    impl AddOnLogic for Guest {
        fn clone_box(&self) -> Box<dyn AddOnLogic> {
            Box::new(self.clone())
        }
    }

    /// A node offered as an AddOn that wrongly opts in.
    #[derive(Clone)]
    struct Sneaky;

    impl ExecutableLogic for Sneaky {
        fn accept_add_on_parent(&self, _parent: &dyn ExecutableLogic) -> AcceptResult {
            AcceptResult::TentativeAccept
        }
    }

    impl NodeLogic for Sneaky {
        fn clone_box(&self) -> Box<dyn NodeLogic> {
            Box::new(self.clone())
        }
    }

    const RESULTS: [AcceptResult; 3] = [
        AcceptResult::Undetermined,
        AcceptResult::TentativeAccept,
        AcceptResult::Reject,
    ];

    fn guest(result: AcceptResult) -> UnitTemplate {
        AddOnTemplate::new(Guest(result)).into()
    }

    #[test]
    fn test_verdict_is_the_combined_answer() {
        for parent_answer in RESULTS {
            for child_answer in RESULTS {
                let verdict = check_accept_add_on_child(&Host(parent_answer), Some(&guest(child_answer)));
                assert_eq!(verdict, parent_answer.combine(child_answer));
            }
        }
    }

    #[test]
    fn test_nobody_opting_in_blocks_attachment() {
        let verdict = check_accept_add_on_child(
            &Host(AcceptResult::Undetermined),
            Some(&guest(AcceptResult::Undetermined)),
        );
        assert_eq!(verdict, AcceptResult::Undetermined);
        assert!(!verdict.allows_attachment());
    }

    #[test]
    fn test_node_candidates_are_always_rejected() {
        let candidate: UnitTemplate = NodeTemplate::new(Sneaky).into();
        for parent_answer in RESULTS {
            assert_eq!(
                check_accept_add_on_child(&Host(parent_answer), Some(&candidate)),
                AcceptResult::Reject
            );
        }
    }

    #[test]
    fn test_missing_candidate_is_rejected() {
        assert_eq!(
            check_accept_add_on_child(&Host(AcceptResult::TentativeAccept), None),
            AcceptResult::Reject
        );
    }

    #[test]
    fn test_multi_selection_needs_every_parent() {
        let open = Host(AcceptResult::TentativeAccept);
        let neutral = Host(AcceptResult::Undetermined);
        let closed = Host(AcceptResult::Reject);
        let candidate = guest(AcceptResult::Undetermined);

        let parents: [Option<&dyn ExecutableLogic>; 2] = [Some(&open), Some(&open)];
        assert!(is_add_on_allowed_for_parents(parents, Some(&candidate)));

        let parents: [Option<&dyn ExecutableLogic>; 2] = [Some(&open), Some(&neutral)];
        assert!(!is_add_on_allowed_for_parents(parents, Some(&candidate)));

        let parents: [Option<&dyn ExecutableLogic>; 2] = [Some(&open), Some(&closed)];
        assert!(!is_add_on_allowed_for_parents(parents, Some(&candidate)));

        let parents: [Option<&dyn ExecutableLogic>; 2] = [Some(&open), None];
        assert!(!is_add_on_allowed_for_parents(parents, Some(&candidate)));

        assert!(!is_add_on_allowed_for_parents(Vec::new(), Some(&candidate)));
    }
}
