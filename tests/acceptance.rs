use flowgraph::core::pin::is_supported_input_pin_name;
use flowgraph::prelude::*;
use flowgraph::{check_accept_add_on_child, is_add_on_allowed_for_parents};
use std::sync::Arc;

/// Node that answers every AddOn offer the same way.
#[derive(Clone)]
struct Host {
    answer: AcceptResult,
}

impl ExecutableLogic for Host {
    fn output_pins(&self) -> Vec<Pin> {
        vec![Pin::new("Done")]
    }

    fn accept_add_on_child(&self, _add_on: &dyn ExecutableLogic) -> AcceptResult {
        self.answer
    }

    fn execute_input(&mut self, ctx: &mut UnitContext<'_>, _pin_name: &str) {
        ctx.trigger_output("Done", true);
    }
}

impl NodeLogic for Host {
    fn clone_box(&self) -> Box<dyn NodeLogic> {
        Box::new(self.clone())
    }
}

/// AddOn whose own answer is fixed.
#[derive(Clone)]
struct Probe {
    answer: AcceptResult,
}

impl ExecutableLogic for Probe {
    fn accept_add_on_parent(&self, _parent: &dyn ExecutableLogic) -> AcceptResult {
        self.answer
    }
}

impl AddOnLogic for Probe {
    fn clone_box(&self) -> Box<dyn AddOnLogic> {
        Box::new(self.clone())
    }
}

/// A node type that (wrongly) claims it wants to be an AddOn.
#[derive(Clone)]
struct Greedy;

impl ExecutableLogic for Greedy {
    fn accept_add_on_parent(&self, _parent: &dyn ExecutableLogic) -> AcceptResult {
        AcceptResult::TentativeAccept
    }
}

impl NodeLogic for Greedy {
    fn clone_box(&self) -> Box<dyn NodeLogic> {
        Box::new(self.clone())
    }
}

const ANSWERS: [AcceptResult; 3] = [
    AcceptResult::Undetermined,
    AcceptResult::TentativeAccept,
    AcceptResult::Reject,
];

fn probe(answer: AcceptResult) -> UnitTemplate {
    AddOnTemplate::new(Probe { answer }).into()
}

#[test]
fn test_pin_filter_defaults_to_everything() {
    assert!(is_supported_input_pin_name(&[], "Anything"));
    assert!(is_supported_input_pin_name(&[], ""));

    let declared = [Pin::new("A"), Pin::new("B")];
    assert!(is_supported_input_pin_name(&declared, "A"));
    assert!(!is_supported_input_pin_name(&declared, "C"));
}

#[test]
fn test_acceptance_matrix() {
    for parent_answer in ANSWERS {
        for child_answer in ANSWERS {
            let host = Host { answer: parent_answer };
            let verdict = check_accept_add_on_child(&host, Some(&probe(child_answer)));
            assert_eq!(verdict, parent_answer.combine(child_answer));

            let attachable = verdict.allows_attachment();
            let expected = parent_answer != AcceptResult::Reject
                && child_answer != AcceptResult::Reject
                && (parent_answer == AcceptResult::TentativeAccept || child_answer == AcceptResult::TentativeAccept);
            assert_eq!(attachable, expected, "parent {parent_answer:?}, child {child_answer:?}");
        }
    }
}

#[test]
fn test_silence_on_both_sides_is_not_an_opt_in() {
    let host = Host {
        answer: AcceptResult::Undetermined,
    };
    let verdict = check_accept_add_on_child(&host, Some(&probe(AcceptResult::Undetermined)));
    assert_eq!(verdict, AcceptResult::Undetermined);
    assert!(!verdict.allows_attachment());
}

#[test]
fn test_node_types_are_never_add_ons() {
    let greedy: UnitTemplate = NodeTemplate::new(Greedy).into();
    for answer in ANSWERS {
        let host = Host { answer };
        assert_eq!(check_accept_add_on_child(&host, Some(&greedy)), AcceptResult::Reject);
    }
}

#[test]
fn test_missing_candidate_is_rejected() {
    let host = Host {
        answer: AcceptResult::TentativeAccept,
    };
    assert_eq!(check_accept_add_on_child(&host, None), AcceptResult::Reject);
}

#[test]
fn test_multi_select_needs_every_parent() {
    let welcoming = Host {
        answer: AcceptResult::TentativeAccept,
    };
    let neutral = Host {
        answer: AcceptResult::Undetermined,
    };
    let hostile = Host {
        answer: AcceptResult::Reject,
    };
    let candidate = probe(AcceptResult::Undetermined);

    let all_welcoming: [Option<&dyn ExecutableLogic>; 2] = [Some(&welcoming), Some(&welcoming)];
    assert!(is_add_on_allowed_for_parents(all_welcoming, Some(&candidate)));

    let one_neutral: [Option<&dyn ExecutableLogic>; 2] = [Some(&welcoming), Some(&neutral)];
    assert!(!is_add_on_allowed_for_parents(one_neutral, Some(&candidate)));

    let one_hostile: [Option<&dyn ExecutableLogic>; 3] = [Some(&welcoming), Some(&hostile), Some(&welcoming)];
    assert!(!is_add_on_allowed_for_parents(one_hostile, Some(&candidate)));

    let one_missing: [Option<&dyn ExecutableLogic>; 2] = [Some(&welcoming), None];
    assert!(!is_add_on_allowed_for_parents(one_missing, Some(&candidate)));

    assert!(!is_add_on_allowed_for_parents(Vec::<Option<&dyn ExecutableLogic>>::new(), Some(&candidate)));
}

#[cfg(feature = "authoring")]
mod authoring {
    use super::*;
    use flowgraph::{FlowGraph, UnitPath};

    #[derive(Clone)]
    struct Sink;

    impl ExecutableLogic for Sink {}

    impl NodeLogic for Sink {
        fn clone_box(&self) -> Box<dyn NodeLogic> {
            Box::new(self.clone())
        }
    }

    #[test]
    fn test_refused_attachment_leaves_graph_untouched() {
        let mut graph = FlowGraph::new("/Game/Editor");
        let guid = graph
            .add_node(NodeTemplate::new(Host { answer: AcceptResult::Reject }).with_name("Grumpy"))
            .unwrap();
        let parent = UnitPath::of_node(guid);

        let err = graph
            .attach_add_on(&parent, probe(AcceptResult::TentativeAccept))
            .unwrap_err();
        assert!(matches!(err, FlowError::AddOnRejected { .. }));
        assert!(graph.asset().node(guid).unwrap().add_ons().is_empty());
        assert!(graph.message_log().has_errors());
        let error = graph.message_log().errors().next().unwrap().to_string();
        assert!(error.ends_with("--- node Grumpy, asset /Game/Editor"));

        let err = graph
            .attach_add_on(&parent, NodeTemplate::new(Greedy).into())
            .unwrap_err();
        assert!(matches!(err, FlowError::NodeAsAddOn(_)));
    }

    #[test]
    fn test_selection_attaches_everywhere_or_nowhere() {
        let mut graph = FlowGraph::new("/Game/Editor");
        let a = graph
            .add_node(NodeTemplate::new(Host { answer: AcceptResult::TentativeAccept }))
            .unwrap();
        let b = graph
            .add_node(NodeTemplate::new(Host { answer: AcceptResult::Undetermined }))
            .unwrap();
        let selection = [UnitPath::of_node(a), UnitPath::of_node(b)];

        assert!(graph
            .attach_add_on_to_selection(&selection, probe(AcceptResult::Undetermined))
            .is_err());
        assert!(graph.asset().node(a).unwrap().add_ons().is_empty());
        assert!(graph.asset().node(b).unwrap().add_ons().is_empty());

        graph
            .attach_add_on_to_selection(&selection, probe(AcceptResult::TentativeAccept))
            .unwrap();
        assert_eq!(graph.asset().node(a).unwrap().add_ons().len(), 1);
        assert_eq!(graph.asset().node(b).unwrap().add_ons().len(), 1);
    }

    #[test]
    fn test_edited_graph_runs() {
        let mut graph = FlowGraph::new("/Game/Editor");
        let host = graph
            .add_node(NodeTemplate::new(Host { answer: AcceptResult::TentativeAccept }).with_name("Host"))
            .unwrap();
        let sink = graph.add_node(NodeTemplate::new(Sink).with_name("Sink")).unwrap();

        graph
            .attach_add_on(&UnitPath::of_node(host), probe(AcceptResult::Undetermined))
            .unwrap();
        assert!(graph.connect(host, "Missing", sink, "In").is_err());
        graph.connect(host, "Done", sink, "In").unwrap();
        graph.set_entry_node(host).unwrap();

        let asset = graph.into_asset();
        assert_eq!(asset.node(host).unwrap().connections().len(), 1);

        let mut instance = FlowInstance::new(Arc::new(asset));
        instance.initialize();
        instance.start();

        assert_eq!(instance.activation_state(host), Some(ActivationState::Completed));
        assert_eq!(instance.activation_state(sink), Some(ActivationState::Active));
        assert_eq!(instance.node(host).unwrap().add_ons().len(), 1);
    }
}
