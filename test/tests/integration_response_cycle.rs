/// Response cycles driven directly on a `UiSession`: atomic failure,
/// cascades, detaching and sequence checks.
use std::collections::BTreeSet;

use proptest::prelude::*;

use trellis_server::{
    Component, ComponentContext, FinalizeError, ResponseError, RpcError, ServerConfig, TreeError,
    UiSession,
};
use trellis_shared::{
    json, ComponentId, HasCaption, HasState, HierarchyChange, SequenceNumber, SerializationError,
    ServerRpcCall, SharedState,
};
use trellis_test::{Follower, Label, Layout, Notifier, SumCalculator, TextField};

fn init_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}

fn set_term(sum: ComponentId, term: &str, value: i64, sequence: u16) -> ServerRpcCall {
    ServerRpcCall {
        component: sum,
        interface: SumCalculator::RPC.to_string(),
        method: term.to_string(),
        args: vec![json!(value)],
        sequence: SequenceNumber::new(sequence),
    }
}

fn sum_session(config: &ServerConfig) -> (UiSession, ComponentId) {
    let mut session = UiSession::new(Layout::default(), config);
    let sum = session.attach(session.root(), SumCalculator::new()).unwrap();
    SumCalculator::register(&mut session, sum).unwrap();
    session.write_response().unwrap();
    (session, sum)
}

/// Pings its client peer every time it is finalized, optionally re-marking a
/// partner or trying to grow a child from its hook
#[derive(Default)]
struct Pinger {
    state: SharedState,
    partner: Option<ComponentId>,
    grow: bool,
}

impl HasState for Pinger {
    fn state(&self) -> &SharedState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SharedState {
        &mut self.state
    }
}

impl Component for Pinger {
    fn kind(&self) -> &'static str {
        "Pinger"
    }

    fn before_client_response(&mut self, cx: &mut ComponentContext<'_>, _initial: bool) {
        cx.call_client("PingRpc", "ping", vec![]);
        if let Some(partner) = self.partner {
            cx.mark_dirty(partner);
        }
        if self.grow {
            let id = cx.id();
            cx.attach(id, Label::new("grown"));
        }
    }
}

fn call_methods(response: &trellis_server::Response) -> Vec<&str> {
    response
        .message
        .calls
        .iter()
        .map(|call| call.method.as_str())
        .collect()
}

#[test]
fn oversized_response_is_not_sent() {
    init_logging();
    let config = ServerConfig {
        max_response_bytes: Some(512),
        ..ServerConfig::default()
    };
    let mut session = UiSession::new(Layout::default(), &config);
    let label = session.attach(session.root(), Label::new("Hi")).unwrap();
    let first = session.write_response().unwrap();
    assert_eq!(first.message.sequence, SequenceNumber::new(0));

    session.call_client(label, "LabelRpc", "flash", vec![]).unwrap();
    let long_caption = "x".repeat(2000);
    session
        .component_mut::<Label>(label)
        .unwrap()
        .set_caption(Some(&long_caption));
    session.mark_dirty(label);

    assert!(matches!(
        session.write_response(),
        Err(ResponseError::Serialization(SerializationError::PayloadTooLarge { limit: 512, .. }))
    ));
    assert!(session.is_dirty(label));
    assert_eq!(session.last_response(), Some(SequenceNumber::new(0)));

    session
        .component_mut::<Label>(label)
        .unwrap()
        .set_caption(Some("Shorter"));
    let retry = session.write_response().unwrap();
    assert_eq!(retry.message.sequence, SequenceNumber::new(1));
    assert_eq!(retry.message.changes.len(), 1);
    assert_eq!(retry.message.changes[0].diff["caption"], json!("Shorter"));
    assert_eq!(retry.message.calls.len(), 1);
    assert_eq!(retry.message.calls[0].method, "flash");
}

#[test]
fn oversized_response_drops_calls_from_its_hooks() {
    init_logging();
    let config = ServerConfig {
        max_response_bytes: Some(1000),
        ..ServerConfig::default()
    };
    let mut session = UiSession::new(Layout::default(), &config);
    let pinger = session.attach(session.root(), Pinger::default()).unwrap();
    let first = session.write_response().unwrap();
    assert_eq!(call_methods(&first), vec!["ping"]);

    session.call_client(pinger, "PingRpc", "hello", vec![]).unwrap();
    let payload = "x".repeat(2000);
    session
        .component_mut::<Pinger>(pinger)
        .unwrap()
        .state
        .set("payload", payload);
    session.mark_dirty(pinger);
    assert!(matches!(
        session.write_response(),
        Err(ResponseError::Serialization(SerializationError::PayloadTooLarge { .. }))
    ));

    session
        .component_mut::<Pinger>(pinger)
        .unwrap()
        .state
        .set("payload", "short");
    let retry = session.write_response().unwrap();
    assert_eq!(call_methods(&retry), vec!["hello", "ping"]);
}

#[test]
fn overflowed_cascade_drops_calls_from_its_hooks() {
    init_logging();
    let config = ServerConfig {
        max_finalize_passes: 4,
        ..ServerConfig::default()
    };
    let mut session = UiSession::new(Layout::default(), &config);
    let root = session.root();
    let ping = session.attach(root, Pinger::default()).unwrap();
    let pong = session.attach(root, Pinger::default()).unwrap();
    session.component_mut::<Pinger>(ping).unwrap().partner = Some(pong);
    session.component_mut::<Pinger>(pong).unwrap().partner = Some(ping);

    assert!(matches!(
        session.write_response(),
        Err(ResponseError::Finalize(FinalizeError::CascadeOverflow { passes: 4, .. }))
    ));

    session.component_mut::<Pinger>(pong).unwrap().partner = None;
    let response = session.write_response().unwrap();
    let pinged: Vec<ComponentId> = response.message.calls.iter().map(|c| c.component).collect();
    assert_eq!(pinged, vec![ping, pong]);
}

#[test]
fn tree_change_from_hook_fails_the_response() {
    init_logging();
    let mut session = UiSession::new(Layout::default(), &ServerConfig::default());
    let grower = session
        .attach(
            session.root(),
            Pinger {
                grow: true,
                ..Pinger::default()
            },
        )
        .unwrap();

    assert_eq!(
        session.write_response().unwrap_err(),
        ResponseError::Finalize(FinalizeError::StructureChangeInHook { component: grower })
    );
    assert!(session.tree().children(&grower).is_empty());
    assert!(session.is_dirty(grower));

    session.component_mut::<Pinger>(grower).unwrap().grow = false;
    let response = session.write_response().unwrap();
    assert_eq!(call_methods(&response), vec!["ping"]);
    assert_eq!(response.message.hierarchy.len(), 2);
}

#[test]
fn rejected_tree_change_fails_the_invocation() {
    init_logging();
    let mut session = UiSession::new(Layout::default(), &ServerConfig::default());
    let root = session.root();
    let label = session.attach(root, Label::new("Close")).unwrap();
    session
        .register_rpc(label, "LabelRpc", move |_label: &mut Label, cx, _call| {
            cx.detach(root);
            Ok(())
        })
        .unwrap();
    session.write_response().unwrap();

    let result = session.handle_invocation(ServerRpcCall {
        component: label,
        interface: "LabelRpc".to_string(),
        method: "closeAll".to_string(),
        args: vec![],
        sequence: SequenceNumber::new(0),
    });
    assert_eq!(
        result,
        Err(RpcError::StructureRejected {
            component: label,
            error: TreeError::CannotDetachRoot { component: root },
        })
    );
    assert_eq!(session.tree().pre_order(), vec![root, label]);
}

#[test]
fn endless_cascade_overflows() {
    init_logging();
    let config = ServerConfig {
        max_finalize_passes: 10,
        ..ServerConfig::default()
    };
    let mut session = UiSession::new(Layout::default(), &config);
    let root = session.root();
    let ping = session.attach(root, Notifier::new(vec![])).unwrap();
    let pong = session.attach(root, Notifier::new(vec![ping])).unwrap();
    session
        .component_mut::<Notifier>(ping)
        .unwrap()
        .set_dependents(vec![pong]);

    assert_eq!(
        session.write_response().unwrap_err(),
        ResponseError::Finalize(FinalizeError::CascadeOverflow {
            passes: 10,
            still_dirty: 1,
        })
    );
    assert!(session.is_dirty(ping));
    assert!(session.is_dirty(pong));
    assert_eq!(session.last_response(), None);
}

#[test]
fn cascade_reaches_earlier_component_in_same_response() {
    init_logging();
    let mut session = UiSession::new(Layout::default(), &ServerConfig::default());
    let root = session.root();
    let follower = session.attach(root, Follower::default()).unwrap();
    let notifier = session.attach(root, Notifier::new(vec![follower])).unwrap();
    session.write_response().unwrap();

    session.mark_dirty(notifier);
    let response = session.write_response().unwrap();
    let changed: Vec<ComponentId> = response.message.changes.iter().map(|c| c.component).collect();
    assert_eq!(changed, vec![follower, notifier]);

    // first response: once initially, once more from the cascade
    let flags = session.component::<Follower>(follower).unwrap().initial_flags();
    assert_eq!(flags, &[true, true, false]);
}

#[test]
fn detach_releases_everything() {
    init_logging();
    let mut session = UiSession::new(Layout::default(), &ServerConfig::default());
    let root = session.root();
    let form = session.attach(root, Layout::default()).unwrap();
    let name = session.attach(form, TextField::new("Name")).unwrap();
    TextField::register(&mut session, name).unwrap();
    session.write_response().unwrap();

    session.call_client(name, "TextFieldClientRpc", "focus", vec![]).unwrap();
    session.mark_dirty(name);
    session.detach(form).unwrap();

    assert!(!session.is_dirty(name));
    assert!(!session.mark_dirty(name));
    assert_eq!(
        session.call_client(name, "TextFieldClientRpc", "focus", vec![]),
        Err(TreeError::NotAttached { component: name })
    );
    let call = ServerRpcCall {
        component: name,
        interface: TextField::RPC.to_string(),
        method: "setValue".to_string(),
        args: vec![json!("late")],
        sequence: SequenceNumber::new(0),
    };
    assert!(matches!(
        session.handle_invocation(call),
        Err(RpcError::UnknownRpcTarget { .. })
    ));

    let response = session.write_response().unwrap();
    assert_eq!(response.message.hierarchy, vec![HierarchyChange::Detached { id: form }]);
    assert!(response.message.calls.is_empty());
    assert!(response.message.changes.is_empty());
    assert_eq!(
        session.detach(root),
        Err(TreeError::CannotDetachRoot { component: root })
    );
}

#[test]
fn stale_sequence_is_dropped_untouched() {
    init_logging();
    let (mut session, sum) = sum_session(&ServerConfig::default());

    session.handle_invocation(set_term(sum, "setTerm1", 1, 5)).unwrap();
    session.write_response().unwrap();

    assert_eq!(
        session.handle_invocation(set_term(sum, "setTerm1", 9, 3)),
        Err(RpcError::StaleSequence {
            sequence: 3,
            last_applied: 5
        })
    );
    assert!(matches!(
        session.handle_invocation(set_term(sum, "setTerm1", 9, 5)),
        Err(RpcError::StaleSequence { .. })
    ));
    assert!(!session.is_dirty(sum));
    assert_eq!(session.component::<SumCalculator>(sum).unwrap().term("term1"), 1);
}

#[test]
fn duplicate_sequence_allowed_when_configured() {
    init_logging();
    let config = ServerConfig {
        allow_duplicate_sequence: true,
        ..ServerConfig::default()
    };
    let (mut session, sum) = sum_session(&config);

    session.handle_invocation(set_term(sum, "setTerm1", 1, 5)).unwrap();
    session.handle_invocation(set_term(sum, "setTerm1", 2, 5)).unwrap();
    assert!(session.handle_invocation(set_term(sum, "setTerm1", 3, 4)).is_err());
    assert_eq!(session.component::<SumCalculator>(sum).unwrap().term("term1"), 2);
}

#[test]
fn sequence_survives_wrap_around() {
    init_logging();
    let (mut session, sum) = sum_session(&ServerConfig::default());

    session
        .handle_invocation(set_term(sum, "setTerm1", 1, u16::MAX))
        .unwrap();
    session.handle_invocation(set_term(sum, "setTerm2", 2, 0)).unwrap();
    assert!(session
        .handle_invocation(set_term(sum, "setTerm2", 3, u16::MAX - 1))
        .is_err());
}

#[derive(Clone, Debug)]
enum DirtyOp {
    Mark(usize),
    Clear(usize),
}

fn dirty_op() -> impl Strategy<Value = DirtyOp> {
    prop_oneof![
        (0..6usize).prop_map(DirtyOp::Mark),
        (0..6usize).prop_map(DirtyOp::Clear),
    ]
}

proptest! {
    #[test]
    fn flushed_components_are_marked_minus_cleared(ops in prop::collection::vec(dirty_op(), 0..40)) {
        let mut session = UiSession::new(Layout::default(), &ServerConfig::default());
        let root = session.root();
        let labels: Vec<ComponentId> = (0..6)
            .map(|i| session.attach(root, Label::new(&format!("label {}", i))).unwrap())
            .collect();
        session.write_response().unwrap();

        let mut expected = BTreeSet::new();
        for (step, op) in ops.iter().enumerate() {
            match op {
                DirtyOp::Mark(i) => {
                    session
                        .component_mut::<Label>(labels[*i])
                        .unwrap()
                        .set_caption(Some(&format!("step {}", step)));
                    session.mark_dirty(labels[*i]);
                    expected.insert(labels[*i]);
                }
                DirtyOp::Clear(i) => {
                    session.clear_dirty(labels[*i]);
                    expected.remove(&labels[*i]);
                }
            }
        }

        let dirty: BTreeSet<ComponentId> = session.dirty_components().into_iter().collect();
        prop_assert_eq!(&dirty, &expected);

        let response = session.write_response().unwrap();
        let sent: BTreeSet<ComponentId> =
            response.message.changes.iter().map(|c| c.component).collect();
        prop_assert_eq!(&sent, &expected);
        prop_assert!(session.dirty_components().is_empty());
    }
}
