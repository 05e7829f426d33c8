/// End-to-end request/response cycles between a `Client` and a `Server`,
/// exchanging encoded messages for a demo form.
use std::sync::Arc;

use trellis_client::ApplyOutcome;
use trellis_server::{DataProvider, ListDataProvider, RpcError, Server, ServerConfig};
use trellis_shared::{
    encode_client_message, json, ClientMessage, ComponentId, MouseEventDetails, SequenceNumber,
    ServerRpcCall, CONTEXT_HELP_RPC, ICON_CLICK,
};
use trellis_test::{
    demo_rows, demo_session, DemoIds, Listing, Row, SumCalculator, TestConnection, TextField,
};

fn init_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}

fn demo_server(rows: u32) -> (Server, DemoIds, Arc<ListDataProvider<Row>>) {
    let provider = Arc::new(ListDataProvider::from_items(demo_rows(rows)));
    let config = ServerConfig::default();

    // component ids follow attach order, so every demo session shares them
    let (_, ids) = demo_session(&config, provider.clone());

    let session_rows = provider.clone();
    let server = Server::in_memory(config, move |_id, config| {
        demo_session(config, session_rows.clone()).0
    });
    (server, ids, provider)
}

fn sum_finalize_runs(server: &Server, connection: &TestConnection, ids: &DemoIds) -> usize {
    let context = server.session(&connection.session);
    let transaction = context.start_transaction().unwrap();
    transaction
        .component::<SumCalculator>(ids.sum)
        .unwrap()
        .finalize_runs()
}

#[test]
fn first_response_carries_whole_tree() {
    init_logging();
    let (server, ids, _) = demo_server(12);
    let mut connection = TestConnection::new("first");

    let (outcome, applied) = connection.round_trip(&server).unwrap();
    assert_eq!(applied, ApplyOutcome::Applied);
    assert_eq!(outcome.response.message.sequence, SequenceNumber::new(0));
    assert_eq!(outcome.response.message.hierarchy.len(), 7);

    let mirror = connection.client.mirror();
    assert_eq!(mirror.root(), Some(ids.root));
    assert_eq!(mirror.len(), 7);
    assert_eq!(mirror.children(&ids.root).len(), 6);
    assert_eq!(mirror.field(&ids.title, "caption"), Some(&json!("Demo")));
    assert_eq!(mirror.field(&ids.sum, "sum"), Some(&json!(0)));
    assert_eq!(mirror.field(&ids.name, "requiredIndicator"), Some(&json!(true)));
    assert_eq!(
        mirror.field(&ids.listing, "rows"),
        Some(&json!(["Row 1", "Row 2", "Row 3", "Row 4", "Row 5"]))
    );
    assert_eq!(mirror.field(&ids.listing, "size"), Some(&json!(12)));
    assert_eq!(mirror.get(&ids.listing).unwrap().kind, "Listing");
}

#[test]
fn two_setters_one_finalize() {
    init_logging();
    let (server, ids, _) = demo_server(3);
    let mut connection = TestConnection::new("sum");
    connection.round_trip(&server).unwrap();
    assert_eq!(sum_finalize_runs(&server, &connection, &ids), 1);

    connection
        .client
        .invoke(ids.sum, SumCalculator::RPC, "setTerm1", vec![json!(2)]);
    connection
        .client
        .invoke(ids.sum, SumCalculator::RPC, "setTerm2", vec![json!(3)]);
    let (outcome, _) = connection.round_trip(&server).unwrap();

    assert_eq!(outcome.invocations.applied, 2);
    assert!(outcome.invocations.is_clean());
    assert_eq!(sum_finalize_runs(&server, &connection, &ids), 2);

    let changes = &outcome.response.message.changes;
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].component, ids.sum);
    assert_eq!(changes[0].diff.len(), 3);
    assert_eq!(connection.client.mirror().field(&ids.sum, "sum"), Some(&json!(5)));
}

#[test]
fn unchanged_components_are_not_resent() {
    init_logging();
    let (server, ids, _) = demo_server(3);
    let mut connection = TestConnection::new("quiet");
    connection.round_trip(&server).unwrap();

    // same value as before: finalized, but nothing to send
    connection
        .client
        .invoke(ids.sum, SumCalculator::RPC, "setTerm1", vec![json!(0)]);
    let (outcome, applied) = connection.round_trip(&server).unwrap();

    assert_eq!(applied, ApplyOutcome::Applied);
    assert!(outcome.response.message.changes.is_empty());
    assert_eq!(outcome.response.message.sequence, SequenceNumber::new(1));
}

#[test]
fn stale_invocation_does_not_mutate_state() {
    init_logging();
    let (server, ids, _) = demo_server(3);
    let mut connection = TestConnection::new("stale");
    connection.round_trip(&server).unwrap();

    let applied_sequence = connection
        .client
        .invoke(ids.sum, SumCalculator::RPC, "setTerm1", vec![json!(2)]);
    connection.round_trip(&server).unwrap();

    // a network retry of an old request
    let replay = ClientMessage {
        last_response: connection.client.last_response(),
        invocations: vec![ServerRpcCall {
            component: ids.sum,
            interface: SumCalculator::RPC.to_string(),
            method: "setTerm1".to_string(),
            args: vec![json!(9)],
            sequence: applied_sequence,
        }],
    };
    let payload = encode_client_message(&replay).unwrap();
    let outcome = server.handle_request(&connection.session, &payload).unwrap();

    assert_eq!(outcome.invocations.applied, 0);
    assert!(matches!(
        outcome.invocations.failures[0],
        RpcError::StaleSequence { .. }
    ));
    assert!(outcome.response.message.changes.is_empty());

    let context = server.session(&connection.session);
    let transaction = context.start_transaction().unwrap();
    assert_eq!(
        transaction.component::<SumCalculator>(ids.sum).unwrap().term("term1"),
        2
    );
}

#[test]
fn unknown_target_is_skipped() {
    init_logging();
    let (server, ids, _) = demo_server(3);
    let mut connection = TestConnection::new("unknown");
    connection.round_trip(&server).unwrap();

    connection
        .client
        .invoke(ids.title, SumCalculator::RPC, "setTerm1", vec![json!(1)]);
    connection
        .client
        .invoke(ComponentId::new(999), "Nothing", "noop", vec![]);
    connection
        .client
        .invoke(ids.sum, SumCalculator::RPC, "setTerm2", vec![json!(4)]);
    let (outcome, _) = connection.round_trip(&server).unwrap();

    assert_eq!(outcome.invocations.applied, 1);
    assert_eq!(outcome.invocations.failures.len(), 2);
    assert!(outcome
        .invocations
        .failures
        .iter()
        .all(|failure| matches!(failure, RpcError::UnknownRpcTarget { .. })));
    assert_eq!(connection.client.mirror().field(&ids.sum, "sum"), Some(&json!(4)));
}

#[test]
fn handler_errors_are_reported_per_invocation() {
    init_logging();
    let (server, ids, _) = demo_server(3);
    let mut connection = TestConnection::new("errors");
    connection.round_trip(&server).unwrap();

    connection
        .client
        .invoke(ids.sum, SumCalculator::RPC, "setTerm1", vec![json!("two")]);
    connection
        .client
        .invoke(ids.sum, SumCalculator::RPC, "multiply", vec![]);
    connection
        .client
        .invoke(ids.name, TextField::RPC, "setValue", vec![json!("Ada")]);
    let (outcome, _) = connection.round_trip(&server).unwrap();

    assert_eq!(outcome.invocations.applied, 1);
    assert!(matches!(
        outcome.invocations.failures[0],
        RpcError::InvalidArguments { index: 0, .. }
    ));
    assert!(matches!(
        outcome.invocations.failures[1],
        RpcError::UnknownMethod { .. }
    ));

    let mirror = connection.client.mirror();
    assert_eq!(mirror.field(&ids.name, "value"), Some(&json!("Ada")));
    assert_eq!(mirror.field(&ids.name, "modified"), Some(&json!(true)));
}

#[test]
fn context_help_click_calls_back_to_client() {
    init_logging();
    let (server, ids, _) = demo_server(3);
    let mut connection = TestConnection::new("help");
    connection.round_trip(&server).unwrap();

    let details = MouseEventDetails {
        client_x: 10,
        client_y: 20,
        ..MouseEventDetails::default()
    };
    connection
        .client
        .invoke(ids.name, CONTEXT_HELP_RPC, ICON_CLICK, vec![json!(details)]);
    let (outcome, _) = connection.round_trip(&server).unwrap();
    assert!(outcome.invocations.is_clean());

    let calls = connection.client.take_client_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].component, ids.name);
    assert_eq!(calls[0].interface, TextField::HELP_CLIENT_RPC);
    assert_eq!(calls[0].args, vec![json!("Your full name"), json!(10), json!(20)]);
    assert!(connection.client.take_client_calls().is_empty());
}

#[test]
fn lost_response_triggers_resynchronization() {
    init_logging();
    let (server, ids, _) = demo_server(3);
    let mut connection = TestConnection::new("lossy");
    connection.round_trip(&server).unwrap();

    connection
        .client
        .invoke(ids.sum, SumCalculator::RPC, "setTerm1", vec![json!(7)]);
    let lost = connection.round_trip_lost(&server).unwrap();
    assert!(!lost.response.message.resynchronize);

    let (outcome, applied) = connection.round_trip(&server).unwrap();
    assert!(outcome.invocations.resynchronized);
    assert!(outcome.response.message.resynchronize);
    assert_eq!(outcome.response.message.hierarchy.len(), 7);
    assert_eq!(outcome.response.message.changes.len(), 7);
    assert_eq!(applied, ApplyOutcome::Applied);

    let mirror = connection.client.mirror();
    assert_eq!(mirror.len(), 7);
    assert_eq!(mirror.field(&ids.sum, "sum"), Some(&json!(7)));
    assert_eq!(mirror.field(&ids.title, "caption"), Some(&json!("Demo")));

    // back in step: no further resync
    let (outcome, _) = connection.round_trip(&server).unwrap();
    assert!(!outcome.response.message.resynchronize);
}

#[test]
fn listing_pages_and_refreshes() {
    init_logging();
    let (server, ids, provider) = demo_server(12);
    let mut connection = TestConnection::new("listing");
    connection.round_trip(&server).unwrap();

    connection
        .client
        .invoke(ids.listing, "ListingRpc", "setRange", vec![json!(10), json!(5)]);
    connection.round_trip(&server).unwrap();
    assert_eq!(
        connection.client.mirror().field(&ids.listing, "rows"),
        Some(&json!(["Row 11", "Row 12"]))
    );

    provider.items().write().unwrap().push(Row {
        id: 13,
        label: "Row 13".to_string(),
    });
    provider.refresh_all();
    server
        .transactions()
        .with_transaction(&connection.session, |ui| ui.mark_dirty(ids.listing))
        .unwrap();

    connection.round_trip(&server).unwrap();
    let mirror = connection.client.mirror();
    assert_eq!(mirror.field(&ids.listing, "rows"), Some(&json!(["Row 11", "Row 12", "Row 13"])));
    assert_eq!(mirror.field(&ids.listing, "size"), Some(&json!(13)));
}

#[test]
fn handler_can_attach_and_detach_components() {
    init_logging();
    let (server, ids, _) = demo_server(5);
    let mut connection = TestConnection::new("editor");
    connection.round_trip(&server).unwrap();

    connection
        .client
        .invoke(ids.listing, Listing::RPC, "openEditor", vec![json!(3)]);
    let (outcome, _) = connection.round_trip(&server).unwrap();
    assert!(outcome.invocations.is_clean());

    let mirror = connection.client.mirror();
    assert_eq!(mirror.children(&ids.listing).len(), 1);
    let editor = mirror.children(&ids.listing)[0];
    assert_eq!(mirror.get(&editor).unwrap().kind, "Label");
    assert_eq!(mirror.field(&editor, "caption"), Some(&json!("Editing row 3")));
    assert_eq!(mirror.field(&ids.listing, "editingRow"), Some(&json!(3)));

    // opening another row replaces the editor
    connection
        .client
        .invoke(ids.listing, Listing::RPC, "openEditor", vec![json!(4)]);
    connection.round_trip(&server).unwrap();
    let mirror = connection.client.mirror();
    assert_eq!(mirror.children(&ids.listing).len(), 1);
    let replacement = mirror.children(&ids.listing)[0];
    assert_ne!(replacement, editor);
    assert!(mirror.get(&editor).is_none());
    assert_eq!(mirror.field(&replacement, "caption"), Some(&json!("Editing row 4")));

    {
        let context = server.session(&connection.session);
        let transaction = context.start_transaction().unwrap();
        let listing = transaction.component::<Listing>(ids.listing).unwrap();
        assert_eq!(listing.editor(), Some(replacement));
    }

    connection
        .client
        .invoke(ids.listing, Listing::RPC, "closeEditor", vec![]);
    connection.round_trip(&server).unwrap();
    let mirror = connection.client.mirror();
    assert!(mirror.children(&ids.listing).is_empty());
    assert!(mirror.get(&replacement).is_none());
    assert_eq!(mirror.field(&ids.listing, "editingRow"), None);
}

#[test]
fn sessions_are_independent() {
    init_logging();
    let (server, ids, _) = demo_server(3);
    let mut alice = TestConnection::new("alice");
    let mut bob = TestConnection::new("bob");
    alice.round_trip(&server).unwrap();
    bob.round_trip(&server).unwrap();

    alice
        .client
        .invoke(ids.sum, SumCalculator::RPC, "setTerm1", vec![json!(1)]);
    alice.round_trip(&server).unwrap();
    bob.round_trip(&server).unwrap();

    assert_eq!(alice.client.mirror().field(&ids.sum, "sum"), Some(&json!(1)));
    assert_eq!(bob.client.mirror().field(&ids.sum, "sum"), Some(&json!(0)));

    assert!(server.end_session(&alice.session));
    assert!(!server.end_session(&alice.session));
}
