//! Scenario 2: the AI CLI can restart mid-conversation under a new
//! `cliSessionId` while continuing the same parent-message-id chain. The
//! Correlator follows the chain, not the (now-stale) `cliSessionId`, so the
//! Session's `cliSessionId` gets rewritten to the new value.

use cso_core::{MessageId, WatchEvent};

use crate::prelude::*;

#[tokio::test]
async fn chained_record_under_a_new_cli_session_id_rewrites_the_binding() {
    let fx = new_fixture();
    let session = create_session(&fx, "rewrite");

    let old_cli = cli_id("cli-old");
    fx.registry.link_cli(&session.id, old_cli.clone(), Some(MessageId::new("m1"))).expect("initial link");

    let now = fx.store.get_session(&session.id).expect("exists");
    assert_eq!(now.cli_session_id, Some(old_cli));

    // The CLI process restarts; the new log stream carries a different
    // cliSessionId but a record whose parent is the last message this
    // Session produced.
    let new_cli = cli_id("cli-new");
    let event = WatchEvent::CorrelationCandidate {
        cli_session_id: new_cli.clone(),
        record: cso_core::LogRecord::User {
            message_id: Some(MessageId::new("m2")),
            parent_message_id: Some(MessageId::new("m1")),
        },
    };
    fx.correlator.handle(&event).expect("correlate");

    let now = fx.store.get_session(&session.id).expect("exists");
    assert_eq!(now.cli_session_id, Some(new_cli));
    assert_eq!(now.last_message_id, Some(MessageId::new("m2")));

    fx.pty.kill(&session.terminal_id).expect("kill");
}

#[tokio::test]
async fn two_sessions_cannot_claim_the_same_cli_session_id() {
    let fx = new_fixture();
    let a = create_session(&fx, "a");
    let b = create_session(&fx, "b");

    let shared = cli_id("shared");
    fx.registry.link_cli(&a.id, shared.clone(), None).expect("link a");
    fx.registry.link_cli(&b.id, shared.clone(), None).expect("link b, later claim wins");

    let a_now = fx.store.get_session(&a.id).expect("exists");
    let b_now = fx.store.get_session(&b.id).expect("exists");
    assert_eq!(a_now.cli_session_id, None);
    assert_eq!(b_now.cli_session_id, Some(shared));

    fx.pty.kill(&a.terminal_id).expect("kill");
    fx.pty.kill(&b.terminal_id).expect("kill");
}
