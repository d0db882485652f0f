//! Scenario 6: deleting a Session while its plan is executing tears down the
//! terminal and Store row; later events referencing the now-freed
//! `cliSessionId` must not resurrect or mutate anything.

use cso_core::{MessageId, WatchEvent};

use crate::prelude::*;

#[tokio::test]
async fn delete_during_execution_tears_down_and_orphans_later_events() {
    let fx = new_fixture();
    let session = create_session(&fx, "doomed");

    fx.jarvis.toggle(&session.id, true).expect("toggle on");
    fx.registry.update_plan(&session.id, "risky change").expect("set plan");
    fx.jarvis.execute_plan(&session.id).expect("execute plan");

    let resumed = cli_id("cli-doomed");
    fx.registry.link_cli(&session.id, resumed.clone(), Some(MessageId::new("m1"))).expect("link resumed cli");

    let outcome = fx.registry.delete_session(&session.id);
    assert!(outcome.terminal_killed);
    assert!(outcome.session_row_removed);

    assert!(fx.store.get_session(&session.id).is_none());

    // A late `stop` for the freed cliSessionId must not error or recreate
    // anything.
    fx.jarvis.on_stop(&resumed).expect("stop on a deleted session is a no-op");

    // A late correlation candidate chained off the deleted session's last
    // message must also be ignored, not resurrect the row.
    let event = WatchEvent::CorrelationCandidate {
        cli_session_id: cli_id("cli-late"),
        record: cso_core::LogRecord::User {
            message_id: Some(MessageId::new("m2")),
            parent_message_id: Some(MessageId::new("m1")),
        },
    };
    fx.correlator.handle(&event).expect("handle is a no-op, not an error");

    assert!(fx.store.list_sessions().is_empty());
}

#[tokio::test]
async fn deleting_an_already_deleted_session_is_idempotent() {
    let fx = new_fixture();
    let session = create_session(&fx, "once");

    let first = fx.registry.delete_session(&session.id);
    assert!(first.terminal_killed);
    assert!(first.session_row_removed);

    // No live terminal remains the second time; the Store delete is still
    // reported as succeeding because removing an absent row is a no-op, not
    // an error (§7).
    let second = fx.registry.delete_session(&session.id);
    assert!(!second.terminal_killed);
    assert!(fx.store.get_session(&session.id).is_none());
}
