//! Scenario 1: a freshly created Session has no `cliSessionId` yet. The
//! first conversation-root record observed for some CLI session id attaches
//! to it, since it is the only unbound Session on record.

use cso_core::{MessageId, WatchEvent};

use crate::prelude::*;

#[tokio::test]
async fn fresh_session_attaches_on_first_root_record() {
    let fx = new_fixture();
    let session = create_session(&fx, "fresh");
    assert!(session.cli_session_id.is_none());

    let cli = cli_id("cli-fresh");
    let event = WatchEvent::CorrelationCandidate {
        cli_session_id: cli.clone(),
        record: cso_core::LogRecord::User { message_id: Some(MessageId::new("m1")), parent_message_id: None },
    };
    fx.correlator.handle(&event).expect("correlate");

    let now = fx.store.get_session(&session.id).expect("still exists");
    assert_eq!(now.cli_session_id, Some(cli));
    assert_eq!(now.last_message_id, Some(MessageId::new("m1")));

    fx.pty.kill(&session.terminal_id).expect("kill");
}

#[tokio::test]
async fn root_record_with_no_unbound_session_and_no_pending_execution_is_ignored() {
    let fx = new_fixture();

    let event = WatchEvent::CorrelationCandidate {
        cli_session_id: cli_id("orphan"),
        record: cso_core::LogRecord::User { message_id: Some(MessageId::new("m1")), parent_message_id: None },
    };
    fx.correlator.handle(&event).expect("handle is a no-op, not an error");

    assert!(fx.store.list_sessions().is_empty());
}
