//! Scenario 4: execution -> planning, auto-triggered by the `stop` event
//! while a Session is in Execution mode. A new CLI session id observed
//! after `execute_plan` (the resumed conversation) gets linked as a
//! continuation, then its `stop` flips the Session back to Planning.

use cso_core::JarvisMode;

use crate::prelude::*;

#[tokio::test]
async fn stop_during_execution_returns_to_planning() {
    let fx = new_fixture();
    let session = create_session(&fx, "exec");

    fx.jarvis.toggle(&session.id, true).expect("toggle on");
    fx.registry.update_plan(&session.id, "do it").expect("set plan");
    fx.jarvis.execute_plan(&session.id).expect("execute plan");

    let during = fx.store.get_session(&session.id).expect("exists");
    assert_eq!(during.mode, JarvisMode::Execution);

    // The resumed CLI process reports back under a fresh cliSessionId.
    let resumed = cli_id("cli-resumed");
    fx.registry.link_cli(&session.id, resumed.clone(), None).expect("link resumed cli");

    fx.jarvis.on_stop(&resumed).expect("on stop");

    let after = fx.store.get_session(&session.id).expect("exists");
    assert_eq!(after.mode, JarvisMode::Planning);

    fx.pty.kill(&session.terminal_id).expect("kill");
}

#[tokio::test]
async fn stop_while_already_in_planning_mode_is_a_no_op() {
    let fx = new_fixture();
    let session = create_session(&fx, "already-planning");
    fx.jarvis.toggle(&session.id, true).expect("toggle on");
    let cli = cli_id("cli-1");
    fx.registry.link_cli(&session.id, cli.clone(), None).expect("link");

    fx.jarvis.on_stop(&cli).expect("on stop is a no-op outside execution mode");

    let after = fx.store.get_session(&session.id).expect("exists");
    assert_eq!(after.mode, JarvisMode::Planning);

    fx.pty.kill(&session.terminal_id).expect("kill");
}
