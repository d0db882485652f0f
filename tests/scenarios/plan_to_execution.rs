//! Scenario 3: planning -> execution via the `execute-plan` tool. Requires
//! Jarvis enabled, mode already Planning, and a non-empty plan on file.

use cso_core::JarvisMode;

use crate::prelude::*;

#[tokio::test]
async fn execute_plan_transitions_to_execution_and_clears_the_cli_binding() {
    let fx = new_fixture();
    let session = create_session(&fx, "plan");

    fx.jarvis.toggle(&session.id, true).expect("toggle on");
    fx.registry.link_cli(&session.id, cli_id("cli-1"), None).expect("bind cli");
    fx.registry.update_plan(&session.id, "ship the feature").expect("set plan");

    let before = fx.store.get_session(&session.id).expect("exists");
    assert!(before.can_execute_plan());

    fx.jarvis.execute_plan(&session.id).expect("execute plan");

    let after = fx.store.get_session(&session.id).expect("exists");
    assert_eq!(after.mode, JarvisMode::Execution);
    assert!(after.cli_session_id.is_none());
    assert!(after.last_message_id.is_none());

    fx.pty.kill(&session.terminal_id).expect("kill");
}

#[tokio::test]
async fn execute_plan_is_rejected_without_jarvis_enabled() {
    let fx = new_fixture();
    let session = create_session(&fx, "no-jarvis");
    fx.registry.update_plan(&session.id, "a plan").expect("set plan");

    let result = fx.jarvis.execute_plan(&session.id);
    assert!(result.is_err());

    fx.pty.kill(&session.terminal_id).expect("kill");
}

#[tokio::test]
async fn execute_plan_is_rejected_with_an_empty_plan() {
    let fx = new_fixture();
    let session = create_session(&fx, "empty-plan");
    fx.jarvis.toggle(&session.id, true).expect("toggle on");

    let result = fx.jarvis.execute_plan(&session.id);
    assert!(result.is_err());

    fx.pty.kill(&session.terminal_id).expect("kill");
}
