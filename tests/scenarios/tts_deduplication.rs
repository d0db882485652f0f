//! Scenario 5: in planning mode, repeated `assistantText` events carrying
//! the same text must not re-trigger text-to-speech; only a change in text
//! produces a new `Tts` broadcast.

use cso_core::Broadcast;

use crate::prelude::*;

async fn next_tts(rx: &mut tokio::sync::mpsc::UnboundedReceiver<Broadcast>) -> Option<String> {
    while let Some(event) = rx.recv().await {
        if let Broadcast::Tts { text, .. } = event {
            return Some(text);
        }
    }
    None
}

#[tokio::test]
async fn identical_assistant_text_is_not_spoken_twice() {
    let mut fx = new_fixture();
    let session = create_session(&fx, "tts");
    fx.jarvis.toggle(&session.id, true).expect("toggle on");
    let cli = cli_id("cli-1");
    fx.registry.link_cli(&session.id, cli.clone(), None).expect("link");

    fx.jarvis.on_assistant_text(&cli, "hello there").expect("first text");
    fx.jarvis.on_assistant_text(&cli, "hello there").expect("duplicate text");
    fx.jarvis.on_assistant_text(&cli, "a new thought").expect("distinct text");

    let first = next_tts(&mut fx.broadcast_rx).await.expect("first tts");
    assert_eq!(first, "hello there");
    let second = next_tts(&mut fx.broadcast_rx).await.expect("second tts");
    assert_eq!(second, "a new thought");

    let now = fx.store.get_session(&session.id).expect("exists");
    assert_eq!(now.last_assistant_text.as_deref(), Some("a new thought"));

    fx.pty.kill(&session.terminal_id).expect("kill");
}

#[tokio::test]
async fn assistant_text_outside_planning_mode_is_not_spoken() {
    let fx = new_fixture();
    let session = create_session(&fx, "execution-mode");
    fx.jarvis.toggle(&session.id, true).expect("toggle on");
    fx.registry.update_plan(&session.id, "plan").expect("set plan");
    fx.jarvis.execute_plan(&session.id).expect("execute plan");

    let resumed = cli_id("cli-resumed");
    fx.registry.link_cli(&session.id, resumed.clone(), None).expect("link resumed cli");
    fx.jarvis.on_assistant_text(&resumed, "narrating the execution").expect("text during execution");

    let now = fx.store.get_session(&session.id).expect("exists");
    assert!(now.last_assistant_text.is_none());

    fx.pty.kill(&session.terminal_id).expect("kill");
}
