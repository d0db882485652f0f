use super::*;
use cso_core::{CliSessionId, SessionId, TerminalId};
use std::io::Cursor;

#[test]
fn gateway_event_round_trips_through_json() {
    let event = GatewayEvent::TerminalOutput { terminal_id: TerminalId::new("t1"), bytes: vec![1, 2, 3] };
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("\"type\":\"terminalOutput\""));
    let back: GatewayEvent = serde_json::from_str(&json).unwrap();
    match back {
        GatewayEvent::TerminalOutput { terminal_id, bytes } => {
            assert_eq!(terminal_id, TerminalId::new("t1"));
            assert_eq!(bytes, vec![1, 2, 3]);
        }
        other => panic!("unexpected variant: {other:?}"),
    }
}

#[test]
fn gateway_command_tag_uses_camel_case() {
    let command = GatewayCommand::SessionToggleJarvis { session_id: SessionId::new("s1"), jarvis_mode: true };
    let json = serde_json::to_string(&command).unwrap();
    assert!(json.contains("\"type\":\"sessionToggleJarvis\""));
    assert!(json.contains("\"jarvisMode\":true"));
}

#[test]
fn control_request_round_trips() {
    let request = ControlRequest::SetPlan { session_id: SessionId::new("s1"), plan: "do the thing".into() };
    let json = serde_json::to_vec(&request).unwrap();
    let back: ControlRequest = decode(&json).unwrap();
    assert_eq!(back, request);
}

#[test]
fn decode_rejects_garbage() {
    let err = decode::<ControlRequest>(b"not json").unwrap_err();
    assert!(matches!(err, ProtocolError::Json(_)));
}

#[tokio::test]
async fn write_message_then_read_message_recovers_the_payload() {
    let mut buf = Vec::new();
    write_message(&mut buf, b"hello").await.unwrap();

    let mut cursor = Cursor::new(buf);
    let out = read_message(&mut cursor).await.unwrap();
    assert_eq!(out, b"hello");
}

#[tokio::test]
async fn read_message_on_empty_stream_is_connection_closed() {
    let mut cursor = Cursor::new(Vec::<u8>::new());
    let err = read_message(&mut cursor).await.unwrap_err();
    assert!(matches!(err, ProtocolError::ConnectionClosed));
}

#[tokio::test]
async fn read_request_then_write_response_round_trip_over_a_socket_pair() {
    let (mut a, mut b) = tokio::io::duplex(4096);

    let request = ControlRequest::ExecutePlan { session_id: SessionId::new("s1") };
    write_message(&mut a, &encode(&request).unwrap()).await.unwrap();
    let got = read_request(&mut b).await.unwrap();
    assert_eq!(got, request);

    let response = ControlResponse::Error { message: "session not executing planning".into() };
    write_response(&mut a, &response).await.unwrap();
    let bytes = read_message(&mut b).await.unwrap();
    let got_response: ControlResponse = decode(&bytes).unwrap();
    assert_eq!(got_response, response);
}

#[test]
fn session_status_update_carries_cli_session_id() {
    let event = GatewayEvent::SessionStatusUpdate {
        cli_session_id: CliSessionId::new("cli-1"),
        status: SessionStatus::Ready,
    };
    let json = serde_json::to_string(&event).unwrap();
    assert!(json.contains("\"status\":\"ready\""));
}
