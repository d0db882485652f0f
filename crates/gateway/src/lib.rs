// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cso-gateway: the Client Gateway (§4.8/§4.9) — a broadcast WebSocket feed
//! for the browser UI, and a loopback Unix control socket for the CLI's
//! External Tool Invoker surface.

mod control;
mod protocol;
mod ws;

pub use control::{ControlCtx, ControlServer};
pub use protocol::{
    decode, encode, read_message, read_request, write_message, write_response, ControlRequest,
    ControlResponse, GatewayCommand, GatewayEvent, ProtocolError, SessionStatus, MAX_MESSAGE_SIZE,
};
pub use ws::WsGateway;
