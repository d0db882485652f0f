// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cso - the session orchestrator's command-line surface: the External Tool
//! Invoker entrypoint (§4.9) the embedded AI CLI calls out to, plus a
//! handful of session-inspection commands for scripting and debugging.

mod client;
mod commands;
mod env;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::session::SessionArgs;

#[derive(Parser)]
#[command(name = "cso", version, about = "Session orchestrator control CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the daemon's control socket is reachable
    Ping,
    /// Session management
    Session(SessionArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ping => commands::ping().await,
        Commands::Session(args) => commands::session::run(args).await,
    };

    match result {
        Ok(output) => {
            println!("{output}");
            Ok(())
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
