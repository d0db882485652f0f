// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup: single-instance lock, directory creation, logging setup
//! — grounded in the teacher's `lifecycle.rs` (`fs2`-based exclusive lock on
//! a PID file) and `main.rs`'s `setup_logging`.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use fs2::FileExt;
use thiserror::Error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory")]
    NoStateDir,
    #[error("another cso daemon instance is already running")]
    LockFailed(#[source] std::io::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Holds the exclusive lock on `daemon.pid` for the process lifetime;
/// dropping it releases the lock.
pub struct InstanceLock {
    #[allow(dead_code)]
    file: File,
}

pub fn acquire_lock(lock_path: &Path) -> Result<InstanceLock, LifecycleError> {
    if let Some(parent) = lock_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::options().create(true).write(true).truncate(false).open(lock_path)?;
    file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    let mut file = file;
    file.set_len(0)?;
    writeln!(file, "{}", std::process::id())?;

    Ok(InstanceLock { file })
}

pub fn setup_logging(config: &Config) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_name = config.log_path.file_name().ok_or(LifecycleError::NoStateDir)?;
    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().ok_or(LifecycleError::NoStateDir)?,
        file_name,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(non_blocking)).init();

    Ok(guard)
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
