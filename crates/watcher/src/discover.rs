// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Enumerate the per-session log files under a watch root.
//!
//! Generalizes the teacher's `find_session_log`/`project_dir_name` (look up
//! one known project's one known session id) into "find every `*.jsonl`
//! under the root, deriving each stream's `cliSessionId` from its filename".

use cso_core::CliSessionId;
use std::path::{Path, PathBuf};

/// One discovered log file and the `cliSessionId` derived from its name.
pub struct DiscoveredLog {
    pub cli_session_id: CliSessionId,
    pub path: PathBuf,
}

/// Recursively enumerate `*.jsonl` files under `root`. Errors reading a
/// subdirectory are logged and skipped rather than aborting discovery.
pub fn discover_logs(root: &Path) -> Vec<DiscoveredLog> {
    let mut found = Vec::new();
    walk(root, &mut found);
    found
}

fn walk(dir: &Path, found: &mut Vec<DiscoveredLog>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };

    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            walk(&path, found);
            continue;
        }

        if path.extension().is_some_and(|ext| ext == "jsonl") {
            if let Some(cli_session_id) = cli_session_id_from_path(&path) {
                found.push(DiscoveredLog { cli_session_id, path });
            }
        }
    }
}

/// The log file's stem (minus `.jsonl`) is the `cliSessionId` — the same
/// convention the teacher relies on (`{session_id}.jsonl`).
pub fn cli_session_id_from_path(path: &Path) -> Option<CliSessionId> {
    path.file_stem().and_then(|stem| stem.to_str()).map(CliSessionId::new)
}

#[cfg(test)]
#[path = "discover_tests.rs"]
mod tests;
