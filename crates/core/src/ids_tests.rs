// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn distinct_id_types_do_not_compare_equal_across_kinds() {
    let session = SessionId::new("abc");
    let terminal = TerminalId::new("abc");
    // Same underlying string, but the type system keeps them apart; this
    // just exercises Display/as_str parity, not cross-type equality (which
    // would not compile).
    assert_eq!(session.as_str(), terminal.as_str());
}

#[test]
fn display_matches_as_str() {
    let id = CliSessionId::new("cli-1");
    assert_eq!(format!("{id}"), "cli-1");
}
