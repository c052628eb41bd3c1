// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn signal_variants_are_distinct() {
    assert_ne!(Signal::Usr1, Signal::Hup);
    assert_ne!(Signal::Term, Signal::Kill);
}
