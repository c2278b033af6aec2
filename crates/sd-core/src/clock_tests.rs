// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_starts_at_unix_epoch() {
    let clock = FakeClock::new();
    assert_eq!(clock.utc_now(), DateTime::<Utc>::UNIX_EPOCH);
}

#[test]
fn fake_clock_advance_moves_wall_clock_only() {
    let clock = FakeClock::new();
    let before = clock.now();
    clock.advance(Duration::from_secs(30));
    assert_eq!(clock.now(), before);
    assert_eq!(
        clock.utc_now(),
        DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::seconds(30)
    );
}

#[test]
fn fake_clock_shares_offset_across_clones() {
    let clock = FakeClock::new();
    let clone = clock.clone();
    clock.advance(Duration::from_secs(5));
    assert_eq!(clone.utc_now(), clock.utc_now());
}
