//! Test assertions for contexts.

use crate::context::Context;
use std::collections::BTreeSet;

/// Asserts that every key in `keys` is present.
pub fn assert_has_keys(ctx: &Context, keys: &[&str]) {
    let missing: Vec<&str> = keys.iter().copied().filter(|k| !ctx.contains_key(k)).collect();
    assert!(
        missing.is_empty(),
        "Expected keys {:?} to be present. Keys: {:?}",
        missing,
        ctx.keys().collect::<Vec<_>>()
    );
}

/// Asserts that none of `keys` is present.
pub fn assert_lacks_keys(ctx: &Context, keys: &[&str]) {
    let present: Vec<&str> = keys.iter().copied().filter(|k| ctx.contains_key(k)).collect();
    assert!(
        present.is_empty(),
        "Expected keys {present:?} to be absent"
    );
}

/// Asserts that `after` holds every key of `before` plus exactly `added`.
pub fn assert_added_exactly(before: &Context, after: &Context, added: &[&str]) {
    let before_keys: BTreeSet<&str> = before.keys().collect();
    let after_keys: BTreeSet<&str> = after.keys().collect();

    let dropped: Vec<&&str> = before_keys.difference(&after_keys).collect();
    assert!(dropped.is_empty(), "Run dropped keys {dropped:?}");

    let new_keys: BTreeSet<&str> = after_keys.difference(&before_keys).copied().collect();
    let expected: BTreeSet<&str> = added.iter().copied().filter(|k| !before_keys.contains(k)).collect();
    assert_eq!(
        new_keys, expected,
        "Expected the run to add {expected:?}, it added {new_keys:?}"
    );
}

/// Asserts that `key` holds the boolean `expected`.
pub fn assert_flag(ctx: &Context, key: &str, expected: bool) {
    let actual = ctx.get(key).and_then(|v| v.as_flag());
    assert_eq!(
        actual,
        Some(expected),
        "Expected '{key}' to be {expected}, got {:?}",
        ctx.get(key)
    );
}

/// Asserts that `key` holds the text `expected`.
pub fn assert_text(ctx: &Context, key: &str, expected: &str) {
    let actual = ctx.get(key).and_then(|v| v.as_text());
    assert_eq!(
        actual,
        Some(expected),
        "Expected '{key}' to be {expected:?}, got {:?}",
        ctx.get(key)
    );
}
