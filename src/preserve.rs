//! Carries fields the Qovery API never echoes back from prior state.
//!
//! Secret values are write-only and descriptions are returned in a form that
//! does not round-trip (an unset description can come back populated), so
//! when state is rebuilt from an API response those fields are taken from the
//! previous state entry with the same key.

use crate::collection::{Keyed, find_by_key};

pub trait Preserve: Keyed {
    /// Copies preserved fields, explicit nulls included, from the prior entry.
    fn carry_from(&mut self, prior: &Self);

    /// Resets preserved fields to null for entries state has never seen.
    fn reset_preserved(&mut self);
}

/// Backfills `item` from the `old` entry sharing its key.
pub fn backfill<T: Preserve>(mut item: T, old: &[T]) -> T {
    let prior = find_by_key(old, &item.key());
    match prior {
        Some(prior) => item.carry_from(prior),
        None => item.reset_preserved(),
    }
    item
}

pub fn backfill_all<T: Preserve>(items: Vec<T>, old: &[T]) -> Vec<T> {
    items.into_iter().map(|item| backfill(item, old)).collect()
}
