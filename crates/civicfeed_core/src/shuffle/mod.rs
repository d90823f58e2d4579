//! Deterministic content-derived feed shuffle.
//!
//! # Responsibility
//! - Derive a reproducible seed from the titles of a content list.
//! - Permute the list with a seeded xorshift64* generator.
//!
//! # Invariants
//! - Identical title multisets always produce the identical permutation.
//! - No wall-clock time, OS randomness or persisted state is consulted.
//! - Generator state is local to one shuffle call.

mod rng;
mod seed;

pub use rng::XorShift64Star;
pub use seed::{compute_seed, key_token, FALLBACK_SEED};

use crate::model::list_item::Titled;

/// Returns `items` in the order derived from their titles.
pub fn shuffle<T: Titled>(mut items: Vec<T>) -> Vec<T> {
    shuffle_in_place(&mut items);
    items
}

/// Shuffles `items` in place using the seed derived from their titles.
pub fn shuffle_in_place<T: Titled>(items: &mut [T]) {
    if items.len() < 2 {
        return;
    }
    let seed = compute_seed(items.iter().map(Titled::title));
    permute_with_seed(items, seed);
}

/// Returns the shuffle permutation as source indices.
///
/// `order[k]` is the index in `titles` of the item that lands at position
/// `k`. Lets callers keep ownership of their own item structs.
pub fn shuffled_order<S: AsRef<str>>(titles: &[S]) -> Vec<usize> {
    let mut order = (0..titles.len()).collect::<Vec<_>>();
    if order.len() < 2 {
        return order;
    }
    let seed = compute_seed(titles.iter().map(AsRef::as_ref));
    permute_with_seed(&mut order, seed);
    order
}

/// Forward-walking Fisher-Yates driven by one freshly seeded generator.
///
/// Position `i` swaps with `i + bounded(len - i)` for every `i` but the
/// last, so a given `(len, seed)` pair always yields the same swaps.
pub fn permute_with_seed<T>(items: &mut [T], seed: u64) {
    let len = items.len();
    if len < 2 {
        return;
    }

    let mut rng = XorShift64Star::new(seed);
    for index in 0..len - 1 {
        let remaining = (len - index) as u64;
        let offset = rng.next_bounded(remaining) as usize;
        items.swap(index, index + offset);
    }
}
