//! Concurrency-limited parallel iteration utilities.
//!
//! Wraps rayon's `par_iter` to process items in parallel while limiting
//! the number of items in flight at once, so that large per-item results
//! (for example full-size images) never pile up in memory.

use rayon::prelude::*;

/// Maps `f` over `items` in parallel, with at most `max_concurrent` items in flight.
///
/// Semantically equivalent to `items.par_iter().map(f).collect()`, but processes
/// items in chunks of `max_concurrent` to limit resource usage.
///
/// # Panics
///
/// Panics if `max_concurrent` is 0.
pub fn par_map_limited<T, R, F>(items: &[T], max_concurrent: usize, f: F) -> Vec<R>
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
{
    assert!(max_concurrent > 0, "max_concurrent must be > 0");

    let mut results = Vec::with_capacity(items.len());
    for chunk in items.chunks(max_concurrent) {
        let chunk_results: Vec<R> = chunk.par_iter().map(&f).collect();
        results.extend(chunk_results);
    }
    results
}

/// Maps `f` over `items` chunk by chunk and hands every result to `consume`
/// on the calling thread, in input order, before the next chunk starts.
///
/// `proceed` is polled before each chunk; returning `false` stops the walk.
/// Returns the number of items that were mapped and consumed.
///
/// # Panics
///
/// Panics if `max_concurrent` is 0.
pub fn par_map_streamed<T, R, F, C, P>(
    items: &[T],
    max_concurrent: usize,
    f: F,
    mut consume: C,
    mut proceed: P,
) -> usize
where
    T: Sync,
    R: Send,
    F: Fn(&T) -> R + Sync,
    C: FnMut(&T, R),
    P: FnMut() -> bool,
{
    assert!(max_concurrent > 0, "max_concurrent must be > 0");

    let mut done = 0;
    for chunk in items.chunks(max_concurrent) {
        if !proceed() {
            break;
        }
        let chunk_results: Vec<R> = chunk.par_iter().map(&f).collect();
        for (item, result) in chunk.iter().zip(chunk_results) {
            consume(item, result);
            done += 1;
        }
    }
    done
}
