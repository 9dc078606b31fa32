//! Rate-limited concurrent dispatch with order-preserving collection.
//!
//! This is the core of batch processing: a bounded pool of concurrent
//! workers pulls items off a shared stream, each gated by the rate limiter,
//! and results are reassembled positionally so output order always matches
//! input order regardless of completion order.

use crate::limiter::RateLimiter;
use futures_util::stream::{self, StreamExt};
use std::future::Future;
use tracing::info;

/// How often a progress event is emitted, in completed items.
pub const PROGRESS_INTERVAL: usize = 100;

/// Run `worker_fn` over every item with bounded concurrency and rate
/// limiting, returning results in input order.
///
/// At most `pool_size` workers run at once (floored at 1); each acquires a
/// permit from `limiter` before invoking `worker_fn`. Results land in a
/// positional array indexed by the item's original position, so completion
/// order never leaks into the output.
///
/// `worker_fn` is infallible here; callers isolate per-item failures into
/// their result type before they reach the dispatcher.
pub async fn dispatch<T, R, F, Fut>(
    items: Vec<T>,
    pool_size: usize,
    limiter: &RateLimiter,
    worker_fn: F,
) -> Vec<R>
where
    F: Fn(T) -> Fut,
    Fut: Future<Output = R>,
{
    let total = items.len();
    let pool_size = pool_size.max(1);
    let worker_fn = &worker_fn;

    let mut results: Vec<Option<R>> = std::iter::repeat_with(|| None).take(total).collect();
    let mut completed = 0usize;

    let mut in_flight = stream::iter(items.into_iter().enumerate())
        .map(move |(index, item)| async move {
            limiter.acquire().await;
            (index, worker_fn(item).await)
        })
        .buffer_unordered(pool_size);

    while let Some((index, result)) = in_flight.next().await {
        results[index] = Some(result);
        completed += 1;
        if completed % PROGRESS_INTERVAL == 0 {
            info!("processed {} of {} items", completed, total);
        }
    }
    drop(in_flight);

    // Every index was written exactly once.
    results.into_iter().flatten().collect()
}
