//! Bounded, order-preserving concurrent execution.
//!
//! Each unit of work may spawn a subprocess or open a socket, so fan-out is
//! capped at a fixed number of in-flight workers. Results are stored by
//! input index, so output order never depends on completion order.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::join_all;
use parking_lot::Mutex;

/// Run `worker` over every item with at most `limit` invocations in flight.
///
/// The returned vector has the same length as `items` and slot `i` holds
/// the result for `items[i]`. Workers run cooperatively on the calling
/// task; a `limit` of 0 is treated as 1. Failures must be represented in
/// `R` by the worker itself.
pub async fn run_bounded<T, R, F, Fut>(items: &[T], limit: usize, worker: F) -> Vec<R>
where
    F: Fn(&T, usize) -> Fut,
    Fut: Future<Output = R>,
{
    let total = items.len();
    if total == 0 {
        return Vec::new();
    }

    let next = AtomicUsize::new(0);
    let slots: Mutex<Vec<Option<R>>> = Mutex::new((0..total).map(|_| None).collect());

    let pool_size = limit.max(1).min(total);
    let (next_ref, slots_ref, worker_ref) = (&next, &slots, &worker);
    let workers = (0..pool_size).map(|_| async move {
        loop {
            let index = next_ref.fetch_add(1, Ordering::SeqCst);
            let Some(item) = items.get(index) else {
                break;
            };
            let result = worker_ref(item, index).await;
            slots_ref.lock()[index] = Some(result);
        }
    });
    join_all(workers).await;

    let results: Vec<R> = slots.into_inner().into_iter().flatten().collect();
    debug_assert_eq!(results.len(), total, "every slot is filled exactly once");
    results
}
