//! Bounded-concurrency fan-out for independent gateway calls.
//!
//! Per-chunk classification and metadata extraction are data-independent,
//! so they run as concurrent tasks behind a semaphore with a fixed
//! parallelism cap. Results are reassembled in input order, keeping
//! downstream behavior deterministic with respect to ordering. Everything
//! that depends on a previous stage's output stays sequential.

use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Apply an async operation to every item with at most `parallelism`
/// in flight at once. The output vector is in input order. The first
/// task error aborts the whole fan-out and propagates.
pub async fn map_bounded<T, R, F, Fut>(parallelism: usize, items: Vec<T>, f: F) -> Result<Vec<R>>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(usize, T) -> Fut,
    Fut: Future<Output = Result<R>> + Send + 'static,
{
    let total = items.len();
    let semaphore = Arc::new(Semaphore::new(parallelism.max(1)));
    let mut set: JoinSet<Result<(usize, R)>> = JoinSet::new();

    for (index, item) in items.into_iter().enumerate() {
        let permit_source = Arc::clone(&semaphore);
        let fut = f(index, item);
        set.spawn(async move {
            let _permit = permit_source
                .acquire_owned()
                .await
                .context("fan-out semaphore closed")?;
            let result = fut.await?;
            Ok((index, result))
        });
    }

    let mut slots: Vec<Option<R>> = (0..total).map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        let (index, result) = joined.context("fan-out task panicked")??;
        slots[index] = Some(result);
    }

    slots
        .into_iter()
        .map(|slot| slot.context("fan-out task produced no result"))
        .collect()
}
