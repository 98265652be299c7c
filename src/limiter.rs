//! Bounded-concurrency task runner
//!
//! Runs a batch of asynchronous tasks with at most `limit` in flight at
//! once. Tasks start in FIFO order, a queued task starts as soon as any
//! in-flight one settles, and the output array corresponds position by
//! position to the input. Individual task failures are absorbed to `None`
//! so one bad task never rejects the batch.

use futures::stream::{self, StreamExt};
use futures::Future;
use tracing::error;

pub async fn run_limited<T, F>(tasks: Vec<F>, limit: usize) -> Vec<Option<T>>
where
    F: Future<Output = anyhow::Result<T>>,
{
    let limit = limit.max(1);
    stream::iter(tasks.into_iter().map(|task| async move {
        match task.await {
            Ok(value) => Some(value),
            Err(err) => {
                error!(error = %err, "limited task failed");
                None
            }
        }
    }))
    .buffered(limit)
    .collect()
    .await
}
