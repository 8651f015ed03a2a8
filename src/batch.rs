use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::errors::FetchErrorKind;
use crate::models::{FetchOutcome, Identifier};

/// Run-level cancellation handle threaded through [`run_batches`].
///
/// Checked at each group boundary: a cancelled run finishes the in-flight
/// group (there is no partial-group cancellation) and returns what has been
/// accumulated so far. Per-item timeouts remain the only mid-group cutoff.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// What a post-process hook did with one completed group.
#[derive(Debug)]
pub enum GroupOutput {
    /// Drop the group's results entirely.
    Discard,
    /// Splice this list into the accumulator.
    Splice(Vec<FetchOutcome>),
    /// Append a single derived outcome.
    Append(FetchOutcome),
}

/// Per-group hook: receives the full result list for one completed group.
pub type PostProcess = dyn Fn(Vec<FetchOutcome>) -> GroupOutput + Send + Sync;

/// Runs `per_item` over `identifiers` in contiguous groups of `batch_size`.
///
/// Every member of a group runs concurrently; groups are strictly
/// sequential, which caps simultaneous open connections at `batch_size`.
/// Results are reassembled in input order regardless of completion order,
/// and a single item's failure never aborts the group or the run; it shows
/// up as a `Failure` outcome in the output sequence. A panicked fetch task
/// is folded into a `Failure` of kind `Unexpected` the same way.
pub async fn run_batches<F, Fut>(
    identifiers: &[Identifier],
    per_item: F,
    batch_size: usize,
    post_process: Option<&PostProcess>,
    cancel: &CancelToken,
) -> Vec<FetchOutcome>
where
    F: Fn(Identifier) -> Fut,
    Fut: Future<Output = FetchOutcome> + Send + 'static,
{
    let batch_size = batch_size.max(1);
    let total_groups = identifiers.len().div_ceil(batch_size);
    let mut results: Vec<FetchOutcome> = Vec::with_capacity(identifiers.len());

    for (index, group) in identifiers.chunks(batch_size).enumerate() {
        if cancel.is_cancelled() {
            tracing::warn!(
                "Run cancelled before group {}/{}; returning {} accumulated outcomes",
                index + 1,
                total_groups,
                results.len()
            );
            break;
        }

        tracing::info!(
            "Fetching group {}/{} ({} identifiers)",
            index + 1,
            total_groups,
            group.len()
        );

        // Spawn the whole group, then join in input order: positional
        // accumulation, not completion order.
        let handles: Vec<_> = group
            .iter()
            .map(|id| tokio::spawn(per_item(id.clone())))
            .collect();

        let joined = futures::future::join_all(handles).await;

        let mut group_results = Vec::with_capacity(group.len());
        for (join_result, id) in joined.into_iter().zip(group.iter()) {
            match join_result {
                Ok(outcome) => group_results.push(outcome),
                Err(e) => group_results.push(FetchOutcome::failure(
                    id.clone(),
                    FetchErrorKind::Unexpected,
                    format!("fetch task aborted: {}", e),
                )),
            }
        }

        match post_process {
            None => results.extend(group_results),
            Some(hook) => match hook(group_results) {
                GroupOutput::Discard => {}
                GroupOutput::Splice(items) => results.extend(items),
                GroupOutput::Append(item) => results.push(item),
            },
        }
    }

    results
}
