/// Tests for the batch fetch controller
/// Covers order preservation, partitioning, failure isolation, the
/// post-process contract and run-level cancellation.
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use company_harvest::batch::{run_batches, CancelToken, GroupOutput};
use company_harvest::errors::FetchErrorKind;
use company_harvest::models::{CompanyRecord, FetchOutcome, Identifier};

fn ids(n: i64) -> Vec<Identifier> {
    (0..n).map(Identifier::Numeric).collect()
}

fn record_for(id: Identifier) -> CompanyRecord {
    CompanyRecord {
        id,
        ..CompanyRecord::default()
    }
}

/// Succeeds after a delay inversely related to the identifier, so later
/// inputs complete earlier and completion order differs from input order.
fn reversed_delay_item(
    id: Identifier,
) -> impl std::future::Future<Output = FetchOutcome> + Send + 'static {
    async move {
        let delay = match &id {
            Identifier::Numeric(n) => 40u64.saturating_sub(*n as u64 * 2),
            Identifier::Text(_) => 0,
        };
        tokio::time::sleep(Duration::from_millis(delay)).await;
        FetchOutcome::Success(record_for(id))
    }
}

fn instant_item(
    id: Identifier,
) -> impl std::future::Future<Output = FetchOutcome> + Send + 'static {
    async move { FetchOutcome::Success(record_for(id)) }
}

#[tokio::test]
async fn output_order_matches_input_order_despite_completion_order() {
    let input = ids(20);
    let cancel = CancelToken::new();
    let out = run_batches(&input, reversed_delay_item, 7, None, &cancel).await;

    assert_eq!(out.len(), input.len());
    for (i, outcome) in out.iter().enumerate() {
        let record = outcome.record().expect("all items succeed");
        assert_eq!(record.id, input[i]);
    }
}

#[tokio::test]
async fn partitions_237_by_100_into_expected_group_sizes() {
    let sizes = Arc::new(Mutex::new(Vec::new()));
    let sizes_hook = Arc::clone(&sizes);
    let hook = move |group: Vec<FetchOutcome>| {
        sizes_hook.lock().unwrap().push(group.len());
        GroupOutput::Splice(group)
    };

    let cancel = CancelToken::new();
    let out = run_batches(&ids(237), instant_item, 100, Some(&hook), &cancel).await;

    assert_eq!(out.len(), 237);
    assert_eq!(*sizes.lock().unwrap(), vec![100, 100, 37]);
}

#[tokio::test]
async fn exact_multiple_yields_a_single_full_group() {
    let sizes = Arc::new(Mutex::new(Vec::new()));
    let sizes_hook = Arc::clone(&sizes);
    let hook = move |group: Vec<FetchOutcome>| {
        sizes_hook.lock().unwrap().push(group.len());
        GroupOutput::Splice(group)
    };

    let cancel = CancelToken::new();
    let out = run_batches(&ids(50), instant_item, 50, Some(&hook), &cancel).await;

    assert_eq!(out.len(), 50);
    assert_eq!(*sizes.lock().unwrap(), vec![50]);
}

#[tokio::test]
async fn concurrency_is_bounded_by_the_group_size() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_seen = Arc::new(AtomicUsize::new(0));

    let in_flight_item = {
        let in_flight = Arc::clone(&in_flight);
        let max_seen = Arc::clone(&max_seen);
        move |id: Identifier| {
            let in_flight = Arc::clone(&in_flight);
            let max_seen = Arc::clone(&max_seen);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
                FetchOutcome::Success(record_for(id))
            }
        }
    };

    let cancel = CancelToken::new();
    let out = run_batches(&ids(10), in_flight_item, 5, None, &cancel).await;

    assert_eq!(out.len(), 10);
    assert_eq!(max_seen.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn one_failure_among_many_is_isolated() {
    let failing = Identifier::Numeric(63);
    let item = {
        let failing = failing.clone();
        move |id: Identifier| {
            let failing = failing.clone();
            async move {
                if id == failing {
                    FetchOutcome::failure(id, FetchErrorKind::HttpStatus, "endpoint returned 503")
                } else {
                    FetchOutcome::Success(record_for(id))
                }
            }
        }
    };

    let cancel = CancelToken::new();
    let out = run_batches(&ids(100), item, 25, None, &cancel).await;

    assert_eq!(out.len(), 100);
    assert_eq!(out.iter().filter(|o| o.is_success()).count(), 99);

    let failure = out.iter().find(|o| o.is_failure()).unwrap();
    match failure {
        FetchOutcome::Failure { id, kind, .. } => {
            assert_eq!(*id, failing);
            assert_eq!(*kind, FetchErrorKind::HttpStatus);
        }
        FetchOutcome::Success(_) => unreachable!(),
    }
    // The failure sits at its input position
    assert!(out[63].is_failure());
}

#[tokio::test]
async fn post_process_discard_drops_the_whole_group() {
    let hook = |_: Vec<FetchOutcome>| GroupOutput::Discard;
    let cancel = CancelToken::new();
    let out = run_batches(&ids(10), instant_item, 10, Some(&hook), &cancel).await;
    assert!(out.is_empty());
}

#[tokio::test]
async fn post_process_append_adds_exactly_one_summary_entry() {
    let hook = |group: Vec<FetchOutcome>| {
        let successes = group.iter().filter(|o| o.is_success()).count();
        GroupOutput::Append(FetchOutcome::failure(
            Identifier::Text(format!("summary:{}", successes)),
            FetchErrorKind::Unexpected,
            "group summary",
        ))
    };

    let cancel = CancelToken::new();
    let out = run_batches(&ids(10), instant_item, 10, Some(&hook), &cancel).await;

    assert_eq!(out.len(), 1);
    match &out[0] {
        FetchOutcome::Failure { id, .. } => {
            assert_eq!(*id, Identifier::Text("summary:10".to_string()));
        }
        FetchOutcome::Success(_) => unreachable!(),
    }
}

#[tokio::test]
async fn post_process_splice_extends_by_the_returned_length() {
    let hook = |group: Vec<FetchOutcome>| {
        GroupOutput::Splice(group.into_iter().take(3).collect())
    };

    let cancel = CancelToken::new();
    let out = run_batches(&ids(10), instant_item, 10, Some(&hook), &cancel).await;
    assert_eq!(out.len(), 3);
}

#[tokio::test]
async fn cancellation_stops_at_the_next_group_boundary() {
    let cancel = CancelToken::new();
    let hook = {
        let cancel = cancel.clone();
        move |group: Vec<FetchOutcome>| {
            // Cancel after the first group has fully completed
            cancel.cancel();
            GroupOutput::Splice(group)
        }
    };

    let out = run_batches(&ids(30), instant_item, 10, Some(&hook), &cancel).await;

    // First group completes and is kept; the remaining two never start
    assert_eq!(out.len(), 10);
}
