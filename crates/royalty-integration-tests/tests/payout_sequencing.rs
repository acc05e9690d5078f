//! Integration test: per-track ordering under concurrent callers.
//!
//! 1. Concurrent revenue on one track lands one at a time, in receipt order
//! 2. Tracks do not block each other
//! 3. A second payout for a track is refused while the first is in flight
//! 4. A cancelled payout frees the track for the next one

use std::sync::Arc;
use std::time::Duration;

use royalty_integration_tests::{new_track, Fixture};
use royalty_pipeline::PipelineError;

#[tokio::test]
async fn test_concurrent_revenue_is_serialized() {
    let fx = Fixture::new();
    let id = fx
        .orchestrator
        .create_track(new_track("Crowd Noise", 60, 30, 10))
        .await
        .expect("create");

    let mut handles = Vec::new();
    for amount in 1..=8u64 {
        let orchestrator = Arc::clone(&fx.orchestrator);
        handles.push(tokio::spawn(async move { orchestrator.add_revenue(id, amount * 10).await }));
    }

    let mut sequences = Vec::new();
    for handle in handles {
        let receipt = handle.await.expect("task").expect("revenue");
        sequences.push(receipt.sequence);
    }
    sequences.sort_unstable();
    assert_eq!(sequences, (1..=8).collect::<Vec<u64>>());

    let info = fx.orchestrator.track_info(id).await.expect("info");
    assert_eq!(info.revenue_events, 8);
    assert_eq!(fx.ledger.inner().revenue_events(id).await.len(), 8);
}

#[tokio::test]
async fn test_payout_blocks_only_its_own_track() {
    let fx = Fixture::gated();
    fx.ledger.open_gate(4);
    let a = fx
        .orchestrator
        .create_track(new_track("Side A", 60, 30, 10))
        .await
        .expect("create");
    let b = fx
        .orchestrator
        .create_track(new_track("Side B", 60, 30, 10))
        .await
        .expect("create");
    fx.orchestrator.add_revenue(a, 100).await.expect("revenue");
    fx.orchestrator.add_revenue(b, 100).await.expect("revenue");

    // Park a payout for track A at the ledger.
    let payout = {
        let orchestrator = Arc::clone(&fx.orchestrator);
        tokio::spawn(async move { orchestrator.execute_payout(a, 100).await })
    };
    fx.ledger.wait_entered(5).await;

    // Track B still reaches the ledger.
    let revenue_b = {
        let orchestrator = Arc::clone(&fx.orchestrator);
        tokio::spawn(async move { orchestrator.add_revenue(b, 7).await })
    };
    tokio::time::timeout(Duration::from_secs(1), fx.ledger.wait_entered(6))
        .await
        .expect("track B not blocked by track A");

    fx.ledger.open_gate(2);
    payout.await.expect("task").expect("payout");
    revenue_b.await.expect("task").expect("revenue");
}

#[tokio::test]
async fn test_duplicate_payout_refused() {
    let fx = Fixture::gated();
    fx.ledger.open_gate(2);
    let id = fx
        .orchestrator
        .create_track(new_track("Double Take", 50, 30, 20))
        .await
        .expect("create");
    fx.orchestrator.add_revenue(id, 300).await.expect("revenue");

    let first = {
        let orchestrator = Arc::clone(&fx.orchestrator);
        tokio::spawn(async move { orchestrator.execute_payout(id, 300).await })
    };
    fx.ledger.wait_entered(3).await;

    let encrypts_before = fx.cipher.encrypt_calls();
    let second = fx.orchestrator.execute_payout(id, 300).await;
    assert_eq!(second.err(), Some(PipelineError::PayoutInFlight { track_id: id }));
    assert_eq!(fx.cipher.encrypt_calls(), encrypts_before, "refused before encrypting");

    fx.ledger.open_gate(1);
    first.await.expect("task").expect("payout");
    assert_eq!(fx.ledger.payouts(), 1);
    assert_eq!(fx.ledger.inner().payout_requests(id).await.len(), 1);
}

#[tokio::test]
async fn test_cancelled_payout_releases_track() {
    let fx = Fixture::gated();
    fx.ledger.open_gate(2);
    let id = fx
        .orchestrator
        .create_track(new_track("Second Chance", 50, 30, 20))
        .await
        .expect("create");
    fx.orchestrator.add_revenue(id, 300).await.expect("revenue");

    let parked = {
        let orchestrator = Arc::clone(&fx.orchestrator);
        tokio::spawn(async move { orchestrator.execute_payout(id, 300).await })
    };
    fx.ledger.wait_entered(3).await;
    assert!(fx.orchestrator.payout_in_flight(id));

    parked.abort();
    let _ = parked.await;
    assert!(!fx.orchestrator.payout_in_flight(id));

    fx.ledger.open_gate(1);
    let receipt = tokio::time::timeout(Duration::from_secs(1), fx.orchestrator.execute_payout(id, 300))
        .await
        .expect("track free after cancellation")
        .expect("payout");
    assert_eq!(receipt.track_id, id);
}
