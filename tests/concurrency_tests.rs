//! Concurrency tests against the public engine API
//!
//! These drive many tasks at once on a multi-threaded runtime and check the
//! ledger invariants once everything has settled.

use point_ledger::{EngineConfig, LedgerEngine, LedgerError, Points, TransactionRecord, UserId};
use rstest::rstest;

fn net_history(engine: &LedgerEngine, user_id: UserId) -> Points {
    engine
        .get_history(user_id)
        .iter()
        .map(TransactionRecord::signed_amount)
        .sum()
}

#[rstest]
#[case::single_user(1)]
#[case::few_users(4)]
#[case::many_users(64)]
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_mixed_load_keeps_balance_equal_to_history(#[case] users: u64) {
    let engine = LedgerEngine::in_memory(EngineConfig::default());
    let mut tasks = Vec::new();

    for i in 0..1000u64 {
        let engine = engine.clone();
        let user_id = i % users;
        tasks.push(tokio::spawn(async move {
            match i % 5 {
                0 | 1 => engine.charge(user_id, 10).await,
                2 => engine.charge(user_id, 0).await,
                _ => engine.use_points(user_id, 9).await,
            }
        }));
    }

    for task in tasks {
        match task.await.unwrap() {
            Ok(balance) => assert!(balance.points >= 0),
            Err(LedgerError::InvalidAmount { .. }) | Err(LedgerError::InsufficientBalance { .. }) => {}
            Err(e) => panic!("Unexpected error: {:?}", e),
        }
    }

    for user_id in 0..users {
        assert_eq!(engine.get_balance(user_id).points, net_history(&engine, user_id));
    }
    assert_eq!(engine.active_users(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_queries_do_not_wait_for_mutations() {
    let engine = LedgerEngine::in_memory(EngineConfig::default());
    engine.charge(1, 100).await.unwrap();

    let writer = {
        let engine = engine.clone();
        tokio::spawn(async move {
            for _ in 0..500 {
                engine.charge(1, 1).await.unwrap();
            }
        })
    };

    // Reads observe some committed prefix of the writes.
    let mut last = 0;
    while !writer.is_finished() {
        let points = engine.get_balance(1).points;
        assert!(points >= last);
        last = points;
        tokio::task::yield_now().await;
    }
    writer.await.unwrap();

    assert_eq!(engine.get_balance(1).points, 600);
    assert_eq!(engine.get_history(1).len(), 501);
}
