//! Integration tests for the channel-driven ledger service.

use chrono::{Duration, Local, TimeZone};
use goalr_core::service;
use goalr_core::{Ledger, LedgerEvent, LedgerOptions, MemoryStore, StepEvent};

fn at_hour(days_ago: i64, hour: u32) -> chrono::DateTime<Local> {
    let day = Local::now().date_naive() - Duration::days(days_ago);
    Local
        .from_local_datetime(&day.and_hms_opt(hour, 0, 0).unwrap())
        .earliest()
        .unwrap()
}

#[tokio::test]
async fn test_readings_are_applied_in_order() {
    let ledger = Ledger::new(MemoryStore::new(), LedgerOptions::default());
    let (tx, _events, handle) = service::spawn(ledger, 8);

    for steps in [1200, 3400, 2900] {
        tx.send(StepEvent::Steps {
            steps,
            at: at_hour(0, 12),
        })
        .await
        .unwrap();
    }
    drop(tx);

    let ledger = handle.await.unwrap();
    assert_eq!(ledger.daily_progress().len(), 1);
    assert_eq!(ledger.current_steps(), 2900);
}

#[tokio::test]
async fn test_observers_see_streak_and_goal_changes() {
    let ledger = Ledger::new(MemoryStore::new(), LedgerOptions::default());
    let (tx, mut events, handle) = service::spawn(ledger, 8);

    tx.send(StepEvent::GoalChanged { goal: 3000 }).await.unwrap();
    tx.send(StepEvent::Steps {
        steps: 3500,
        at: at_hour(1, 20),
    })
    .await
    .unwrap();
    tx.send(StepEvent::Shutdown).await.unwrap();

    let ledger = handle.await.unwrap();
    assert_eq!(ledger.daily_goal(), 3000);

    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert_eq!(seen[0], LedgerEvent::GoalChanged { goal: 3000 });
    assert!(seen
        .iter()
        .any(|e| matches!(e, LedgerEvent::StepsUpdated { steps: 3500, goal_met: true, .. })));
    assert!(seen
        .iter()
        .any(|e| *e == LedgerEvent::StreakChanged { from: 0, to: 1 }));
}

#[tokio::test]
async fn test_messages_after_shutdown_are_ignored() {
    let ledger = Ledger::new(MemoryStore::new(), LedgerOptions::default());
    let (tx, _events, handle) = service::spawn(ledger, 8);

    tx.send(StepEvent::Shutdown).await.unwrap();
    let _ = tx
        .send(StepEvent::Steps {
            steps: 10,
            at: at_hour(0, 9),
        })
        .await;

    let ledger = handle.await.unwrap();
    assert!(ledger.history().is_empty());
}
