//! Single-writer update loop around a [`Ledger`].
//!
//! Step readings and goal changes arrive on an mpsc channel and are applied
//! one at a time on one task; each ingest, including its store write,
//! finishes before the next message is read. Observers subscribe to
//! [`LedgerEvent`]s on a broadcast channel.

use tokio::sync::{broadcast, mpsc};

use crate::error::CoreError;
use crate::events::{LedgerEvent, StepEvent};
use crate::ledger::{Ledger, LedgerSnapshot};
use crate::progress::calendar_day;
use crate::storage::ProgressStore;

/// Capacity of the outbound event channel. Slow subscribers see `Lagged`.
pub const EVENT_CAPACITY: usize = 64;

pub struct LedgerService<S: ProgressStore> {
    ledger: Ledger<S>,
    events: broadcast::Sender<LedgerEvent>,
}

impl<S: ProgressStore> LedgerService<S> {
    pub fn new(ledger: Ledger<S>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { ledger, events }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    pub fn ledger(&self) -> &Ledger<S> {
        &self.ledger
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.ledger.snapshot()
    }

    /// Consume messages until the channel closes or `Shutdown` arrives,
    /// then hand the ledger back.
    pub async fn run(mut self, mut inbox: mpsc::Receiver<StepEvent>) -> Ledger<S> {
        while let Some(event) = inbox.recv().await {
            if !self.handle(event) {
                break;
            }
        }
        tracing::debug!("ledger service stopped");
        self.ledger
    }

    /// Apply one message. Returns `false` on shutdown.
    pub fn handle(&mut self, event: StepEvent) -> bool {
        match event {
            StepEvent::Steps { steps, at } => self.on_steps(steps, &at),
            StepEvent::GoalChanged { goal } => match self.ledger.set_goal(goal) {
                Ok(goal) => self.publish(LedgerEvent::GoalChanged { goal }),
                Err(e) => self.reject(e),
            },
            StepEvent::Shutdown => return false,
        }
        true
    }

    fn on_steps(&mut self, steps: i64, at: &chrono::DateTime<chrono::Local>) {
        let day = calendar_day(at);
        let was_absent = self.ledger.record_for(day).is_none();
        let streak_before = self.ledger.streak();

        let result = self.ledger.ingest_at(steps, at);
        if let Err(e) = &result {
            if !e.is_persistence() {
                let message = e.to_string();
                tracing::warn!("rejected reading: {message}");
                self.publish(LedgerEvent::Rejected { message });
                return;
            }
        }

        // Past here the in-memory update happened, stored or not.
        // A day evicted straight away by the window announces nothing.
        if let Some(record) = self.ledger.record_for(day).copied() {
            if was_absent {
                self.publish(LedgerEvent::DayStarted { date: day });
            }
            self.publish(LedgerEvent::StepsUpdated {
                date: record.date,
                steps: record.steps,
                goal_met: record.goal_met,
            });
        }
        let streak = self.ledger.streak();
        if streak != streak_before {
            self.publish(LedgerEvent::StreakChanged {
                from: streak_before,
                to: streak,
            });
        }
        if let Err(e) = result {
            self.publish(LedgerEvent::PersistFailed {
                message: e.to_string(),
            });
        }
    }

    fn reject(&self, error: CoreError) {
        let message = error.to_string();
        tracing::warn!("rejected update: {message}");
        self.publish(LedgerEvent::Rejected { message });
    }

    fn publish(&self, event: LedgerEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

/// Spawn the service on the current runtime.
///
/// Returns the inbox sender, an event receiver subscribed before the
/// first message, and the join handle yielding the ledger.
pub fn spawn<S>(
    ledger: Ledger<S>,
    inbox_capacity: usize,
) -> (
    mpsc::Sender<StepEvent>,
    broadcast::Receiver<LedgerEvent>,
    tokio::task::JoinHandle<Ledger<S>>,
)
where
    S: ProgressStore + Send + 'static,
{
    let (tx, rx) = mpsc::channel(inbox_capacity.max(1));
    let service = LedgerService::new(ledger);
    let events = service.subscribe();
    let handle = tokio::spawn(service.run(rx));
    (tx, events, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerOptions;
    use crate::error::StoreError;
    use crate::storage::MemoryStore;
    use chrono::{Local, TimeZone};

    fn noon(y: i32, m: u32, d: u32) -> chrono::DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn service() -> LedgerService<MemoryStore> {
        LedgerService::new(Ledger::new(MemoryStore::new(), LedgerOptions::default()))
    }

    /// Store that accepts reads but rejects every write.
    #[derive(Default)]
    struct ReadOnlyStore(MemoryStore);

    impl ProgressStore for ReadOnlyStore {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            self.0.get(key)
        }

        fn set(&mut self, key: &str, _value: &[u8]) -> Result<(), StoreError> {
            Err(StoreError::Rejected {
                key: key.to_string(),
                message: "read-only".into(),
            })
        }
    }

    fn drain(rx: &mut broadcast::Receiver<LedgerEvent>) -> Vec<LedgerEvent> {
        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            seen.push(event);
        }
        seen
    }

    #[test]
    fn failed_write_keeps_reading_and_reports_it_last() {
        let ledger = Ledger::new(ReadOnlyStore::default(), LedgerOptions::default());
        let mut svc = LedgerService::new(ledger);
        let mut rx = svc.subscribe();
        let at = noon(2026, 10, 18);
        let date = at.date_naive();

        assert!(svc.handle(StepEvent::Steps { steps: 4500, at }));

        let seen = drain(&mut rx);
        assert_eq!(seen.len(), 4);
        assert_eq!(seen[0], LedgerEvent::DayStarted { date });
        assert_eq!(
            seen[1],
            LedgerEvent::StepsUpdated {
                date,
                steps: 4500,
                goal_met: true
            }
        );
        assert_eq!(seen[2], LedgerEvent::StreakChanged { from: 0, to: 1 });
        assert!(matches!(&seen[3], LedgerEvent::PersistFailed { message } if message.contains("read-only")));
        assert_eq!(svc.ledger().record_for(date).unwrap().steps, 4500);
    }

    #[test]
    fn evicted_day_announces_nothing() {
        let options = LedgerOptions {
            history_window: 2,
            ..LedgerOptions::default()
        };
        let mut svc = LedgerService::new(Ledger::new(MemoryStore::new(), options));
        svc.handle(StepEvent::Steps {
            steps: 100,
            at: noon(2026, 10, 17),
        });
        svc.handle(StepEvent::Steps {
            steps: 100,
            at: noon(2026, 10, 18),
        });
        let mut rx = svc.subscribe();

        svc.handle(StepEvent::Steps {
            steps: 9000,
            at: noon(2026, 10, 1),
        });

        let seen = drain(&mut rx);
        assert!(!seen
            .iter()
            .any(|e| matches!(e, LedgerEvent::DayStarted { .. } | LedgerEvent::StepsUpdated { .. })));
        assert_eq!(svc.ledger().daily_progress().len(), 2);
    }

    #[test]
    fn first_reading_of_a_day_announces_it() {
        let mut svc = service();
        let mut rx = svc.subscribe();
        let at = noon(2026, 10, 18);
        assert!(svc.handle(StepEvent::Steps { steps: 4100, at }));

        let date = at.date_naive();
        assert_eq!(rx.try_recv().unwrap(), LedgerEvent::DayStarted { date });
        assert_eq!(
            rx.try_recv().unwrap(),
            LedgerEvent::StepsUpdated {
                date,
                steps: 4100,
                goal_met: true
            }
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            LedgerEvent::StreakChanged { from: 0, to: 1 }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn negative_reading_is_rejected() {
        let mut svc = service();
        let mut rx = svc.subscribe();
        svc.handle(StepEvent::Steps {
            steps: -1,
            at: noon(2026, 10, 18),
        });
        assert!(matches!(rx.try_recv().unwrap(), LedgerEvent::Rejected { .. }));
        assert!(svc.ledger().history().is_empty());
    }

    #[test]
    fn goal_change_is_published_and_bad_goal_rejected() {
        let mut svc = service();
        let mut rx = svc.subscribe();
        svc.handle(StepEvent::GoalChanged { goal: 9000 });
        svc.handle(StepEvent::GoalChanged { goal: 0 });
        assert_eq!(rx.try_recv().unwrap(), LedgerEvent::GoalChanged { goal: 9000 });
        assert!(matches!(rx.try_recv().unwrap(), LedgerEvent::Rejected { .. }));
        assert_eq!(svc.snapshot().daily_goal, 9000);
    }

    #[test]
    fn shutdown_stops_handling() {
        let mut svc = service();
        assert!(!svc.handle(StepEvent::Shutdown));
    }
}
