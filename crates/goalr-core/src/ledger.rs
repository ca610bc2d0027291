//! Daily progress ledger.
//!
//! The ledger is the single owner of the step history. Each reading
//! replaces the count for its calendar day, the history is trimmed to
//! its window, written to the store, and the streak is recomputed.
//!
//! Readings are absolute daily totals, not deltas: a lower value than
//! the stored one (a health-data correction) still overwrites it.

use chrono::{DateTime, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, StoreError, ValidationError};
use crate::profile::{validate_goal, UserProfile, DEFAULT_DAILY_GOAL};
use crate::progress::{
    self, calendar_day, DailyRecord, GapPolicy, ProgressHistory, StreakCalculator, Upsert,
    WeeklySummary, HISTORY_WINDOW,
};
use crate::storage::{Config, ProgressStore, PROGRESS_KEY};

/// Construction settings, usually taken from [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerOptions {
    pub history_window: usize,
    pub gap_policy: GapPolicy,
    /// Goal used until a profile is found in the store.
    pub default_goal: u32,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            history_window: HISTORY_WINDOW,
            gap_policy: GapPolicy::default(),
            default_goal: DEFAULT_DAILY_GOAL,
        }
    }
}

impl LedgerOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            history_window: config.ledger.history_window,
            gap_policy: config.streak.gap_policy,
            default_goal: config.profile.default_goal,
        }
    }
}

/// What [`Ledger::load`] found in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// Nothing stored yet.
    Empty,
    /// History decoded successfully.
    Restored { records: usize },
    /// Stored history was unreadable and has been replaced by an empty one.
    Recovered { reason: String },
    /// The store itself could not be read. The stored history is left
    /// alone and saves are refused until a later load succeeds.
    Unavailable { reason: String },
}

/// Result of a successful ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestReport {
    /// `None` when the day fell outside the window and was evicted at once.
    pub record: Option<DailyRecord>,
    pub upsert: Upsert,
    pub streak_before: u32,
    pub streak: u32,
}

/// Read-only view handed to UI layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub current_steps: u64,
    /// Most recent last.
    pub daily_progress: Vec<DailyRecord>,
    pub streak: u32,
    pub daily_goal: u32,
}

pub struct Ledger<S: ProgressStore> {
    store: S,
    history: ProgressHistory,
    calculator: StreakCalculator,
    daily_goal: u32,
    current_steps: u64,
    streak: u32,
    /// Set when the last load could not read the store.
    unreadable: Option<String>,
}

impl<S: ProgressStore> Ledger<S> {
    /// Empty ledger over `store`. Call [`Ledger::load`] to restore state.
    pub fn new(store: S, options: LedgerOptions) -> Self {
        Self {
            store,
            history: ProgressHistory::new(options.history_window),
            calculator: StreakCalculator::with_policy(options.gap_policy),
            daily_goal: options.default_goal.max(1),
            current_steps: 0,
            streak: 0,
            unreadable: None,
        }
    }

    /// Build and load in one step, as done at startup.
    pub fn open(store: S, options: LedgerOptions) -> (Self, LoadStatus) {
        let mut ledger = Self::new(store, options);
        let status = ledger.load();
        (ledger, status)
    }

    /// Restore history and goal from the store. Never fails: unparseable
    /// state falls back to an empty history, and a store that cannot be
    /// read leaves the ledger empty but refusing to save.
    pub fn load(&mut self) -> LoadStatus {
        self.load_at(progress::today())
    }

    /// [`Ledger::load`] with an explicit "today".
    pub fn load_at(&mut self, today: NaiveDate) -> LoadStatus {
        self.reload_goal();

        let window = self.history.window();
        self.unreadable = None;
        let status = match self.store.get(PROGRESS_KEY) {
            Ok(None) => {
                self.history = ProgressHistory::new(window);
                LoadStatus::Empty
            }
            Ok(Some(bytes)) => match ProgressHistory::decode(&bytes, window, PROGRESS_KEY) {
                Ok(history) => {
                    self.history = history;
                    LoadStatus::Restored {
                        records: self.history.len(),
                    }
                }
                Err(e) => {
                    tracing::warn!("discarding stored progress: {e}");
                    self.history = ProgressHistory::new(window);
                    LoadStatus::Recovered {
                        reason: e.to_string(),
                    }
                }
            },
            Err(e) => {
                tracing::warn!("progress store unreadable, not saving until reloaded: {e}");
                self.history = ProgressHistory::new(window);
                self.unreadable = Some(e.to_string());
                LoadStatus::Unavailable {
                    reason: e.to_string(),
                }
            }
        };

        self.refresh(today);
        tracing::debug!(?status, streak = self.streak, "ledger loaded");
        status
    }

    /// Re-read the goal from the stored profile, keeping the current
    /// goal when no usable profile exists.
    pub fn reload_goal(&mut self) -> u32 {
        match UserProfile::load(&self.store) {
            Ok(Some(profile)) if profile.daily_goal > 0 => self.daily_goal = profile.daily_goal,
            Ok(_) => {}
            Err(e) => tracing::warn!("ignoring stored profile: {e}"),
        }
        self.daily_goal
    }

    /// Write the history to the store.
    ///
    /// # Errors
    /// `Persistence` if the store rejects the write. The in-memory history
    /// is unaffected and the next successful save catches the store up.
    /// Also `Persistence` while the store is unread (see [`LoadStatus::Unavailable`]);
    /// nothing is written then.
    pub fn save(&mut self) -> Result<(), CoreError> {
        if let Some(reason) = &self.unreadable {
            tracing::warn!("not overwriting unread progress: {reason}");
            return Err(StoreError::NotLoaded {
                key: PROGRESS_KEY.to_string(),
                message: reason.clone(),
            }
            .into());
        }
        let bytes = self.history.encode()?;
        self.store.set(PROGRESS_KEY, &bytes).map_err(|e| {
            tracing::warn!("failed to persist progress: {e}");
            CoreError::from(e)
        })
    }

    /// Apply a reading taken now.
    pub fn ingest(&mut self, steps: i64) -> Result<IngestReport, CoreError> {
        self.ingest_at(steps, &chrono::Local::now())
    }

    /// Apply a reading taken at `now`: the count for `now`'s calendar day
    /// becomes `steps`.
    ///
    /// # Errors
    /// `InvalidArgument` for negative `steps` (nothing changes).
    /// `Persistence` if the write fails; the in-memory update is kept.
    pub fn ingest_at<Tz: TimeZone>(
        &mut self,
        steps: i64,
        now: &DateTime<Tz>,
    ) -> Result<IngestReport, CoreError> {
        let day = calendar_day(now);
        self.apply(steps, day, day)
    }

    /// Set the count for a past day, e.g. from a delayed health-data sync.
    ///
    /// # Errors
    /// `InvalidArgument` for negative steps or a day after `today`.
    pub fn backfill(
        &mut self,
        steps: i64,
        day: NaiveDate,
        today: NaiveDate,
    ) -> Result<IngestReport, CoreError> {
        if day > today {
            return Err(ValidationError::InvalidValue {
                field: "date".into(),
                message: format!("{day} is in the future"),
            }
            .into());
        }
        self.apply(steps, day, today)
    }

    fn apply(
        &mut self,
        steps: i64,
        day: NaiveDate,
        today: NaiveDate,
    ) -> Result<IngestReport, CoreError> {
        let steps = u64::try_from(steps).map_err(|_| ValidationError::NegativeSteps(steps))?;

        let is_new_day = self.history.latest().is_none_or(|r| r.date < day);
        let upsert = self.history.upsert(day, steps, self.daily_goal);
        match upsert {
            Upsert::Inserted if is_new_day => tracing::info!(%day, "started a new day"),
            Upsert::Evicted => tracing::warn!(%day, "reading is older than the history window"),
            _ => {}
        }
        tracing::debug!(%day, steps, goal = self.daily_goal, "ingested steps");

        let streak_before = self.streak;
        self.refresh(today);

        let record = self.history.get(day).copied();

        self.save()?;

        Ok(IngestReport {
            record,
            upsert,
            streak_before,
            streak: self.streak,
        })
    }

    /// Change the goal used for future writes. Past records keep their
    /// `goal_met` as written.
    ///
    /// # Errors
    /// `InvalidArgument` unless `goal` is positive.
    /// Whether saves are currently refused because the store was unreadable at load.
    pub fn is_store_unread(&self) -> bool {
        self.unreadable.is_some()
    }

    pub fn set_goal(&mut self, goal: i64) -> Result<u32, CoreError> {
        let goal = validate_goal(goal)?;
        if goal != self.daily_goal {
            tracing::info!(from = self.daily_goal, to = goal, "daily goal changed");
            self.daily_goal = goal;
        }
        Ok(goal)
    }

    /// Recompute derived state for `today` (day rollover without a reading).
    pub fn refresh(&mut self, today: NaiveDate) {
        self.current_steps = self.history.get(today).map_or(0, |r| r.steps);
        let streak = self.calculator.calculate(self.history.records(), today);
        if streak != self.streak {
            tracing::info!(from = self.streak, to = streak, "streak changed");
        }
        self.streak = streak;
    }

    /// Record for `date` if retained.
    pub fn record_for(&self, date: NaiveDate) -> Option<&DailyRecord> {
        self.history.get(date)
    }

    pub fn history(&self) -> &ProgressHistory {
        &self.history
    }

    /// Records, most recent last.
    pub fn daily_progress(&self) -> &[DailyRecord] {
        self.history.records()
    }

    pub fn current_steps(&self) -> u64 {
        self.current_steps
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn daily_goal(&self) -> u32 {
        self.daily_goal
    }

    pub fn gap_policy(&self) -> GapPolicy {
        self.calculator.policy()
    }

    pub fn weekly_summary(&self, today: NaiveDate) -> WeeklySummary {
        WeeklySummary::build(&self.history, today, self.daily_goal)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            current_steps: self.current_steps,
            daily_progress: self.history.records().to_vec(),
            streak: self.streak,
            daily_goal: self.daily_goal,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, USER_KEY};
    use chrono::{Duration, Local, Utc};

    /// Store whose writes can be switched off.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_reads: bool,
        fail_writes: bool,
    }

    impl ProgressStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
            if self.fail_reads {
                return Err(StoreError::Database(crate::error::DatabaseError::Locked));
            }
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &[u8]) -> Result<(), StoreError> {
            if self.fail_writes {
                return Err(StoreError::Rejected {
                    key: key.to_string(),
                    message: "disk full".into(),
                });
            }
            self.inner.set(key, value)
        }
    }

    fn at(day: NaiveDate, hour: u32) -> DateTime<Utc> {
        day.and_hms_opt(hour, 0, 0).unwrap().and_utc()
    }

    fn day0() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 18).unwrap()
    }

    fn ledger() -> Ledger<MemoryStore> {
        Ledger::new(MemoryStore::new(), LedgerOptions::default())
    }

    #[test]
    fn same_day_ingest_is_idempotent() {
        let mut ledger = ledger();
        ledger.ingest_at(500, &at(day0(), 9)).unwrap();
        ledger.ingest_at(500, &at(day0(), 10)).unwrap();
        assert_eq!(ledger.daily_progress().len(), 1);
        assert_eq!(ledger.record_for(day0()).unwrap().steps, 500);
    }

    #[test]
    fn ingest_overwrites_instead_of_accumulating() {
        let mut ledger = ledger();
        ledger.ingest_at(300, &at(day0(), 9)).unwrap();
        let report = ledger.ingest_at(200, &at(day0(), 23)).unwrap();
        assert_eq!(ledger.record_for(day0()).unwrap().steps, 200);
        assert_eq!(ledger.current_steps(), 200);
        assert_eq!(
            report.upsert,
            Upsert::Replaced(DailyRecord::new(day0(), 300, DEFAULT_DAILY_GOAL))
        );
    }

    #[test]
    fn window_keeps_latest_thirty_days() {
        let mut ledger = ledger();
        let start = day0() - Duration::days(34);
        for offset in 0..35 {
            ledger
                .ingest_at(1000, &at(start + Duration::days(offset), 12))
                .unwrap();
        }
        assert_eq!(ledger.daily_progress().len(), 30);
        for offset in 0..5 {
            assert!(ledger.record_for(start + Duration::days(offset)).is_none());
        }
        assert!(ledger.record_for(start + Duration::days(5)).is_some());
    }

    #[test]
    fn goal_met_uses_active_goal() {
        let mut ledger = ledger();
        ledger.set_goal(4000).unwrap();
        assert!(!ledger.ingest_at(3999, &at(day0(), 8)).unwrap().record.unwrap().goal_met);
        assert!(ledger.ingest_at(4000, &at(day0(), 9)).unwrap().record.unwrap().goal_met);
    }

    #[test]
    fn streak_follows_history() {
        let mut ledger = ledger();
        ledger.ingest_at(1000, &at(day0() - Duration::days(2), 20)).unwrap();
        ledger.ingest_at(4200, &at(day0() - Duration::days(1), 20)).unwrap();
        let report = ledger.ingest_at(4500, &at(day0(), 20)).unwrap();
        assert_eq!(report.streak_before, 1);
        assert_eq!(report.streak, 2);
        assert_eq!(ledger.streak(), 2);
    }

    #[test]
    fn lowered_count_can_break_todays_streak() {
        let mut ledger = ledger();
        ledger.ingest_at(5000, &at(day0(), 10)).unwrap();
        assert_eq!(ledger.streak(), 1);
        ledger.ingest_at(100, &at(day0(), 11)).unwrap();
        assert_eq!(ledger.streak(), 0);
    }

    #[test]
    fn empty_ledger_has_nothing() {
        let mut ledger = ledger();
        assert_eq!(ledger.load_at(day0()), LoadStatus::Empty);
        assert_eq!(ledger.streak(), 0);
        assert!(ledger.record_for(day0()).is_none());
        assert_eq!(ledger.current_steps(), 0);
    }

    #[test]
    fn negative_steps_rejected_without_mutation() {
        let mut ledger = ledger();
        ledger.ingest_at(700, &at(day0(), 9)).unwrap();
        let before = ledger.snapshot();
        let stored = ledger.store().get(PROGRESS_KEY).unwrap();

        let err = ledger.ingest_at(-1, &at(day0(), 10)).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidArgument(ValidationError::NegativeSteps(-1))
        ));
        assert_eq!(ledger.snapshot(), before);
        assert_eq!(ledger.store().get(PROGRESS_KEY).unwrap(), stored);
    }

    #[test]
    fn corrupt_store_recovers_to_empty() {
        let mut store = MemoryStore::new();
        store.set(PROGRESS_KEY, b"\xff\x00not json").unwrap();
        let (ledger, status) = Ledger::open(store, LedgerOptions::default());
        assert!(matches!(status, LoadStatus::Recovered { .. }));
        assert!(ledger.history().is_empty());
        assert_eq!(ledger.streak(), 0);
    }

    #[test]
    fn load_restores_history_goal_and_today() {
        let mut store = MemoryStore::new();
        UserProfile::new("Ada", "ada", 6000)
            .unwrap()
            .save(&mut store)
            .unwrap();
        let mut first = Ledger::new(store, LedgerOptions::default());
        first.reload_goal();
        first.ingest_at(6500, &at(day0() - Duration::days(1), 18)).unwrap();
        first.ingest_at(2500, &at(day0(), 18)).unwrap();

        let mut second = Ledger::new(first.into_store(), LedgerOptions::default());
        assert_eq!(second.load_at(day0()), LoadStatus::Restored { records: 2 });
        assert_eq!(second.daily_goal(), 6000);
        assert_eq!(second.current_steps(), 2500);
        assert_eq!(second.streak(), 0);

        // Next day: nothing recorded yet.
        second.refresh(day0() + Duration::days(1));
        assert_eq!(second.current_steps(), 0);
    }

    #[test]
    fn persistence_failure_keeps_memory_state() {
        let mut ledger = Ledger::new(FlakyStore::default(), LedgerOptions::default());
        ledger.ingest_at(100, &at(day0(), 8)).unwrap();

        ledger.store_mut().fail_writes = true;
        let err = ledger.ingest_at(5000, &at(day0(), 9)).unwrap_err();
        assert!(err.is_persistence());
        assert!(!err.is_fatal());
        assert_eq!(ledger.record_for(day0()).unwrap().steps, 5000);
        assert_eq!(ledger.streak(), 1);

        // Store still holds the last good write.
        let stored = ledger.store().get(PROGRESS_KEY).unwrap().unwrap();
        let stored = ProgressHistory::decode(&stored, 30, PROGRESS_KEY).unwrap();
        assert_eq!(stored.get(day0()).unwrap().steps, 100);

        ledger.store_mut().fail_writes = false;
        ledger.save().unwrap();
        let stored = ledger.store().get(PROGRESS_KEY).unwrap().unwrap();
        let stored = ProgressHistory::decode(&stored, 30, PROGRESS_KEY).unwrap();
        assert_eq!(stored.get(day0()).unwrap().steps, 5000);
    }

    #[test]
    fn unreadable_store_is_not_overwritten() {
        let mut ledger = Ledger::new(FlakyStore::default(), LedgerOptions::default());
        for offset in (0..20).rev() {
            ledger
                .ingest_at(5000, &at(day0() - Duration::days(offset + 1), 12))
                .unwrap();
        }

        ledger.store_mut().fail_reads = true;
        let status = ledger.load_at(day0());
        assert!(matches!(status, LoadStatus::Unavailable { .. }));
        assert!(ledger.is_store_unread());
        assert!(ledger.history().is_empty());

        ledger.store_mut().fail_reads = false;
        let err = ledger.ingest_at(100, &at(day0(), 12)).unwrap_err();
        assert!(err.is_persistence());
        assert_eq!(ledger.record_for(day0()).unwrap().steps, 100);

        let stored = ledger.store().get(PROGRESS_KEY).unwrap().unwrap();
        let stored = ProgressHistory::decode(&stored, 30, PROGRESS_KEY).unwrap();
        assert_eq!(stored.len(), 20);

        // A successful reload restores the stored days and re-enables saving.
        assert_eq!(ledger.load_at(day0()), LoadStatus::Restored { records: 20 });
        assert!(!ledger.is_store_unread());
        ledger.ingest_at(100, &at(day0(), 13)).unwrap();
        let stored = ledger.store().get(PROGRESS_KEY).unwrap().unwrap();
        assert_eq!(
            ProgressHistory::decode(&stored, 30, PROGRESS_KEY).unwrap().len(),
            21
        );
    }

    #[test]
    fn backfill_older_than_window_reports_eviction() {
        let options = LedgerOptions {
            history_window: 3,
            ..LedgerOptions::default()
        };
        let mut ledger = Ledger::new(MemoryStore::new(), options);
        for offset in 0..3 {
            ledger.ingest_at(100, &at(day0() - Duration::days(offset), 12)).unwrap();
        }
        let report = ledger
            .backfill(9000, day0() - Duration::days(10), day0())
            .unwrap();
        assert_eq!(report.upsert, Upsert::Evicted);
        assert!(report.record.is_none());
        assert_eq!(ledger.daily_progress().len(), 3);
        assert!(ledger.record_for(day0() - Duration::days(10)).is_none());
    }

    #[test]
    fn goal_change_does_not_rewrite_history() {
        let mut ledger = ledger();
        ledger.ingest_at(4500, &at(day0() - Duration::days(1), 12)).unwrap();
        ledger.set_goal(10_000).unwrap();
        assert!(ledger.record_for(day0() - Duration::days(1)).unwrap().goal_met);
        assert!(!ledger.ingest_at(4500, &at(day0(), 12)).unwrap().record.unwrap().goal_met);
        assert!(ledger.set_goal(0).is_err());
        assert!(ledger.set_goal(-5).is_err());
        assert_eq!(ledger.daily_goal(), 10_000);
    }

    #[test]
    fn backfill_rejects_future_days() {
        let mut ledger = ledger();
        let err = ledger
            .backfill(100, day0() + Duration::days(1), day0())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidArgument(_)));
        ledger.backfill(4000, day0() - Duration::days(3), day0()).unwrap();
        assert_eq!(ledger.current_steps(), 0);
        assert_eq!(ledger.streak(), 1);
    }

    #[test]
    fn corrupt_profile_keeps_default_goal() {
        let mut store = MemoryStore::new();
        store.set(USER_KEY, b"{").unwrap();
        let (ledger, _) = Ledger::open(store, LedgerOptions::default());
        assert_eq!(ledger.daily_goal(), DEFAULT_DAILY_GOAL);
    }

    #[test]
    fn ingest_now_lands_on_local_today() {
        let mut ledger = ledger();
        ledger.ingest(42).unwrap();
        assert_eq!(
            ledger.record_for(Local::now().date_naive()).map(|r| r.steps),
            Some(42)
        );
    }
}
