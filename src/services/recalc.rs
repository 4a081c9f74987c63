//! Weekly goal recalculation.
//!
//! Each run selects every user not yet updated today, reads their log for the
//! most recent Sunday and rewrites their goals from that weight. Users without
//! a usable anchor log are skipped and stay eligible, so the next run (or a
//! manual trigger) picks them up.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::db::GoalStore;
use crate::services::calendar::last_sunday;
use crate::services::goals::{calculate_goals, GoalTargets};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoLog,
    NoWeight,
    UserMissing,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::NoLog => "no log on anchor day",
            SkipReason::NoWeight => "anchor log has no weight",
            SkipReason::UserMissing => "user no longer exists",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecalcOutcome {
    Updated(GoalTargets),
    Skipped(SkipReason),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub selected: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Recompute one user's goals from their log on `anchor`.
///
/// Nothing is written on a skip. `mark` is stored as `last_weekly_update`
/// when present; the manual path passes `None`.
pub async fn recalculate_user<S: GoalStore>(
    store: &S,
    user_id: Uuid,
    anchor: NaiveDate,
    mark: Option<NaiveDate>,
) -> Result<RecalcOutcome, S::Error> {
    let Some(log) = store.log_on(user_id, anchor).await? else {
        return Ok(RecalcOutcome::Skipped(SkipReason::NoLog));
    };

    let Some(targets) = calculate_goals(log.weight_kg) else {
        return Ok(RecalcOutcome::Skipped(SkipReason::NoWeight));
    };

    if !store.save_goals(user_id, targets, mark).await? {
        return Ok(RecalcOutcome::Skipped(SkipReason::UserMissing));
    }
    Ok(RecalcOutcome::Updated(targets))
}

/// One batch run for `today`. Users are processed sequentially; a failure on
/// one user is logged and counted, never propagated. Only a failed selection
/// aborts the run.
pub async fn run_weekly_recalculation<S: GoalStore>(
    store: &S,
    today: NaiveDate,
) -> Result<BatchReport, S::Error> {
    let anchor = last_sunday(today);
    let user_ids = store.users_due_for_update(today).await?;

    let mut report = BatchReport {
        selected: user_ids.len(),
        ..BatchReport::default()
    };
    tracing::info!(
        selected = report.selected,
        anchor = %anchor,
        today = %today,
        "Weekly goal recalculation started"
    );

    for user_id in user_ids {
        match recalculate_user(store, user_id, anchor, Some(today)).await {
            Ok(RecalcOutcome::Updated(targets)) => {
                report.updated += 1;
                tracing::debug!(
                    user_id = %user_id,
                    maintenance_calories = targets.maintenance_calories,
                    protein_goal = targets.protein_goal,
                    "Goals recalculated"
                );
            }
            Ok(RecalcOutcome::Skipped(reason)) => {
                report.skipped += 1;
                tracing::info!(
                    user_id = %user_id,
                    anchor = %anchor,
                    reason = reason.as_str(),
                    "Skipping goal recalculation"
                );
            }
            Err(e) => {
                report.failed += 1;
                tracing::error!(user_id = %user_id, error = %e, "Goal recalculation failed for user");
            }
        }
    }

    tracing::info!(
        selected = report.selected,
        updated = report.updated,
        skipped = report.skipped,
        failed = report.failed,
        "Weekly goal recalculation finished"
    );
    Ok(report)
}

/// Scheduler entry point. Batch-level failures end up in the log only.
pub async fn run_weekly_job<S: GoalStore>(store: &S, today: NaiveDate) -> Option<BatchReport> {
    match run_weekly_recalculation(store, today).await {
        Ok(report) => Some(report),
        Err(e) => {
            tracing::error!(error = %e, today = %today, "Weekly goal recalculation aborted");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::future::Future;
    use std::sync::Mutex;

    use chrono::{Duration, Utc};

    use crate::models::daily_log::DailyLog;

    #[derive(Debug, thiserror::Error)]
    #[error("store unavailable: {0}")]
    pub struct MemoryStoreError(String);

    #[derive(Debug, Clone, PartialEq)]
    pub struct MemoryUser {
        pub id: Uuid,
        pub maintenance_calories: Option<i32>,
        pub protein_goal: Option<i32>,
        pub last_weekly_update: Option<NaiveDate>,
    }

    #[derive(Default)]
    pub struct MemoryGoalStore {
        pub users: Mutex<Vec<MemoryUser>>,
        pub logs: Mutex<Vec<DailyLog>>,
        pub failing_users: Mutex<HashSet<Uuid>>,
        pub fail_selection: Mutex<bool>,
    }

    impl MemoryGoalStore {
        pub fn add_user(&self) -> Uuid {
            let id = Uuid::new_v4();
            self.users.lock().unwrap().push(MemoryUser {
                id,
                maintenance_calories: None,
                protein_goal: None,
                last_weekly_update: None,
            });
            id
        }

        pub fn add_log(&self, user_id: Uuid, date: NaiveDate, weight_kg: Option<f64>) {
            let now = Utc::now();
            self.logs.lock().unwrap().push(DailyLog {
                id: Uuid::new_v4(),
                user_id,
                log_date: date,
                weight_kg,
                calories: None,
                protein_g: None,
                exercise_minutes: None,
                notes: None,
                created_at: now,
                updated_at: now,
            });
        }

        pub fn user(&self, id: Uuid) -> MemoryUser {
            self.users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.id == id)
                .cloned()
                .unwrap()
        }

        pub fn set_last_update(&self, id: Uuid, date: NaiveDate) {
            let mut users = self.users.lock().unwrap();
            if let Some(u) = users.iter_mut().find(|u| u.id == id) {
                u.last_weekly_update = Some(date);
            }
        }
    }

    impl GoalStore for MemoryGoalStore {
        type Error = MemoryStoreError;

        fn users_due_for_update(
            &self,
            today: NaiveDate,
        ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_ {
            let result = if *self.fail_selection.lock().unwrap() {
                Err(MemoryStoreError("selection".into()))
            } else {
                Ok(self
                    .users
                    .lock()
                    .unwrap()
                    .iter()
                    .filter(|u| u.last_weekly_update.map_or(true, |d| d < today))
                    .map(|u| u.id)
                    .collect::<Vec<_>>())
            };
            async move { result }
        }

        fn log_on(
            &self,
            user_id: Uuid,
            date: NaiveDate,
        ) -> impl Future<Output = Result<Option<DailyLog>, Self::Error>> + Send + '_ {
            let result = if self.failing_users.lock().unwrap().contains(&user_id) {
                Err(MemoryStoreError(format!("lookup for {user_id}")))
            } else {
                Ok(self
                    .logs
                    .lock()
                    .unwrap()
                    .iter()
                    .find(|l| l.user_id == user_id && l.log_date == date)
                    .cloned())
            };
            async move { result }
        }

        fn save_goals(
            &self,
            user_id: Uuid,
            targets: GoalTargets,
            weekly_update: Option<NaiveDate>,
        ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_ {
            let mut users = self.users.lock().unwrap();
            let found = match users.iter_mut().find(|u| u.id == user_id) {
                Some(u) => {
                    u.maintenance_calories = Some(targets.maintenance_calories);
                    u.protein_goal = Some(targets.protein_goal);
                    if weekly_update.is_some() {
                        u.last_weekly_update = weekly_update;
                    }
                    true
                }
                None => false,
            };
            async move { Ok(found) }
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    // 2026-10-19 is a Monday; the anchor is Sunday 2026-10-18.
    fn monday() -> NaiveDate {
        date(2026, 10, 19)
    }

    fn sunday() -> NaiveDate {
        date(2026, 10, 18)
    }

    #[tokio::test]
    async fn test_sunday_log_updates_goals_on_monday_run() {
        let store = MemoryGoalStore::default();
        let user = store.add_user();
        store.add_log(user, sunday(), Some(70.0));

        let report = run_weekly_recalculation(&store, monday()).await.unwrap();
        assert_eq!(report.updated, 1);

        let u = store.user(user);
        assert_eq!(u.maintenance_calories, Some(1862));
        assert_eq!(u.protein_goal, Some(119));
        assert_eq!(u.last_weekly_update, Some(monday()));
    }

    #[tokio::test]
    async fn test_missing_anchor_log_leaves_user_unchanged() {
        let store = MemoryGoalStore::default();
        let user = store.add_user();
        // Saturday and Monday logs do not count as the anchor.
        store.add_log(user, sunday() - Duration::days(1), Some(80.0));
        store.add_log(user, monday(), Some(80.0));
        let before = store.user(user);

        let report = run_weekly_recalculation(&store, monday()).await.unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.updated, 0);
        assert_eq!(store.user(user), before);
    }

    #[tokio::test]
    async fn test_anchor_log_without_weight_is_skipped() {
        let store = MemoryGoalStore::default();
        let user = store.add_user();
        store.add_log(user, sunday(), None);

        let outcome = recalculate_user(&store, user, sunday(), Some(monday()))
            .await
            .unwrap();
        assert_eq!(outcome, RecalcOutcome::Skipped(SkipReason::NoWeight));
        assert!(store.user(user).last_weekly_update.is_none());
    }

    #[tokio::test]
    async fn test_user_deleted_after_selection_is_not_counted_as_updated() {
        let store = MemoryGoalStore::default();
        let user = store.add_user();
        store.add_log(user, sunday(), Some(90.0));
        // Account deleted between selection and save.
        store.users.lock().unwrap().retain(|u| u.id != user);

        let outcome = recalculate_user(&store, user, sunday(), Some(monday()))
            .await
            .unwrap();
        assert_eq!(outcome, RecalcOutcome::Skipped(SkipReason::UserMissing));
    }

    #[tokio::test]
    async fn test_users_updated_today_are_not_selected() {
        let store = MemoryGoalStore::default();
        let done = store.add_user();
        let stale = store.add_user();
        store.set_last_update(done, monday());
        store.set_last_update(stale, monday() - Duration::days(7));

        let due = store.users_due_for_update(monday()).await.unwrap();
        assert_eq!(due, vec![stale]);
    }

    #[tokio::test]
    async fn test_second_run_same_day_is_a_no_op() {
        let store = MemoryGoalStore::default();
        let user = store.add_user();
        store.add_log(user, sunday(), Some(80.0));

        let first = run_weekly_recalculation(&store, monday()).await.unwrap();
        assert_eq!(first.updated, 1);

        let second = run_weekly_recalculation(&store, monday()).await.unwrap();
        assert_eq!(second, BatchReport::default());
    }

    #[tokio::test]
    async fn test_failing_user_does_not_abort_batch() {
        let store = MemoryGoalStore::default();
        let a = store.add_user();
        let b = store.add_user();
        store.add_log(a, sunday(), Some(90.0));
        store.add_log(b, sunday(), Some(80.0));
        store.failing_users.lock().unwrap().insert(a);

        let report = run_weekly_recalculation(&store, monday()).await.unwrap();
        assert_eq!(report.selected, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.updated, 1);

        let ua = store.user(a);
        assert!(ua.maintenance_calories.is_none());
        assert!(ua.last_weekly_update.is_none());

        let ub = store.user(b);
        assert_eq!(ub.maintenance_calories, Some(2128));
        assert_eq!(ub.protein_goal, Some(136));
        assert_eq!(ub.last_weekly_update, Some(monday()));
    }

    #[tokio::test]
    async fn test_failed_user_is_picked_up_next_week() {
        let store = MemoryGoalStore::default();
        let user = store.add_user();
        store.failing_users.lock().unwrap().insert(user);
        run_weekly_recalculation(&store, monday()).await.unwrap();

        store.failing_users.lock().unwrap().clear();
        let next_monday = monday() + Duration::days(7);
        store.add_log(user, sunday() + Duration::days(7), Some(75.0));

        let report = run_weekly_recalculation(&store, next_monday).await.unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(store.user(user).last_weekly_update, Some(next_monday));
    }

    #[tokio::test]
    async fn test_selection_failure_aborts_without_updates() {
        let store = MemoryGoalStore::default();
        let user = store.add_user();
        store.add_log(user, sunday(), Some(80.0));
        *store.fail_selection.lock().unwrap() = true;

        assert!(run_weekly_recalculation(&store, monday()).await.is_err());
        assert!(run_weekly_job(&store, monday()).await.is_none());
        assert!(store.user(user).maintenance_calories.is_none());
    }

    #[tokio::test]
    async fn test_manual_recalculation_is_repeatable() {
        let store = MemoryGoalStore::default();
        let user = store.add_user();
        store.add_log(user, sunday(), Some(80.0));
        store.set_last_update(user, monday());

        let first = recalculate_user(&store, user, last_sunday(monday()), None)
            .await
            .unwrap();
        let second = recalculate_user(&store, user, last_sunday(monday()), None)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first,
            RecalcOutcome::Updated(GoalTargets {
                maintenance_calories: 2128,
                protein_goal: 136,
            })
        );
        // Manual runs leave the weekly marker alone.
        assert_eq!(store.user(user).last_weekly_update, Some(monday()));
    }

    #[tokio::test]
    async fn test_run_on_sunday_anchors_to_same_day() {
        let store = MemoryGoalStore::default();
        let user = store.add_user();
        store.add_log(user, sunday(), Some(60.0));

        let report = run_weekly_recalculation(&store, sunday()).await.unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(store.user(user).protein_goal, Some(102));
    }
}
