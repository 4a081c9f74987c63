//! Storage seam used by goal recalculation.
//!
//! The recalculation service only needs three operations, so it depends on
//! this trait rather than on a pool. `PgGoalStore` backs it in production;
//! tests use an in-memory implementation.

use std::future::Future;

use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::daily_log::DailyLog;
use crate::services::goals::GoalTargets;

pub trait GoalStore: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Users whose `last_weekly_update` is unset or earlier than `today`.
    fn users_due_for_update(
        &self,
        today: NaiveDate,
    ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_;

    /// The user's log for exactly `date`, if any.
    fn log_on(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Option<DailyLog>, Self::Error>> + Send + '_;

    /// Write both goal fields in one row update. When `weekly_update` is
    /// given it becomes the user's `last_weekly_update`. Returns `false` when
    /// the user no longer exists.
    fn save_goals(
        &self,
        user_id: Uuid,
        targets: GoalTargets,
        weekly_update: Option<NaiveDate>,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

#[derive(Clone)]
pub struct PgGoalStore {
    db: PgPool,
}

impl PgGoalStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

impl GoalStore for PgGoalStore {
    type Error = sqlx::Error;

    fn users_due_for_update(
        &self,
        today: NaiveDate,
    ) -> impl Future<Output = Result<Vec<Uuid>, Self::Error>> + Send + '_ {
        async move {
            sqlx::query_scalar::<_, Uuid>(
                r#"
                SELECT id FROM users
                WHERE last_weekly_update IS NULL OR last_weekly_update < $1
                ORDER BY created_at ASC
                "#,
            )
            .bind(today)
            .fetch_all(&self.db)
            .await
        }
    }

    fn log_on(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> impl Future<Output = Result<Option<DailyLog>, Self::Error>> + Send + '_ {
        async move {
            sqlx::query_as::<_, DailyLog>(
                "SELECT * FROM daily_logs WHERE user_id = $1 AND log_date = $2",
            )
            .bind(user_id)
            .bind(date)
            .fetch_optional(&self.db)
            .await
        }
    }

    fn save_goals(
        &self,
        user_id: Uuid,
        targets: GoalTargets,
        weekly_update: Option<NaiveDate>,
    ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_ {
        async move {
            let result = sqlx::query(
                r#"
                UPDATE users SET
                    maintenance_calories = $2,
                    protein_goal = $3,
                    last_weekly_update = COALESCE($4, last_weekly_update),
                    updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(user_id)
            .bind(targets.maintenance_calories)
            .bind(targets.protein_goal)
            .bind(weekly_update)
            .execute(&self.db)
            .await?;
            Ok(result.rows_affected() > 0)
        }
    }
}
