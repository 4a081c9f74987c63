use axum::{extract::State, Extension, Json};
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::handlers::profile::load_user;
use crate::models::daily_log::DailyLog;
use crate::models::user::{TargetWeightRequest, User, UserProfile};
use crate::services::calendar::{self, last_sunday};
use crate::services::goals::{estimate_tdee, BodyProfile, TdeeEstimate};
use crate::services::recalc::{recalculate_user, RecalcOutcome, SkipReason};
use crate::services::summary::{summarize_weeks, WeekSummary};
use crate::AppState;

pub async fn set_target_weight(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<TargetWeightRequest>,
) -> AppResult<Json<UserProfile>> {
    body.validate()?;

    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET target_weight_kg = $2, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(auth_user.id)
    .bind(body.target_weight)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("User not found".into()))?;

    Ok(Json(user.into()))
}

pub async fn weekly_summary(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Vec<WeekSummary>>> {
    let user = load_user(&state.db, auth_user.id).await?;

    let logs = sqlx::query_as::<_, DailyLog>(
        "SELECT * FROM daily_logs WHERE user_id = $1 ORDER BY log_date ASC",
    )
    .bind(auth_user.id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(summarize_weeks(
        &logs,
        user.maintenance_calories,
        user.protein_goal,
    )))
}

/// Recalculate now from the most recent Sunday's log. Runs regardless of
/// when the weekly job last touched this user and leaves its marker alone.
pub async fn manual_update(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<UserProfile>> {
    let anchor = last_sunday(calendar::today());

    match recalculate_user(&state.goal_store, auth_user.id, anchor, None).await? {
        RecalcOutcome::Updated(targets) => {
            tracing::info!(
                user_id = %auth_user.id,
                maintenance_calories = targets.maintenance_calories,
                protein_goal = targets.protein_goal,
                "Manual goal recalculation"
            );
        }
        RecalcOutcome::Skipped(SkipReason::UserMissing) => {
            return Err(AppError::NotFound("User not found".into()));
        }
        RecalcOutcome::Skipped(reason) => {
            tracing::debug!(user_id = %auth_user.id, reason = reason.as_str(), "Manual recalculation skipped");
            return Err(AppError::NoAnchorData(anchor));
        }
    }

    let user = load_user(&state.db, auth_user.id).await?;
    Ok(Json(user.into()))
}

/// Mifflin-St Jeor estimate for reference. Stored goals are unaffected.
pub async fn tdee_estimate(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<TdeeEstimate>> {
    let user = load_user(&state.db, auth_user.id).await?;
    let profile = BodyProfile::from_user(&user).ok_or_else(|| {
        AppError::Validation(
            "Weight, height, age, gender and activity level are required for an estimate".into(),
        )
    })?;
    Ok(Json(estimate_tdee(&profile)))
}
