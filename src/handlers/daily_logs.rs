use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Duration;
use uuid::Uuid;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::daily_log::{
    DailyLog, DailyLogQuery, UpdateDailyLogRequest, UpsertDailyLogRequest,
};
use crate::services::calendar;
use crate::AppState;

/// Create or update the entry for `logDate` (default today). Fields left out
/// of the body keep their stored values.
pub async fn upsert_daily_log(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<UpsertDailyLogRequest>,
) -> AppResult<Json<DailyLog>> {
    body.validate()?;
    let today = calendar::today();
    let log_date = body.log_date.unwrap_or(today);

    if log_date > today {
        return Err(AppError::Validation("Cannot log a future date".into()));
    }

    let log = sqlx::query_as::<_, DailyLog>(
        r#"
        INSERT INTO daily_logs (id, user_id, log_date, weight_kg, calories, protein_g, exercise_minutes, notes)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (user_id, log_date) DO UPDATE SET
            weight_kg = COALESCE($4, daily_logs.weight_kg),
            calories = COALESCE($5, daily_logs.calories),
            protein_g = COALESCE($6, daily_logs.protein_g),
            exercise_minutes = COALESCE($7, daily_logs.exercise_minutes),
            notes = COALESCE($8, daily_logs.notes),
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(auth_user.id)
    .bind(log_date)
    .bind(body.weight_kg)
    .bind(body.calories)
    .bind(body.protein_g)
    .bind(body.exercise_minutes)
    .bind(&body.notes)
    .fetch_one(&state.db)
    .await?;

    // Today's weigh-in becomes the profile's last known weight.
    if log_date == today {
        if let Some(weight) = log.weight_kg {
            sqlx::query("UPDATE users SET weight_kg = $2, updated_at = NOW() WHERE id = $1")
                .bind(auth_user.id)
                .bind(weight)
                .execute(&state.db)
                .await?;
        }
    }

    Ok(Json(log))
}

pub async fn list_daily_logs(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<DailyLogQuery>,
) -> AppResult<Json<Vec<DailyLog>>> {
    let end = query.end_date.unwrap_or_else(calendar::today);
    let start = query.start_date.unwrap_or(end - Duration::days(30));

    if start > end {
        return Err(AppError::Validation("startDate must not be after endDate".into()));
    }

    let logs = sqlx::query_as::<_, DailyLog>(
        r#"
        SELECT * FROM daily_logs
        WHERE user_id = $1 AND log_date BETWEEN $2 AND $3
        ORDER BY log_date DESC
        "#,
    )
    .bind(auth_user.id)
    .bind(start)
    .bind(end)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(logs))
}

pub async fn update_daily_log(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(log_id): Path<Uuid>,
    Json(body): Json<UpdateDailyLogRequest>,
) -> AppResult<Json<DailyLog>> {
    body.validate()?;

    let log = sqlx::query_as::<_, DailyLog>(
        r#"
        UPDATE daily_logs SET
            weight_kg = COALESCE($3, weight_kg),
            calories = COALESCE($4, calories),
            protein_g = COALESCE($5, protein_g),
            exercise_minutes = COALESCE($6, exercise_minutes),
            notes = COALESCE($7, notes),
            updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING *
        "#,
    )
    .bind(log_id)
    .bind(auth_user.id)
    .bind(body.weight_kg)
    .bind(body.calories)
    .bind(body.protein_g)
    .bind(body.exercise_minutes)
    .bind(&body.notes)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("Log not found".into()))?;

    Ok(Json(log))
}

pub async fn delete_daily_log(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(log_id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM daily_logs WHERE id = $1 AND user_id = $2")
        .bind(log_id)
        .bind(auth_user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Log not found".into()));
    }

    Ok(Json(serde_json::json!({ "deleted": true, "id": log_id })))
}
