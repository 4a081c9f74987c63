use axum::{extract::State, Extension, Json};
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::models::user::{UpdateProfileRequest, User, UserProfile};
use crate::AppState;

pub(crate) async fn load_user(db: &sqlx::PgPool, user_id: uuid::Uuid) -> AppResult<User> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::NotFound("User not found".into()))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<UserProfile>> {
    let user = load_user(&state.db, auth_user.id).await?;
    Ok(Json(user.into()))
}

/// Partial profile update. Goal fields are not writable here; they change
/// only through recalculation.
pub async fn update_me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> AppResult<Json<UserProfile>> {
    body.validate()?;
    let profile = &body.profile;

    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET
            name = COALESCE($2, name),
            age = COALESCE($3, age),
            gender = COALESCE($4, gender),
            height_cm = COALESCE($5, height_cm),
            weight_kg = COALESCE($6, weight_kg),
            activity_level = COALESCE($7, activity_level),
            primary_goal = COALESCE($8, primary_goal),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(auth_user.id)
    .bind(body.name.as_deref().map(str::trim))
    .bind(profile.age)
    .bind(profile.gender)
    .bind(profile.height_cm)
    .bind(profile.weight_kg)
    .bind(profile.activity_level)
    .bind(profile.primary_goal)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::NotFound("User not found".into()))?;

    Ok(Json(user.into()))
}

/// Delete the account. Daily logs and refresh tokens go with it
/// (`ON DELETE CASCADE`).
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(auth_user.id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".into()));
    }

    tracing::info!(user_id = %auth_user.id, "Account deleted");
    Ok(Json(serde_json::json!({ "deleted": true, "id": auth_user.id })))
}
