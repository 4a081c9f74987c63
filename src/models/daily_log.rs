use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub log_date: NaiveDate,
    pub weight_kg: Option<f64>,
    pub calories: Option<i32>,
    pub protein_g: Option<i32>,
    pub exercise_minutes: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpsertDailyLogRequest {
    pub log_date: Option<NaiveDate>,
    #[validate(range(min = 20.0, max = 500.0, message = "Weight must be between 20 and 500 kg"))]
    pub weight_kg: Option<f64>,
    #[validate(range(min = 0, max = 20000, message = "Calories must be between 0 and 20000"))]
    pub calories: Option<i32>,
    #[validate(range(min = 0, max = 1000, message = "Protein must be between 0 and 1000 g"))]
    pub protein_g: Option<i32>,
    #[validate(range(min = 0, max = 1440, message = "Exercise must be between 0 and 1440 minutes"))]
    pub exercise_minutes: Option<i32>,
    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDailyLogRequest {
    #[validate(range(min = 20.0, max = 500.0, message = "Weight must be between 20 and 500 kg"))]
    pub weight_kg: Option<f64>,
    #[validate(range(min = 0, max = 20000, message = "Calories must be between 0 and 20000"))]
    pub calories: Option<i32>,
    #[validate(range(min = 0, max = 1000, message = "Protein must be between 0 and 1000 g"))]
    pub protein_g: Option<i32>,
    #[validate(range(min = 0, max = 1440, message = "Exercise must be between 0 and 1440 minutes"))]
    pub exercise_minutes: Option<i32>,
    #[validate(length(max = 2000, message = "Notes must be at most 2000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLogQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}
