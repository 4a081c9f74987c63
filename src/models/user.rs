use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub primary_goal: Option<PrimaryGoal>,
    pub target_weight_kg: Option<f64>,
    pub maintenance_calories: Option<i32>,
    pub protein_goal: Option<i32>,
    pub last_weekly_update: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "gender", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "activity_level", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Active,
    VeryActive,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "primary_goal", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PrimaryGoal {
    FatLoss,
    MuscleGain,
}

/// Profile as returned to the owning user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub primary_goal: Option<PrimaryGoal>,
    pub target_weight_kg: Option<f64>,
    pub maintenance_calories: Option<i32>,
    pub protein_goal: Option<i32>,
    pub last_weekly_update: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
            age: u.age,
            gender: u.gender,
            height_cm: u.height_cm,
            weight_kg: u.weight_kg,
            activity_level: u.activity_level,
            primary_goal: u.primary_goal,
            target_weight_kg: u.target_weight_kg,
            maintenance_calories: u.maintenance_calories,
            protein_goal: u.protein_goal,
            last_weekly_update: u.last_weekly_update,
            created_at: u.created_at,
        }
    }
}

/// Body attributes shared by registration and `PUT /api/me`.
///
/// Goal fields are deliberately absent: they are only ever derived.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileFields {
    #[validate(range(min = 13, max = 120, message = "Age must be between 13 and 120"))]
    pub age: Option<i32>,
    pub gender: Option<Gender>,
    #[validate(range(min = 50.0, max = 280.0, message = "Height must be between 50 and 280 cm"))]
    pub height_cm: Option<f64>,
    #[validate(range(min = 20.0, max = 500.0, message = "Weight must be between 20 and 500 kg"))]
    pub weight_kg: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub primary_goal: Option<PrimaryGoal>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    #[serde(flatten)]
    #[validate]
    pub profile: ProfileFields,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TargetWeightRequest {
    #[validate(range(min = 20.0, max = 500.0, message = "Target weight must be between 20 and 500 kg"))]
    pub target_weight: f64,
}
