//! Goal calculator.
//!
//! Stored goals use the flat weight rule only. The Mifflin-St Jeor estimate
//! below is reported separately and is never written to a user's goals.

use serde::Serialize;

use crate::models::user::{ActivityLevel, Gender, User};

/// Daily deficit applied to maintenance when reporting a calorie goal.
pub const CALORIE_DEFICIT: i32 = 500;

const MAINTENANCE_FACTOR: f64 = 1.9;
const KCAL_PER_KG: f64 = 14.0;
const PROTEIN_G_PER_KG: f64 = 1.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalTargets {
    pub maintenance_calories: i32,
    pub protein_goal: i32,
}

/// Derive goals from a weight reading. Returns `None` when there is no usable
/// weight, in which case callers must not write anything.
pub fn calculate_goals(weight_kg: Option<f64>) -> Option<GoalTargets> {
    let weight = weight_kg.filter(|w| w.is_finite() && *w > 0.0)?;
    Some(GoalTargets {
        maintenance_calories: (weight * MAINTENANCE_FACTOR * KCAL_PER_KG).round() as i32,
        protein_goal: (weight * PROTEIN_G_PER_KG).round() as i32,
    })
}

/// Calorie goal shown alongside weekly summaries.
pub fn calorie_goal(maintenance_calories: Option<i32>) -> Option<i32> {
    maintenance_calories.map(|m| m - CALORIE_DEFICIT)
}

// ── TDEE estimate ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyProfile {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: i32,
    pub gender: Gender,
    pub activity_level: ActivityLevel,
}

impl BodyProfile {
    /// `None` unless every attribute the estimate needs is present.
    pub fn from_user(user: &User) -> Option<Self> {
        Some(Self {
            weight_kg: user.weight_kg?,
            height_cm: user.height_cm?,
            age: user.age?,
            gender: user.gender?,
            activity_level: user.activity_level?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TdeeEstimate {
    pub bmr: i32,
    pub activity_factor: f64,
    pub tdee: i32,
}

pub fn activity_factor(level: ActivityLevel) -> f64 {
    match level {
        ActivityLevel::Sedentary => 1.2,
        ActivityLevel::Light => 1.375,
        ActivityLevel::Moderate => 1.55,
        ActivityLevel::Active => 1.725,
        ActivityLevel::VeryActive => 1.9,
    }
}

/// Mifflin-St Jeor BMR scaled by the activity factor.
pub fn estimate_tdee(profile: &BodyProfile) -> TdeeEstimate {
    let offset = match profile.gender {
        Gender::Male => 5.0,
        Gender::Female => -161.0,
    };
    let bmr = 10.0 * profile.weight_kg + 6.25 * profile.height_cm - 5.0 * profile.age as f64
        + offset;
    let factor = activity_factor(profile.activity_level);

    TdeeEstimate {
        bmr: bmr.round() as i32,
        activity_factor: factor,
        tdee: (bmr * factor).round() as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goals_for_80kg() {
        let goals = calculate_goals(Some(80.0)).unwrap();
        assert_eq!(goals.maintenance_calories, 2128);
        assert_eq!(goals.protein_goal, 136);
    }

    #[test]
    fn test_goals_for_70kg() {
        let goals = calculate_goals(Some(70.0)).unwrap();
        assert_eq!(goals.maintenance_calories, 1862);
        assert_eq!(goals.protein_goal, 119);
    }

    #[test]
    fn test_goals_round_fractional_weight() {
        // 72.3 * 1.9 * 14 = 1923.18, 72.3 * 1.7 = 122.91
        let goals = calculate_goals(Some(72.3)).unwrap();
        assert_eq!(goals.maintenance_calories, 1923);
        assert_eq!(goals.protein_goal, 123);
    }

    #[test]
    fn test_goals_match_formula_across_weights() {
        for tenth in (400..=1500).step_by(7) {
            let w = tenth as f64 / 10.0;
            let goals = calculate_goals(Some(w)).unwrap();
            assert_eq!(goals.maintenance_calories, (w * 1.9 * 14.0).round() as i32);
            assert_eq!(goals.protein_goal, (w * 1.7).round() as i32);
        }
    }

    #[test]
    fn test_goals_skipped_without_weight() {
        assert!(calculate_goals(None).is_none());
        assert!(calculate_goals(Some(0.0)).is_none());
        assert!(calculate_goals(Some(-3.0)).is_none());
        assert!(calculate_goals(Some(f64::NAN)).is_none());
    }

    #[test]
    fn test_calorie_goal_applies_deficit() {
        assert_eq!(calorie_goal(Some(2128)), Some(1628));
        assert_eq!(calorie_goal(None), None);
    }

    #[test]
    fn test_tdee_male_moderate() {
        let profile = BodyProfile {
            weight_kg: 80.0,
            height_cm: 180.0,
            age: 30,
            gender: Gender::Male,
            activity_level: ActivityLevel::Moderate,
        };
        // 800 + 1125 - 150 + 5 = 1780; 1780 * 1.55 = 2759
        let est = estimate_tdee(&profile);
        assert_eq!(est.bmr, 1780);
        assert_eq!(est.tdee, 2759);
        assert_eq!(est.activity_factor, 1.55);
    }

    #[test]
    fn test_tdee_female_sedentary() {
        let profile = BodyProfile {
            weight_kg: 60.0,
            height_cm: 165.0,
            age: 40,
            gender: Gender::Female,
            activity_level: ActivityLevel::Sedentary,
        };
        // 600 + 1031.25 - 200 - 161 = 1270.25; * 1.2 = 1524.3
        let est = estimate_tdee(&profile);
        assert_eq!(est.bmr, 1270);
        assert_eq!(est.tdee, 1524);
    }
}
