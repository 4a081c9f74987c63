use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::daily_log::DailyLog;
use crate::services::calendar::week_start;
use crate::services::goals::calorie_goal;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSummary {
    /// Sunday that opens the week.
    pub week_start: NaiveDate,
    pub avg_calories: Option<i32>,
    pub avg_protein: Option<i32>,
    pub log_count: usize,
    /// Weight on the most recent log of the week.
    pub weight: Option<f64>,
    pub calorie_goal: Option<i32>,
    pub protein_goal: Option<i32>,
}

/// Group logs into Sunday-keyed weeks, newest week first.
///
/// Goals come from the user's current stored values, not recomputed per week.
pub fn summarize_weeks(
    logs: &[DailyLog],
    maintenance_calories: Option<i32>,
    protein_goal: Option<i32>,
) -> Vec<WeekSummary> {
    let mut weeks: BTreeMap<NaiveDate, Vec<&DailyLog>> = BTreeMap::new();
    for log in logs {
        weeks.entry(week_start(log.log_date)).or_default().push(log);
    }

    let goal = calorie_goal(maintenance_calories);

    weeks
        .into_iter()
        .rev()
        .map(|(start, entries)| {
            let latest = entries.iter().max_by_key(|l| l.log_date);
            WeekSummary {
                week_start: start,
                avg_calories: average(entries.iter().filter_map(|l| l.calories)),
                avg_protein: average(entries.iter().filter_map(|l| l.protein_g)),
                log_count: entries.len(),
                weight: latest.and_then(|l| l.weight_kg),
                calorie_goal: goal,
                protein_goal,
            }
        })
        .collect()
}

/// Rounded mean of the values present; `None` if there are none.
fn average(values: impl Iterator<Item = i32>) -> Option<i32> {
    let (sum, count) = values.fold((0i64, 0i64), |(s, c), v| (s + v as i64, c + 1));
    if count == 0 {
        None
    } else {
        Some((sum as f64 / count as f64).round() as i32)
    }
}
